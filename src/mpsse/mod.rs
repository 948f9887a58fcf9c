//! Command encoding for the MPSSE engine of FTDI bridge chips.
//!
//! Every command is an opcode byte followed by a fixed number of argument
//! bytes (or, for data transfers, a length-minus-one and the payload). A
//! `Frame` is a batch of complete commands that goes out in one transport
//! write; the builder never hands out a frame with a half-encoded command.

use std::fmt;

mod pins;

pub use self::pins::{
	HighPins,
	LowPins,
};

#[allow(dead_code)]
pub mod opcodes {
	// clock bytes out on -ve edge, MSB first, no read
	pub const CLOCK_BYTES_OUT: u8 = 0x11;
	pub const SET_LOW_BUS:     u8 = 0x80; // value, direction
	pub const READ_LOW_BUS:    u8 = 0x81;
	pub const SET_HIGH_BUS:    u8 = 0x82; // value, direction
	pub const READ_HIGH_BUS:   u8 = 0x83;
	pub const SET_CLOCK_DIVISOR: u8 = 0x86; // divisor LSB, MSB
	pub const SEND_IMMEDIATE:  u8 = 0x87;
}

use self::opcodes::*;

/// Largest payload a single data transfer can carry (length is sent as a
/// 16-bit "length minus one").
pub const MAX_TRANSFER: usize = 0x1_0000;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Command {
	SetLowBus { value: u8, direction: u8 },
	SetHighBus { value: u8, direction: u8 },
	ClockBytesOut(Vec<u8>),
	SetClockDivisor(u16),
	ReadHighBus,
}

impl Command {
	pub fn low(pins: LowPins) -> Self {
		Command::SetLowBus { value: pins.0, direction: pins.direction() }
	}

	pub fn high(pins: HighPins) -> Self {
		Command::SetHighBus { value: pins.value, direction: pins.direction }
	}

	/// number of bytes the device sends back for this command
	pub fn response_len(&self) -> usize {
		match self {
			Command::ReadHighBus => 1,
			_ => 0,
		}
	}

	/// append the wire encoding to `out`; leaves `out` untouched on error
	pub fn encode(&self, out: &mut Vec<u8>) -> crate::AResult<()> {
		match self {
			Command::SetLowBus { value, direction } => {
				out.extend_from_slice(&[SET_LOW_BUS, *value, *direction]);
			},
			Command::SetHighBus { value, direction } => {
				out.extend_from_slice(&[SET_HIGH_BUS, *value, *direction]);
			},
			Command::ClockBytesOut(data) => {
				ensure!(!data.is_empty(), "Cannot clock out an empty transfer");
				ensure!(data.len() <= MAX_TRANSFER,
					"Transfer too long: {} bytes (max {})", data.len(), MAX_TRANSFER
				);
				let len = (data.len() - 1) as u16;
				out.extend_from_slice(&[CLOCK_BYTES_OUT, len as u8, (len >> 8) as u8]);
				out.extend_from_slice(data);
			},
			Command::SetClockDivisor(divisor) => {
				out.extend_from_slice(&[SET_CLOCK_DIVISOR, *divisor as u8, (*divisor >> 8) as u8]);
			},
			Command::ReadHighBus => {
				out.push(READ_HIGH_BUS);
			},
		}
		Ok(())
	}

	/// parse a byte stream back into commands; only the opcodes above are
	/// understood
	pub fn decode_all(mut data: &[u8]) -> crate::AResult<Vec<Command>> {
		fn take<'a>(data: &mut &'a [u8], n: usize, opcode: u8) -> crate::AResult<&'a [u8]> {
			ensure!(data.len() >= n, "Truncated command 0x{:02x}: need {} bytes, have {}", opcode, n, data.len());
			let rest: &'a [u8] = *data;
			let (head, tail) = rest.split_at(n);
			*data = tail;
			Ok(head)
		}

		let mut commands = Vec::new();
		while let Some((&opcode, rest)) = data.split_first() {
			data = rest;
			let cmd = match opcode {
				SET_LOW_BUS => {
					let args = take(&mut data, 2, opcode)?;
					Command::SetLowBus { value: args[0], direction: args[1] }
				},
				SET_HIGH_BUS => {
					let args = take(&mut data, 2, opcode)?;
					Command::SetHighBus { value: args[0], direction: args[1] }
				},
				CLOCK_BYTES_OUT => {
					let args = take(&mut data, 2, opcode)?;
					let len = (args[0] as usize) + ((args[1] as usize) << 8) + 1;
					Command::ClockBytesOut(take(&mut data, len, opcode)?.to_vec())
				},
				SET_CLOCK_DIVISOR => {
					let args = take(&mut data, 2, opcode)?;
					Command::SetClockDivisor((args[0] as u16) | ((args[1] as u16) << 8))
				},
				READ_HIGH_BUS => Command::ReadHighBus,
				_ => bail!("Unknown MPSSE opcode 0x{:02x}", opcode),
			};
			commands.push(cmd);
		}
		Ok(commands)
	}
}

/// Encoded batch of commands, written to the device in one go.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Frame {
	bytes: Vec<u8>,
	response_len: usize,
}

impl Frame {
	pub fn as_bytes(&self) -> &[u8] {
		&self.bytes
	}

	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// bytes the device will answer with once the frame was executed
	pub fn response_len(&self) -> usize {
		self.response_len
	}

	pub fn commands(&self) -> crate::AResult<Vec<Command>> {
		Command::decode_all(&self.bytes)
	}
}

impl fmt::Debug for Frame {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self.commands() {
			Ok(commands) => f.debug_list().entries(commands.iter()).finish(),
			Err(_) => write!(f, "{:02x?}", self.bytes),
		}
	}
}

#[derive(Default)]
pub struct FrameBuilder {
	frame: Frame,
}

impl FrameBuilder {
	pub fn new() -> Self {
		FrameBuilder::default()
	}

	pub fn push(&mut self, cmd: &Command) -> crate::AResult<&mut Self> {
		cmd.encode(&mut self.frame.bytes)?;
		self.frame.response_len += cmd.response_len();
		Ok(self)
	}

	pub fn low(&mut self, pins: LowPins) -> &mut Self {
		self.infallible(Command::low(pins))
	}

	pub fn high(&mut self, pins: HighPins) -> &mut Self {
		self.infallible(Command::high(pins))
	}

	pub fn clock_divisor(&mut self, divisor: u16) -> &mut Self {
		self.infallible(Command::SetClockDivisor(divisor))
	}

	pub fn read_high(&mut self) -> &mut Self {
		self.infallible(Command::ReadHighBus)
	}

	pub fn clock_bytes_out(&mut self, data: &[u8]) -> crate::AResult<&mut Self> {
		self.push(&Command::ClockBytesOut(data.to_vec()))
	}

	// fixed-size commands cannot fail to encode
	fn infallible(&mut self, cmd: Command) -> &mut Self {
		let _ = cmd.encode(&mut self.frame.bytes);
		self.frame.response_len += cmd.response_len();
		self
	}

	pub fn build(&mut self) -> Frame {
		std::mem::replace(&mut self.frame, Frame::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn gpio_commands() {
		let frame = FrameBuilder::new()
			.low(LowPins::idle())
			.high(HighPins::drive(0xa5))
			.build();
		assert_eq!(frame.as_bytes(), &[0x80, 0x7f, 0xfb, 0x82, 0xa5, 0xff]);
		assert_eq!(frame.response_len(), 0);
	}

	#[test]
	fn clock_divisor() {
		let frame = FrameBuilder::new().clock_divisor(4).build();
		assert_eq!(frame.as_bytes(), &[0x86, 0x04, 0x00]);
		let frame = FrameBuilder::new().clock_divisor(0x1234).build();
		assert_eq!(frame.as_bytes(), &[0x86, 0x34, 0x12]);
	}

	#[test]
	fn clock_bytes_out_length_is_minus_one() {
		let frame = FrameBuilder::new().clock_bytes_out(&[0xde, 0xad]).unwrap().build();
		assert_eq!(frame.as_bytes(), &[0x11, 0x01, 0x00, 0xde, 0xad]);

		let big = vec![0u8; 0x101];
		let frame = FrameBuilder::new().clock_bytes_out(&big).unwrap().build();
		assert_eq!(&frame.as_bytes()[..3], &[0x11, 0x00, 0x01]);
		assert_eq!(frame.len(), 3 + 0x101);
	}

	#[test]
	fn clock_bytes_out_range() {
		let mut b = FrameBuilder::new();
		assert!(b.clock_bytes_out(&[]).is_err());
		assert!(b.clock_bytes_out(&vec![0u8; MAX_TRANSFER + 1]).is_err());
		// failed commands leave nothing behind
		assert!(b.build().is_empty());

		let frame = FrameBuilder::new().clock_bytes_out(&vec![0u8; MAX_TRANSFER]).unwrap().build();
		assert_eq!(&frame.as_bytes()[..3], &[0x11, 0xff, 0xff]);
	}

	#[test]
	fn read_expects_response() {
		let frame = FrameBuilder::new().read_high().build();
		assert_eq!(frame.as_bytes(), &[0x83]);
		assert_eq!(frame.response_len(), 1);
	}

	#[test]
	fn decode() {
		let cmds = Command::decode_all(&[0x11, 0x01, 0x00, 0x12, 0x34, 0x80, 0x7f, 0xfb, 0x83]).unwrap();
		assert_eq!(cmds, vec![
			Command::ClockBytesOut(vec![0x12, 0x34]),
			Command::SetLowBus { value: 0x7f, direction: 0xfb },
			Command::ReadHighBus,
		]);
		assert!(Command::decode_all(&[0x80, 0x7f]).is_err());
		assert!(Command::decode_all(&[0x11, 0x02, 0x00, 0x01]).is_err());
		assert!(Command::decode_all(&[0x42]).is_err());
	}
}
