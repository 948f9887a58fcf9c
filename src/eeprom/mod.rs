//! Parallel EEPROM behind an FTDI bridge in MPSSE mode.
//!
//! The address bus comes from serial-in/parallel-out shift registers fed by
//! the MPSSE clock/data pins, the data bus is the high GPIO bus and the
//! control lines are on the low GPIO bus (see `frames`).

use std::time::Duration;

use crate::error::ErrorKind;
use crate::mpsse::Frame;
use crate::transport::{
	BitMode,
	Transport,
};

pub mod frames;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Mode {
	/// device open, bridge in its default mode
	Default,
	/// bridge ready for parallel bus emulation
	Mpsse,
}

pub struct Eeprom<T: Transport> {
	transport: T,
	mode: Mode,
}

impl<T: Transport> Eeprom<T> {
	/// wrap an open device; nothing is sent yet
	pub fn new(transport: T) -> Self {
		Eeprom {
			transport,
			mode: Mode::Default,
		}
	}

	pub fn mode(&self) -> Mode {
		self.mode
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	fn switch_mode(&mut self, pin_mask: u8, mode: BitMode) -> crate::AResult<()> {
		self.transport.set_bit_mode(pin_mask, mode)
			.map_err(|e| ErrorKind::ModeSwitchFailed.wrap(e))
	}

	fn send(&mut self, frame: &Frame) -> crate::AResult<()> {
		debug!("write {:?}", frame);
		self.transport.write(frame.as_bytes())
			.map_err(|e| ErrorKind::TransportWriteFailed.wrap(e))
	}

	fn receive(&mut self, buf: &mut [u8]) -> crate::AResult<()> {
		self.transport.read(buf)
			.map_err(|e| ErrorKind::TransportReadFailed.wrap(e))
	}

	fn ensure_ready(&self) -> crate::AResult<()> {
		ensure!(self.mode == Mode::Mpsse, "EEPROM session not initialized");
		Ok(())
	}

	/// Bring the bridge into MPSSE mode and the external circuit into its
	/// idle state. Stops at the first failing step.
	pub fn init(&mut self, clock_divisor: u16) -> crate::AResult<()> {
		info!("Resetting bit mode");
		with_context!("reset bit mode", self.switch_mode(0xff, BitMode::Reset))?;

		info!("Selecting MPSSE mode");
		with_context!("select MPSSE mode", self.switch_mode(0xff, BitMode::Mpsse))?;

		with_context!(("set clock divisor {}", clock_divisor), self.send(&frames::clock_divisor(clock_divisor)))?;
		with_context!("set low bus defaults", self.send(&frames::low_defaults()))?;
		with_context!("set high bus defaults", self.send(&frames::high_defaults()))?;
		with_context!("reset shift registers", self.send(&frames::reset_pulse()))?;

		self.mode = Mode::Mpsse;
		Ok(())
	}

	pub fn set_address(&mut self, address: u16) -> crate::AResult<()> {
		self.ensure_ready()?;
		let frame = frames::address_latch(address)?;
		with_context!(("latch address 0x{:04x}", address), self.send(&frame))
	}

	/// Latch `address` and pulse `data` into the EEPROM. The caller has to
	/// wait for the write cycle to finish before the next access.
	pub fn write_byte(&mut self, address: u16, data: u8) -> crate::AResult<()> {
		self.set_address(address)?;
		with_context!(("write byte 0x{:02x} at 0x{:04x}", data, address),
			self.send(&frames::byte_write(data))
		)
	}

	pub fn read_byte(&mut self, address: u16) -> crate::AResult<u8> {
		self.set_address(address)?;
		with_context!(("read byte at 0x{:04x}", address), {
			self.send(&frames::read_enable())?;

			// the answer has to be drained before the bus is touched again
			let request = frames::read_request();
			self.send(&request)?;
			let mut data = [0u8; 1];
			self.receive(&mut data[..request.response_len()])?;

			self.send(&frames::read_release())?;
			Ok(data[0])
		})
	}

	/// read `target.len()` consecutive bytes starting at `start`
	pub fn read_range(&mut self, start: u16, target: &mut [u8]) -> crate::AResult<()> {
		ensure!(target.len() <= 0x1_0000 - start as usize,
			"Range 0x{:04x}+{} exceeds the 64 KiB address space", start, target.len()
		);
		for (offset, t) in target.iter_mut().enumerate() {
			*t = self.read_byte(start + offset as u16)?;
		}
		Ok(())
	}

	pub fn delay(&mut self, duration: Duration) {
		self.transport.delay(duration);
	}

	/// Put the bridge back into its default mode. The session counts as
	/// released even if the device refused.
	pub fn reset(&mut self) -> crate::AResult<()> {
		info!("Resetting bit mode");
		self.mode = Mode::Default;
		// pin mask is ignored by the reset mode
		with_context!("reset bit mode", self.switch_mode(0, BitMode::Reset))
	}
}

impl<T: Transport> Drop for Eeprom<T> {
	fn drop(&mut self) {
		if self.mode == Mode::Mpsse {
			if let Err(e) = self.reset() {
				error!("Couldn't reset bit mode: {}", e);
			}
		}
	}
}
