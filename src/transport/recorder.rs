use std::collections::VecDeque;
use std::time::Duration;

use super::{
	BitMode,
	Transport,
};

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Event {
	BitMode { pin_mask: u8, mode: BitMode },
	Write(Vec<u8>),
	Read(usize),
	Delay(Duration),
}

/// Transport that keeps a log of everything instead of talking to hardware.
///
/// Used for `--dry-run`; failures can be injected to exercise error paths.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
	events: Vec<Event>,
	writes: usize,
	fail_write: Option<usize>,
	fail_bit_mode: Option<BitMode>,
	responses: VecDeque<u8>,
	default_response: Option<u8>,
}

impl Recorder {
	pub fn new() -> Self {
		Recorder::default()
	}

	/// the write with index `n` (counting from zero) fails
	pub fn fail_on_write(mut self, n: usize) -> Self {
		self.fail_write = Some(n);
		self
	}

	pub fn fail_on_bit_mode(mut self, mode: BitMode) -> Self {
		self.fail_bit_mode = Some(mode);
		self
	}

	/// queue bytes returned by following reads
	pub fn respond_with(mut self, data: &[u8]) -> Self {
		self.responses.extend(data);
		self
	}

	/// answer reads with `value` once the queue is empty
	pub fn default_response(mut self, value: u8) -> Self {
		self.default_response = Some(value);
		self
	}

	pub fn events(&self) -> &[Event] {
		&self.events
	}

	/// data of all successful writes, in order
	pub fn writes(&self) -> Vec<&[u8]> {
		self.events.iter().filter_map(|e| match e {
			Event::Write(data) => Some(&data[..]),
			_ => None,
		}).collect()
	}

	pub fn delays(&self) -> Vec<Duration> {
		self.events.iter().filter_map(|e| match e {
			Event::Delay(d) => Some(*d),
			_ => None,
		}).collect()
	}
}

impl Transport for Recorder {
	fn set_bit_mode(&mut self, pin_mask: u8, mode: BitMode) -> crate::AResult<()> {
		ensure!(self.fail_bit_mode != Some(mode), "injected failure switching to {} mode", mode);
		trace!("bit mode {} (mask 0x{:02x})", mode, pin_mask);
		self.events.push(Event::BitMode { pin_mask, mode });
		Ok(())
	}

	fn write(&mut self, data: &[u8]) -> crate::AResult<()> {
		let index = self.writes;
		self.writes += 1;
		ensure!(self.fail_write != Some(index), "injected failure on write #{}", index);
		trace!("write {:02x?}", data);
		self.events.push(Event::Write(data.to_vec()));
		Ok(())
	}

	fn read(&mut self, buf: &mut [u8]) -> crate::AResult<()> {
		for b in buf.iter_mut() {
			*b = match self.responses.pop_front().or(self.default_response) {
				Some(v) => v,
				None => bail!("no data to read"),
			};
		}
		self.events.push(Event::Read(buf.len()));
		Ok(())
	}

	fn delay(&mut self, duration: Duration) {
		self.events.push(Event::Delay(duration));
	}
}
