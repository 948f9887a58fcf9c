//! Streams a program image into the EEPROM, one latched byte write at a time.

use std::io::Read;
use std::time::Duration;

use crate::eeprom::Eeprom;
use crate::error::ErrorKind;
use crate::transport::Transport;

/// Timing and layout of one programming run.
///
/// The defaults match the reference board: 64 byte pages, 15 ms write
/// cycle, MPSSE clock divisor 4.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Config {
	pub load_address: u16,
	pub page_size: u16,
	pub write_delay: Duration,
	pub clock_divisor: u16,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			load_address: 0x0000,
			page_size: 64,
			write_delay: Duration::from_micros(15_000),
			clock_divisor: 4,
		}
	}
}

impl Config {
	pub fn validate(&self) -> crate::AResult<()> {
		ensure!(self.page_size != 0, "Page size must not be zero");
		Ok(())
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum State {
	Idle,
	Initializing,
	Programming,
	Finalizing,
	Done,
	Failed,
}

/// Operator feedback while programming.
pub trait Progress {
	fn start(&mut self, _load_address: u16) {}

	/// `address` was the last byte of a page
	fn page(&mut self, _address: u16) {}

	/// last address written; `load_address - 1` (wrapping) for an empty image
	fn finish(&mut self, _end_address: u16) {}
}

pub struct NoProgress;

impl Progress for NoProgress {}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Summary {
	pub start_address: u16,
	pub end_address: u16,
	pub bytes_written: usize,
}

pub struct Programmer<T: Transport> {
	eeprom: Eeprom<T>,
	config: Config,
	state: State,
	history: Vec<State>,
}

impl<T: Transport> Programmer<T> {
	/// takes over an open device session
	pub fn new(transport: T, config: Config) -> Self {
		Programmer {
			eeprom: Eeprom::new(transport),
			config,
			state: State::Idle,
			history: vec![State::Idle],
		}
	}

	pub fn state(&self) -> State {
		self.state
	}

	/// every state entered so far, starting with `Idle`
	pub fn history(&self) -> &[State] {
		&self.history
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn transport(&self) -> &T {
		self.eeprom.transport()
	}

	fn enter(&mut self, state: State) {
		debug!("{:?} -> {:?}", self.state, state);
		self.state = state;
		self.history.push(state);
	}

	/// Program `image` starting at the configured load address.
	///
	/// Whatever happens, the bridge is reset to its default mode before this
	/// returns. Bytes written before a failure stay written.
	pub fn run<R, P>(&mut self, image: R, progress: &mut P) -> crate::AResult<Summary>
	where
		R: Read,
		P: Progress + ?Sized,
	{
		ensure!(self.state == State::Idle, "Programmer already used (state {:?})", self.state);

		let result = self.initialize().and_then(|()| self.program(image, progress));
		if result.is_err() {
			self.enter(State::Failed);
		}

		self.finalize();

		self.enter(if result.is_ok() { State::Done } else { State::Failed });
		result
	}

	fn initialize(&mut self) -> crate::AResult<()> {
		self.config.validate()?;
		self.enter(State::Initializing);
		with_context!("initialization failed", self.eeprom.init(self.config.clock_divisor))
	}

	fn program<R, P>(&mut self, image: R, progress: &mut P) -> crate::AResult<Summary>
	where
		R: Read,
		P: Progress + ?Sized,
	{
		self.enter(State::Programming);

		let load_address = self.config.load_address;
		let page_size = self.config.page_size;
		progress.start(load_address);

		let mut offset = 0usize;
		for data in image.bytes() {
			let data = data.map_err(|e| ErrorKind::InputUnavailable.wrap(e))?;
			let address = load_address as usize + offset;
			if address > 0xffff {
				return Err(ErrorKind::InputUnavailable.wrap(format_err!(
					"image doesn't fit: byte {} would land past address 0xffff", offset
				)));
			}
			let address = address as u16;

			self.eeprom.write_byte(address, data)?;
			self.eeprom.delay(self.config.write_delay);

			// the very first byte never completes a page, even at a page end
			if address % page_size == page_size - 1 && offset != 0 {
				progress.page(address);
			}
			offset += 1;
		}

		let end_address = load_address.wrapping_add(offset as u16).wrapping_sub(1);
		progress.finish(end_address);
		info!("Wrote {} bytes (0x{:04x} to 0x{:04x})", offset, load_address, end_address);

		Ok(Summary {
			start_address: load_address,
			end_address,
			bytes_written: offset,
		})
	}

	// best effort: errors are logged, never returned
	fn finalize(&mut self) {
		self.enter(State::Finalizing);
		self.eeprom.delay(self.config.write_delay);
		if let Err(e) = self.eeprom.reset() {
			error!("Couldn't return device to default mode: {}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config() {
		let config = Config::default();
		assert_eq!(config.load_address, 0);
		assert_eq!(config.page_size, 64);
		assert_eq!(config.write_delay, Duration::from_millis(15));
		assert_eq!(config.clock_divisor, 4);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn zero_page_size_rejected() {
		let config = Config { page_size: 0, ..Config::default() };
		assert!(config.validate().is_err());
	}
}
