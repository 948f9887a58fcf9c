//! Access to the bridge chip.
//!
//! The sequencers only need to switch bit modes, write complete frames and
//! read back answers; everything about USB lives behind `Transport`.

use std::fmt;
use std::thread;
use std::time::{
	Duration,
	Instant,
};

#[cfg(feature = "ftdi")]
mod usb;
mod recorder;

#[cfg(feature = "ftdi")]
pub use self::usb::{
	DeviceSelector,
	FtdiTransport,
};

pub use self::recorder::{
	Event,
	Recorder,
};

pub fn reliable_sleep(mut duration: Duration) {
	loop {
		let now = Instant::now();
		thread::sleep(duration);
		let elapsed = now.elapsed();
		if elapsed >= duration {
			return;
		}
		duration -= elapsed;
	}
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum BitMode {
	/// back to the chip's power-on (UART) mode
	Reset,
	/// command processor for the synchronous serial engine
	Mpsse,
}

impl fmt::Display for BitMode {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			BitMode::Reset => write!(f, "reset"),
			BitMode::Mpsse => write!(f, "MPSSE"),
		}
	}
}

pub trait Transport {
	fn set_bit_mode(&mut self, pin_mask: u8, mode: BitMode) -> crate::AResult<()>;

	// either the whole buffer is accepted or an error is returned
	fn write(&mut self, data: &[u8]) -> crate::AResult<()>;

	// fills the whole buffer or fails
	fn read(&mut self, buf: &mut [u8]) -> crate::AResult<()>;

	// block for (at least) `duration`
	fn delay(&mut self, duration: Duration) {
		reliable_sleep(duration);
	}
}

impl<T: Transport + ?Sized> Transport for &mut T {
	fn set_bit_mode(&mut self, pin_mask: u8, mode: BitMode) -> crate::AResult<()> {
		(**self).set_bit_mode(pin_mask, mode)
	}

	fn write(&mut self, data: &[u8]) -> crate::AResult<()> {
		(**self).write(data)
	}

	fn read(&mut self, buf: &mut [u8]) -> crate::AResult<()> {
		(**self).read(buf)
	}

	fn delay(&mut self, duration: Duration) {
		(**self).delay(duration)
	}
}

impl<T: Transport + ?Sized> Transport for Box<T> {
	fn set_bit_mode(&mut self, pin_mask: u8, mode: BitMode) -> crate::AResult<()> {
		(**self).set_bit_mode(pin_mask, mode)
	}

	fn write(&mut self, data: &[u8]) -> crate::AResult<()> {
		(**self).write(data)
	}

	fn read(&mut self, buf: &mut [u8]) -> crate::AResult<()> {
		(**self).read(buf)
	}

	fn delay(&mut self, duration: Duration) {
		(**self).delay(duration)
	}
}
