use std::fmt;
use std::io::{
	Read,
	Write,
};
use std::thread;
use std::time::{
	Duration,
	Instant,
};

use super::{
	BitMode,
	Transport,
};

const READ_POLL_INTERVAL: Duration = Duration::from_millis(1);
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Which FTDI device/interface to open.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct DeviceSelector {
	pub vendor: u16,
	pub product: u16,
	/// interface index: 0 = A, 1 = B, ...
	pub port: u8,
}

impl Default for DeviceSelector {
	fn default() -> Self {
		// FT232H
		DeviceSelector {
			vendor: 0x0403,
			product: 0x6014,
			port: 0,
		}
	}
}

impl DeviceSelector {
	fn interface(&self) -> crate::AResult<ftdi::Interface> {
		Ok(match self.port {
			0 => ftdi::Interface::A,
			1 => ftdi::Interface::B,
			2 => ftdi::Interface::C,
			3 => ftdi::Interface::D,
			n => bail!("invalid FTDI port {} (expected 0-3)", n),
		})
	}
}

impl fmt::Display for DeviceSelector {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{:04x}:{:04x} port {}", self.vendor, self.product, self.port)
	}
}

pub struct FtdiTransport {
	device: ftdi::Device,
}

impl FtdiTransport {
	pub fn open(selector: DeviceSelector) -> crate::AResult<Self> {
		with_context!(("couldn't open FTDI device {}", selector), {
			let device = ftdi::find_by_vid_pid(selector.vendor, selector.product)
				.interface(selector.interface()?)
				.open()?;
			Ok(FtdiTransport { device })
		})
	}
}

impl Transport for FtdiTransport {
	fn set_bit_mode(&mut self, pin_mask: u8, mode: BitMode) -> crate::AResult<()> {
		let mode = match mode {
			BitMode::Reset => ftdi::BitMode::Reset,
			BitMode::Mpsse => ftdi::BitMode::Mpsse,
		};
		self.device.set_bitmode(pin_mask, mode)?;
		Ok(())
	}

	fn write(&mut self, data: &[u8]) -> crate::AResult<()> {
		self.device.write_all(data)?;
		Ok(())
	}

	fn read(&mut self, buf: &mut [u8]) -> crate::AResult<()> {
		let deadline = Instant::now() + READ_TIMEOUT;
		let mut filled = 0;
		while filled < buf.len() {
			let n = self.device.read(&mut buf[filled..])?;
			filled += n;
			if n == 0 {
				ensure!(Instant::now() < deadline,
					"timeout waiting for data: got {} of {} bytes", filled, buf.len()
				);
				thread::sleep(READ_POLL_INTERVAL);
			}
		}
		Ok(())
	}
}
