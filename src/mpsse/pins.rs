use std::fmt;

// low bus (ADBUS) wiring
const LOW_CLOCK:         u8 = 0x01; // AD0 -> shift register clock
const LOW_MOSI:          u8 = 0x02; // AD1 -> shift register data
const LOW_UNUSED_2:      u8 = 0x04; // AD2 -  not connected
const LOW_UNUSED_3:      u8 = 0x08; // AD3 -  not connected
const LOW_WRITE_ENABLE:  u8 = 0x10; // AD4 -> WE#, active low
const LOW_OUTPUT_ENABLE: u8 = 0x20; // AD5 -> OE#, active low
const LOW_RESET:         u8 = 0x40; // AD6 -> shift register RST#, active low
const LOW_LATCH:         u8 = 0x80; // AD7 -> shift register latch, active high

// AD2 stays an input; everything else is driven
const LOW_DIRECTION: u8 = !LOW_UNUSED_2;

/// Levels on the low bus.
///
/// Active-low lines are handled by `assert_*`/`release_*`, so callers never
/// have to think in inverted bits.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LowPins(pub u8);

impl LowPins {
	/// idle state of the external circuit: clock and data high, WE#, OE#
	/// and RST# inactive, latch low
	pub fn idle() -> Self {
		LowPins(LOW_CLOCK | LOW_MOSI | LOW_UNUSED_2 | LOW_UNUSED_3 | LOW_WRITE_ENABLE | LOW_OUTPUT_ENABLE | LOW_RESET)
	}

	pub fn direction(&self) -> u8 {
		LOW_DIRECTION
	}

	pub fn is_write_enabled(&self) -> bool {
		0 == self.0 & LOW_WRITE_ENABLE
	}
	pub fn assert_write_enable(&mut self) -> &mut Self {
		self.0 &= !LOW_WRITE_ENABLE;
		self
	}
	pub fn release_write_enable(&mut self) -> &mut Self {
		self.0 |= LOW_WRITE_ENABLE;
		self
	}

	pub fn is_output_enabled(&self) -> bool {
		0 == self.0 & LOW_OUTPUT_ENABLE
	}
	pub fn assert_output_enable(&mut self) -> &mut Self {
		self.0 &= !LOW_OUTPUT_ENABLE;
		self
	}
	pub fn release_output_enable(&mut self) -> &mut Self {
		self.0 |= LOW_OUTPUT_ENABLE;
		self
	}

	pub fn is_reset(&self) -> bool {
		0 == self.0 & LOW_RESET
	}
	pub fn assert_reset(&mut self) -> &mut Self {
		self.0 &= !LOW_RESET;
		self
	}
	pub fn release_reset(&mut self) -> &mut Self {
		self.0 |= LOW_RESET;
		self
	}

	pub fn is_latch(&self) -> bool {
		0 != self.0 & LOW_LATCH
	}
	pub fn set_latch(&mut self) -> &mut Self {
		self.0 |= LOW_LATCH;
		self
	}
	pub fn clear_latch(&mut self) -> &mut Self {
		self.0 &= !LOW_LATCH;
		self
	}
}

impl fmt::Display for LowPins {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x}", self.0)
	}
}

impl fmt::Debug for LowPins {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "0x{:02x} (", self.0)?;
		if self.is_write_enabled() { write!(f, " WE")?; }
		if self.is_output_enabled() { write!(f, " OE")?; }
		if self.is_reset() { write!(f, " RST")?; }
		if self.is_latch() { write!(f, " LATCH")?; }
		write!(f, " )")
	}
}

/// Data bus on the high bus (ACBUS), D0 to D7.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct HighPins {
	pub value: u8,
	pub direction: u8,
}

impl HighPins {
	/// drive `value` onto the data bus
	pub fn drive(value: u8) -> Self {
		HighPins { value, direction: 0xff }
	}

	/// bus pulled high while nothing is being written
	pub fn idle() -> Self {
		HighPins::drive(0xff)
	}

	/// release the bus so the EEPROM can drive it
	pub fn input() -> Self {
		HighPins { value: 0xff, direction: 0x00 }
	}
}
