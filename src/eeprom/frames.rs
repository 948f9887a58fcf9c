//! Frames driving the external parallel bus circuit.
//!
//! Pure functions: the same arguments always give the same bytes.
//!
//! Board wiring:
//! - AD0 -> MCLK, AD1 -> MOSI (address shift registers)
//! - AD4 -> WE#, AD5 -> OE# (EEPROM)
//! - AD6 -> RST# (shift registers), AD7 -> address latch (active high)
//! - AC0 to AC7 <-> D0 to D7

use crate::mpsse::{
	Frame,
	FrameBuilder,
	HighPins,
	LowPins,
};

pub fn clock_divisor(divisor: u16) -> Frame {
	FrameBuilder::new().clock_divisor(divisor).build()
}

pub fn low_defaults() -> Frame {
	FrameBuilder::new().low(LowPins::idle()).build()
}

pub fn high_defaults() -> Frame {
	FrameBuilder::new().high(HighPins::idle()).build()
}

/// clear the address shift registers
pub fn reset_pulse() -> Frame {
	FrameBuilder::new()
		.low(*LowPins::idle().assert_reset())
		.low(LowPins::idle())
		.build()
}

/// shift `address` into the registers (MSB first) and latch it onto the
/// address bus
pub fn address_latch(address: u16) -> crate::AResult<Frame> {
	let idle = LowPins::idle();
	Ok(FrameBuilder::new()
		.clock_bytes_out(&[(address >> 8) as u8, address as u8])?
		.low(idle)
		.low(*LowPins::idle().set_latch())
		.low(idle)
		.build())
}

/// put `data` on the bus and pulse WE#
pub fn byte_write(data: u8) -> Frame {
	let idle = LowPins::idle();
	FrameBuilder::new()
		.low(idle)
		.high(HighPins::drive(data))
		.low(*LowPins::idle().assert_write_enable())
		.low(idle)
		.build()
}

/// turn the data bus around and let the EEPROM drive it
pub fn read_enable() -> Frame {
	FrameBuilder::new()
		.high(HighPins::input())
		.low(LowPins::idle())
		.low(*LowPins::idle().assert_output_enable())
		.build()
}

pub fn read_request() -> Frame {
	FrameBuilder::new().read_high().build()
}

/// release OE# and drive the data bus again
pub fn read_release() -> Frame {
	FrameBuilder::new()
		.low(LowPins::idle())
		.high(HighPins::idle())
		.build()
}
