//! HD44780 character LCD module.
//!
//! Two layers, composed by direct call:
//!
//! - [driver] — the bus protocol: command bytes and the 4-bit transfer
//!   sequence with its timing. [driver::GpioHD44780Driver] is the GPIO
//!   bit-banging implementation.
//! - [screen] — the text-level controller on top of a driver: geometry,
//!   cursor addressing, custom characters, and justified messages.

pub mod driver;
pub mod screen;

pub use screen::{Align, CharLcd};
