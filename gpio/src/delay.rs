//! Blocking delay abstraction.
//!
//! The HD44780 bus has no busy-flag read-back in this crate (write-only
//! wiring), so every command is paced by fixed waits instead. The waits go
//! through this trait so the LCD drivers can be exercised against a recording
//! fake in tests.

use std::fmt::Debug;
use std::thread;
use std::time::Duration;

pub trait Delay: Debug {
    /// Blocks the calling thread for at least the given duration.
    fn sleep(&self, duration: Duration);
}

/// [Delay] backed by [std::thread::sleep].
#[derive(Debug, Default)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
