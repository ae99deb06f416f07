pub mod delay;
pub mod gpiod;
pub mod lcd;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("error: {0}")]
    Other(String),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

/// A source of output-capable GPIO pins.
///
/// This crate only ever drives pins (the LCD bus is write-only), so the driver
/// hands out output pins and pin buses and nothing else.
pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO pins available.
    fn count(&self) -> GpioResult<usize>;

    /// Gets the GPIO pin at the given index.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;

    /// Gets the GPIO pin bus at the specific indices.
    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>>;
}

/// Specifies the active level of the GPIO pin.
///
/// By default, the active level is high.
#[derive(Copy, Clone, Debug, Default)]
pub enum GpioActiveLevel {
    #[default] High,
    Low,
}

/// Specifies the bias of the GPIO pin.
///
/// You can use this to enable pull-up or pull-down resistors.
#[derive(Copy, Clone, Debug, Default)]
pub enum GpioBias {
    #[default] None,
    PullUp,
    PullDown,
}

pub trait GpioPin: Debug {
    /// Sets the GPIO pin function to output, allowing writing its state.
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>>;

    /// Gets whether the GPIO pin supports active level.
    fn supports_active_level(&self) -> bool {
        false
    }
    /// Gets the active level of the GPIO pin.
    fn active_level(&self) -> GpioActiveLevel {
        GpioActiveLevel::High
    }
    /// Sets the active level of the GPIO pin.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the pin does not support active level.
    fn set_active_level(&mut self, _level: GpioActiveLevel) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }

    /// Gets whether the GPIO pin supports bias (pull-up/pull-down resistors).
    fn supports_bias(&self) -> bool {
        false
    }
    /// Gets the bias of the GPIO pin.
    fn bias(&self) -> GpioBias {
        GpioBias::None
    }
    /// Sets the bias of the GPIO pin.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the pin does not support bias.
    fn set_bias(&mut self, _bias: GpioBias) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO pin.
    fn write(&self, value: bool) -> GpioResult<()>;
}

pub trait GpioBus<const N: usize>: Debug {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;

    fn supports_active_level(&self) -> bool {
        false
    }
    fn active_level(&self) -> GpioActiveLevel {
        GpioActiveLevel::High
    }
    fn set_active_level(&mut self, _level: GpioActiveLevel) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }

    fn supports_bias(&self) -> bool {
        false
    }
    fn bias(&self) -> GpioBias {
        GpioBias::None
    }
    fn set_bias(&mut self, _bias: GpioBias) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

pub trait GpioBusOutput<const N: usize>: Debug {
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes the values to the GPIO pins in the bus.
    /// The values are written as a nibble, LSb first.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let mut values = [false; 4];
        for i in 0..4 {
            values[i] = (value & (1 << i)) != 0;
        }
        self.write(&values)
    }
}
