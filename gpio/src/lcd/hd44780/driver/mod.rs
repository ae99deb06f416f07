mod gpio;

use crate::{GpioError, GpioResult};
pub use gpio::*;
use std::fmt::Debug;

/// Low-level interface to an HD44780-family controller.
///
/// The controller here is wired write-only (R/W grounded), so the trait has
/// no read-back: there is no busy-flag polling, and commands are paced by
/// fixed delays in the implementation instead.
///
/// The default methods build the documented command bytes and hand them to
/// [HD44780Driver::send_command]; only the three raw operations are left to
/// the implementation.
pub trait HD44780Driver: Debug {
    /// Runs the documented power-on reset sequence, leaving the controller in
    /// 4-bit mode with the display on, cursor hidden, left-to-right entry,
    /// and the screen cleared.
    ///
    /// `multiline` selects two-line addressing (the N bit of function set).
    fn init(&mut self, multiline: bool) -> GpioResult<()>;

    /// Clears the entire display and sets the cursor to the home position.
    fn clear_display(&mut self) -> GpioResult<()> {
        self.send_command(0b00000001)
    }

    /// Sets the cursor to the home position and undoes any display shift.
    fn return_home(&mut self) -> GpioResult<()> {
        self.send_command(0b00000010)
    }

    /// Sets the cursor move direction after each write, and whether the
    /// display shifts instead of the cursor.
    fn set_entry_mode(&mut self, cursor_direction: CursorDirection, shift: bool) -> GpioResult<()> {
        let mut command = 0b00000100;
        if cursor_direction == CursorDirection::Right {
            command |= 0b00000010;
        }
        if shift {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Sets the display on/off, cursor on/off, and blinking on/off.
    ///
    /// One command carries all three flags; the controller has no way to
    /// change one without resending the others.
    fn set_display_control(
        &mut self,
        display_on: bool,
        cursor_on: bool,
        blink_on: bool,
    ) -> GpioResult<()> {
        let mut command = 0b00001000;
        if display_on {
            command |= 0b00000100;
        }
        if cursor_on {
            command |= 0b00000010;
        }
        if blink_on {
            command |= 0b00000001;
        }
        self.send_command(command)
    }

    /// Moves the cursor or shifts the whole display window by one position.
    /// DDRAM content is untouched either way.
    fn cursor_shift(&mut self, display_shift: bool, direction: CursorDirection) -> GpioResult<()> {
        let mut command = 0b00010000;
        if display_shift {
            command |= 0b00001000;
        }
        if direction == CursorDirection::Right {
            command |= 0b00000100;
        }
        self.send_command(command)
    }

    /// Sets the function set: 4-bit bus and 5×8 font fixed, `two_lines`
    /// selecting one- or two-line addressing.
    fn function_set(&mut self, two_lines: bool) -> GpioResult<()> {
        let mut command = 0b00100000;
        if two_lines {
            command |= 0b00001000;
        }
        self.send_command(command)
    }

    /// Sets the CGRAM address (custom character memory, 6-bit).
    fn set_cgram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b00111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b01000000 | address;
        self.send_command(command)
    }

    /// Sets the DDRAM address (display memory, 7-bit). This is how the cursor
    /// is positioned.
    fn set_ddram_address(&mut self, address: u8) -> GpioResult<()> {
        if address > 0b01111111 {
            return Err(GpioError::InvalidArgument);
        }
        let command = 0b10000000 | address;
        self.send_command(command)
    }

    // Raw operations, implemented by the bus driver.

    /// Transfers one byte with RS set to 0 (instruction register).
    fn send_command(&mut self, command: u8) -> GpioResult<()>;

    /// Transfers one byte with RS set to 1 (data register).
    fn send_data(&mut self, data: u8) -> GpioResult<()>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CursorDirection {
    Left,
    Right,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct CommandLog {
        commands: Vec<u8>,
    }

    impl HD44780Driver for CommandLog {
        fn init(&mut self, _multiline: bool) -> GpioResult<()> {
            Ok(())
        }

        fn send_command(&mut self, command: u8) -> GpioResult<()> {
            self.commands.push(command);
            Ok(())
        }

        fn send_data(&mut self, _data: u8) -> GpioResult<()> {
            unreachable!("default methods only send commands")
        }
    }

    #[test]
    fn builds_fixed_commands() {
        let mut log = CommandLog::default();
        log.clear_display().unwrap();
        log.return_home().unwrap();
        assert_eq!(log.commands, vec![0x01, 0x02]);
    }

    #[test]
    fn builds_entry_mode() {
        let mut log = CommandLog::default();
        log.set_entry_mode(CursorDirection::Right, false).unwrap();
        log.set_entry_mode(CursorDirection::Left, true).unwrap();
        assert_eq!(log.commands, vec![0b00000110, 0b00000101]);
    }

    #[test]
    fn builds_display_control() {
        let mut log = CommandLog::default();
        log.set_display_control(true, false, false).unwrap();
        log.set_display_control(true, true, true).unwrap();
        log.set_display_control(false, false, false).unwrap();
        assert_eq!(log.commands, vec![0b00001100, 0b00001111, 0b00001000]);
    }

    #[test]
    fn builds_shift_commands() {
        let mut log = CommandLog::default();
        log.cursor_shift(true, CursorDirection::Left).unwrap();
        log.cursor_shift(true, CursorDirection::Right).unwrap();
        log.cursor_shift(false, CursorDirection::Right).unwrap();
        assert_eq!(log.commands, vec![0b00011000, 0b00011100, 0b00010100]);
    }

    #[test]
    fn builds_function_set() {
        let mut log = CommandLog::default();
        log.function_set(true).unwrap();
        log.function_set(false).unwrap();
        assert_eq!(log.commands, vec![0b00101000, 0b00100000]);
    }

    #[test]
    fn guards_address_ranges() {
        let mut log = CommandLog::default();
        assert_eq!(
            log.set_cgram_address(0b01000000),
            Err(GpioError::InvalidArgument)
        );
        assert_eq!(
            log.set_ddram_address(0b10000000),
            Err(GpioError::InvalidArgument)
        );
        log.set_cgram_address(0b00011000).unwrap();
        log.set_ddram_address(0b01010100).unwrap();
        assert_eq!(log.commands, vec![0b01011000, 0b11010100]);
    }
}
