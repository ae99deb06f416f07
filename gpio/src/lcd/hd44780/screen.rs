//! Text-level controller for HD44780 displays.

use crate::delay::Delay;
use crate::lcd::hd44780::driver::{CLEAR_SETTLE_TIME, CursorDirection, HD44780Driver};
use crate::{GpioError, GpioResult};
use std::borrow::Cow;

/// DDRAM base address of each physical line.
///
/// Always four entries, regardless of the configured row count: the
/// controller can address four lines over this bus even when only one or two
/// are wired up. These are the documented line-start addresses, not derived
/// arithmetically.
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Text justification for [CharLcd::message].
///
/// Everything except [Align::None] pads the text to the full display width
/// with spaces, so the cursor should be at the start of a line first.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Align {
    /// Send the text as-is, no padding.
    None,
    Left,
    Center,
    Right,
}

/// A character LCD of a fixed geometry, on top of any [HD44780Driver].
///
/// Tracks the display-control flags (on/off, underline cursor, blink) so each
/// toggle can re-send the combined command the controller expects. It keeps
/// no shadow of the on-screen text; DDRAM holds whatever was written last.
#[derive(Debug)]
pub struct CharLcd<'a> {
    driver: &'a mut dyn HD44780Driver,
    delay: &'a dyn Delay,
    cols: usize,
    rows: usize,
    display_on: bool,
    cursor_on: bool,
    blink_on: bool,
}

impl<'a> CharLcd<'a> {
    /// Initializes the controller and returns the display handle.
    ///
    /// Runs the driver's mandatory reset sequence; afterwards the display is
    /// on, cleared, with no cursor and no blink.
    pub fn new(
        driver: &'a mut dyn HD44780Driver,
        delay: &'a dyn Delay,
        cols: usize,
        rows: usize,
    ) -> GpioResult<Self> {
        if cols == 0 || rows == 0 {
            return Err(GpioError::InvalidArgument);
        }

        driver.init(rows > 1)?;

        Ok(CharLcd {
            driver,
            delay,
            cols,
            rows,
            display_on: true,
            cursor_on: false,
            blink_on: false,
        })
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Clears the display and homes the cursor. Blocks for the long settle
    /// delay the controller needs for a full-memory clear.
    pub fn clear(&mut self) -> GpioResult<()> {
        self.driver.clear_display()?;
        self.delay.sleep(CLEAR_SETTLE_TIME);
        Ok(())
    }

    /// Returns the cursor to the home position. Same settle delay as
    /// [CharLcd::clear].
    pub fn home(&mut self) -> GpioResult<()> {
        self.driver.return_home()?;
        self.delay.sleep(CLEAR_SETTLE_TIME);
        Ok(())
    }

    /// Sets the cursor to column zero of the given line.
    ///
    /// # Panics
    /// Panics if `line` is 4 or more; the address table has exactly four
    /// entries.
    pub fn set_line(&mut self, line: usize) -> GpioResult<()> {
        self.driver.set_ddram_address(ROW_OFFSETS[line])
    }

    /// Moves the cursor to an explicit column and row.
    ///
    /// Rows past the configured height clamp to the last row. Columns are not
    /// range-checked here; an address past the controller's 7-bit DDRAM range
    /// is rejected by the driver.
    pub fn set_cursor(&mut self, col: u8, row: usize) -> GpioResult<()> {
        let row = row.min(self.rows - 1);
        self.driver
            .set_ddram_address(ROW_OFFSETS[row].wrapping_add(col))
    }

    /// Writes a 5×8 custom character pattern into one of the 8 CGRAM slots.
    ///
    /// Slot values past 7 wrap; the controller only decodes three slot bits.
    /// The glyph occupies the first 8 bytes of `pattern`, one row per byte,
    /// low 5 bits significant. Displaying it is just `message("\x00")` with
    /// the slot number as the character.
    ///
    /// # Panics
    /// Panics if `pattern` holds fewer than 8 bytes.
    pub fn create_char(&mut self, slot: u8, pattern: &[u8]) -> GpioResult<()> {
        let slot = slot & 0x7;
        self.driver.set_cgram_address(slot << 3)?;
        // CGRAM auto-increments after each write
        for i in 0..8 {
            self.driver.send_data(pattern[i])?;
        }
        Ok(())
    }

    /// Turns the display on or off. DDRAM content is kept either way.
    pub fn set_enabled(&mut self, on: bool) -> GpioResult<()> {
        self.display_on = on;
        self.update_display_control()
    }

    /// Shows or hides the underline cursor.
    pub fn show_underline(&mut self, show: bool) -> GpioResult<()> {
        self.cursor_on = show;
        self.update_display_control()
    }

    /// Enables or disables the blinking block cursor.
    pub fn show_blink(&mut self, show: bool) -> GpioResult<()> {
        self.blink_on = show;
        self.update_display_control()
    }

    fn update_display_control(&mut self) -> GpioResult<()> {
        self.driver
            .set_display_control(self.display_on, self.cursor_on, self.blink_on)
    }

    /// Shifts the display window one position to the left.
    pub fn move_left(&mut self) -> GpioResult<()> {
        self.driver.cursor_shift(true, CursorDirection::Left)
    }

    /// Shifts the display window one position to the right.
    pub fn move_right(&mut self) -> GpioResult<()> {
        self.driver.cursor_shift(true, CursorDirection::Right)
    }

    /// Writes text at the current cursor position, left to right.
    ///
    /// With an alignment other than [Align::None] the text is padded with
    /// spaces to the display width, so it should start at column zero of a
    /// line. Text is not wrapped or truncated: what runs past the width
    /// continues into the controller's own address space.
    pub fn message(&mut self, text: &str, align: Align) -> GpioResult<()> {
        let width = self.cols;
        let padded: Cow<str> = match align {
            Align::None => Cow::Borrowed(text),
            Align::Left => Cow::Owned(format!("{text:<width$}")),
            Align::Center => Cow::Owned(format!("{text:^width$}")),
            Align::Right => Cow::Owned(format!("{text:>width$}")),
        };

        for byte in padded.bytes() {
            self.driver.send_data(byte)?;
        }
        Ok(())
    }
}
