use crate::delay::Delay;
use crate::lcd::hd44780::driver::{CursorDirection, HD44780Driver};
use crate::{GpioBusOutput, GpioOutput, GpioResult};
use log::trace;
use std::time::Duration;

/// Address setup and hold time kept around each enable pulse.
///
/// 500 µs is a generous margin over the datasheet minimums (which are in the
/// hundreds of nanoseconds); it keeps the sequence valid regardless of how
/// the GPIO backend batches its writes.
pub const SETUP_TIME: Duration = Duration::from_micros(500);

/// Width of the enable pulse that latches one nibble into the controller.
pub const ENABLE_PULSE_WIDTH: Duration = Duration::from_micros(500);

/// Wait after clear/home. These commands touch the whole DDRAM and take the
/// controller far longer than anything else.
pub const CLEAR_SETTLE_TIME: Duration = Duration::from_millis(50);

/// GPIO bit-banging driver for the HD44780 over the reduced 4-bit bus.
///
/// Owns six logical output lines for the lifetime of the driver: register
/// select, enable, and the four data lines grouped as a bus. Every byte goes
/// out as two nibbles, high first, each latched by its own enable pulse.
#[derive(Debug)]
pub struct GpioHD44780Driver<'a> {
    pin_rs: &'a dyn GpioOutput,
    pin_e: &'a dyn GpioOutput,
    data_bus: &'a dyn GpioBusOutput<4>,
    delay: &'a dyn Delay,
}

impl<'a> GpioHD44780Driver<'a> {
    /// Creates a new 4-bit driver.
    ///
    /// The data bus maps bus line 0..=3 to controller pins D4..=D7, LSb
    /// first; with an 8-bit value split into nibbles that puts bit 4 of a
    /// byte on D4 for the high nibble and bit 0 on D4 for the low one.
    pub fn new_4bit(
        pin_rs: &'a dyn GpioOutput,
        pin_e: &'a dyn GpioOutput,
        data_bus: &'a dyn GpioBusOutput<4>,
        delay: &'a dyn Delay,
    ) -> Self {
        GpioHD44780Driver {
            pin_rs,
            pin_e,
            data_bus,
            delay,
        }
    }

    /// Latches whatever is on the data lines: setup wait, E high for the
    /// pulse width, E low, hold wait.
    fn latch(&self) -> GpioResult<()> {
        self.delay.sleep(SETUP_TIME);
        self.pin_e.write(true)?;
        self.delay.sleep(ENABLE_PULSE_WIDTH);
        self.pin_e.write(false)?;
        self.delay.sleep(SETUP_TIME);
        Ok(())
    }

    fn send(&mut self, data: u8, rs: bool) -> GpioResult<()> {
        trace!("Sending data: {:08b}, RS: {}", data, rs);

        self.pin_rs.write(rs)?;
        self.delay.sleep(SETUP_TIME);

        let high_nibble = (data >> 4) & 0x0F;
        let low_nibble = data & 0x0F;

        trace!("Writing HN: {:04b}", high_nibble);
        self.data_bus.write_nibble(high_nibble)?;
        self.latch()?;

        trace!("Writing LN: {:04b}", low_nibble);
        self.data_bus.write_nibble(low_nibble)?;
        self.latch()?;

        Ok(())
    }
}

impl HD44780Driver for GpioHD44780Driver<'_> {
    fn init(&mut self, multiline: bool) -> GpioResult<()> {
        // Synchronize: after power-on the controller may still be in 8-bit
        // mode, so the first two transfers are function-set pulses that force
        // it into a known state and then into 4-bit mode. Must not be
        // reordered or shortened.
        self.send(0b00110011, false)?;
        self.send(0b00110010, false)?;
        self.function_set(multiline)?;
        self.set_display_control(true, false, false)?;
        self.set_entry_mode(CursorDirection::Right, false)?;
        self.clear_display()?;
        self.delay.sleep(CLEAR_SETTLE_TIME);
        Ok(())
    }

    fn send_command(&mut self, command: u8) -> GpioResult<()> {
        self.send(command, false)
    }

    fn send_data(&mut self, data: u8) -> GpioResult<()> {
        self.send(data, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Pin(&'static str, bool),
        Bus([bool; 4]),
        Sleep(Duration),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    #[derive(Debug)]
    struct FakePin {
        name: &'static str,
        log: Log,
    }

    impl GpioOutput for FakePin {
        fn write(&self, value: bool) -> GpioResult<()> {
            self.log.borrow_mut().push(Event::Pin(self.name, value));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FakeBus {
        log: Log,
    }

    impl GpioBusOutput<4> for FakeBus {
        fn write(&self, values: &[bool; 4]) -> GpioResult<()> {
            self.log.borrow_mut().push(Event::Bus(*values));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FakeDelay {
        log: Log,
    }

    impl Delay for FakeDelay {
        fn sleep(&self, duration: Duration) {
            self.log.borrow_mut().push(Event::Sleep(duration));
        }
    }

    struct Rig {
        rs: FakePin,
        e: FakePin,
        bus: FakeBus,
        delay: FakeDelay,
        log: Log,
    }

    fn rig() -> Rig {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        Rig {
            rs: FakePin {
                name: "rs",
                log: log.clone(),
            },
            e: FakePin {
                name: "e",
                log: log.clone(),
            },
            bus: FakeBus { log: log.clone() },
            delay: FakeDelay { log: log.clone() },
            log,
        }
    }

    fn nibble(values: [bool; 4]) -> u8 {
        values
            .iter()
            .enumerate()
            .map(|(i, &bit)| (bit as u8) << i)
            .sum()
    }

    /// Reassembles the transferred bytes from consecutive bus writes.
    fn sent_bytes(log: &Log) -> Vec<u8> {
        let nibbles: Vec<u8> = log
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Bus(values) => Some(nibble(*values)),
                _ => None,
            })
            .collect();
        assert_eq!(nibbles.len() % 2, 0, "nibbles always come in pairs");
        nibbles
            .chunks(2)
            .map(|pair| (pair[0] << 4) | pair[1])
            .collect()
    }

    #[test]
    fn transfer_is_two_latched_nibbles_high_first() {
        let rig = rig();
        let mut driver = GpioHD44780Driver::new_4bit(&rig.rs, &rig.e, &rig.bus, &rig.delay);

        driver.send_command(0b10110100).unwrap();

        let expected = vec![
            Event::Pin("rs", false),
            Event::Sleep(SETUP_TIME),
            // High nibble 0b1011, LSb first on the bus
            Event::Bus([true, true, false, true]),
            Event::Sleep(SETUP_TIME),
            Event::Pin("e", true),
            Event::Sleep(ENABLE_PULSE_WIDTH),
            Event::Pin("e", false),
            Event::Sleep(SETUP_TIME),
            // Low nibble 0b0100
            Event::Bus([false, false, true, false]),
            Event::Sleep(SETUP_TIME),
            Event::Pin("e", true),
            Event::Sleep(ENABLE_PULSE_WIDTH),
            Event::Pin("e", false),
            Event::Sleep(SETUP_TIME),
        ];
        assert_eq!(*rig.log.borrow(), expected);
    }

    #[test]
    fn data_mode_raises_rs() {
        let rig = rig();
        let mut driver = GpioHD44780Driver::new_4bit(&rig.rs, &rig.e, &rig.bus, &rig.delay);

        driver.send_data(b'A').unwrap();

        assert_eq!(rig.log.borrow()[0], Event::Pin("rs", true));
        assert_eq!(sent_bytes(&rig.log), vec![b'A']);
    }

    #[test]
    fn nibble_split_covers_byte_range() {
        for byte in [0x00u8, 0x0F, 0xF0, 0xFF, 0x5A, 0xA5] {
            let rig = rig();
            let mut driver = GpioHD44780Driver::new_4bit(&rig.rs, &rig.e, &rig.bus, &rig.delay);
            driver.send_command(byte).unwrap();

            let pulses = rig
                .log
                .borrow()
                .iter()
                .filter(|event| matches!(event, Event::Pin("e", true)))
                .count();
            assert_eq!(pulses, 2);
            assert_eq!(sent_bytes(&rig.log), vec![byte]);
        }
    }

    #[test]
    fn init_sends_reset_sequence_in_order() {
        let rig = rig();
        let mut driver = GpioHD44780Driver::new_4bit(&rig.rs, &rig.e, &rig.bus, &rig.delay);

        driver.init(true).unwrap();

        assert_eq!(
            sent_bytes(&rig.log),
            vec![0x33, 0x32, 0x28, 0x0C, 0x06, 0x01]
        );
        // The closing clear is given time to settle.
        assert_eq!(
            rig.log.borrow().last(),
            Some(&Event::Sleep(CLEAR_SETTLE_TIME))
        );
        // Everything went to the instruction register.
        assert!(rig
            .log
            .borrow()
            .iter()
            .all(|event| *event != Event::Pin("rs", true)));
    }

    #[test]
    fn one_line_init_uses_single_line_function_set() {
        let rig = rig();
        let mut driver = GpioHD44780Driver::new_4bit(&rig.rs, &rig.e, &rig.bus, &rig.delay);

        driver.init(false).unwrap();

        assert_eq!(
            sent_bytes(&rig.log),
            vec![0x33, 0x32, 0x20, 0x0C, 0x06, 0x01]
        );
    }
}
