use charlcd_gpio::delay::ThreadDelay;
use charlcd_gpio::gpiod::GpiodDriver;
use charlcd_gpio::lcd::hd44780::driver::GpioHD44780Driver;
use charlcd_gpio::lcd::hd44780::{Align, CharLcd};
use charlcd_gpio::GpioDriver;
use dotenv::dotenv;
use log::{debug, info};
use std::env::var;
use std::thread::sleep;
use std::time::Duration;

fn parse_pin_bus(pin_str: &str) -> eyre::Result<[usize; 4]> {
    pin_str
        .split([',', ' ', ';'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse())
        .collect::<Result<Vec<_>, _>>()?
        .try_into()
        .map_err(|_| eyre::eyre!("Invalid number of data pins"))
}

fn main() -> eyre::Result<()> {
    // Initialize environment and logger
    dotenv().ok();
    pretty_env_logger::init();

    info!("charlcd demo starting...");

    // Get pin numbers from env
    let chip_path = var("CHARLCD_GPIOCHIP").unwrap_or_else(|_| "/dev/gpiochip0".to_string());
    let rs_pin_no: usize = var("CHARLCD_PIN_RS")?.parse()?;
    let e_pin_no: usize = var("CHARLCD_PIN_E")?.parse()?;
    let data_pin_nos: [usize; 4] = parse_pin_bus(&var("CHARLCD_PINS_DATA")?)?;
    let cols: usize = var("CHARLCD_COLS").map_or(Ok(16), |s| s.parse())?;
    let rows: usize = var("CHARLCD_ROWS").map_or(Ok(2), |s| s.parse())?;

    info!(
        "LCD @ RS: {}, E: {}, Data: {:?}, {}x{} on {}",
        rs_pin_no, e_pin_no, data_pin_nos, cols, rows, chip_path
    );

    debug!("Initializing GPIO driver...");
    let gpio = GpiodDriver::new(gpiod::Chip::new(&chip_path)?);
    debug!("{:?} initialized.", gpio);

    debug!("Initializing LCD driver...");
    let mut rs_pin = gpio.get_pin(rs_pin_no)?;
    let rs_out = rs_pin.as_output()?;
    let mut e_pin = gpio.get_pin(e_pin_no)?;
    let e_out = e_pin.as_output()?;
    let mut data_bus = gpio.get_pin_bus(data_pin_nos)?;
    let data_out = data_bus.as_output()?;
    let delay = ThreadDelay;

    let mut driver = GpioHD44780Driver::new_4bit(&*rs_out, &*e_out, &*data_out, &delay);
    let mut lcd = CharLcd::new(&mut driver, &delay, cols, rows)?;

    debug!("{:?} initialized.", lcd);

    info!("Running demo...");

    // Two-line centered greeting
    lcd.message("Hello", Align::Center)?;
    lcd.set_line(1)?;
    lcd.message("World!", Align::Center)?;
    sleep(Duration::from_secs(3));

    // Show the underline cursor
    lcd.clear()?;
    lcd.show_underline(true)?;
    lcd.message("Underline", Align::None)?;
    lcd.set_line(1)?;
    lcd.message("Cursor: ", Align::None)?;
    sleep(Duration::from_secs(3));

    // Also show the blinking cursor
    lcd.clear()?;
    lcd.show_blink(true)?;
    lcd.message("Blinking", Align::None)?;
    lcd.set_line(1)?;
    lcd.message("Cursor: ", Align::None)?;
    sleep(Duration::from_secs(3));

    lcd.show_underline(false)?;
    lcd.show_blink(false)?;

    // Scroll the display window right and back left
    lcd.clear()?;
    lcd.message("Scrolling Demo", Align::None)?;
    sleep(Duration::from_secs(1));
    for _ in 0..cols {
        sleep(Duration::from_millis(250));
        lcd.move_right()?;
    }
    for _ in 0..cols {
        sleep(Duration::from_millis(250));
        lcd.move_left()?;
    }
    sleep(Duration::from_secs(2));

    // Custom characters: a 2x2 glyph block shown next to "The End"
    lcd.create_char(0, &[0x07, 0x0C, 0x18, 0x10, 0x16, 0x16, 0x16, 0x10])?;
    lcd.create_char(1, &[0x1C, 0x06, 0x03, 0x01, 0x0D, 0x0D, 0x0D, 0x01])?;
    lcd.create_char(2, &[0x10, 0x14, 0x14, 0x17, 0x13, 0x18, 0x0C, 0x07])?;
    lcd.create_char(3, &[0x01, 0x01, 0x05, 0x1D, 0x19, 0x03, 0x06, 0x1C])?;
    lcd.clear()?;
    lcd.message("The", Align::Right)?;
    lcd.home()?;
    lcd.message("\x00\x01", Align::None)?;
    lcd.set_line(1)?;
    lcd.message("End", Align::Right)?;
    lcd.set_cursor(0, 1)?;
    lcd.message("\x02\x03", Align::None)?;

    info!("Demo finished.");

    Ok(())
}
