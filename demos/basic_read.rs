#![no_std]
#![no_main]

#[path = "board.rs"]
mod board;

use arduino_hal::default_serial;
use arduino_hal::spi;
use embedded_hal::spi::{Mode, Phase, Polarity};
use panic_halt as _;
use rc522_iso14443a::RfidRc522;
use ufmt::uwriteln;

use board::Tc1Clock;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);

    // Initialize serial communication
    let mut serial = default_serial!(dp, pins, 9600);

    // SPI mode 0, MSB first
    let settings = spi::Settings {
        data_order: spi::DataOrder::MostSignificantFirst,
        mode: Mode {
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
        },
        clock: spi::SerialClockRate::OscfOver64,
    };

    // Set up SPI pins
    let sclk = pins.d13.into_output();
    let mosi = pins.d11.into_output();
    let miso = pins.d12.into_pull_up_input();
    let cs = pins.d10.into_output();
    let (spi, cs_pin) = spi::Spi::new(dp.SPI, sclk, mosi, miso, cs, settings);

    // Keep the reader out of hard power-down
    let mut rst = pins.d9.into_output();
    rst.set_high();
    arduino_hal::delay_ms(50);

    let mut rfid = RfidRc522::new(spi, cs_pin, Tc1Clock::new(dp.TC1));
    if rfid.init(&mut serial).is_err() {
        uwriteln!(&mut serial, "Reader did not come up").ok();
    }

    loop {
        if !rfid.is_new_card_present() {
            arduino_hal::delay_ms(200);
            continue;
        }

        if let Ok(uid) = rfid.read_card_serial(&mut serial) {
            uwriteln!(&mut serial, "SAK: 0x{:02X}", uid.sak()).ok();
            if let Err(e) = rfid.halt_a() {
                uwriteln!(&mut serial, "HLTA failed: {:?}", e).ok();
            }
        }

        // Delay before the next detection attempt
        arduino_hal::delay_ms(1000);
    }
}
