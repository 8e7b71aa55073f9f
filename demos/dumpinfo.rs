#![no_std]
#![no_main]

#[path = "board.rs"]
mod board;

use arduino_hal::default_serial;
use arduino_hal::spi;
use embedded_hal::spi::{Mode, Phase, Polarity};
use panic_halt as _;
use rc522_iso14443a::mifare::MIFARE_READ_LEN;
use rc522_iso14443a::{CardType, RfidRc522, Uid};
use ufmt::{uwrite, uwriteln};

use board::Tc1Clock;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);

    // Initialize serial communication
    let mut serial = default_serial!(dp, pins, 9600);

    // Set up SPI communication with specific settings
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

    // Set up reset pin
    let mut rst = pins.d9.into_output();
    rst.set_high();
    arduino_hal::delay_ms(50);

    // Initialize the RFID reader
    let mut rfid = RfidRc522::new(spi, cs_pin, Tc1Clock::new(dp.TC1));
    rfid.init(&mut serial).ok();

    if let Ok(id) = rfid.random_id() {
        uwrite!(&mut serial, "Random ID:").ok();
        for byte in id {
            uwrite!(&mut serial, " {:02X}", byte).ok();
        }
        uwriteln!(&mut serial, "").ok();
    }
    let mut uid = Uid::new();

    loop {
        // Step 1: Check if a new card is present
        match rfid.request_a() {
            Ok(atqa) => {
                uwriteln!(&mut serial, "ATQA: {:02X} {:02X}", atqa[0], atqa[1]).ok();
            }
            Err(_) => {
                arduino_hal::delay_ms(500);
                continue;
            }
        }

        // Step 2: Anti-collision and selection
        if let Err(e) = rfid.select(&mut uid) {
            uwriteln!(&mut serial, "Select failed: {:?}", e).ok();
            arduino_hal::delay_ms(500);
            continue;
        }
        uwriteln!(&mut serial, "UID: {} SAK: 0x{:02X}", uid, uid.sak()).ok();
        uwriteln!(&mut serial, "PICC type: {}", uid.card_type()).ok();

        // Step 3: Ultralight pages can be read without authentication
        if uid.card_type() == CardType::MifareUltralight {
            let mut buffer = [0u8; MIFARE_READ_LEN];
            for page in (0..16u8).step_by(4) {
                match rfid.mifare_read(page, &mut buffer) {
                    Ok(_) => {
                        for (offset, chunk) in buffer[..16].chunks(4).enumerate() {
                            uwriteln!(
                                &mut serial,
                                "Page {}: {:02X} {:02X} {:02X} {:02X}",
                                page as usize + offset,
                                chunk[0],
                                chunk[1],
                                chunk[2],
                                chunk[3]
                            )
                            .ok();
                        }
                    }
                    Err(e) => {
                        uwriteln!(&mut serial, "Read of page {} failed: {:?}", page, e).ok();
                        break;
                    }
                }
            }
        }

        rfid.halt_a().ok();
        // Delay before the next detection attempt
        arduino_hal::delay_ms(1500);
    }
}
