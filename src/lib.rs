//! Driver for the NXP MFRC522 (and FM17522 clone) ISO/IEC 14443-A reader over
//! SPI, built on `embedded-hal` 1.0.
//!
//! ```ignore
//! let mut rc522 = RfidRc522::new(spi, cs, clock);
//! rc522.init(&mut serial)?;
//! if rc522.is_new_card_present() {
//!     let uid = rc522.read_card_serial(&mut serial)?;
//! }
//! ```
#![cfg_attr(not(test), no_std)]

pub mod card_types;
pub mod clock;
pub mod commands;
mod communicate;
pub mod config;
pub mod cs_pin_wrapper;
pub mod errors;
pub mod mifare;
mod presence;
pub mod registers;
pub mod rfid_rc522;
pub mod select;

pub use card_types::{CardType, Uid};
pub use clock::{Clock, Duration, Instant};
pub use commands::Command;
pub use config::{Config, RxGain};
pub use errors::RFIDError;
pub use rfid_rc522::RfidRc522;
pub use select::CascadeLevel;
pub use self_test::SelfTestOutcome;
