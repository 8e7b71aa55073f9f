use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::clock::Clock;
use crate::commands::{Command, PICC_CMD_MF_READ};
use crate::errors::RFIDError;
use crate::registers::{IDLE_IRQ, RX_IRQ};
use crate::rfid_rc522::RfidRc522;

/// 16 data bytes followed by CRC_A
pub const MIFARE_READ_LEN: usize = 18;

impl<SPI, CS, CLK> RfidRc522<SPI, CS, CLK>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    /// Reads 16 bytes starting at `block` from the selected PICC.
    ///
    /// On MIFARE Classic the sector must be authenticated first; Ultralight
    /// returns four 4-byte pages. `buffer` receives the data and the CRC_A and
    /// must hold at least 18 bytes. Returns the number of bytes written.
    pub fn mifare_read(&mut self, block: u8, buffer: &mut [u8]) -> Result<usize, RFIDError> {
        if buffer.len() < MIFARE_READ_LEN {
            return Err(RFIDError::NoRoom);
        }

        let mut frame = [PICC_CMD_MF_READ, block, 0x00, 0x00];
        let crc = self.calculate_crc(&frame[..2])?;
        frame[2..].copy_from_slice(&crc);

        let mut valid_bits = 0;
        self.communicate(
            Command::Transceive,
            RX_IRQ | IDLE_IRQ,
            &frame,
            Some(buffer),
            &mut valid_bits,
            0,
            true,
        )
    }
}
