use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::clock::Clock;
use crate::commands::*;
use crate::errors::RFIDError;
use crate::registers::*;
use crate::rfid_rc522::RfidRc522;

impl<SPI, CS, CLK> RfidRc522<SPI, CS, CLK>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    /// Sends REQA and returns the ATQA. Only PICCs in the IDLE state answer.
    pub fn request_a(&mut self) -> Result<[u8; 2], RFIDError> {
        self.request_or_wakeup(PICC_CMD_REQA)
    }

    /// Sends WUPA and returns the ATQA. Also wakes PICCs in the HALT state.
    pub fn wakeup_a(&mut self) -> Result<[u8; 2], RFIDError> {
        self.request_or_wakeup(PICC_CMD_WUPA)
    }

    /// True if a PICC in the IDLE state is in the field. Several PICCs
    /// answering at once also count as present.
    pub fn is_new_card_present(&mut self) -> bool {
        matches!(
            self.request_a(),
            Ok(_) | Err(RFIDError::Collision { .. })
        )
    }

    /// Puts the selected PICC into the HALT state.
    ///
    /// The PICC acknowledges HLTA by staying silent, so a timeout is success
    /// and any answer is an error.
    pub fn halt_a(&mut self) -> Result<(), RFIDError> {
        let mut frame = [PICC_CMD_HLTA, 0x00, 0x00, 0x00];
        let crc = self.calculate_crc(&frame[..2])?;
        frame[2..].copy_from_slice(&crc);

        let mut valid_bits = 0;
        match self.transceive(&frame, None, &mut valid_bits, 0) {
            Err(RFIDError::Timeout) => Ok(()),
            Ok(_) => Err(RFIDError::CommunicationError),
            Err(err) => Err(err),
        }
    }

    fn request_or_wakeup(&mut self, command: u8) -> Result<[u8; 2], RFIDError> {
        // Back to 106 kBd after a higher-rate exchange
        self.write_register(TX_MODE_REG, 0x00)?;
        self.write_register(RX_MODE_REG, 0x00)?;
        self.write_register(MOD_WIDTH_REG, 0x26)?;
        self.clear_bits(COLL_REG, VALUES_AFTER_COLL)?;

        let mut atqa = [0u8; 2];
        let mut valid_bits = SHORT_FRAME_BITS;
        let len = self.transceive(&[command], Some(&mut atqa), &mut valid_bits, 0)?;
        if len != 2 || valid_bits != 0 {
            return Err(RFIDError::CommunicationError);
        }
        Ok(atqa)
    }
}
