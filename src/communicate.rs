use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::clock::Clock;
use crate::commands::Command;
use crate::errors::RFIDError;
use crate::registers::*;
use crate::rfid_rc522::RfidRc522;

/// Size of the internal buffer moved by the Mem command
const INTERNAL_BUFFER_LEN: usize = 25;
const RANDOM_ID_LEN: usize = 10;

impl<SPI, CS, CLK> RfidRc522<SPI, CS, CLK>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    /// Runs `command` with `send_data` in the FIFO and waits for any of the
    /// ComIrqReg bits in `wait_irq`.
    ///
    /// `valid_bits` holds the number of valid bits in the last sent byte on
    /// entry (0 = all eight) and the number of valid bits in the last received
    /// byte on return, when `back_data` is given. `rx_align` is the bit
    /// position of the first received bit within `back_data[0]`.
    ///
    /// Returns the number of bytes copied into `back_data`.
    #[allow(clippy::too_many_arguments)]
    pub fn communicate(
        &mut self,
        command: Command,
        wait_irq: u8,
        send_data: &[u8],
        back_data: Option<&mut [u8]>,
        valid_bits: &mut u8,
        rx_align: u8,
        check_crc: bool,
    ) -> Result<usize, RFIDError> {
        let tx_last_bits = *valid_bits & 0x07;
        let bit_framing = ((rx_align & 0x07) << 4) | tx_last_bits;

        self.write_command(Command::Idle)?; // Stop any active command
        self.write_register(COMM_IRQ_REG, ALL_COM_IRQS)?;
        self.flush_fifo()?;
        self.write_burst(FIFO_DATA_REG, send_data)?;
        self.write_register(BIT_FRAMING_REG, bit_framing)?;
        self.write_command(command)?;
        if command == Command::Transceive {
            // Transceive only arms the receiver, StartSend kicks off transmission
            self.set_bits(BIT_FRAMING_REG, START_SEND)?;
        }

        let timeout = self.config.command_timeout;
        self.poll(timeout, |rc522| {
            let irq = rc522.read_register(COMM_IRQ_REG)?;
            if irq & wait_irq != 0 {
                Ok(Some(()))
            } else if irq & TIMER_IRQ != 0 {
                Err(RFIDError::Timeout)
            } else {
                Ok(None)
            }
        })?;

        let error = self.read_register(ERROR_REG)?;
        if error & (BUFFER_OVFL | PARITY_ERR | PROTOCOL_ERR) != 0 {
            return Err(RFIDError::CommunicationError);
        }

        let mut back_len = 0;
        let mut rx_last_bits = 0;
        let back_data = match back_data {
            Some(buffer) => {
                let level = self.fifo_level()? as usize;
                if level > buffer.len() {
                    return Err(RFIDError::NoRoom);
                }
                self.read_burst_aligned(FIFO_DATA_REG, &mut buffer[..level], rx_align)?;
                rx_last_bits = self.read_register(CONTROL_REG)? & RX_LAST_BITS_MASK;
                *valid_bits = rx_last_bits;
                back_len = level;
                Some(buffer)
            }
            None => None,
        };

        // Checked after the copy, the bits before the collision are still useful
        if error & COLL_ERR != 0 {
            let coll = self.read_register(COLL_REG)?;
            let position = if coll & COLL_POS_NOT_VALID != 0 {
                None
            } else {
                match coll & COLL_POS_MASK {
                    0 => Some(32),
                    position => Some(position),
                }
            };
            return Err(RFIDError::Collision { position });
        }

        if let (true, Some(buffer)) = (check_crc, back_data) {
            // A MIFARE NAK is a lone 4-bit frame
            if back_len == 1 && rx_last_bits == 4 {
                return Err(RFIDError::MifareNack);
            }
            if back_len < 2 || rx_last_bits != 0 {
                return Err(RFIDError::CrcWrong);
            }
            let crc = self.calculate_crc(&buffer[..back_len - 2])?;
            if buffer[back_len - 2..back_len] != crc {
                return Err(RFIDError::CrcWrong);
            }
        }

        Ok(back_len)
    }

    /// Transmits `send_data` to the PICC and receives its answer.
    pub fn transceive(
        &mut self,
        send_data: &[u8],
        back_data: Option<&mut [u8]>,
        valid_bits: &mut u8,
        rx_align: u8,
    ) -> Result<usize, RFIDError> {
        self.communicate(
            Command::Transceive,
            RX_IRQ | IDLE_IRQ,
            send_data,
            back_data,
            valid_bits,
            rx_align,
            false,
        )
    }

    /// CRC_A of `data` computed by the chip's coprocessor, low byte first.
    pub fn calculate_crc(&mut self, data: &[u8]) -> Result<[u8; 2], RFIDError> {
        self.write_command(Command::Idle)?;
        self.write_register(DIV_IRQ_REG, CRC_IRQ)?; // Clear the CRCIRq request bit
        self.flush_fifo()?;
        self.write_burst(FIFO_DATA_REG, data)?;
        self.write_command(Command::CalcCrc)?;

        let timeout = self.config.crc_timeout;
        self.poll(timeout, |rc522| {
            let irq = rc522.read_register(DIV_IRQ_REG)?;
            Ok((irq & CRC_IRQ != 0).then_some(()))
        })?;

        // Stop calculating CRC for new content in the FIFO
        self.write_command(Command::Idle)?;
        Ok([
            self.read_register(CRC_RESULT_REG_L)?,
            self.read_register(CRC_RESULT_REG_H)?,
        ])
    }

    /// 10 random bytes from the chip's GenerateRandomID command.
    pub fn random_id(&mut self) -> Result<[u8; RANDOM_ID_LEN], RFIDError> {
        self.write_command(Command::Idle)?;
        self.flush_fifo()?;
        self.write_command(Command::GenerateRandomId)?;
        self.wait_idle()?;

        // Mem with an empty FIFO copies the internal buffer into the FIFO
        self.flush_fifo()?;
        self.write_command(Command::Mem)?;
        self.wait_idle()?;

        let level = (self.fifo_level()? as usize).min(INTERNAL_BUFFER_LEN);
        if level < RANDOM_ID_LEN {
            return Err(RFIDError::CommunicationError);
        }
        let mut internal = [0u8; INTERNAL_BUFFER_LEN];
        self.read_burst(FIFO_DATA_REG, &mut internal[..level])?;

        let mut id = [0u8; RANDOM_ID_LEN];
        id.copy_from_slice(&internal[..RANDOM_ID_LEN]);
        Ok(id)
    }

    /// Waits for a self-terminating command to hand back to Idle.
    fn wait_idle(&mut self) -> Result<(), RFIDError> {
        let timeout = self.config.command_timeout;
        self.poll(timeout, |rc522| {
            let command = rc522.read_register(COMMAND_REG)? & COMMAND_MASK;
            Ok((command == Command::Idle as u8).then_some(()))
        })
    }
}
