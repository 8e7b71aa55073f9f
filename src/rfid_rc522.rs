use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use ufmt::uWrite;

use crate::clock::{Clock, Deadline, Duration};
use crate::commands::Command;
use crate::config::{Config, RxGain};
use crate::cs_pin_wrapper::CsPinWrapper;
use crate::errors::RFIDError;
use crate::registers::*;

/// MFRC522 reader driver.
///
/// Owns the SPI bus, the chip-select line and the clock used for timeouts.
/// The chip's FIFO and command state are exclusive to one operation at a time,
/// so share an instance between tasks only behind a lock.
pub struct RfidRc522<SPI, CS, CLK> {
    spi: SPI,
    cs: CsPinWrapper<CS>,
    clock: CLK,
    pub(crate) config: Config,
}

impl<SPI, CS, CLK> RfidRc522<SPI, CS, CLK>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    pub fn new(spi: SPI, cs: CS, clock: CLK) -> Self {
        Self::with_config(spi, cs, clock, Config::default())
    }

    pub fn with_config(spi: SPI, cs: CS, clock: CLK, config: Config) -> Self {
        RfidRc522 {
            spi,
            cs: CsPinWrapper::new(cs),
            clock,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gives the bus, chip-select pin and clock back.
    pub fn release(self) -> (SPI, CS, CLK) {
        (self.spi, self.cs.into_inner(), self.clock)
    }

    /// Soft reset followed by the standard ISO 14443-A configuration: 25 ms
    /// chip timer, 100% ASK, CRC preset 0x6363, antenna on.
    pub fn init<W: uWrite>(&mut self, serial: &mut W) -> Result<(), RFIDError> {
        self.reset()?;

        let version = self.version()?;
        ufmt::uwriteln!(serial, "RFID-RC522 Version: 0x{:02X}", version).ok();

        // Reset baud rates
        self.write_register(TX_MODE_REG, 0x00)?;
        self.write_register(RX_MODE_REG, 0x00)?;
        self.write_register(MOD_WIDTH_REG, 0x26)?;

        // TAuto: timer starts at the end of every transmission.
        // f_timer = 13.56 MHz / (2 * 0xA9 + 1) = 40 kHz, reload 1000 -> 25 ms
        self.write_register(T_MODE_REG, 0x80)?;
        self.write_register(T_PRESCALER_REG, 0xA9)?;
        self.write_register(T_RELOAD_REG_H, 0x03)?;
        self.write_register(T_RELOAD_REG_L, 0xE8)?;

        self.write_register(TX_ASK_REG, 0x40)?; // 100% ASK
        self.write_register(MODE_REG, 0x3D)?; // CRC preset to 0x6363
        self.antenna_on()?;

        let gain = self.config.antenna_gain;
        self.set_antenna_gain(serial, gain)
    }

    /// Soft reset. Waits for the PowerDown bit to clear.
    pub fn reset(&mut self) -> Result<(), RFIDError> {
        self.write_command(Command::SoftReset)?;

        let timeout = self.config.reset_timeout;
        self.poll(timeout, |rc522| {
            let command = rc522.read_register(COMMAND_REG)?;
            Ok((command & POWER_DOWN == 0).then_some(()))
        })
    }

    pub fn antenna_on(&mut self) -> Result<(), RFIDError> {
        let current = self.read_register(TX_CONTROL_REG)?;
        if (current & ANTENNA_DRIVERS) != ANTENNA_DRIVERS {
            self.write_register(TX_CONTROL_REG, current | ANTENNA_DRIVERS)?;
        }
        Ok(())
    }

    pub fn antenna_off(&mut self) -> Result<(), RFIDError> {
        self.clear_bits(TX_CONTROL_REG, ANTENNA_DRIVERS)
    }

    pub fn antenna_gain(&mut self) -> Result<RxGain, RFIDError> {
        Ok(RxGain::from_bits(self.read_register(RF_CFG_REG)?))
    }

    pub fn set_antenna_gain<W: uWrite>(
        &mut self,
        serial: &mut W,
        gain: RxGain,
    ) -> Result<(), RFIDError> {
        if self.antenna_gain()? != gain {
            self.clear_bits(RF_CFG_REG, RX_GAIN_MASK)?;
            self.set_bits(RF_CFG_REG, gain.bits())?;
            ufmt::uwriteln!(serial, "Antenna gain set to 0x{:02X}", gain.bits()).ok();
        }
        Ok(())
    }

    /// VersionReg: 0x91/0x92 for MFRC522 v1.0/v2.0, 0x88 for the FM17522 clone.
    pub fn version(&mut self) -> Result<u8, RFIDError> {
        self.read_register(VERSION_REG)
    }

    pub fn set_bits(&mut self, reg: u8, mask: u8) -> Result<(), RFIDError> {
        let current = self.read_register(reg)?;
        self.write_register(reg, current | mask)
    }

    pub fn clear_bits(&mut self, reg: u8, mask: u8) -> Result<(), RFIDError> {
        let current = self.read_register(reg)?;
        self.write_register(reg, current & !mask)
    }

    pub fn read_register(&mut self, reg: u8) -> Result<u8, RFIDError> {
        let buffer = [read_address(reg), 0x00];
        let mut read_buffer = [0u8; 2];
        self.transaction(|rc522| {
            rc522
                .spi
                .transfer(&mut read_buffer, &buffer)
                .map_err(RFIDError::bus)
        })?;
        Ok(read_buffer[1])
    }

    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), RFIDError> {
        let buffer = [write_address(reg), value];
        self.transaction(|rc522| rc522.spi.write(&buffer).map_err(RFIDError::bus))
    }

    /// Reads `buffer.len()` bytes from `reg` in one transaction.
    pub fn read_burst(&mut self, reg: u8, buffer: &mut [u8]) -> Result<(), RFIDError> {
        self.read_burst_aligned(reg, buffer, 0)
    }

    /// Burst read keeping bits `0..rx_align` of `buffer[0]`, which hold the
    /// already known part of a split byte.
    pub(crate) fn read_burst_aligned(
        &mut self,
        reg: u8,
        buffer: &mut [u8],
        rx_align: u8,
    ) -> Result<(), RFIDError> {
        let Some(last) = buffer.len().checked_sub(1) else {
            return Ok(());
        };
        let address = read_address(reg);

        self.transaction(|rc522| {
            rc522.exchange(address)?;
            for (index, byte) in buffer.iter_mut().enumerate() {
                // The chip clocks out the addressed register while the next
                // address is shifted in; the final byte is terminated by 0x00.
                let next = if index == last { 0x00 } else { address };
                let value = rc522.exchange(next)?;
                if index == 0 && rx_align > 0 {
                    let mask = 0xFFu8 << (rx_align & 0x07);
                    *byte = (*byte & !mask) | (value & mask);
                } else {
                    *byte = value;
                }
            }
            Ok(())
        })
    }

    pub fn write_burst(&mut self, reg: u8, data: &[u8]) -> Result<(), RFIDError> {
        let address = [write_address(reg)];
        self.transaction(|rc522| {
            rc522.spi.write(&address).map_err(RFIDError::bus)?;
            rc522.spi.write(data).map_err(RFIDError::bus)
        })
    }

    pub(crate) fn write_command(&mut self, command: Command) -> Result<(), RFIDError> {
        self.write_register(COMMAND_REG, command.into())
    }

    pub(crate) fn flush_fifo(&mut self) -> Result<(), RFIDError> {
        self.write_register(FIFO_LEVEL_REG, FLUSH_BUFFER)
    }

    pub(crate) fn fifo_level(&mut self) -> Result<u8, RFIDError> {
        Ok(self.read_register(FIFO_LEVEL_REG)? & FIFO_LEVEL_MASK)
    }

    /// Repeats `check` until it yields a value or `timeout` elapses. `check`
    /// runs at least once and may end the wait early with an error.
    pub(crate) fn poll<T>(
        &mut self,
        timeout: Duration,
        mut check: impl FnMut(&mut Self) -> Result<Option<T>, RFIDError>,
    ) -> Result<T, RFIDError> {
        let deadline = Deadline::after(&mut self.clock, timeout);
        loop {
            if let Some(value) = check(self)? {
                return Ok(value);
            }
            if deadline.expired(&mut self.clock) {
                return Err(RFIDError::Timeout);
            }
        }
    }

    fn exchange(&mut self, byte: u8) -> Result<u8, RFIDError> {
        let mut buffer = [byte];
        self.spi
            .transfer_in_place(&mut buffer)
            .map_err(RFIDError::bus)?;
        Ok(buffer[0])
    }

    /// Runs `f` with chip-select asserted. The bus is flushed and chip-select
    /// released even when `f` fails.
    fn transaction<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, RFIDError>,
    ) -> Result<T, RFIDError> {
        self.cs.select()?;
        let result = f(self);
        let flushed = self.spi.flush().map_err(RFIDError::bus);
        self.cs.release()?;
        let value = result?;
        flushed?;
        Ok(value)
    }
}
