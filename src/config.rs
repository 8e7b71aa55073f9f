use crate::clock::Duration;

/// Receiver gain, RFCfgReg bits 6..4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum RxGain {
    Db18 = 0x00,
    Db23 = 0x10,
    Db18Alt = 0x20,
    Db23Alt = 0x30,
    Db33 = 0x40,
    Db38 = 0x50,
    Db43 = 0x60,
    Db48 = 0x70,
}

impl RxGain {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x70 {
            0x00 => RxGain::Db18,
            0x10 => RxGain::Db23,
            0x20 => RxGain::Db18Alt,
            0x30 => RxGain::Db23Alt,
            0x40 => RxGain::Db33,
            0x50 => RxGain::Db38,
            0x60 => RxGain::Db43,
            _ => RxGain::Db48,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Driver settings. Timeouts bound the polls on the chip's status registers.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Completion of a Transceive/Mem/GenerateRandomID command. The chip's own
    /// timer fires after 25 ms, this is the safety net behind it.
    pub command_timeout: Duration,
    pub crc_timeout: Duration,
    /// PowerDown bit clearing after a soft reset
    pub reset_timeout: Duration,
    /// FIFO filling up with the 64-byte self-test digest
    pub self_test_timeout: Duration,
    /// Receiver gain applied by `init`
    pub antenna_gain: RxGain,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            command_timeout: Duration::millis(36),
            crc_timeout: Duration::millis(89),
            reset_timeout: Duration::millis(150),
            self_test_timeout: Duration::millis(100),
            antenna_gain: RxGain::Db48,
        }
    }
}
