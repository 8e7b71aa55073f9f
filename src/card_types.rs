use core::fmt::{Debug, Formatter, Result};

use ufmt::{uDisplay, uWrite};

use crate::commands::SAK_CASCADE_BIT;
use crate::errors::RFIDError;

/// PICC family as announced by the SAK byte.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    MifareMini,
    Mifare1K,
    Mifare4K,
    MifareUltralight,
    MifarePlus,
    Iso14443_4,
    Iso18092,
    Tnp3xxx,
    /// SAK says the UID continues at the next cascade level
    NotComplete,
    Unknown,
}

impl CardType {
    pub fn from_sak(sak: u8) -> Self {
        // bit 7 is reserved for future use
        match sak & 0x7F {
            0x04 => CardType::NotComplete,
            0x09 => CardType::MifareMini,
            0x08 => CardType::Mifare1K,
            0x18 => CardType::Mifare4K,
            0x00 => CardType::MifareUltralight,
            0x10 | 0x11 => CardType::MifarePlus,
            0x01 => CardType::Tnp3xxx,
            0x20 => CardType::Iso14443_4,
            0x40 => CardType::Iso18092,
            _ => CardType::Unknown,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CardType::MifareMini => "MifareMini",
            CardType::Mifare1K => "Mifare1K",
            CardType::Mifare4K => "Mifare4K",
            CardType::MifareUltralight => "MifareUltralight",
            CardType::MifarePlus => "MifarePlus",
            CardType::Iso14443_4 => "ISO/IEC 14443-4",
            CardType::Iso18092 => "ISO/IEC 18092",
            CardType::Tnp3xxx => "TNP3xxx",
            CardType::NotComplete => "NotComplete",
            CardType::Unknown => "Unknown",
        }
    }
}

impl Debug for CardType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

impl uDisplay for CardType {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

pub const MAX_UID_LEN: usize = 10;

/// UID of a selected PICC: 4, 7 or 10 bytes plus the final SAK.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Uid {
    size: u8,
    bytes: [u8; MAX_UID_LEN],
    sak: u8,
}

impl Uid {
    /// An empty UID, ready to be filled by `select`.
    pub const fn new() -> Self {
        Uid {
            size: 0,
            bytes: [0; MAX_UID_LEN],
            sak: 0,
        }
    }

    /// A known UID, e.g. to re-select a halted card with `select_uid`.
    pub fn from_bytes(bytes: &[u8]) -> core::result::Result<Self, RFIDError> {
        match bytes.len() {
            4 | 7 | 10 => {
                let mut uid = Uid::new();
                uid.bytes[..bytes.len()].copy_from_slice(bytes);
                uid.size = bytes.len() as u8;
                Ok(uid)
            }
            _ => Err(RFIDError::InvalidArgument),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.size as usize]
    }

    pub fn size(&self) -> usize {
        self.size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn sak(&self) -> u8 {
        self.sak
    }

    pub fn card_type(&self) -> CardType {
        CardType::from_sak(self.sak)
    }

    pub fn clear(&mut self) {
        *self = Uid::new();
    }

    pub(crate) fn raw(&self) -> &[u8; MAX_UID_LEN] {
        &self.bytes
    }

    pub(crate) fn complete(&mut self, bytes: [u8; MAX_UID_LEN], size: u8, sak: u8) {
        debug_assert!(sak & SAK_CASCADE_BIT == 0);
        self.bytes = bytes;
        self.size = size;
        self.sak = sak;
    }
}

impl Debug for Uid {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:02X?} (SAK {:#04x})", self.bytes(), self.sak)
    }
}

impl uDisplay for Uid {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        for (i, byte) in self.bytes().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            ufmt::uwrite!(f, "{:02X}", *byte)?;
        }
        Ok(())
    }
}
