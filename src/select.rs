//! ISO/IEC 14443-3 anti-collision and selection of a single PICC.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use ufmt::uWrite;

use crate::card_types::{Uid, MAX_UID_LEN};
use crate::clock::Clock;
use crate::commands::*;
use crate::errors::RFIDError;
use crate::registers::{COLL_REG, VALUES_AFTER_COLL};
use crate::rfid_rc522::RfidRc522;

/// SEL, NVB, 4 UID bytes (or CT + 3), BCC and CRC_A
const SELECT_FRAME_LEN: usize = 9;
/// Bits of UID data carried by one cascade level
const LEVEL_UID_BITS: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadeLevel {
    One,
    Two,
    Three,
}

impl CascadeLevel {
    pub fn select_command(self) -> u8 {
        match self {
            CascadeLevel::One => PICC_CMD_SEL_CL1,
            CascadeLevel::Two => PICC_CMD_SEL_CL2,
            CascadeLevel::Three => PICC_CMD_SEL_CL3,
        }
    }

    /// Offset of this level's UID bytes in the complete UID.
    pub fn uid_offset(self) -> usize {
        match self {
            CascadeLevel::One => 0,
            CascadeLevel::Two => 3,
            CascadeLevel::Three => 6,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            CascadeLevel::One => 1,
            CascadeLevel::Two => 2,
            CascadeLevel::Three => 3,
        }
    }

    pub fn next(self) -> Option<Self> {
        match self {
            CascadeLevel::One => Some(CascadeLevel::Two),
            CascadeLevel::Two => Some(CascadeLevel::Three),
            CascadeLevel::Three => None,
        }
    }

    /// UID size once the SAK of this level reports completion.
    pub fn uid_size(self) -> u8 {
        3 * self.number() + 1
    }
}

impl<SPI, CS, CLK> RfidRc522<SPI, CS, CLK>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    CLK: Clock,
{
    /// Runs anti-collision and selection for one PICC in the READY state
    /// (after `request_a`/`wakeup_a`) and stores its UID and SAK in `uid`.
    ///
    /// When several PICCs answer, the one with a 1 at the first colliding bit
    /// wins. On error `uid` is left empty.
    pub fn select(&mut self, uid: &mut Uid) -> Result<(), RFIDError> {
        uid.clear();
        self.select_levels(uid, 0)
    }

    /// Selects the PICC whose complete UID is already in `uid`, skipping
    /// anti-collision. Used to re-select a card after HLTA and WUPA.
    pub fn select_uid(&mut self, uid: &mut Uid) -> Result<(), RFIDError> {
        let known = uid.size();
        if !matches!(known, 4 | 7 | 10) {
            return Err(RFIDError::InvalidArgument);
        }
        self.select_levels(uid, known)
    }

    /// `select`, reporting the outcome on `serial`.
    pub fn read_card_serial<W: uWrite>(&mut self, serial: &mut W) -> Result<Uid, RFIDError> {
        let mut uid = Uid::new();
        match self.select(&mut uid) {
            Ok(()) => {
                ufmt::uwriteln!(serial, "Card selected. UID: {} ({})", uid, uid.card_type()).ok();
                Ok(uid)
            }
            Err(err) => {
                ufmt::uwriteln!(serial, "Failed to select card: {:?}", err).ok();
                Err(err)
            }
        }
    }

    fn select_levels(&mut self, uid: &mut Uid, known: usize) -> Result<(), RFIDError> {
        let mut uid_bytes = *uid.raw();

        // All received bits are cleared after a collision
        self.clear_bits(COLL_REG, VALUES_AFTER_COLL)?;

        let mut level = CascadeLevel::One;
        loop {
            let sak = self.select_level(level, &mut uid_bytes, known)?;
            if sak & SAK_CASCADE_BIT == 0 {
                uid.complete(uid_bytes, level.uid_size(), sak);
                return Ok(());
            }
            level = level.next().ok_or(RFIDError::InternalError)?;
        }
    }

    /// Resolves the UID bytes of one cascade level and selects it. Returns
    /// the SAK.
    fn select_level(
        &mut self,
        level: CascadeLevel,
        uid_bytes: &mut [u8; MAX_UID_LEN],
        known: usize,
    ) -> Result<u8, RFIDError> {
        let uid_index = level.uid_offset();
        let mut buffer = [0u8; SELECT_FRAME_LEN];
        buffer[0] = level.select_command();

        // Pre-fill what the caller already knows about this level
        let remaining = known.saturating_sub(uid_index);
        let use_cascade_tag = remaining > 4;
        let mut index = 2;
        let mut known_bits = 0;
        if use_cascade_tag {
            buffer[index] = PICC_CMD_CT;
            index += 1;
            known_bits += 8;
        }
        let max_bytes = if use_cascade_tag { 3 } else { 4 };
        let bytes_to_copy = remaining.min(max_bytes);
        buffer[index..index + bytes_to_copy]
            .copy_from_slice(&uid_bytes[uid_index..uid_index + bytes_to_copy]);
        known_bits += 8 * bytes_to_copy;

        let mut response_offset;
        let mut rx_last_bits;
        let response_len = loop {
            let tx_last_bits;
            let send_len;
            if known_bits >= LEVEL_UID_BITS {
                // SELECT: all 40 bits (UID + BCC) plus CRC_A
                buffer[1] = NVB_SELECT;
                buffer[6] = buffer[2] ^ buffer[3] ^ buffer[4] ^ buffer[5];
                let crc = self.calculate_crc(&buffer[..7])?;
                buffer[7..].copy_from_slice(&crc);
                tx_last_bits = 0;
                send_len = SELECT_FRAME_LEN;
                response_offset = 6; // SAK + CRC_A
            } else {
                // ANTICOLLISION: send the known prefix, receive the rest
                tx_last_bits = (known_bits % 8) as u8;
                let whole_bytes = known_bits / 8;
                let index = 2 + whole_bytes;
                buffer[1] = ((index as u8) << 4) | tx_last_bits;
                send_len = index + usize::from(tx_last_bits != 0);
                response_offset = index;
            }

            // The answer lands right behind the known bits, completing the
            // partially sent byte
            let rx_align = tx_last_bits;
            let frame = buffer;
            let response_end = if known_bits >= LEVEL_UID_BITS {
                response_offset + 3
            } else {
                SELECT_FRAME_LEN
            };
            rx_last_bits = tx_last_bits;

            match self.transceive(
                &frame[..send_len],
                Some(&mut buffer[response_offset..response_end]),
                &mut rx_last_bits,
                rx_align,
            ) {
                Ok(len) => {
                    if known_bits >= LEVEL_UID_BITS {
                        break len;
                    }
                    // The whole level arrived without collision, select it
                    known_bits = LEVEL_UID_BITS;
                }
                Err(RFIDError::Collision { position }) => {
                    let position = usize::from(position.ok_or(RFIDError::InternalError)?);
                    if position <= known_bits || position > LEVEL_UID_BITS {
                        return Err(RFIDError::InternalError);
                    }
                    known_bits = position;
                    // Always follow the PICCs that sent a 1 at the colliding bit
                    let check_bit = (position - 1) % 8;
                    let index = 1 + position / 8 + usize::from(position % 8 != 0);
                    buffer[index] |= 1 << check_bit;
                }
                Err(err) => return Err(err),
            }
        };

        // SAK frame: one byte plus CRC_A, no trailing bits
        if response_len != 3 || rx_last_bits != 0 {
            return Err(RFIDError::CommunicationError);
        }
        let sak = buffer[response_offset];
        let crc = self.calculate_crc(&[sak])?;
        if buffer[response_offset + 1..response_offset + 3] != crc {
            return Err(RFIDError::CrcWrong);
        }

        // Only a level the PICC continues past starts with the cascade tag.
        // A cascade bit at level 3 announces a UID longer than 10 bytes.
        let cascades = sak & SAK_CASCADE_BIT != 0;
        if cascades && level.next().is_none() {
            return Err(RFIDError::InternalError);
        }
        let tag_missing = cascades && buffer[2] != PICC_CMD_CT;
        // A known UID fixes where the cascade tags are
        let size_disagrees = known > 0 && cascades != use_cascade_tag;
        if tag_missing || size_disagrees {
            return Err(RFIDError::CommunicationError);
        }
        let (source, count) = if cascades { (3, 3) } else { (2, 4) };
        uid_bytes[uid_index..uid_index + count].copy_from_slice(&buffer[source..source + count]);
        Ok(sak)
    }
}
