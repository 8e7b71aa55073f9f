/// Commands for the MFRC522 (CommandReg bits 3..0)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// No action, cancels current command execution
    Idle = 0b0000,
    /// Moves 25 bytes between the FIFO and the internal buffer
    Mem = 0b0001,
    /// Generates a 10-byte random ID number
    GenerateRandomId = 0b0010,
    /// Activates the CRC coprocessor or performs a self-test
    CalcCrc = 0b0011,
    Transmit = 0b0100,
    /// Modifies CommandReg bits without affecting the running command
    NoCmdChange = 0b0111,
    Receive = 0b1000,
    /// Transmits the FIFO and activates the receiver after transmission
    Transceive = 0b1100,
    MfAuthent = 0b1110,
    SoftReset = 0b1111,
}

impl From<Command> for u8 {
    fn from(command: Command) -> u8 {
        command as u8
    }
}

// PICC commands (ISO/IEC 14443-3 type A)
pub const PICC_CMD_REQA: u8 = 0x26;      // REQuest command, Type A, 7 bit frame
pub const PICC_CMD_WUPA: u8 = 0x52;      // Wake-UP command, Type A, 7 bit frame
pub const PICC_CMD_CT: u8 = 0x88;        // Cascade Tag, used during anti collision
pub const PICC_CMD_SEL_CL1: u8 = 0x93;   // Anti collision/Select, Cascade Level 1
pub const PICC_CMD_SEL_CL2: u8 = 0x95;   // Anti collision/Select, Cascade Level 2
pub const PICC_CMD_SEL_CL3: u8 = 0x97;   // Anti collision/Select, Cascade Level 3
pub const PICC_CMD_HLTA: u8 = 0x50;      // HaLT command, Type A
pub const PICC_CMD_RATS: u8 = 0xE0;      // Request command for Answer To Reset

// MIFARE Classic commands
pub const PICC_CMD_MF_AUTH_KEY_A: u8 = 0x60;
pub const PICC_CMD_MF_AUTH_KEY_B: u8 = 0x61;
pub const PICC_CMD_MF_READ: u8 = 0x30;   // Reads one 16 byte block
pub const PICC_CMD_MF_WRITE: u8 = 0xA0;
pub const PICC_CMD_MF_DECREMENT: u8 = 0xC0;
pub const PICC_CMD_MF_INCREMENT: u8 = 0xC1;
pub const PICC_CMD_MF_RESTORE: u8 = 0xC2;
pub const PICC_CMD_MF_TRANSFER: u8 = 0xB0;

// MIFARE Ultralight
pub const PICC_CMD_UL_WRITE: u8 = 0xA2;  // Writes one 4 byte page

/// Number of valid bits in the last byte of a REQA/WUPA short frame
pub const SHORT_FRAME_BITS: u8 = 7;
/// NVB of a SELECT frame: 7 whole bytes, no trailing bits
pub const NVB_SELECT: u8 = 0x70;
/// SAK bit signalling that the UID is not complete
pub const SAK_CASCADE_BIT: u8 = 0x04;
