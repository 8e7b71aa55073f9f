use core::fmt::{Display, Formatter, Result};
use embedded_hal::spi::ErrorKind;
use ufmt::{uDebug, uWrite};

/// Failure outcome of every driver operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RFIDError {
    /// Chip reported a buffer overflow, parity or protocol error
    CommunicationError,
    /// Several PICCs answered at once. `position` is the 1-based bit of the
    /// first collision (32 for the last UID bit), `None` if the chip could not
    /// locate it.
    Collision { position: Option<u8> },
    Timeout,
    /// The response does not fit in the caller's buffer
    NoRoom,
    InternalError,
    InvalidArgument,
    CrcWrong,
    /// MIFARE NAK
    MifareNack,
    /// SPI transfer failed
    Bus(ErrorKind),
    /// Chip-select line could not be driven
    ChipSelect,
}

impl RFIDError {
    pub(crate) fn bus<E: embedded_hal::spi::Error>(error: E) -> Self {
        RFIDError::Bus(error.kind())
    }

    fn as_str(&self) -> &'static str {
        match self {
            RFIDError::CommunicationError => "CommunicationError",
            RFIDError::Collision { .. } => "Collision",
            RFIDError::Timeout => "Timeout",
            RFIDError::NoRoom => "NoRoom",
            RFIDError::InternalError => "InternalError",
            RFIDError::InvalidArgument => "InvalidArgument",
            RFIDError::CrcWrong => "CrcWrong",
            RFIDError::MifareNack => "MifareNack",
            RFIDError::Bus(_) => "Bus",
            RFIDError::ChipSelect => "ChipSelect",
        }
    }
}

impl Display for RFIDError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            RFIDError::Collision { position: Some(position) } => {
                write!(f, "Collision at bit {}", position)
            }
            RFIDError::Bus(kind) => write!(f, "Bus: {}", kind),
            other => f.write_str(other.as_str()),
        }
    }
}

impl uDebug for RFIDError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            RFIDError::Collision { position: Some(position) } => {
                f.write_str("Collision at bit ")?;
                uDebug::fmt(position, f)
            }
            other => f.write_str(other.as_str()),
        }
    }
}
