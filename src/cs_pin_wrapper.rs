use embedded_hal::digital::OutputPin;

use crate::errors::RFIDError;

/// Active-low chip-select line of the MFRC522.
pub struct CsPinWrapper<CS> {
    cs: CS,
}

impl<CS> CsPinWrapper<CS>
where
    CS: OutputPin,
{
    pub fn new(cs: CS) -> Self {
        CsPinWrapper { cs }
    }

    /// Asserts chip-select, opening a bus transaction.
    pub fn select(&mut self) -> Result<(), RFIDError> {
        self.cs.set_low().map_err(|_| RFIDError::ChipSelect)
    }

    /// Releases chip-select, closing the bus transaction.
    pub fn release(&mut self) -> Result<(), RFIDError> {
        self.cs.set_high().map_err(|_| RFIDError::ChipSelect)
    }

    pub fn into_inner(self) -> CS {
        self.cs
    }
}
