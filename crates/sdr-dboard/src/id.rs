//! Daughterboard identity codes

use std::fmt;

/// Identity code read from a daughterboard EEPROM
///
/// Codes identify a model, not an instance: every board of the same model
/// reports the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DboardId(pub u16);

impl DboardId {
    /// No daughterboard detected in the slot
    pub const NONE: DboardId = DboardId(0xffff);
    /// Basic TX pass-through board
    pub const BASIC_TX: DboardId = DboardId(0x0000);
    /// Basic RX pass-through board
    pub const BASIC_RX: DboardId = DboardId(0x0001);

    /// Get the raw code
    pub fn as_u16(&self) -> u16 {
        self.0
    }
}

impl From<u16> for DboardId {
    fn from(code: u16) -> Self {
        Self(code)
    }
}

impl fmt::Display for DboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}
