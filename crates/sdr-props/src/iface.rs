//! Capability traits for the hardware collaborators reached through the tree
//!
//! The transport that actually moves register values is outside this crate;
//! these traits are the boundary it implements.

use crate::error::PropError;
use crate::types::Range;
use crate::Direction;

/// Gain name that addresses the overall gain of a group
pub const ALL_GAINS: &str = "";

/// Daughterboard GPIO bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpioBank {
    /// Pins routed to the RX daughterboard slot
    Rx,
    /// Pins routed to the TX daughterboard slot
    Tx,
}

impl From<Direction> for GpioBank {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Rx => GpioBank::Rx,
            Direction::Tx => GpioBank::Tx,
        }
    }
}

/// Automatic transmit/receive switching register of one GPIO bank
///
/// Pins selected by `mask` follow `rx_value` while receiving and `tx_value`
/// while transmitting; all other pins are under software control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AtrReg {
    /// Pin levels driven while receiving
    pub rx_value: u16,
    /// Pin levels driven while transmitting
    pub tx_value: u16,
    /// Pins handed to the switching logic
    pub mask: u16,
}

impl AtrReg {
    /// Switching logic off, every pin software controlled
    pub const DISABLED: AtrReg = AtrReg {
        rx_value: 0,
        tx_value: 0,
        mask: 0,
    };
}

/// Low-level daughterboard interface provided by the motherboard
///
/// Direction bits: a set bit makes the pin an input.
pub trait DboardIface {
    /// Write the direction register of a bank (only bits in `mask` change)
    fn set_gpio_ddr(&self, bank: GpioBank, value: u16, mask: u16) -> Result<(), PropError>;

    /// Write the output latch of a bank (only bits in `mask` change)
    fn write_gpio(&self, bank: GpioBank, value: u16, mask: u16) -> Result<(), PropError>;

    /// Read the pin levels of a bank
    fn read_gpio(&self, bank: GpioBank) -> Result<u16, PropError>;

    /// Program the automatic switching register of a bank
    fn set_atr_reg(&self, bank: GpioBank, atr: AtrReg) -> Result<(), PropError>;
}

/// Composite of independently adjustable gain stages
///
/// Passing [`ALL_GAINS`] as the name addresses the overall gain, which the
/// group distributes across its stages.
pub trait GainGroup {
    /// Range of a stage, or of the overall gain
    fn range(&self, name: &str) -> Result<Range, PropError>;

    /// Current value of a stage, or of the overall gain
    fn value(&self, name: &str) -> Result<f64, PropError>;

    /// Set a stage, or distribute an overall gain
    fn set_value(&self, gain: f64, name: &str) -> Result<(), PropError>;

    /// Names of the individual stages
    fn names(&self) -> Result<Vec<String>, PropError>;
}

/// Low-level motherboard register interface
pub trait MboardIface {
    /// Read a 32-bit register
    fn peek32(&self, addr: u32) -> Result<u32, PropError>;

    /// Write a 32-bit register
    fn poke32(&self, addr: u32, data: u32) -> Result<(), PropError>;
}
