//! SDR Property Tree Library
//!
//! This crate provides the addressing substrate shared by every layer of the
//! host driver. Each hardware attribute (motherboard name, clock rate, channel
//! frequency range, sensor readings, GPIO interface handles) lives behind a
//! property node and is reached the same way:
//!
//! - **Keys**: a symbolic [`Prop`] plus an optional index string ([`PropKey`])
//! - **Values**: an explicitly tagged [`PropValue`] with typed views
//! - **Nodes**: anything implementing [`PropNode`], handled through [`Node`]
//!
//! Nodes link to child nodes by returning [`PropValue::Node`], so a device is
//! a tree: device → motherboard → DSP / daughterboard → sub-device.
//!
//! # Example
//!
//! ```rust
//! use sdr_props::{Node, Prop, PropKey, StoreNode};
//!
//! let mboard = Node::new(StoreNode::new());
//! mboard.set(Prop::Name, "B100").unwrap();
//! mboard.set(Prop::ClockRate, 64e6).unwrap();
//!
//! let device = Node::new(StoreNode::new());
//! device.set(PropKey::named(Prop::Mboard, "0"), mboard).unwrap();
//!
//! let mb = device.child(PropKey::named(Prop::Mboard, "0")).unwrap();
//! assert_eq!(mb.get_as::<f64>(Prop::ClockRate).unwrap(), 64e6);
//! assert!(mb.get_as::<String>(Prop::ClockRate).is_err());
//! ```

pub mod error;
pub mod iface;
pub mod key;
pub mod node;
pub mod time;
pub mod types;
pub mod value;

pub use error::PropError;
pub use iface::{AtrReg, DboardIface, GainGroup, GpioBank, MboardIface, ALL_GAINS};
pub use key::{Prop, PropKey};
pub use node::{Node, PropNode, StoreNode};
pub use time::{Clock, SystemClock, TimeSpec};
pub use types::{
    ClockConfig, PpsPolarity, PpsSource, Range, RefSource, SensorReading, SensorValue,
    StreamCmd, StreamMode, SubdevSpec, SubdevSpecPair,
};
pub use value::{FromPropValue, PropValue};

/// Signal chain direction
///
/// Used to tag sub-device proxies, select GPIO banks and pick the RX or TX
/// half of a motherboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Receive chain
    Rx,
    /// Transmit chain
    Tx,
}

impl Direction {
    /// Upper-case label used in diagnostics ("RX" / "TX")
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Rx => "RX",
            Direction::Tx => "TX",
        }
    }

    /// Lower-case label used in error messages ("rx" / "tx")
    pub fn short(&self) -> &'static str {
        match self {
            Direction::Rx => "rx",
            Direction::Tx => "tx",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
