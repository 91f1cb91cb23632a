//! Built-in pass-through daughterboards
//!
//! Basic boards carry no mixer, no gain stages and no filters: the signal
//! goes straight to the converters. They answer the same properties in both
//! directions so that a slot seeded with a basic board is usable no matter
//! which chain addresses it.

use sdr_props::{Prop, PropError, PropKey, PropValue, Range};

use crate::driver::{CtorArgs, Dboard, DboardCtor};

/// Which basic board this instance models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BasicKind {
    Rx,
    Tx,
}

/// A pass-through daughterboard
#[derive(Debug, Clone)]
pub struct BasicDboard {
    kind: BasicKind,
    subdev_name: String,
    bandwidth: f64,
}

impl BasicDboard {
    /// Create a basic RX sub-device
    pub fn new_rx(subdev_name: &str) -> Self {
        Self::new(BasicKind::Rx, subdev_name)
    }

    /// Create a basic TX sub-device
    pub fn new_tx(subdev_name: &str) -> Self {
        Self::new(BasicKind::Tx, subdev_name)
    }

    fn new(kind: BasicKind, subdev_name: &str) -> Self {
        Self {
            kind,
            subdev_name: subdev_name.to_string(),
            bandwidth: 0.0,
        }
    }

    /// Constructor registered for the basic RX board
    pub fn rx_ctor() -> DboardCtor {
        DboardCtor::new("basic_rx", |args: CtorArgs| {
            Ok(Box::new(BasicDboard::new_rx(&args.subdev_name)) as Box<dyn Dboard>)
        })
    }

    /// Constructor registered for the basic TX board
    pub fn tx_ctor() -> DboardCtor {
        DboardCtor::new("basic_tx", |args: CtorArgs| {
            Ok(Box::new(BasicDboard::new_tx(&args.subdev_name)) as Box<dyn Dboard>)
        })
    }

    fn label(&self) -> &'static str {
        match self.kind {
            BasicKind::Rx => "Basic RX",
            BasicKind::Tx => "Basic TX",
        }
    }

    /// How the converters see this sub-device
    fn connection(&self) -> &'static str {
        match self.subdev_name.as_str() {
            "a" | "A" => "I",
            "b" | "B" => "Q",
            _ => "IQ",
        }
    }

    fn get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        match key.prop {
            Prop::Name => Ok(format!("{} ({})", self.label(), self.subdev_name).into()),
            Prop::Freq => Ok(PropValue::Real(0.0)),
            Prop::FreqRange => Ok(Range::single(0.0).into()),
            Prop::GainNames => Ok(Vec::<String>::new().into()),
            Prop::Antenna => Ok("".into()),
            Prop::AntennaNames => Ok(vec![String::new()].into()),
            Prop::Bandwidth => Ok(self.bandwidth.into()),
            Prop::Connection => Ok(self.connection().into()),
            Prop::Enabled => Ok(true.into()),
            Prop::LoLocked => Ok(true.into()),
            Prop::SensorNames => Ok(Vec::<String>::new().into()),
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }

    fn set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        match key.prop {
            // No LO to tune; accept so that tuning falls through to the DSP
            Prop::Freq | Prop::Enabled => Ok(()),
            Prop::Antenna => match value {
                PropValue::Text(ant) if ant.is_empty() => Ok(()),
                PropValue::Text(ant) => Err(PropError::invalid(
                    key,
                    format!("basic board has no antenna \"{}\"", ant),
                )),
                other => Err(PropError::TypeMismatch {
                    key: key.to_string(),
                    expected: "text",
                    found: other.type_name(),
                }),
            },
            Prop::Bandwidth => {
                self.bandwidth = value.typed_for(key)?;
                Ok(())
            }
            Prop::Name | Prop::FreqRange | Prop::Connection | Prop::LoLocked => {
                Err(PropError::ReadOnly(key.to_string()))
            }
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }
}

impl Dboard for BasicDboard {
    fn rx_get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        self.get(key)
    }

    fn rx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        self.set(key, value)
    }

    fn tx_get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        self.get(key)
    }

    fn tx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        self.set(key, value)
    }
}
