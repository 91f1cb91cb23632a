//! Dynamically typed property values
//!
//! [`PropValue`] is an explicit tagged union. Readers state the type they
//! expect through [`FromPropValue`]; a value that cannot be viewed as that
//! type is handed back so the caller can report a type mismatch.

use std::fmt;
use std::rc::Rc;

use crate::error::PropError;
use crate::iface::{DboardIface, GainGroup, MboardIface};
use crate::key::PropKey;
use crate::node::Node;
use crate::time::TimeSpec;
use crate::types::{ClockConfig, Range, SensorValue, StreamCmd, SubdevSpec};

/// A property value with its runtime type tag
#[derive(Clone)]
pub enum PropValue {
    /// Flag
    Bool(bool),
    /// Integer
    Int(i64),
    /// Real number (rates, frequencies, gains)
    Real(f64),
    /// Text (names, antenna selection)
    Text(String),
    /// Ordered list of names
    Names(Vec<String>),
    /// Device time
    Time(TimeSpec),
    /// Numeric range
    Range(Range),
    /// Channel topology
    SubdevSpec(SubdevSpec),
    /// Sensor reading
    Sensor(SensorValue),
    /// Streaming command
    StreamCmd(StreamCmd),
    /// Clock configuration
    ClockConfig(ClockConfig),
    /// Link to a child node
    Node(Node),
    /// Gain group handle
    GainGroup(Rc<dyn GainGroup>),
    /// Daughterboard interface handle
    DboardIface(Rc<dyn DboardIface>),
    /// Motherboard interface handle
    MboardIface(Rc<dyn MboardIface>),
}

impl PropValue {
    /// Name of the variant, used in type mismatch reports
    pub fn type_name(&self) -> &'static str {
        match self {
            PropValue::Bool(_) => "bool",
            PropValue::Int(_) => "int",
            PropValue::Real(_) => "real",
            PropValue::Text(_) => "text",
            PropValue::Names(_) => "names",
            PropValue::Time(_) => "time",
            PropValue::Range(_) => "range",
            PropValue::SubdevSpec(_) => "subdev_spec",
            PropValue::Sensor(_) => "sensor",
            PropValue::StreamCmd(_) => "stream_cmd",
            PropValue::ClockConfig(_) => "clock_config",
            PropValue::Node(_) => "node",
            PropValue::GainGroup(_) => "gain_group",
            PropValue::DboardIface(_) => "dboard_iface",
            PropValue::MboardIface(_) => "mboard_iface",
        }
    }

    /// View the value as `T`, handing the value back on mismatch
    pub fn into_typed<T: FromPropValue>(self) -> Result<T, PropValue> {
        T::from_prop_value(self)
    }

    /// View the value as `T`, reporting a mismatch against `key`
    pub fn typed_for<T: FromPropValue>(self, key: &PropKey) -> Result<T, PropError> {
        self.into_typed::<T>()
            .map_err(|found| PropError::TypeMismatch {
                key: key.to_string(),
                expected: T::TYPE_NAME,
                found: found.type_name(),
            })
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            PropValue::Int(v) => f.debug_tuple("Int").field(v).finish(),
            PropValue::Real(v) => f.debug_tuple("Real").field(v).finish(),
            PropValue::Text(v) => f.debug_tuple("Text").field(v).finish(),
            PropValue::Names(v) => f.debug_tuple("Names").field(v).finish(),
            PropValue::Time(v) => f.debug_tuple("Time").field(v).finish(),
            PropValue::Range(v) => f.debug_tuple("Range").field(v).finish(),
            PropValue::SubdevSpec(v) => f.debug_tuple("SubdevSpec").field(v).finish(),
            PropValue::Sensor(v) => f.debug_tuple("Sensor").field(v).finish(),
            PropValue::StreamCmd(v) => f.debug_tuple("StreamCmd").field(v).finish(),
            PropValue::ClockConfig(v) => f.debug_tuple("ClockConfig").field(v).finish(),
            PropValue::Node(v) => f.debug_tuple("Node").field(v).finish(),
            PropValue::GainGroup(_) => f.write_str("GainGroup(<handle>)"),
            PropValue::DboardIface(_) => f.write_str("DboardIface(<handle>)"),
            PropValue::MboardIface(_) => f.write_str("MboardIface(<handle>)"),
        }
    }
}

/// Typed view of a [`PropValue`]
pub trait FromPropValue: Sized {
    /// Type name reported on mismatch
    const TYPE_NAME: &'static str;

    /// Convert, or return the original value if it is of another type
    fn from_prop_value(value: PropValue) -> Result<Self, PropValue>;
}

/// Implements `From<T> for PropValue` and `FromPropValue for T` for a variant
macro_rules! impl_prop_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl From<$ty> for PropValue {
            fn from(value: $ty) -> Self {
                PropValue::$variant(value)
            }
        }

        impl FromPropValue for $ty {
            const TYPE_NAME: &'static str = $name;

            fn from_prop_value(value: PropValue) -> Result<Self, PropValue> {
                match value {
                    PropValue::$variant(v) => Ok(v),
                    other => Err(other),
                }
            }
        }
    };
}

impl_prop_value!(bool, Bool, "bool");
impl_prop_value!(i64, Int, "int");
impl_prop_value!(String, Text, "text");
impl_prop_value!(Vec<String>, Names, "names");
impl_prop_value!(TimeSpec, Time, "time");
impl_prop_value!(Range, Range, "range");
impl_prop_value!(SubdevSpec, SubdevSpec, "subdev_spec");
impl_prop_value!(SensorValue, Sensor, "sensor");
impl_prop_value!(StreamCmd, StreamCmd, "stream_cmd");
impl_prop_value!(ClockConfig, ClockConfig, "clock_config");
impl_prop_value!(Node, Node, "node");
impl_prop_value!(Rc<dyn GainGroup>, GainGroup, "gain_group");
impl_prop_value!(Rc<dyn DboardIface>, DboardIface, "dboard_iface");
impl_prop_value!(Rc<dyn MboardIface>, MboardIface, "mboard_iface");

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Real(value)
    }
}

impl FromPropValue for f64 {
    const TYPE_NAME: &'static str = "real";

    fn from_prop_value(value: PropValue) -> Result<Self, PropValue> {
        match value {
            PropValue::Real(v) => Ok(v),
            PropValue::Int(v) => Ok(v as f64),
            other => Err(other),
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl FromPropValue for PropValue {
    const TYPE_NAME: &'static str = "any";

    fn from_prop_value(value: PropValue) -> Result<Self, PropValue> {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_view() {
        let v = PropValue::from(2.5);
        assert_eq!(v.type_name(), "real");
        assert_eq!(v.into_typed::<f64>().unwrap(), 2.5);
    }

    #[test]
    fn test_int_widens_to_real() {
        assert_eq!(PropValue::Int(7).into_typed::<f64>().unwrap(), 7.0);
    }

    #[test]
    fn test_mismatch_returns_value() {
        let err = PropValue::from("RX2").into_typed::<f64>().unwrap_err();
        assert_eq!(err.type_name(), "text");
    }

    #[test]
    fn test_real_does_not_narrow_to_int() {
        assert!(PropValue::Real(1.0).into_typed::<i64>().is_err());
    }
}
