//! Daughterboard driver seam
//!
//! Concrete drivers implement [`Dboard`]; the manager builds them through a
//! [`DboardCtor`] registered for their identity code.

use std::fmt;
use std::rc::Rc;

use sdr_props::{DboardIface, PropError, PropKey, PropValue};

use crate::error::DboardError;

/// A daughterboard driver instance
///
/// One instance serves one sub-device. The RX and TX handlers are separate so
/// that a transceiver can expose different attributes per direction while
/// sharing its hardware state.
pub trait Dboard {
    /// Read an RX-side property
    fn rx_get(&self, key: &PropKey) -> Result<PropValue, PropError>;

    /// Write an RX-side property
    fn rx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError>;

    /// Read a TX-side property
    fn tx_get(&self, key: &PropKey) -> Result<PropValue, PropError>;

    /// Write a TX-side property
    fn tx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError>;
}

/// Arguments handed to a driver constructor
#[derive(Clone)]
pub struct CtorArgs {
    /// Sub-device this instance serves
    pub subdev_name: String,
    /// GPIO / register interface of the slot
    pub iface: Rc<dyn DboardIface>,
}

impl fmt::Debug for CtorArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CtorArgs")
            .field("subdev_name", &self.subdev_name)
            .field("iface", &"<iface>")
            .finish()
    }
}

/// Constructor function signature
pub type MakeFn = dyn Fn(CtorArgs) -> Result<Box<dyn Dboard>, DboardError>;

/// A named driver constructor
///
/// Clones share the underlying factory. Two identity codes registered with
/// clones of one constructor are served by the same factory, which is how
/// the manager recognizes a transceiver. The name is only a label.
#[derive(Clone)]
pub struct DboardCtor {
    name: String,
    make: Rc<MakeFn>,
}

impl DboardCtor {
    /// Create a constructor
    pub fn new<F>(name: impl Into<String>, make: F) -> Self
    where
        F: Fn(CtorArgs) -> Result<Box<dyn Dboard>, DboardError> + 'static,
    {
        Self {
            name: name.into(),
            make: Rc::new(make),
        }
    }

    /// Factory name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build a driver instance
    pub fn make(&self, args: CtorArgs) -> Result<Box<dyn Dboard>, DboardError> {
        (self.make)(args)
    }

    /// Whether both constructors are clones of the same factory
    pub fn same_factory(&self, other: &DboardCtor) -> bool {
        Rc::ptr_eq(&self.make, &other.make)
    }
}

impl fmt::Debug for DboardCtor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DboardCtor").field("name", &self.name).finish()
    }
}
