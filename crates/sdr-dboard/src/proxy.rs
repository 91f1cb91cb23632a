//! Sub-device proxies
//!
//! A proxy presents one direction of a driver instance as a property node.
//! Every access is forwarded as it arrives; nothing is cached.

use std::cell::RefCell;
use std::rc::Rc;

use sdr_props::{Direction, PropError, PropKey, PropNode, PropValue};

use crate::driver::Dboard;

/// Driver instance shared between the proxies that wrap it
pub type SharedDboard = Rc<RefCell<Box<dyn Dboard>>>;

/// Forwards property access to the RX or TX handlers of a driver
pub struct SubdevProxy {
    dboard: SharedDboard,
    direction: Direction,
}

impl SubdevProxy {
    /// Wrap a driver instance for one direction
    pub fn new(dboard: SharedDboard, direction: Direction) -> Self {
        Self { dboard, direction }
    }

    /// Direction this proxy dispatches to
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Whether two proxies wrap the same driver instance
    pub fn shares_dboard_with(&self, other: &SubdevProxy) -> bool {
        Rc::ptr_eq(&self.dboard, &other.dboard)
    }
}

impl PropNode for SubdevProxy {
    fn get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        let dboard = self
            .dboard
            .try_borrow()
            .map_err(|_| PropError::Hardware(format!("dboard busy while reading {}", key)))?;
        match self.direction {
            Direction::Rx => dboard.rx_get(key),
            Direction::Tx => dboard.tx_get(key),
        }
    }

    fn set(&self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        let mut dboard = self
            .dboard
            .try_borrow_mut()
            .map_err(|_| PropError::Hardware(format!("dboard busy while writing {}", key)))?;
        match self.direction {
            Direction::Rx => dboard.rx_set(key, value),
            Direction::Tx => dboard.tx_set(key, value),
        }
    }
}
