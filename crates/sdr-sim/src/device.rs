//! Simulated device root
//!
//! Assembles one or more simulated motherboards under a device node, the
//! way a transport layer would after enumerating real hardware.

use std::rc::Rc;

use sdr_dboard::{DboardError, DboardRegistry};
use sdr_props::{Node, Prop, PropKey, PropNode, StoreNode};

use crate::clock::SimClock;
use crate::mboard::{SimMboard, SimMboardConfig};
use crate::sim_registry;

/// A simulated multi-board device sharing one simulated clock
pub struct SimDevice {
    root: Node,
    mboards: Vec<Rc<SimMboard>>,
    clock: SimClock,
}

impl SimDevice {
    /// Build a device from per-board configurations
    pub fn new(configs: Vec<SimMboardConfig>) -> Result<Self, DboardError> {
        Self::with_registry(&sim_registry(), configs)
    }

    /// Build a device resolving daughterboards through `registry`
    pub fn with_registry(
        registry: &DboardRegistry,
        configs: Vec<SimMboardConfig>,
    ) -> Result<Self, DboardError> {
        let clock = SimClock::new();
        let mut mboards = Vec::with_capacity(configs.len());
        for config in configs {
            mboards.push(Rc::new(SimMboard::new(
                config,
                registry,
                Rc::new(clock.clone()),
            )?));
        }

        let names: Vec<String> = (0..mboards.len()).map(|i| i.to_string()).collect();
        let mut root = StoreNode::new()
            .with(Prop::Name, "Sim device")
            .with(Prop::MboardNames, names.clone());
        for (name, mboard) in names.into_iter().zip(&mboards) {
            let node: Rc<dyn PropNode> = mboard.clone();
            root = root.with(PropKey::named(Prop::Mboard, name), Node::from_rc(node));
        }

        Ok(Self {
            root: Node::new(root),
            mboards,
            clock,
        })
    }

    /// A device of `count` default boards
    pub fn with_mboards(count: usize) -> Result<Self, DboardError> {
        let configs = (0..count)
            .map(|i| SimMboardConfig {
                name: format!("SIM-B{}", i + 1),
                ..Default::default()
            })
            .collect();
        Self::new(configs)
    }

    /// Root node of the device tree
    pub fn root(&self) -> Node {
        self.root.clone()
    }

    /// Clock every board runs from
    pub fn clock(&self) -> SimClock {
        self.clock.clone()
    }

    /// A motherboard by index
    pub fn mboard(&self, index: usize) -> Option<&Rc<SimMboard>> {
        self.mboards.get(index)
    }

    /// Number of motherboards
    pub fn num_mboards(&self) -> usize {
        self.mboards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_lists_mboards() {
        let device = SimDevice::with_mboards(3).unwrap();
        let root = device.root();

        let names: Vec<String> = root.get_as(Prop::MboardNames).unwrap();
        assert_eq!(names, vec!["0", "1", "2"]);

        let mb = root.child(Prop::Mboard.named("2")).unwrap();
        assert_eq!(mb.get_as::<String>(Prop::Name).unwrap(), "SIM-B3");
    }

    #[test]
    fn test_unknown_dboard_fails_build() {
        let config = SimMboardConfig {
            rx_dboard_id: 0x0bad,
            ..Default::default()
        };
        assert!(matches!(
            SimDevice::new(vec![config]),
            Err(DboardError::UnknownId { .. })
        ));
    }
}
