//! Daughterboard manager
//!
//! One manager per motherboard. It resolves the identity codes read from the
//! RX and TX slots, puts the slot GPIO into a known state and builds one
//! driver instance per sub-device, filed by name per direction.

use std::cell::RefCell;
use std::rc::Rc;

use sdr_props::{AtrReg, DboardIface, Direction, GpioBank, Node, PropError};
use tracing::{debug, info, warn};

use crate::driver::{CtorArgs, DboardCtor};
use crate::error::DboardError;
use crate::id::DboardId;
use crate::proxy::{SharedDboard, SubdevProxy};
use crate::registry::DboardRegistry;

/// Direction register value making every pin an input
pub const GPIO_ALL_INPUTS: u16 = 0xffff;
/// Mask covering every pin of a bank
pub const GPIO_ALL_PINS: u16 = 0xffff;

/// Owner of the daughterboard drivers of one motherboard
pub struct DboardManager {
    rx_id: DboardId,
    tx_id: DboardId,
    transceiver: bool,
    rx_subdevs: Vec<(String, Node)>,
    tx_subdevs: Vec<(String, Node)>,
}

impl DboardManager {
    /// Build the drivers for a motherboard's RX and TX slots
    ///
    /// Fails before touching the hardware if either identity code is not
    /// registered. GPIO is initialized before any driver constructor runs.
    pub fn new(
        registry: &DboardRegistry,
        rx_id: DboardId,
        tx_id: DboardId,
        iface: Rc<dyn DboardIface>,
    ) -> Result<Self, DboardError> {
        let rx_entry = registry
            .resolve(rx_id)
            .inspect_err(|_| warn!("Unknown rx dboard id: {}", rx_id))?;
        let tx_entry = registry
            .resolve(tx_id)
            .inspect_err(|_| warn!("Unknown tx dboard id: {}", tx_id))?;

        init_gpio(iface.as_ref())?;

        let mut manager = Self {
            rx_id,
            tx_id,
            transceiver: rx_entry.ctor.same_factory(&tx_entry.ctor),
            rx_subdevs: Vec::new(),
            tx_subdevs: Vec::new(),
        };

        if manager.transceiver {
            // One instance per sub-device, seen from both directions
            for name in &rx_entry.subdev_names {
                let xcvr = make_shared(&rx_entry.ctor, name, &iface)?;
                manager.file(Direction::Rx, name, xcvr.clone());
                manager.file(Direction::Tx, name, xcvr);
            }
        } else {
            for name in &rx_entry.subdev_names {
                let rx = make_shared(&rx_entry.ctor, name, &iface)?;
                manager.file(Direction::Rx, name, rx);
            }
            for name in &tx_entry.subdev_names {
                let tx = make_shared(&tx_entry.ctor, name, &iface)?;
                manager.file(Direction::Tx, name, tx);
            }
        }

        info!(
            "Built dboards: rx {} ({}), tx {} ({}){}",
            rx_id,
            rx_entry.ctor.name(),
            tx_id,
            tx_entry.ctor.name(),
            if manager.transceiver { " [xcvr]" } else { "" }
        );

        Ok(manager)
    }

    /// Identity code of the RX slot
    pub fn rx_id(&self) -> DboardId {
        self.rx_id
    }

    /// Identity code of the TX slot
    pub fn tx_id(&self) -> DboardId {
        self.tx_id
    }

    /// Whether RX and TX are served by one shared driver per sub-device
    pub fn is_transceiver(&self) -> bool {
        self.transceiver
    }

    /// RX sub-device names in the order they were built
    pub fn rx_subdev_names(&self) -> Vec<String> {
        self.subdev_names(Direction::Rx)
    }

    /// TX sub-device names in the order they were built
    pub fn tx_subdev_names(&self) -> Vec<String> {
        self.subdev_names(Direction::Tx)
    }

    /// Node for an RX sub-device
    pub fn rx_subdev(&self, name: &str) -> Result<Node, DboardError> {
        self.subdev(Direction::Rx, name)
    }

    /// Node for a TX sub-device
    pub fn tx_subdev(&self, name: &str) -> Result<Node, DboardError> {
        self.subdev(Direction::Tx, name)
    }

    /// Sub-device names for a direction
    pub fn subdev_names(&self, direction: Direction) -> Vec<String> {
        self.filed(direction)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Node for a sub-device in a direction
    pub fn subdev(&self, direction: Direction, name: &str) -> Result<Node, DboardError> {
        self.filed(direction)
            .iter()
            .find(|(filed, _)| filed == name)
            .map(|(_, node)| node.clone())
            .ok_or_else(|| DboardError::UnknownSubdev {
                direction,
                name: name.to_string(),
            })
    }

    fn filed(&self, direction: Direction) -> &Vec<(String, Node)> {
        match direction {
            Direction::Rx => &self.rx_subdevs,
            Direction::Tx => &self.tx_subdevs,
        }
    }

    fn file(&mut self, direction: Direction, name: &str, dboard: SharedDboard) {
        let node = Node::new(SubdevProxy::new(dboard, direction));
        let filed = match direction {
            Direction::Rx => &mut self.rx_subdevs,
            Direction::Tx => &mut self.tx_subdevs,
        };
        match filed.iter_mut().find(|(filed, _)| filed == name) {
            Some(slot) => slot.1 = node,
            None => filed.push((name.to_string(), node)),
        }
        debug!("Filed {} subdev \"{}\"", direction, name);
    }
}

impl std::fmt::Debug for DboardManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DboardManager")
            .field("rx_id", &self.rx_id)
            .field("tx_id", &self.tx_id)
            .field("transceiver", &self.transceiver)
            .field("rx_subdevs", &self.rx_subdev_names())
            .field("tx_subdevs", &self.tx_subdev_names())
            .finish()
    }
}

/// Put both GPIO banks into a known state: inputs, low, software controlled
fn init_gpio(iface: &dyn DboardIface) -> Result<(), PropError> {
    iface.set_gpio_ddr(GpioBank::Rx, GPIO_ALL_INPUTS, GPIO_ALL_PINS)?;
    iface.set_gpio_ddr(GpioBank::Tx, GPIO_ALL_INPUTS, GPIO_ALL_PINS)?;

    iface.write_gpio(GpioBank::Rx, 0x0000, GPIO_ALL_PINS)?;
    iface.write_gpio(GpioBank::Tx, 0x0000, GPIO_ALL_PINS)?;

    iface.set_atr_reg(GpioBank::Rx, AtrReg::DISABLED)?;
    iface.set_atr_reg(GpioBank::Tx, AtrReg::DISABLED)?;
    Ok(())
}

fn make_shared(
    ctor: &DboardCtor,
    subdev_name: &str,
    iface: &Rc<dyn DboardIface>,
) -> Result<SharedDboard, DboardError> {
    let dboard = ctor.make(CtorArgs {
        subdev_name: subdev_name.to_string(),
        iface: Rc::clone(iface),
    })?;
    Ok(Rc::new(RefCell::new(dboard)))
}
