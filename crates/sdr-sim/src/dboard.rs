//! Daughterboard slot nodes
//!
//! A motherboard exposes each of its RX and TX slots as a node that lists
//! the sub-devices built by the slot's [`DboardManager`], hands out their
//! proxies and wraps each one in a gain group.

use std::rc::Rc;

use sdr_dboard::DboardManager;
use sdr_props::{
    DboardIface, Direction, GainGroup, Node, Prop, PropError, PropKey, PropNode, PropValue, Range,
    ALL_GAINS,
};

/// One daughterboard slot of a simulated motherboard
pub struct SimDboardNode {
    direction: Direction,
    manager: Rc<DboardManager>,
    iface: Rc<dyn DboardIface>,
}

impl SimDboardNode {
    /// Expose one direction of a manager's sub-devices
    pub fn new(
        direction: Direction,
        manager: Rc<DboardManager>,
        iface: Rc<dyn DboardIface>,
    ) -> Self {
        Self {
            direction,
            manager,
            iface,
        }
    }

    fn subdev(&self, key: &PropKey) -> Result<Node, PropError> {
        self.manager
            .subdev(self.direction, key.index_or_empty())
            .map_err(|_| PropError::UnknownKey(key.to_string()))
    }
}

impl PropNode for SimDboardNode {
    fn get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        match key.prop {
            Prop::Name => {
                let id = match self.direction {
                    Direction::Rx => self.manager.rx_id(),
                    Direction::Tx => self.manager.tx_id(),
                };
                Ok(format!("{} dboard {}", self.direction, id).into())
            }
            Prop::SubdevNames => Ok(self.manager.subdev_names(self.direction).into()),
            Prop::Subdev => Ok(self.subdev(key)?.into()),
            Prop::DboardIface => Ok(Rc::clone(&self.iface).into()),
            Prop::GainGroup => {
                let group: Rc<dyn GainGroup> = Rc::new(SubdevGainGroup::new(self.subdev(key)?));
                Ok(group.into())
            }
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }

    fn set(&self, key: &PropKey, _value: PropValue) -> Result<(), PropError> {
        Err(PropError::ReadOnly(key.to_string()))
    }
}

/// Gain stages of one sub-device presented as a single control
///
/// Individual stages are addressed by name; [`ALL_GAINS`] addresses the sum,
/// distributed over the stages in the order the sub-device lists them.
pub struct SubdevGainGroup {
    subdev: Node,
}

impl SubdevGainGroup {
    /// Group the gain stages of a sub-device
    pub fn new(subdev: Node) -> Self {
        Self { subdev }
    }

    fn stage_range(&self, name: &str) -> Result<Range, PropError> {
        self.subdev.get_as(PropKey::named(Prop::GainRange, name))
    }

    fn stage_value(&self, name: &str) -> Result<f64, PropError> {
        self.subdev.get_as(PropKey::named(Prop::Gain, name))
    }
}

impl GainGroup for SubdevGainGroup {
    fn range(&self, name: &str) -> Result<Range, PropError> {
        if name != ALL_GAINS {
            return self.stage_range(name);
        }
        let mut total = Range::single(0.0);
        for stage in self.names()? {
            let range = self.stage_range(&stage)?;
            total.start += range.start;
            total.stop += range.stop;
            if range.step > 0.0 && (total.step == 0.0 || range.step < total.step) {
                total.step = range.step;
            }
        }
        Ok(total)
    }

    fn value(&self, name: &str) -> Result<f64, PropError> {
        if name != ALL_GAINS {
            return self.stage_value(name);
        }
        self.names()?
            .iter()
            .map(|stage| self.stage_value(stage))
            .sum()
    }

    fn set_value(&self, gain: f64, name: &str) -> Result<(), PropError> {
        if name != ALL_GAINS {
            return self.subdev.set(PropKey::named(Prop::Gain, name), gain);
        }

        // Fill stages in order, each starting from its minimum
        let total = self.range(ALL_GAINS)?;
        if !total.is_valid() {
            return Err(PropError::invalid(
                PropKey::named(Prop::GainRange, ALL_GAINS),
                format!("stage ranges add up to {:?}", total),
            ));
        }
        let mut extra = total.clip(gain, false) - total.start;
        for stage in self.names()? {
            let range = self.stage_range(&stage)?;
            let add = extra.min(range.stop - range.start);
            self.subdev
                .set(PropKey::named(Prop::Gain, stage.as_str()), range.start + add)?;
            extra -= add;
        }
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>, PropError> {
        self.subdev.get_as(Prop::GainNames)
    }
}
