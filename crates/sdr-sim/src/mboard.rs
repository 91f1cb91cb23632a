//! Simulated motherboard
//!
//! Serves the motherboard keys of the property tree: clocking, device time,
//! sub-device specs, the DSP chains and the two daughterboard slots.
//!
//! Device time runs off the injected host [`Clock`]. PPS edges arrive once
//! per period (whole host seconds by default, shifted by a per-board phase);
//! a time armed through `TimeNextPps` is latched on the first edge after
//! the arm.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sdr_dboard::{DboardError, DboardId, DboardManager, DboardRegistry};
use sdr_props::{
    Clock, ClockConfig, DboardIface, Direction, MboardIface, Node, Prop, PropError, PropKey,
    PropNode, PropValue, RefSource, SensorValue, SubdevSpec, SubdevSpecPair, TimeSpec,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dboard::SimDboardNode;
use crate::dsp::SimDsp;
use crate::iface::{SimDboardIface, SimMboardIface};

/// Name of the single daughterboard slot per direction
pub const DBOARD_SLOT: &str = "A";

/// Configuration for one simulated motherboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimMboardConfig {
    /// Board name reported through the tree
    pub name: String,
    /// Initial master clock rate in Hz
    pub clock_rate: f64,
    /// Lowest accepted master clock rate in Hz
    pub min_clock_rate: f64,
    /// Highest accepted master clock rate in Hz
    pub max_clock_rate: f64,
    /// Number of RX DSP chains
    pub rx_dsps: usize,
    /// Number of TX DSP chains
    pub tx_dsps: usize,
    /// Identity code read from the RX slot
    pub rx_dboard_id: u16,
    /// Identity code read from the TX slot
    pub tx_dboard_id: u16,
    /// Whether a PPS signal reaches the board
    pub pps_connected: bool,
    /// Offset of the first PPS edge from host time zero, in seconds
    pub pps_phase: f64,
    /// Time between PPS edges in host seconds; 1.0 for a true PPS source
    pub pps_period_secs: f64,
    /// Constant error added to every time read, in seconds
    pub time_error: f64,
    /// Whether an external 10 MHz reference is present
    pub ext_ref_connected: bool,
}

impl Default for SimMboardConfig {
    fn default() -> Self {
        Self {
            name: "SIM-B1".to_string(),
            clock_rate: 64e6,
            min_clock_rate: 10e6,
            max_clock_rate: 100e6,
            rx_dsps: 2,
            tx_dsps: 1,
            rx_dboard_id: crate::SIM_XCVR_ID.as_u16(),
            tx_dboard_id: crate::SIM_XCVR_ID.as_u16(),
            pps_connected: true,
            pps_phase: 0.0,
            pps_period_secs: 1.0,
            time_error: 0.0,
            ext_ref_connected: true,
        }
    }
}

/// Device timekeeping of one board
#[derive(Debug, Default)]
struct Timekeeper {
    /// Device time minus host time, in seconds
    offset: f64,
    /// Armed time and the host time it was armed at
    armed: Option<(TimeSpec, f64)>,
}

/// A simulated motherboard
pub struct SimMboard {
    config: SimMboardConfig,
    clock: Rc<dyn Clock>,
    clock_rate: Rc<Cell<f64>>,
    time: RefCell<Timekeeper>,
    next_pps_writes: Cell<usize>,
    pps_connected: Cell<bool>,
    time_error: Cell<f64>,
    clock_config: Cell<ClockConfig>,
    rx_spec: RefCell<SubdevSpec>,
    tx_spec: RefCell<SubdevSpec>,
    rx_dsps: Vec<Rc<SimDsp>>,
    tx_dsps: Vec<Rc<SimDsp>>,
    rx_dboard: Node,
    tx_dboard: Node,
    manager: Rc<DboardManager>,
    dboard_iface: Rc<SimDboardIface>,
    mboard_iface: Rc<SimMboardIface>,
}

impl SimMboard {
    /// Build a motherboard and its daughterboards
    pub fn new(
        config: SimMboardConfig,
        registry: &DboardRegistry,
        clock: Rc<dyn Clock>,
    ) -> Result<Self, DboardError> {
        let dboard_iface = Rc::new(SimDboardIface::new());
        let iface: Rc<dyn DboardIface> = dboard_iface.clone();
        let manager = Rc::new(DboardManager::new(
            registry,
            DboardId(config.rx_dboard_id),
            DboardId(config.tx_dboard_id),
            iface.clone(),
        )?);

        let clock_rate = Rc::new(Cell::new(config.clock_rate));
        let rx_dsps = (0..config.rx_dsps)
            .map(|i| Rc::new(SimDsp::new(Direction::Rx, i, clock_rate.clone())))
            .collect();
        let tx_dsps = (0..config.tx_dsps)
            .map(|i| Rc::new(SimDsp::new(Direction::Tx, i, clock_rate.clone())))
            .collect();

        let rx_spec = default_spec(&manager, Direction::Rx, config.rx_dsps);
        let tx_spec = default_spec(&manager, Direction::Tx, config.tx_dsps);

        info!(
            "Sim mboard {}: rx spec \"{}\", tx spec \"{}\"",
            config.name, rx_spec, tx_spec
        );

        Ok(Self {
            clock,
            clock_rate,
            time: RefCell::new(Timekeeper::default()),
            next_pps_writes: Cell::new(0),
            pps_connected: Cell::new(config.pps_connected),
            time_error: Cell::new(config.time_error),
            clock_config: Cell::new(ClockConfig::default()),
            rx_spec: RefCell::new(rx_spec),
            tx_spec: RefCell::new(tx_spec),
            rx_dsps,
            tx_dsps,
            rx_dboard: Node::new(SimDboardNode::new(
                Direction::Rx,
                manager.clone(),
                iface.clone(),
            )),
            tx_dboard: Node::new(SimDboardNode::new(Direction::Tx, manager.clone(), iface)),
            manager,
            dboard_iface,
            mboard_iface: Rc::new(SimMboardIface::new()),
            config,
        })
    }

    /// Board name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Connect or disconnect the PPS input
    pub fn set_pps_connected(&self, connected: bool) {
        self.pps_connected.set(connected);
    }

    /// Change the constant error added to time reads
    pub fn set_time_error(&self, secs: f64) {
        self.time_error.set(secs);
    }

    /// How many times a time has been armed for the next PPS edge
    pub fn next_pps_writes(&self) -> usize {
        self.next_pps_writes.get()
    }

    /// Daughterboard interface shared by both slots
    pub fn dboard_iface(&self) -> &Rc<SimDboardIface> {
        &self.dboard_iface
    }

    /// Manager owning the daughterboard drivers
    pub fn dboard_manager(&self) -> &Rc<DboardManager> {
        &self.manager
    }

    /// A DSP chain by index
    pub fn dsp(&self, direction: Direction, index: usize) -> Option<&Rc<SimDsp>> {
        self.dsps(direction).get(index)
    }

    /// Current master clock rate
    pub fn clock_rate(&self) -> f64 {
        self.clock_rate.get()
    }

    fn dsps(&self, direction: Direction) -> &[Rc<SimDsp>] {
        match direction {
            Direction::Rx => &self.rx_dsps,
            Direction::Tx => &self.tx_dsps,
        }
    }

    fn spec(&self, direction: Direction) -> &RefCell<SubdevSpec> {
        match direction {
            Direction::Rx => &self.rx_spec,
            Direction::Tx => &self.tx_spec,
        }
    }

    fn host_secs(&self) -> f64 {
        self.clock.elapsed().as_secs_f64()
    }

    /// Most recent PPS edge in host seconds
    fn last_edge(&self, host: f64) -> Option<f64> {
        if !self.pps_connected.get() {
            return None;
        }
        let phase = self.config.pps_phase;
        let period = self.config.pps_period_secs;
        if period.is_nan() || period <= 0.0 {
            return None;
        }
        let edges = ((host - phase) / period).floor();
        (edges >= 0.0).then_some(edges * period + phase)
    }

    /// Apply an armed time if its edge has passed
    fn latch(&self, host: f64) {
        let mut time = self.time.borrow_mut();
        if let Some((armed, armed_at)) = time.armed {
            if let Some(edge) = self.last_edge(host) {
                if edge > armed_at {
                    time.offset = armed.real_secs() - edge;
                    time.armed = None;
                    debug!("{} latched {} at pps edge", self.config.name, armed);
                }
            }
        }
    }

    fn time_now(&self) -> TimeSpec {
        let host = self.host_secs();
        self.latch(host);
        let offset = self.time.borrow().offset;
        TimeSpec::from_secs(host + offset + self.time_error.get())
    }

    fn time_last_pps(&self) -> TimeSpec {
        let host = self.host_secs();
        self.latch(host);
        match self.last_edge(host) {
            Some(edge) => {
                let offset = self.time.borrow().offset;
                TimeSpec::from_secs(edge + offset + self.time_error.get())
            }
            None => TimeSpec::default(),
        }
    }

    fn set_subdev_spec(
        &self,
        direction: Direction,
        key: &PropKey,
        spec: SubdevSpec,
    ) -> Result<(), PropError> {
        let dsps = self.dsps(direction).len();
        if spec.len() > dsps {
            return Err(PropError::invalid(
                key,
                format!("{} channels requested, {} DSPs available", spec.len(), dsps),
            ));
        }
        let subdevs = self.manager.subdev_names(direction);
        for pair in spec.iter() {
            if pair.db_name != DBOARD_SLOT {
                return Err(PropError::invalid(key, format!("no dboard slot {}", pair.db_name)));
            }
            if !subdevs.contains(&pair.sd_name) {
                return Err(PropError::invalid(key, format!("no subdev {}", pair)));
            }
        }
        debug!("{} {} spec \"{}\"", self.config.name, direction, spec);
        *self.spec(direction).borrow_mut() = spec;
        Ok(())
    }

    fn dsp_names(&self, direction: Direction) -> Vec<String> {
        (0..self.dsps(direction).len()).map(|i| i.to_string()).collect()
    }

    fn dsp_node(&self, direction: Direction, key: &PropKey) -> Result<PropValue, PropError> {
        let dsp = key
            .index_or_empty()
            .parse::<usize>()
            .ok()
            .and_then(|i| self.dsp(direction, i))
            .ok_or_else(|| PropError::UnknownKey(key.to_string()))?;
        let node: Rc<dyn PropNode> = dsp.clone();
        Ok(Node::from_rc(node).into())
    }

    fn dboard_node(&self, direction: Direction, key: &PropKey) -> Result<PropValue, PropError> {
        if key.index_or_empty() != DBOARD_SLOT {
            return Err(PropError::UnknownKey(key.to_string()));
        }
        let node = match direction {
            Direction::Rx => &self.rx_dboard,
            Direction::Tx => &self.tx_dboard,
        };
        Ok(node.clone().into())
    }

    fn ref_locked(&self) -> bool {
        match self.clock_config.get().ref_source {
            RefSource::Internal => true,
            RefSource::Sma | RefSource::Mimo => self.config.ext_ref_connected,
        }
    }
}

impl PropNode for SimMboard {
    fn get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        match key.prop {
            Prop::Name => Ok(self.config.name.as_str().into()),
            Prop::ClockRate => Ok(PropValue::Real(self.clock_rate.get())),
            Prop::TimeNow => Ok(self.time_now().into()),
            Prop::TimePps => Ok(self.time_last_pps().into()),
            Prop::ClockConfig => Ok(self.clock_config.get().into()),
            Prop::RxSubdevSpec => Ok(self.rx_spec.borrow().clone().into()),
            Prop::TxSubdevSpec => Ok(self.tx_spec.borrow().clone().into()),
            Prop::RxDspNames => Ok(self.dsp_names(Direction::Rx).into()),
            Prop::TxDspNames => Ok(self.dsp_names(Direction::Tx).into()),
            Prop::RxDsp => self.dsp_node(Direction::Rx, key),
            Prop::TxDsp => self.dsp_node(Direction::Tx, key),
            Prop::RxDboardNames | Prop::TxDboardNames => {
                Ok(vec![DBOARD_SLOT.to_string()].into())
            }
            Prop::RxDboard => self.dboard_node(Direction::Rx, key),
            Prop::TxDboard => self.dboard_node(Direction::Tx, key),
            Prop::SensorNames => Ok(vec!["ref_locked".to_string()].into()),
            Prop::Sensor if key.index_or_empty() == "ref_locked" => Ok(SensorValue::boolean(
                "ref_locked",
                self.ref_locked(),
                "locked",
                "unlocked",
            )
            .into()),
            Prop::Iface => {
                let iface: Rc<dyn MboardIface> = self.mboard_iface.clone();
                Ok(iface.into())
            }
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }

    fn set(&self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        match key.prop {
            Prop::ClockRate => {
                let rate: f64 = value.typed_for(key)?;
                if rate < self.config.min_clock_rate || rate > self.config.max_clock_rate {
                    return Err(PropError::invalid(
                        key,
                        format!("{:.3} MHz is outside the clock range", rate / 1e6),
                    ));
                }
                self.clock_rate.set(rate);
                Ok(())
            }
            Prop::TimeNow => {
                let time: TimeSpec = value.typed_for(key)?;
                let host = self.host_secs();
                self.latch(host);
                self.time.borrow_mut().offset = time.real_secs() - host;
                Ok(())
            }
            Prop::TimeNextPps => {
                let time: TimeSpec = value.typed_for(key)?;
                let host = self.host_secs();
                self.latch(host);
                self.time.borrow_mut().armed = Some((time, host));
                self.next_pps_writes.set(self.next_pps_writes.get() + 1);
                debug!("{} armed {} for next pps", self.config.name, time);
                Ok(())
            }
            Prop::ClockConfig => {
                self.clock_config.set(value.typed_for(key)?);
                Ok(())
            }
            Prop::RxSubdevSpec => self.set_subdev_spec(Direction::Rx, key, value.typed_for(key)?),
            Prop::TxSubdevSpec => self.set_subdev_spec(Direction::Tx, key, value.typed_for(key)?),
            Prop::Name | Prop::TimePps | Prop::SensorNames | Prop::Sensor => {
                Err(PropError::ReadOnly(key.to_string()))
            }
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }
}

/// One channel on the first sub-device of the slot
fn default_spec(manager: &DboardManager, direction: Direction, dsps: usize) -> SubdevSpec {
    let mut spec = SubdevSpec::new();
    if dsps > 0 {
        if let Some(first) = manager.subdev_names(direction).into_iter().next() {
            spec.push(SubdevSpecPair::new(DBOARD_SLOT, first));
        }
    }
    spec
}
