//! Simulated transceiver daughterboard
//!
//! One driver instance serves both chains of a sub-device. The two chains
//! keep their own LO, gains and bandwidth but share the antenna switch: the
//! "TX/RX" port can be routed to one chain at a time, so selecting it for
//! transmit moves the receiver over to "RX2".

use std::rc::Rc;

use sdr_dboard::{CtorArgs, Dboard, DboardCtor, DboardId};
use sdr_props::{
    DboardIface, Direction, GpioBank, Prop, PropError, PropKey, PropValue, Range, SensorValue,
};
use tracing::debug;

/// Identity code the simulated transceiver reports in both slots
pub const SIM_XCVR_ID: DboardId = DboardId(0x0062);

/// Tunable LO range
pub const LO_RANGE: Range = Range {
    start: 50e6,
    stop: 6e9,
    step: 100e3,
};

const TXRX_PORT: &str = "TX/RX";
const RX2_PORT: &str = "RX2";

/// Output latch bit driving the TX/RX port to the receiver
const ANT_SW_RX_BIT: u16 = 1 << 6;

#[derive(Debug, Clone)]
struct GainStage {
    name: &'static str,
    range: Range,
    value: f64,
}

#[derive(Debug, Clone)]
struct Chain {
    lo_freq: f64,
    gains: Vec<GainStage>,
    bandwidth: f64,
    enabled: bool,
}

impl Chain {
    fn new(gains: Vec<GainStage>, bandwidth: f64) -> Self {
        Self {
            lo_freq: LO_RANGE.start,
            gains,
            bandwidth,
            enabled: true,
        }
    }

    fn stage(&self, key: &PropKey) -> Result<&GainStage, PropError> {
        let name = key.index_or_empty();
        self.gains
            .iter()
            .find(|stage| stage.name == name)
            .ok_or_else(|| PropError::UnknownKey(key.to_string()))
    }

    fn stage_mut(&mut self, key: &PropKey) -> Result<&mut GainStage, PropError> {
        let name = key.index_or_empty();
        self.gains
            .iter_mut()
            .find(|stage| stage.name == name)
            .ok_or_else(|| PropError::UnknownKey(key.to_string()))
    }
}

/// Simulated wideband transceiver
pub struct SimXcvr {
    subdev_name: String,
    iface: Rc<dyn DboardIface>,
    rx: Chain,
    tx: Chain,
    /// Which chain owns the TX/RX port
    txrx_owner: Direction,
    temperature: f64,
}

impl SimXcvr {
    /// Create a transceiver instance for one sub-device
    pub fn new(subdev_name: &str, iface: Rc<dyn DboardIface>) -> Self {
        let rx_gains = vec![
            GainStage {
                name: "LNA",
                range: Range::with_step(0.0, 30.0, 1.0),
                value: 0.0,
            },
            GainStage {
                name: "PGA",
                range: Range::with_step(0.0, 40.0, 0.5),
                value: 0.0,
            },
        ];
        let tx_gains = vec![GainStage {
            name: "PA",
            range: Range::with_step(0.0, 25.0, 0.25),
            value: 0.0,
        }];

        Self {
            subdev_name: subdev_name.to_string(),
            iface,
            rx: Chain::new(rx_gains, 20e6),
            tx: Chain::new(tx_gains, 20e6),
            txrx_owner: Direction::Rx,
            temperature: 41.5,
        }
    }

    /// Constructor to register under [`SIM_XCVR_ID`]
    pub fn ctor() -> DboardCtor {
        DboardCtor::new("sim_xcvr", |args: CtorArgs| {
            Ok(Box::new(SimXcvr::new(&args.subdev_name, args.iface)) as Box<dyn Dboard>)
        })
    }

    fn chain(&self, direction: Direction) -> &Chain {
        match direction {
            Direction::Rx => &self.rx,
            Direction::Tx => &self.tx,
        }
    }

    fn chain_mut(&mut self, direction: Direction) -> &mut Chain {
        match direction {
            Direction::Rx => &mut self.rx,
            Direction::Tx => &mut self.tx,
        }
    }

    fn antenna(&self, direction: Direction) -> &'static str {
        match direction {
            Direction::Rx if self.txrx_owner == Direction::Rx => TXRX_PORT,
            Direction::Rx => RX2_PORT,
            Direction::Tx => TXRX_PORT,
        }
    }

    fn antennas(direction: Direction) -> Vec<String> {
        match direction {
            Direction::Rx => vec![TXRX_PORT.into(), RX2_PORT.into()],
            Direction::Tx => vec![TXRX_PORT.into()],
        }
    }

    fn route_txrx(&mut self, owner: Direction) -> Result<(), PropError> {
        let level = match owner {
            Direction::Rx => ANT_SW_RX_BIT,
            Direction::Tx => 0,
        };
        self.iface.write_gpio(GpioBank::Rx, level, ANT_SW_RX_BIT)?;
        self.txrx_owner = owner;
        Ok(())
    }

    fn get(&self, direction: Direction, key: &PropKey) -> Result<PropValue, PropError> {
        let chain = self.chain(direction);
        match key.prop {
            Prop::Name => Ok(format!("Sim XCVR {} ({})", direction, self.subdev_name).into()),
            Prop::Freq => Ok(PropValue::Real(chain.lo_freq)),
            Prop::FreqRange => Ok(LO_RANGE.into()),
            Prop::Gain => Ok(PropValue::Real(chain.stage(key)?.value)),
            Prop::GainRange => Ok(chain.stage(key)?.range.into()),
            Prop::GainNames => Ok(chain
                .gains
                .iter()
                .map(|stage| stage.name.to_string())
                .collect::<Vec<_>>()
                .into()),
            Prop::Antenna => Ok(self.antenna(direction).into()),
            Prop::AntennaNames => Ok(Self::antennas(direction).into()),
            Prop::Bandwidth => Ok(PropValue::Real(chain.bandwidth)),
            Prop::Connection => Ok("IQ".into()),
            Prop::Enabled => Ok(chain.enabled.into()),
            Prop::LoLocked => Ok(chain.enabled.into()),
            Prop::SensorNames => Ok(vec!["lo_locked".to_string(), "temp".to_string()].into()),
            Prop::Sensor => match key.index_or_empty() {
                "lo_locked" => Ok(SensorValue::boolean(
                    "lo_locked",
                    chain.enabled,
                    "locked",
                    "unlocked",
                )
                .into()),
                "temp" => Ok(SensorValue::real("temp", self.temperature, "C").into()),
                _ => Err(PropError::UnknownKey(key.to_string())),
            },
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }

    fn set(
        &mut self,
        direction: Direction,
        key: &PropKey,
        value: PropValue,
    ) -> Result<(), PropError> {
        match key.prop {
            Prop::Freq => {
                let target = value.typed_for::<f64>(key)?;
                let chain = self.chain_mut(direction);
                chain.lo_freq = LO_RANGE.clip(target, true);
                debug!("{} LO {:.6} MHz", direction, chain.lo_freq / 1e6);
                Ok(())
            }
            Prop::Gain => {
                let gain = value.typed_for::<f64>(key)?;
                let stage = self.chain_mut(direction).stage_mut(key)?;
                stage.value = stage.range.clip(gain, true);
                Ok(())
            }
            Prop::Antenna => {
                let antenna = value.typed_for::<String>(key)?;
                if !Self::antennas(direction).contains(&antenna) {
                    return Err(PropError::invalid(key, format!("no antenna named {}", antenna)));
                }
                match (direction, antenna.as_str()) {
                    (Direction::Rx, TXRX_PORT) => self.route_txrx(Direction::Rx),
                    (Direction::Rx, _) => {
                        if self.txrx_owner == Direction::Rx {
                            self.route_txrx(Direction::Tx)?;
                        }
                        Ok(())
                    }
                    (Direction::Tx, _) => self.route_txrx(Direction::Tx),
                }
            }
            Prop::Bandwidth => {
                let bandwidth = value.typed_for::<f64>(key)?;
                self.chain_mut(direction).bandwidth = bandwidth.clamp(1e6, 40e6);
                Ok(())
            }
            Prop::Enabled => {
                let enabled = value.typed_for::<bool>(key)?;
                self.chain_mut(direction).enabled = enabled;
                Ok(())
            }
            Prop::Name
            | Prop::FreqRange
            | Prop::GainRange
            | Prop::GainNames
            | Prop::AntennaNames
            | Prop::Connection
            | Prop::LoLocked
            | Prop::SensorNames
            | Prop::Sensor => Err(PropError::ReadOnly(key.to_string())),
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }
}

impl Dboard for SimXcvr {
    fn rx_get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        self.get(Direction::Rx, key)
    }

    fn rx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        self.set(Direction::Rx, key, value)
    }

    fn tx_get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        self.get(Direction::Tx, key)
    }

    fn tx_set(&mut self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        self.set(Direction::Tx, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iface::SimDboardIface;

    fn xcvr() -> (SimXcvr, Rc<SimDboardIface>) {
        let iface = Rc::new(SimDboardIface::new());
        (SimXcvr::new("0", iface.clone()), iface)
    }

    fn key(prop: Prop) -> PropKey {
        PropKey::new(prop)
    }

    #[test]
    fn test_lo_snaps_to_step() {
        let (mut xcvr, _) = xcvr();
        xcvr.rx_set(&key(Prop::Freq), PropValue::Real(915.03e6)).unwrap();
        let lo = xcvr.rx_get(&key(Prop::Freq)).unwrap().into_typed::<f64>().unwrap();
        assert!((lo - 915.0e6).abs() < 1e-3);

        xcvr.tx_set(&key(Prop::Freq), PropValue::Real(10e9)).unwrap();
        let lo = xcvr.tx_get(&key(Prop::Freq)).unwrap().into_typed::<f64>().unwrap();
        assert_eq!(lo, LO_RANGE.stop);
    }

    #[test]
    fn test_chains_keep_separate_lo() {
        let (mut xcvr, _) = xcvr();
        xcvr.rx_set(&key(Prop::Freq), PropValue::Real(100e6)).unwrap();
        xcvr.tx_set(&key(Prop::Freq), PropValue::Real(200e6)).unwrap();
        let rx = xcvr.rx_get(&key(Prop::Freq)).unwrap().into_typed::<f64>().unwrap();
        assert_eq!(rx, 100e6);
    }

    #[test]
    fn test_gain_stages() {
        let (mut xcvr, _) = xcvr();
        let pga = PropKey::named(Prop::Gain, "PGA");
        xcvr.rx_set(&pga, PropValue::Real(12.3)).unwrap();
        assert_eq!(xcvr.rx_get(&pga).unwrap().into_typed::<f64>().unwrap(), 12.5);

        let err = xcvr.tx_set(&pga, PropValue::Real(1.0)).unwrap_err();
        assert_eq!(err, PropError::UnknownKey("gain[PGA]".into()));
    }

    #[test]
    fn test_txrx_port_is_shared() {
        let (mut xcvr, iface) = xcvr();
        assert_eq!(xcvr.antenna(Direction::Rx), TXRX_PORT);

        xcvr.tx_set(&key(Prop::Antenna), TXRX_PORT.into()).unwrap();
        let rx_ant = xcvr.rx_get(&key(Prop::Antenna)).unwrap().into_typed::<String>().unwrap();
        assert_eq!(rx_ant, RX2_PORT);
        assert_eq!(iface.out(GpioBank::Rx) & ANT_SW_RX_BIT, 0);

        xcvr.rx_set(&key(Prop::Antenna), TXRX_PORT.into()).unwrap();
        assert_eq!(iface.out(GpioBank::Rx) & ANT_SW_RX_BIT, ANT_SW_RX_BIT);
    }

    #[test]
    fn test_unknown_antenna_rejected() {
        let (mut xcvr, _) = xcvr();
        let err = xcvr.tx_set(&key(Prop::Antenna), RX2_PORT.into()).unwrap_err();
        assert!(matches!(err, PropError::InvalidValue { .. }));
    }

    #[test]
    fn test_read_only_keys() {
        let (mut xcvr, _) = xcvr();
        let err = xcvr.rx_set(&key(Prop::FreqRange), LO_RANGE.into()).unwrap_err();
        assert_eq!(err, PropError::ReadOnly("freq_range".into()));
    }
}
