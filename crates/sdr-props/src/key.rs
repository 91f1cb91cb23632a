//! Compound property keys
//!
//! A key is a symbolic [`Prop`] plus an optional index string. The index
//! selects one member of a family: a named sensor, a named motherboard, a
//! named sub-device. The same `Prop` values are reused across node kinds
//! (every node answers [`Prop::Name`]), which keeps key construction uniform.

use std::fmt;

/// Symbolic property names understood by device tree nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prop {
    // ---------------------------------------------------------------------
    // Shared by every node kind
    // ---------------------------------------------------------------------
    /// Human-readable name of the node
    Name,
    /// Names of the sensors a node offers
    SensorNames,
    /// A named sensor reading (indexed by sensor name)
    Sensor,

    // ---------------------------------------------------------------------
    // Device
    // ---------------------------------------------------------------------
    /// Ordered list of motherboard names
    MboardNames,
    /// A motherboard node (indexed by motherboard name)
    Mboard,

    // ---------------------------------------------------------------------
    // Motherboard
    // ---------------------------------------------------------------------
    /// Master clock rate in Hz
    ClockRate,
    /// Current device time
    TimeNow,
    /// Device time latched at the last PPS edge
    TimePps,
    /// Time to load into "now" on the next PPS edge
    TimeNextPps,
    /// Reference and PPS source selection
    ClockConfig,
    /// RX sub-device spec (channel topology)
    RxSubdevSpec,
    /// TX sub-device spec (channel topology)
    TxSubdevSpec,
    /// Names of the RX DSP chains
    RxDspNames,
    /// Names of the TX DSP chains
    TxDspNames,
    /// An RX DSP node (indexed by DSP name)
    RxDsp,
    /// A TX DSP node (indexed by DSP name)
    TxDsp,
    /// Names of the RX daughterboard slots
    RxDboardNames,
    /// Names of the TX daughterboard slots
    TxDboardNames,
    /// An RX daughterboard node (indexed by slot name)
    RxDboard,
    /// A TX daughterboard node (indexed by slot name)
    TxDboard,
    /// Low-level motherboard register interface
    Iface,

    // ---------------------------------------------------------------------
    // DSP
    // ---------------------------------------------------------------------
    /// Sample rate seen by the host
    HostRate,
    /// Converter (codec) rate
    CodecRate,
    /// Digital frequency shift applied by the DSP
    FreqShift,
    /// Streaming command
    StreamCmd,

    // ---------------------------------------------------------------------
    // Daughterboard
    // ---------------------------------------------------------------------
    /// Names of the sub-devices on a daughterboard
    SubdevNames,
    /// A sub-device node (indexed by sub-device name)
    Subdev,
    /// Daughterboard GPIO / register interface
    DboardIface,
    /// Gain group for a sub-device (indexed by sub-device name)
    GainGroup,

    // ---------------------------------------------------------------------
    // Sub-device
    // ---------------------------------------------------------------------
    /// RF front-end center frequency
    Freq,
    /// Tunable frequency range
    FreqRange,
    /// A named gain stage value (indexed by stage name)
    Gain,
    /// Range of a named gain stage (indexed by stage name)
    GainRange,
    /// Names of the gain stages
    GainNames,
    /// Selected antenna
    Antenna,
    /// Selectable antennas
    AntennaNames,
    /// Analog filter bandwidth
    Bandwidth,
    /// How the sub-device is wired into the DSP (IQ, QI, I, Q)
    Connection,
    /// Whether the sub-device is powered
    Enabled,
    /// Whether the local oscillator is locked
    LoLocked,
}

impl Prop {
    /// Create a key for this property with an index
    pub fn named(self, index: impl Into<String>) -> PropKey {
        PropKey::named(self, index)
    }

    /// Lower-case name used when rendering keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Prop::Name => "name",
            Prop::SensorNames => "sensor_names",
            Prop::Sensor => "sensor",
            Prop::MboardNames => "mboard_names",
            Prop::Mboard => "mboard",
            Prop::ClockRate => "clock_rate",
            Prop::TimeNow => "time_now",
            Prop::TimePps => "time_pps",
            Prop::TimeNextPps => "time_next_pps",
            Prop::ClockConfig => "clock_config",
            Prop::RxSubdevSpec => "rx_subdev_spec",
            Prop::TxSubdevSpec => "tx_subdev_spec",
            Prop::RxDspNames => "rx_dsp_names",
            Prop::TxDspNames => "tx_dsp_names",
            Prop::RxDsp => "rx_dsp",
            Prop::TxDsp => "tx_dsp",
            Prop::RxDboardNames => "rx_dboard_names",
            Prop::TxDboardNames => "tx_dboard_names",
            Prop::RxDboard => "rx_dboard",
            Prop::TxDboard => "tx_dboard",
            Prop::Iface => "iface",
            Prop::HostRate => "host_rate",
            Prop::CodecRate => "codec_rate",
            Prop::FreqShift => "freq_shift",
            Prop::StreamCmd => "stream_cmd",
            Prop::SubdevNames => "subdev_names",
            Prop::Subdev => "subdev",
            Prop::DboardIface => "dboard_iface",
            Prop::GainGroup => "gain_group",
            Prop::Freq => "freq",
            Prop::FreqRange => "freq_range",
            Prop::Gain => "gain",
            Prop::GainRange => "gain_range",
            Prop::GainNames => "gain_names",
            Prop::Antenna => "antenna",
            Prop::AntennaNames => "antenna_names",
            Prop::Bandwidth => "bandwidth",
            Prop::Connection => "connection",
            Prop::Enabled => "enabled",
            Prop::LoLocked => "lo_locked",
        }
    }
}

impl fmt::Display for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compound property key: symbolic name plus optional index
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropKey {
    /// Symbolic property name
    pub prop: Prop,
    /// Optional index within the property family
    pub index: Option<String>,
}

impl PropKey {
    /// Create an unindexed key
    pub fn new(prop: Prop) -> Self {
        Self { prop, index: None }
    }

    /// Create an indexed key, e.g. a named sensor
    pub fn named(prop: Prop, index: impl Into<String>) -> Self {
        Self {
            prop,
            index: Some(index.into()),
        }
    }

    /// Index string, or `""` for unindexed keys
    pub fn index_or_empty(&self) -> &str {
        self.index.as_deref().unwrap_or("")
    }
}

impl From<Prop> for PropKey {
    fn from(prop: Prop) -> Self {
        Self::new(prop)
    }
}

impl From<&PropKey> for PropKey {
    fn from(key: &PropKey) -> Self {
        key.clone()
    }
}

impl fmt::Display for PropKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.index {
            Some(index) => write!(f, "{}[{}]", self.prop, index),
            None => write!(f, "{}", self.prop),
        }
    }
}
