//! Multi-board facade
//!
//! [`MultiUsrp`] presents every motherboard of a device as one radio with a
//! flat channel numbering. Each call resolves its channel against the
//! current sub-device specs, walks the property tree to the node that owns
//! the attribute and reads or writes it there. Nothing is cached.

use std::rc::Rc;

use sdr_props::{
    Clock, ClockConfig, DboardIface, Direction, GainGroup, MboardIface, Node, Prop, Range,
    SensorValue, StreamCmd, SubdevSpec, SubdevSpecPair, SystemClock, TimeSpec,
};
use tracing::{debug, warn};

use crate::channel::{chan_to_mcp, McPair, Select};
use crate::config::MultiConfig;
use crate::diagnostics::Diagnostic;
use crate::error::MultiError;
use crate::tune::{DefaultTuner, TuneRequest, TuneResult, Tuner};

/// Mboard keys that come in an RX and a TX flavor
fn dir_prop(direction: Direction, rx: Prop, tx: Prop) -> Prop {
    match direction {
        Direction::Rx => rx,
        Direction::Tx => tx,
    }
}

fn spec_prop(direction: Direction) -> Prop {
    dir_prop(direction, Prop::RxSubdevSpec, Prop::TxSubdevSpec)
}

/// Tree position of one logical channel
struct ChannelPath {
    mcp: McPair,
    mboard: Node,
    pair: SubdevSpecPair,
}

/// Facade over a multi-board device tree
pub struct MultiUsrp {
    root: Node,
    config: MultiConfig,
    tuner: Box<dyn Tuner>,
    pub(crate) clock: Rc<dyn Clock>,
    diagnostics: Vec<Diagnostic>,
}

impl MultiUsrp {
    /// Wrap a device tree with the default configuration
    pub fn new(root: Node) -> Self {
        Self::with_config(root, MultiConfig::default())
    }

    /// Wrap a device tree with a custom configuration
    pub fn with_config(root: Node, config: MultiConfig) -> Self {
        Self::with_parts(
            root,
            config,
            Box::new(DefaultTuner),
            Rc::new(SystemClock::new()),
        )
    }

    /// Wrap a device tree with every collaborator supplied
    pub fn with_parts(
        root: Node,
        config: MultiConfig,
        tuner: Box<dyn Tuner>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            root,
            config,
            tuner,
            clock,
            diagnostics: Vec::new(),
        }
    }

    /// Get the current configuration
    pub fn config(&self) -> &MultiConfig {
        &self.config
    }

    /// Update the configuration
    pub fn set_config(&mut self, config: MultiConfig) {
        self.config = config;
    }

    /// Root node of the device tree
    pub fn device(&self) -> &Node {
        &self.root
    }

    /// Drain pending diagnostics
    pub fn drain_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    // ------------------------------------------------------------------
    // Tree walking
    // ------------------------------------------------------------------

    fn mboard_names(&self) -> Result<Vec<String>, MultiError> {
        Ok(self.root.get_as(Prop::MboardNames)?)
    }

    pub(crate) fn mboard(&self, mboard: usize) -> Result<Node, MultiError> {
        let names = self.mboard_names()?;
        let name = names.get(mboard).ok_or(MultiError::InvalidIndex {
            what: "mboard",
            index: mboard,
            count: names.len(),
        })?;
        Ok(self.root.child(Prop::Mboard.named(name.as_str()))?)
    }

    fn spec_sizes(&self, direction: Direction) -> Result<Vec<usize>, MultiError> {
        (0..self.num_mboards()?)
            .map(|m| Ok(self.subdev_spec(direction, m)?.len()))
            .collect()
    }

    fn channel(&self, direction: Direction, chan: usize) -> Result<ChannelPath, MultiError> {
        let sizes = self.spec_sizes(direction)?;
        let mcp = chan_to_mcp(chan, &sizes);
        if mcp.mboard >= sizes.len() {
            return Err(MultiError::InvalidIndex {
                what: "channel",
                index: chan,
                count: sizes.iter().sum(),
            });
        }
        let spec = self.subdev_spec(direction, mcp.mboard)?;
        let pair = spec
            .get(mcp.chan)
            .cloned()
            .ok_or(MultiError::InvalidIndex {
                what: "channel",
                index: chan,
                count: sizes.iter().sum(),
            })?;
        Ok(ChannelPath {
            mcp,
            mboard: self.mboard(mcp.mboard)?,
            pair,
        })
    }

    fn dsp(&self, direction: Direction, chan: usize) -> Result<Node, MultiError> {
        let path = self.channel(direction, chan)?;
        let names: Vec<String> = path
            .mboard
            .get_as(dir_prop(direction, Prop::RxDspNames, Prop::TxDspNames))?;
        let name = names.get(path.mcp.chan).ok_or(MultiError::InvalidIndex {
            what: "dsp",
            index: path.mcp.chan,
            count: names.len(),
        })?;
        Ok(path
            .mboard
            .child(dir_prop(direction, Prop::RxDsp, Prop::TxDsp).named(name.as_str()))?)
    }

    fn dboard(&self, direction: Direction, chan: usize) -> Result<(Node, ChannelPath), MultiError> {
        let path = self.channel(direction, chan)?;
        let key =
            dir_prop(direction, Prop::RxDboard, Prop::TxDboard).named(path.pair.db_name.as_str());
        Ok((path.mboard.child(key)?, path))
    }

    fn subdev(&self, direction: Direction, chan: usize) -> Result<Node, MultiError> {
        let (dboard, path) = self.dboard(direction, chan)?;
        Ok(dboard.child(Prop::Subdev.named(path.pair.sd_name.as_str()))?)
    }

    fn gain_group(
        &self,
        direction: Direction,
        chan: usize,
    ) -> Result<Rc<dyn GainGroup>, MultiError> {
        let (dboard, path) = self.dboard(direction, chan)?;
        Ok(dboard.get_as(Prop::GainGroup.named(path.pair.sd_name.as_str()))?)
    }

    // ------------------------------------------------------------------
    // Motherboards
    // ------------------------------------------------------------------

    /// Number of motherboards in the device
    pub fn num_mboards(&self) -> Result<usize, MultiError> {
        Ok(self.mboard_names()?.len())
    }

    /// Name of a motherboard
    pub fn mboard_name(&self, mboard: usize) -> Result<String, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::Name)?)
    }

    /// Name of the device
    pub fn device_name(&self) -> Result<String, MultiError> {
        Ok(self.root.get_as(Prop::Name)?)
    }

    /// Set the master clock rate of one or every board
    pub fn set_master_clock_rate(
        &mut self,
        rate: f64,
        mboard: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for m in mboard.into().indices(self.num_mboards()?) {
            debug!("mboard {}: clock rate {:.3} MHz", m, rate / 1e6);
            self.mboard(m)?.set(Prop::ClockRate, rate)?;
        }
        Ok(())
    }

    /// Master clock rate of a board
    pub fn master_clock_rate(&self, mboard: usize) -> Result<f64, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::ClockRate)?)
    }

    /// Current time of a board
    pub fn time_now(&self, mboard: usize) -> Result<TimeSpec, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::TimeNow)?)
    }

    /// Time a board latched at its last PPS edge
    pub fn time_last_pps(&self, mboard: usize) -> Result<TimeSpec, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::TimePps)?)
    }

    /// Set the time of one or every board immediately
    ///
    /// Boards set in sequence are not aligned; use
    /// [`set_time_next_pps`](Self::set_time_next_pps) or
    /// [`set_time_unknown_pps`](Self::set_time_unknown_pps) for that.
    pub fn set_time_now(
        &mut self,
        time: TimeSpec,
        mboard: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for m in mboard.into().indices(self.num_mboards()?) {
            self.mboard(m)?.set(Prop::TimeNow, time)?;
        }
        Ok(())
    }

    /// Arm every board to take `time` on its next PPS edge
    pub fn set_time_next_pps(&mut self, time: TimeSpec) -> Result<(), MultiError> {
        for m in 0..self.num_mboards()? {
            debug!("mboard {}: arm {} for next pps", m, time);
            self.mboard(m)?.set(Prop::TimeNextPps, time)?;
        }
        Ok(())
    }

    /// Send a stream command to one or every RX channel
    pub fn issue_stream_cmd(
        &mut self,
        cmd: StreamCmd,
        chan: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for c in chan.into().indices(self.num_channels(Direction::Rx)?) {
            debug!("RX channel {}: stream {:?}", c, cmd.mode);
            self.dsp(Direction::Rx, c)?.set(Prop::StreamCmd, cmd)?;
        }
        Ok(())
    }

    /// Set the clock configuration of one or every board
    pub fn set_clock_config(
        &mut self,
        clock_config: ClockConfig,
        mboard: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for m in mboard.into().indices(self.num_mboards()?) {
            self.mboard(m)?.set(Prop::ClockConfig, clock_config)?;
        }
        Ok(())
    }

    /// Clock configuration of a board
    pub fn clock_config(&self, mboard: usize) -> Result<ClockConfig, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::ClockConfig)?)
    }

    /// Read a motherboard sensor
    pub fn mboard_sensor(&self, name: &str, mboard: usize) -> Result<SensorValue, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::Sensor.named(name))?)
    }

    /// Motherboard sensor names
    pub fn mboard_sensor_names(&self, mboard: usize) -> Result<Vec<String>, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::SensorNames)?)
    }

    /// Register interface of a motherboard
    pub fn mboard_iface(&self, mboard: usize) -> Result<Rc<dyn MboardIface>, MultiError> {
        Ok(self.mboard(mboard)?.get_as(Prop::Iface)?)
    }

    /// Human-readable summary of the device topology
    pub fn pp_string(&self) -> Result<String, MultiError> {
        let num_mboards = self.num_mboards()?;
        let mut buff = format!(
            "{} Device:\n  Device: {}\n",
            if num_mboards > 1 { "Multi" } else { "Single" },
            self.device_name()?
        );
        for m in 0..num_mboards {
            buff += &format!("  Mboard {}: {}\n", m, self.mboard_name(m)?);
        }
        for direction in [Direction::Rx, Direction::Tx] {
            for chan in 0..self.num_channels(direction)? {
                let (dboard, _) = self.dboard(direction, chan)?;
                buff += &format!(
                    "  {dir} Channel: {}\n    {dir} DSP: {}\n    {dir} Dboard: {}\n    {dir} Subdev: {}\n",
                    chan,
                    self.dsp(direction, chan)?.get_as::<String>(Prop::Name)?,
                    dboard.get_as::<String>(Prop::Name)?,
                    self.subdev_name(direction, chan)?,
                    dir = direction,
                );
            }
        }
        Ok(buff)
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    /// Set the sub-device spec of one or every board
    pub fn set_subdev_spec(
        &mut self,
        direction: Direction,
        spec: &SubdevSpec,
        mboard: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for m in mboard.into().indices(self.num_mboards()?) {
            debug!("mboard {}: {} subdev spec \"{}\"", m, direction, spec);
            self.mboard(m)?.set(spec_prop(direction), spec.clone())?;
        }
        Ok(())
    }

    /// Sub-device spec of a board
    pub fn subdev_spec(
        &self,
        direction: Direction,
        mboard: usize,
    ) -> Result<SubdevSpec, MultiError> {
        Ok(self.mboard(mboard)?.get_as(spec_prop(direction))?)
    }

    /// Total channel count across every board
    pub fn num_channels(&self, direction: Direction) -> Result<usize, MultiError> {
        Ok(self.spec_sizes(direction)?.iter().sum())
    }

    /// Name of the sub-device behind a channel
    pub fn subdev_name(&self, direction: Direction, chan: usize) -> Result<String, MultiError> {
        Ok(self.subdev(direction, chan)?.get_as(Prop::Name)?)
    }

    /// Set the host sample rate of one or every channel
    ///
    /// The achieved rate is read back; a miss beyond the rate tolerance is
    /// reported as a [`Diagnostic::RateMismatch`].
    pub fn set_rate(
        &mut self,
        direction: Direction,
        rate: f64,
        chan: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for c in chan.into().indices(self.num_channels(direction)?) {
            self.dsp(direction, c)?.set(Prop::HostRate, rate)?;
            let actual = self.rate(direction, c)?;
            if (rate - actual).abs() > self.config.rate_tolerance_sps {
                self.report(Diagnostic::RateMismatch {
                    direction,
                    chan: c,
                    target: rate,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Host sample rate of a channel
    pub fn rate(&self, direction: Direction, chan: usize) -> Result<f64, MultiError> {
        Ok(self.dsp(direction, chan)?.get_as(Prop::HostRate)?)
    }

    /// Tune one or every channel
    ///
    /// Returns one result per channel tuned, in channel order. The achieved
    /// frequency is read back; a miss beyond the frequency tolerance is
    /// reported as a [`Diagnostic::FreqMismatch`].
    pub fn set_freq(
        &mut self,
        direction: Direction,
        request: &TuneRequest,
        chan: impl Into<Select>,
    ) -> Result<Vec<TuneResult>, MultiError> {
        let mut results = Vec::new();
        for c in chan.into().indices(self.num_channels(direction)?) {
            let subdev = self.subdev(direction, c)?;
            let dsp = self.dsp(direction, c)?;
            results.push(self.tuner.tune(direction, &subdev, &dsp, request)?);
            let actual = self.freq(direction, c)?;
            if (request.target_freq - actual).abs() > self.config.freq_tolerance_hz {
                self.report(Diagnostic::FreqMismatch {
                    direction,
                    chan: c,
                    target: request.target_freq,
                    actual,
                });
            }
        }
        Ok(results)
    }

    /// Center frequency of a channel
    pub fn freq(&self, direction: Direction, chan: usize) -> Result<f64, MultiError> {
        let subdev = self.subdev(direction, chan)?;
        let dsp = self.dsp(direction, chan)?;
        Ok(self.tuner.derive_freq(direction, &subdev, &dsp)?)
    }

    /// Tunable range of a channel, including what the DSP can shift
    pub fn freq_range(&self, direction: Direction, chan: usize) -> Result<Range, MultiError> {
        let range: Range = self.subdev(direction, chan)?.get_as(Prop::FreqRange)?;
        let codec_rate: f64 = self.dsp(direction, chan)?.get_as(Prop::CodecRate)?;
        Ok(range.widen(codec_rate / 2.0))
    }

    /// Set a gain stage, or the overall gain with [`sdr_props::ALL_GAINS`],
    /// on one or every channel
    pub fn set_gain(
        &mut self,
        direction: Direction,
        gain: f64,
        name: &str,
        chan: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for c in chan.into().indices(self.num_channels(direction)?) {
            self.gain_group(direction, c)?.set_value(gain, name)?;
        }
        Ok(())
    }

    /// Gain of a stage, or the overall gain
    pub fn gain(&self, direction: Direction, name: &str, chan: usize) -> Result<f64, MultiError> {
        Ok(self.gain_group(direction, chan)?.value(name)?)
    }

    /// Gain range of a stage, or of the overall gain
    pub fn gain_range(
        &self,
        direction: Direction,
        name: &str,
        chan: usize,
    ) -> Result<Range, MultiError> {
        Ok(self.gain_group(direction, chan)?.range(name)?)
    }

    /// Gain stage names of a channel
    pub fn gain_names(&self, direction: Direction, chan: usize) -> Result<Vec<String>, MultiError> {
        Ok(self.gain_group(direction, chan)?.names()?)
    }

    /// Select an antenna on one or every channel
    pub fn set_antenna(
        &mut self,
        direction: Direction,
        antenna: &str,
        chan: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for c in chan.into().indices(self.num_channels(direction)?) {
            self.subdev(direction, c)?.set(Prop::Antenna, antenna)?;
        }
        Ok(())
    }

    /// Selected antenna
    pub fn antenna(&self, direction: Direction, chan: usize) -> Result<String, MultiError> {
        Ok(self.subdev(direction, chan)?.get_as(Prop::Antenna)?)
    }

    /// Selectable antennas
    pub fn antennas(&self, direction: Direction, chan: usize) -> Result<Vec<String>, MultiError> {
        Ok(self.subdev(direction, chan)?.get_as(Prop::AntennaNames)?)
    }

    /// Set the analog bandwidth of one or every channel
    pub fn set_bandwidth(
        &mut self,
        direction: Direction,
        bandwidth: f64,
        chan: impl Into<Select>,
    ) -> Result<(), MultiError> {
        for c in chan.into().indices(self.num_channels(direction)?) {
            self.subdev(direction, c)?.set(Prop::Bandwidth, bandwidth)?;
        }
        Ok(())
    }

    /// Analog bandwidth
    pub fn bandwidth(&self, direction: Direction, chan: usize) -> Result<f64, MultiError> {
        Ok(self.subdev(direction, chan)?.get_as(Prop::Bandwidth)?)
    }

    /// Low-level interface of the daughterboard behind a channel
    pub fn dboard_iface(
        &self,
        direction: Direction,
        chan: usize,
    ) -> Result<Rc<dyn DboardIface>, MultiError> {
        let (dboard, _) = self.dboard(direction, chan)?;
        Ok(dboard.get_as(Prop::DboardIface)?)
    }

    /// Read a sub-device sensor
    pub fn sensor(
        &self,
        direction: Direction,
        name: &str,
        chan: usize,
    ) -> Result<SensorValue, MultiError> {
        Ok(self.subdev(direction, chan)?.get_as(Prop::Sensor.named(name))?)
    }

    /// Sub-device sensor names
    pub fn sensor_names(
        &self,
        direction: Direction,
        chan: usize,
    ) -> Result<Vec<String>, MultiError> {
        Ok(self.subdev(direction, chan)?.get_as(Prop::SensorNames)?)
    }
}

impl std::fmt::Debug for MultiUsrp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiUsrp")
            .field("config", &self.config)
            .field("pending_diagnostics", &self.diagnostics.len())
            .finish()
    }
}
