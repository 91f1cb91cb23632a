//! Hardware value types carried through the property tree

use std::fmt;
use std::str::FromStr;

use crate::error::PropError;
use crate::time::TimeSpec;

/// A numeric range with an optional step (0 means continuous)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    /// Lower bound (inclusive)
    pub start: f64,
    /// Upper bound (inclusive)
    pub stop: f64,
    /// Resolution, 0 for continuous ranges
    pub step: f64,
}

impl Range {
    /// Create a continuous range
    pub fn new(start: f64, stop: f64) -> Self {
        Self {
            start,
            stop,
            step: 0.0,
        }
    }

    /// Create a stepped range
    pub fn with_step(start: f64, stop: f64, step: f64) -> Self {
        Self { start, stop, step }
    }

    /// A range holding exactly one value
    pub fn single(value: f64) -> Self {
        Self::new(value, value)
    }

    /// Check whether a value lies within the bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.start && value <= self.stop
    }

    /// Whether the bounds are ordered numbers and the step is not negative
    pub fn is_valid(&self) -> bool {
        self.start <= self.stop && self.step >= 0.0
    }

    /// Clamp a value into the range, optionally snapping to the step
    ///
    /// Never panics. On a range that is not [valid](Self::is_valid) the
    /// result is meaningless; check ranges read from drivers first.
    pub fn clip(&self, value: f64, clip_step: bool) -> f64 {
        let clamped = value.max(self.start).min(self.stop);
        if !clip_step || self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.start) / self.step).round();
        (self.start + steps * self.step).min(self.stop)
    }

    /// Widen both ends by `amount`
    pub fn widen(&self, amount: f64) -> Self {
        Self {
            start: self.start - amount,
            stop: self.stop + amount,
            step: self.step,
        }
    }
}

/// One entry of a sub-device spec: a daughterboard slot and a sub-device on it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubdevSpecPair {
    /// Daughterboard slot name
    pub db_name: String,
    /// Sub-device name on that daughterboard
    pub sd_name: String,
}

impl SubdevSpecPair {
    /// Create a pair
    pub fn new(db_name: impl Into<String>, sd_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            sd_name: sd_name.into(),
        }
    }
}

impl fmt::Display for SubdevSpecPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.db_name, self.sd_name)
    }
}

/// Ordered channel list of one motherboard for one direction
///
/// The order of the pairs is the channel numbering: pair `i` is the board's
/// channel `i`. The markup form is whitespace separated `db:sd` tokens, e.g.
/// `"A:0 B:AB"`; a token without a colon names a slot with an empty
/// sub-device name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubdevSpec {
    pairs: Vec<SubdevSpecPair>,
}

impl SubdevSpec {
    /// Create an empty spec
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of channels
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the spec has no channels
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pair for a board-local channel
    pub fn get(&self, chan: usize) -> Option<&SubdevSpecPair> {
        self.pairs.get(chan)
    }

    /// Append a channel
    pub fn push(&mut self, pair: SubdevSpecPair) {
        self.pairs.push(pair);
    }

    /// Iterate channels in order
    pub fn iter(&self) -> impl Iterator<Item = &SubdevSpecPair> {
        self.pairs.iter()
    }
}

impl From<Vec<SubdevSpecPair>> for SubdevSpec {
    fn from(pairs: Vec<SubdevSpecPair>) -> Self {
        Self { pairs }
    }
}

impl FromStr for SubdevSpec {
    type Err = PropError;

    fn from_str(markup: &str) -> Result<Self, Self::Err> {
        let mut spec = SubdevSpec::new();
        for token in markup.split_whitespace() {
            let pair = match token.split_once(':') {
                Some((db, sd)) if !sd.contains(':') => SubdevSpecPair::new(db, sd),
                Some(_) => {
                    return Err(PropError::invalid(
                        "subdev_spec",
                        format!("malformed pair \"{}\"", token),
                    ))
                }
                None => SubdevSpecPair::new(token, ""),
            };
            spec.push(pair);
        }
        Ok(spec)
    }
}

impl fmt::Display for SubdevSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let markup = self
            .pairs
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&markup)
    }
}

/// Raw payload of a sensor reading
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorReading {
    /// Boolean sensor (e.g. lock detect)
    Bool(bool),
    /// Integer sensor
    Int(i64),
    /// Real-valued sensor (e.g. temperature, RSSI)
    Real(f64),
    /// Free-form text
    Text(String),
}

/// A named sensor reading with a unit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorValue {
    /// Sensor name
    pub name: String,
    /// Reading
    pub value: SensorReading,
    /// Unit, or a true/false label pair for boolean sensors
    pub unit: String,
}

impl SensorValue {
    /// Create a boolean sensor reading
    pub fn boolean(name: impl Into<String>, value: bool, utrue: &str, ufalse: &str) -> Self {
        Self {
            name: name.into(),
            value: SensorReading::Bool(value),
            unit: if value { utrue } else { ufalse }.to_string(),
        }
    }

    /// Create a real-valued sensor reading
    pub fn real(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: SensorReading::Real(value),
            unit: unit.into(),
        }
    }

    /// Boolean view of the reading
    pub fn to_bool(&self) -> Option<bool> {
        match self.value {
            SensorReading::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Real view of the reading (integers widen)
    pub fn to_real(&self) -> Option<f64> {
        match self.value {
            SensorReading::Real(v) => Some(v),
            SensorReading::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Format for display, e.g. `temp: 41.5 C`
    pub fn to_pp_string(&self) -> String {
        match &self.value {
            SensorReading::Bool(_) => format!("{}: {}", self.name, self.unit),
            SensorReading::Int(v) => format!("{}: {} {}", self.name, v, self.unit),
            SensorReading::Real(v) => format!("{}: {} {}", self.name, v, self.unit),
            SensorReading::Text(v) => format!("{}: {} {}", self.name, v, self.unit),
        }
    }
}

/// How a stream command starts or stops sample flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StreamMode {
    /// Stream until told to stop
    StartContinuous,
    /// Stop a continuous stream
    StopContinuous,
    /// Stream `num_samps` then stop
    NumSampsAndDone,
    /// Stream `num_samps` and expect another command
    NumSampsAndMore,
}

/// A streaming command for an RX DSP chain
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamCmd {
    /// Streaming mode
    pub mode: StreamMode,
    /// Sample count for the counted modes
    pub num_samps: usize,
    /// Start immediately rather than at `time_spec`
    pub stream_now: bool,
    /// Device time at which to start when `stream_now` is false
    pub time_spec: TimeSpec,
}

impl StreamCmd {
    /// Create a command that takes effect immediately
    pub fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            num_samps: 0,
            stream_now: true,
            time_spec: TimeSpec::default(),
        }
    }

    /// Start continuous streaming now
    pub fn start_continuous() -> Self {
        Self::new(StreamMode::StartContinuous)
    }

    /// Stop continuous streaming now
    pub fn stop_continuous() -> Self {
        Self::new(StreamMode::StopContinuous)
    }

    /// Stream a fixed number of samples now
    pub fn num_samps_and_done(num_samps: usize) -> Self {
        Self {
            num_samps,
            ..Self::new(StreamMode::NumSampsAndDone)
        }
    }

    /// Defer the command until a device time
    pub fn at(mut self, time_spec: TimeSpec) -> Self {
        self.stream_now = false;
        self.time_spec = time_spec;
        self
    }
}

/// Frequency reference source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefSource {
    /// On-board oscillator
    #[default]
    Internal,
    /// External SMA input
    Sma,
    /// MIMO cable from a neighbouring board
    Mimo,
}

/// PPS source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PpsSource {
    /// External SMA input
    #[default]
    Sma,
    /// MIMO cable from a neighbouring board
    Mimo,
}

/// PPS edge polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PpsPolarity {
    /// Rising edge
    #[default]
    Positive,
    /// Falling edge
    Negative,
}

/// Motherboard clocking configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClockConfig {
    /// 10 MHz reference source
    pub ref_source: RefSource,
    /// PPS source
    pub pps_source: PpsSource,
    /// PPS polarity
    pub pps_polarity: PpsPolarity,
}

impl ClockConfig {
    /// Reference and PPS both taken from the SMA inputs
    pub fn external() -> Self {
        Self {
            ref_source: RefSource::Sma,
            pps_source: PpsSource::Sma,
            pps_polarity: PpsPolarity::Positive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdev_spec_markup() {
        let spec: SubdevSpec = "A:0 B:AB".parse().unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec.get(0), Some(&SubdevSpecPair::new("A", "0")));
        assert_eq!(spec.get(1), Some(&SubdevSpecPair::new("B", "AB")));
        assert_eq!(spec.to_string(), "A:0 B:AB");
    }

    #[test]
    fn test_subdev_spec_slot_only() {
        let spec: SubdevSpec = "  A  ".parse().unwrap();
        assert_eq!(spec.get(0), Some(&SubdevSpecPair::new("A", "")));
        assert!("".parse::<SubdevSpec>().unwrap().is_empty());
    }

    #[test]
    fn test_subdev_spec_rejects_double_colon() {
        assert!("A:0:1".parse::<SubdevSpec>().is_err());
    }

    #[test]
    fn test_range_clip() {
        let r = Range::with_step(0.0, 30.0, 0.5);
        assert_eq!(r.clip(42.0, false), 30.0);
        assert_eq!(r.clip(-1.0, true), 0.0);
        assert_eq!(r.clip(10.2, true), 10.0);
        assert_eq!(r.clip(10.3, true), 10.5);
        assert_eq!(r.widen(1.0), Range::with_step(-1.0, 31.0, 0.5));
    }

    #[test]
    fn test_range_validity() {
        assert!(Range::with_step(0.0, 30.0, 0.5).is_valid());
        assert!(Range::single(4.0).is_valid());
        assert!(!Range::new(30.0, 0.0).is_valid());
        assert!(!Range::new(f64::NAN, 1.0).is_valid());
        assert!(!Range::with_step(0.0, 1.0, -0.5).is_valid());
    }

    #[test]
    fn test_clip_on_bad_range_does_not_panic() {
        let inverted = Range::new(30.0, 0.0);
        assert!(inverted.clip(10.0, true).is_finite());
        let _ = Range::new(f64::NAN, f64::NAN).clip(10.0, true);
    }

    #[test]
    fn test_sensor_pp_string() {
        let lock = SensorValue::boolean("lo_locked", true, "locked", "unlocked");
        assert_eq!(lock.to_pp_string(), "lo_locked: locked");
        assert_eq!(lock.to_bool(), Some(true));

        let temp = SensorValue::real("temp", 41.5, "C");
        assert_eq!(temp.to_pp_string(), "temp: 41.5 C");
        assert_eq!(temp.to_real(), Some(41.5));
    }

    #[test]
    fn test_stream_cmd_at() {
        let cmd = StreamCmd::num_samps_and_done(1000).at(TimeSpec::from_secs(2.5));
        assert_eq!(cmd.mode, StreamMode::NumSampsAndDone);
        assert_eq!(cmd.num_samps, 1000);
        assert!(!cmd.stream_now);
    }
}
