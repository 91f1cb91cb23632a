//! Tuning seam
//!
//! Placing a channel on a frequency takes two steps: the daughterboard LO
//! gets as close as it can, and the DSP chain shifts the remainder. How the
//! two share the work is up to the [`Tuner`]; the facade only asks for the
//! result and reads back what was achieved.

use sdr_props::{Direction, Node, Prop, PropError};
use serde::{Deserialize, Serialize};

/// A tuning request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TuneRequest {
    /// Desired center frequency (Hz)
    pub target_freq: f64,
    /// Offset of the LO from the target, made up by the DSP (Hz)
    #[serde(default)]
    pub lo_offset: f64,
}

impl TuneRequest {
    /// Tune straight to a frequency
    pub fn new(target_freq: f64) -> Self {
        Self {
            target_freq,
            lo_offset: 0.0,
        }
    }

    /// Tune with the LO parked `lo_offset` away from the target
    pub fn with_lo_offset(target_freq: f64, lo_offset: f64) -> Self {
        Self {
            target_freq,
            lo_offset,
        }
    }
}

impl From<f64> for TuneRequest {
    fn from(target_freq: f64) -> Self {
        Self::new(target_freq)
    }
}

/// What a tuning request achieved
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TuneResult {
    /// LO frequency asked of the daughterboard (Hz)
    pub target_inter_freq: f64,
    /// LO frequency the daughterboard settled on (Hz)
    pub actual_inter_freq: f64,
    /// Shift asked of the DSP (Hz)
    pub target_dsp_freq: f64,
    /// Shift the DSP settled on (Hz)
    pub actual_dsp_freq: f64,
}

/// Frequency planning for one channel
pub trait Tuner {
    /// Tune a sub-device and its DSP chain
    fn tune(
        &self,
        direction: Direction,
        subdev: &Node,
        dsp: &Node,
        request: &TuneRequest,
    ) -> Result<TuneResult, PropError>;

    /// Center frequency currently produced by a sub-device and its DSP chain
    fn derive_freq(&self, direction: Direction, subdev: &Node, dsp: &Node)
        -> Result<f64, PropError>;
}

/// Front end first, DSP makes up the residual
///
/// The receive chain shifts down (`freq = lo - shift`), the transmit chain
/// shifts up (`freq = lo + shift`). The shift is limited to the codec's
/// first Nyquist zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTuner;

impl Tuner for DefaultTuner {
    fn tune(
        &self,
        direction: Direction,
        subdev: &Node,
        dsp: &Node,
        request: &TuneRequest,
    ) -> Result<TuneResult, PropError> {
        let target_inter_freq = request.target_freq + request.lo_offset;
        subdev.set(Prop::Freq, target_inter_freq)?;
        let actual_inter_freq: f64 = subdev.get_as(Prop::Freq)?;

        let residual = request.target_freq - actual_inter_freq;
        let codec_rate: f64 = dsp.get_as(Prop::CodecRate)?;
        if codec_rate.is_nan() || codec_rate < 0.0 {
            return Err(PropError::invalid(
                Prop::CodecRate,
                format!("codec rate {} cannot bound a DSP shift", codec_rate),
            ));
        }
        let nyquist = codec_rate / 2.0;
        let target_dsp_freq = match direction {
            Direction::Rx => -residual,
            Direction::Tx => residual,
        }
        .clamp(-nyquist, nyquist);
        dsp.set(Prop::FreqShift, target_dsp_freq)?;
        let actual_dsp_freq: f64 = dsp.get_as(Prop::FreqShift)?;

        Ok(TuneResult {
            target_inter_freq,
            actual_inter_freq,
            target_dsp_freq,
            actual_dsp_freq,
        })
    }

    fn derive_freq(
        &self,
        direction: Direction,
        subdev: &Node,
        dsp: &Node,
    ) -> Result<f64, PropError> {
        let lo: f64 = subdev.get_as(Prop::Freq)?;
        let shift: f64 = dsp.get_as(Prop::FreqShift)?;
        Ok(match direction {
            Direction::Rx => lo - shift,
            Direction::Tx => lo + shift,
        })
    }
}
