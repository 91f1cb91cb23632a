//! Simulated DSP chains
//!
//! The host-facing rate is derived from the motherboard clock by an integer
//! decimation (or interpolation) factor, so most requested rates come back
//! slightly off. The frequency shift is a 32-bit phase accumulator limited
//! to the first Nyquist zone.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use sdr_props::{Direction, Prop, PropError, PropKey, PropNode, PropValue, StreamCmd};

/// Largest decimation / interpolation factor
pub const MAX_RATE_FACTOR: u32 = 512;

/// One DSP chain of a simulated motherboard
#[derive(Debug)]
pub struct SimDsp {
    name: String,
    direction: Direction,
    codec_rate: Rc<Cell<f64>>,
    factor: Cell<u32>,
    freq_shift: Cell<f64>,
    stream_cmds: RefCell<Vec<StreamCmd>>,
}

impl SimDsp {
    /// Create a DSP clocked from the motherboard clock rate
    pub fn new(direction: Direction, index: usize, codec_rate: Rc<Cell<f64>>) -> Self {
        Self {
            name: format!("{} DSP {}", direction, index),
            direction,
            codec_rate,
            factor: Cell::new(16),
            freq_shift: Cell::new(0.0),
            stream_cmds: RefCell::new(Vec::new()),
        }
    }

    /// Stream commands received so far, oldest first
    pub fn stream_cmds(&self) -> Vec<StreamCmd> {
        self.stream_cmds.borrow().clone()
    }

    /// Host-facing sample rate
    pub fn host_rate(&self) -> f64 {
        self.codec_rate.get() / f64::from(self.factor.get())
    }

    fn set_host_rate(&self, key: &PropKey, rate: f64) -> Result<(), PropError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PropError::invalid(key, format!("rate {} is not positive", rate)));
        }
        let factor = (self.codec_rate.get() / rate)
            .round()
            .clamp(1.0, f64::from(MAX_RATE_FACTOR));
        self.factor.set(factor as u32);
        Ok(())
    }

    fn set_freq_shift(&self, shift: f64) {
        let codec_rate = self.codec_rate.get();
        let nyquist = codec_rate / 2.0;
        let resolution = codec_rate / 2f64.powi(32);
        let clipped = shift.clamp(-nyquist, nyquist);
        self.freq_shift.set((clipped / resolution).round() * resolution);
    }
}

impl PropNode for SimDsp {
    fn get(&self, key: &PropKey) -> Result<PropValue, PropError> {
        match key.prop {
            Prop::Name => Ok(self.name.as_str().into()),
            Prop::HostRate => Ok(PropValue::Real(self.host_rate())),
            Prop::CodecRate => Ok(PropValue::Real(self.codec_rate.get())),
            Prop::FreqShift => Ok(PropValue::Real(self.freq_shift.get())),
            Prop::StreamCmd if self.direction == Direction::Rx => self
                .stream_cmds
                .borrow()
                .last()
                .cloned()
                .map(PropValue::from)
                .ok_or_else(|| PropError::UnknownKey(key.to_string())),
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }

    fn set(&self, key: &PropKey, value: PropValue) -> Result<(), PropError> {
        match key.prop {
            Prop::HostRate => self.set_host_rate(key, value.typed_for(key)?),
            Prop::FreqShift => {
                self.set_freq_shift(value.typed_for(key)?);
                Ok(())
            }
            Prop::StreamCmd if self.direction == Direction::Rx => {
                let cmd: StreamCmd = value.typed_for(key)?;
                self.stream_cmds.borrow_mut().push(cmd);
                Ok(())
            }
            Prop::Name | Prop::CodecRate => Err(PropError::ReadOnly(key.to_string())),
            _ => Err(PropError::UnknownKey(key.to_string())),
        }
    }
}
