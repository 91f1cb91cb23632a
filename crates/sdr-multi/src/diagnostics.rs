//! Non-fatal diagnostics
//!
//! Hardware that cannot hit a requested value exactly is not an error: the
//! facade records what was asked for and what was achieved, logs it, and
//! carries on.

use std::fmt;

use sdr_props::Direction;

/// A non-fatal condition reported by the facade
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// Achieved sample rate differs from the request by more than the tolerance
    RateMismatch {
        direction: Direction,
        chan: usize,
        target: f64,
        actual: f64,
    },
    /// Achieved frequency differs from the request by more than the tolerance
    FreqMismatch {
        direction: Direction,
        chan: usize,
        target: f64,
        actual: f64,
    },
    /// A board's time disagrees with board 0 after synchronization
    TimeDeviation {
        mboard: usize,
        board0_secs: f64,
        board_secs: f64,
    },
}

impl Diagnostic {
    /// Direction the diagnostic concerns, if any
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Diagnostic::RateMismatch { direction, .. }
            | Diagnostic::FreqMismatch { direction, .. } => Some(*direction),
            Diagnostic::TimeDeviation { .. } => None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::RateMismatch {
                direction,
                target,
                actual,
                ..
            } => write!(
                f,
                "The hardware does not support the requested {} sample rate: \
                 target {:.6} MSps, actual {:.6} MSps",
                direction,
                target / 1e6,
                actual / 1e6
            ),
            Diagnostic::FreqMismatch {
                direction,
                target,
                actual,
                ..
            } => write!(
                f,
                "The hardware does not support the requested {} frequency: \
                 target {:.6} MHz, actual {:.6} MHz",
                direction,
                target / 1e6,
                actual / 1e6
            ),
            Diagnostic::TimeDeviation {
                mboard,
                board0_secs,
                board_secs,
            } => write!(
                f,
                "Detected time deviation between board {} and board 0: \
                 board 0 time is {:.6} s, board {} time is {:.6} s",
                mboard, board0_secs, mboard, board_secs
            ),
        }
    }
}
