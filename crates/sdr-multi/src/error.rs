//! Error types for the multi-board layer

use sdr_dboard::DboardError;
use sdr_props::PropError;
use thiserror::Error;

/// Errors that can occur in the multi-board facade
#[derive(Debug, Error)]
pub enum MultiError {
    /// A board, channel or DSP index does not exist
    #[error("{what} index {index} out of range ({count} available)")]
    InvalidIndex {
        /// What was being indexed ("mboard", "channel", ...)
        what: &'static str,
        /// Requested index
        index: usize,
        /// Number of valid indices
        count: usize,
    },

    /// No PPS edge was seen on board 0
    #[error(
        "board 0 may not be getting a PPS signal: no PPS edge detected within {waited:.3} s \
         (check the PPS reference cabling and the clock configuration)"
    )]
    PpsTimeout {
        /// Seconds waited before giving up
        waited: f64,
    },

    /// Property tree error
    #[error("property error: {0}")]
    Prop(#[from] PropError),

    /// Daughterboard error
    #[error("dboard error: {0}")]
    Dboard(#[from] DboardError),

    /// Configuration could not be read or written
    #[error("configuration error: {0}")]
    Config(String),
}
