//! Error types for the daughterboard subsystem

use sdr_props::{Direction, PropError};
use thiserror::Error;

use crate::id::DboardId;

/// Errors that can occur while building or addressing daughterboards
#[derive(Debug, Error)]
pub enum DboardError {
    /// No constructor is registered for an identity code
    #[error("unknown dboard id: {id} (no constructor registered)")]
    UnknownId { id: DboardId },

    /// A sub-device name was never filed by the manager
    #[error("unknown {} subdev name {name}", .direction.short())]
    UnknownSubdev { direction: Direction, name: String },

    /// A driver constructor gave up
    #[error("dboard constructor {ctor} failed for subdev \"{subdev}\": {reason}")]
    CtorFailed {
        ctor: String,
        subdev: String,
        reason: String,
    },

    /// Property access error
    #[error("property error: {0}")]
    Prop(#[from] PropError),
}
