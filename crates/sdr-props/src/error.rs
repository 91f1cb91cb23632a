//! Error types for property access

use thiserror::Error;

/// Errors that can occur while reading or writing a property
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PropError {
    /// Stored value cannot be viewed as the requested type
    #[error("type mismatch on {key}: expected {expected}, found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The node does not serve this key
    #[error("unknown property: {0}")]
    UnknownKey(String),

    /// The property cannot be written
    #[error("property is read-only: {0}")]
    ReadOnly(String),

    /// Value has the right type but is not acceptable
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// The underlying hardware rejected or failed the access
    #[error("hardware error: {0}")]
    Hardware(String),
}

impl PropError {
    /// Build an [`PropError::InvalidValue`] for a key
    pub fn invalid(key: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
