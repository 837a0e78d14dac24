//! Model-level errors
//!
//! Raised when parsing UI labels into model enums or when building
//! request payloads that fail local validation.

use thiserror::Error;

/// Errors produced by the shared model layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A label did not match any known variant
    #[error("Unknown {kind}: {value}")]
    UnknownLabel { kind: &'static str, value: String },

    /// Image attachment rejected before upload
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Identity token could not be decoded
    #[error("Malformed token: {0}")]
    MalformedToken(String),
}

impl ModelError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        Self::UnknownLabel {
            kind,
            value: value.to_string(),
        }
    }
}
