//! Errors produced while reading model data.
use thiserror::Error;

/// Malformed template or value data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModelError {
    /// A value payload does not fit its declared data type.
    #[error("value of type {data_type} has an invalid payload: {reason}")]
    InvalidPayload { data_type: String, reason: String },

    /// JSON input could not be decoded into model types.
    #[error("cannot decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
}

impl ModelError {
    pub(crate) fn decode(what: &'static str, err: serde_json::Error) -> Self {
        ModelError::Decode {
            what,
            reason: err.to_string(),
        }
    }
}
