//! Error types for dtjson encoding and decoding operations.

use thiserror::Error;

/// Errors that can occur during dtjson encoding or decoding.
#[derive(Error, Debug)]
pub enum DtJsonError {
    /// The input was not valid JSON (decoding path). Reader failures reported
    /// by the parser also land here.
    #[error("JSON syntax error: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A recognized `datetime` / `timedelta` tag carried a payload that could
    /// not be turned into a timestamp or duration.
    #[error("invalid {tag} payload: {reason}")]
    InvalidPayload { tag: &'static str, reason: String },

    /// A value the JSON serializer cannot represent (encoding path).
    #[error("Encoding error: {0}")]
    Encode(String),

    /// The output writer failed (encoding path).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DtJsonError {
    pub(crate) fn invalid_payload(tag: &'static str, reason: impl Into<String>) -> Self {
        DtJsonError::InvalidPayload {
            tag,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout dtjson-core.
pub type Result<T> = std::result::Result<T, DtJsonError>;
