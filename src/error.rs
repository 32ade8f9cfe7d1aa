//! Error types for the ranking and export pipeline.
//!
//! Statistical edge cases (empty payloads, filters matching nothing, all-zero
//! counts) are never errors. Only caller mistakes and unusable configuration
//! surface here.

use thiserror::Error;

/// Errors returned by the library.
#[derive(Debug, Error)]
pub enum Error {
    /// A pipeline entry point was called without its preconditions,
    /// e.g. an export with no sub-group selected.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Layout or render settings that cannot produce a plan.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The upstream JSON payload could not be decoded.
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Library result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::InvalidArguments("no sub-group selected".to_string());
        assert_eq!(err.to_string(), "invalid arguments: no sub-group selected");

        let err = Error::InvalidConfig("min_entries > max_entries".to_string());
        assert!(err.to_string().starts_with("invalid configuration"));
    }

    #[test]
    fn test_payload_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Payload(_)));
    }
}
