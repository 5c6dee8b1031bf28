//! Error type for the parse boundaries of the engine.
//!
//! The layout core itself never fails: malformed graphs degrade to empty
//! collections and stale ids are ignored. Errors only arise when turning
//! caller-supplied text or JS values into typed input.

use thiserror::Error;

/// Errors raised while accepting input from the host page.
#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    /// The map payload could not be deserialized.
    #[error("invalid map payload: {0}")]
    InvalidPayload(String),

    /// The view configuration could not be deserialized.
    #[error("invalid view config: {0}")]
    InvalidConfig(String),

    /// A complexity tier name that is not minimal, moderate or thorough.
    #[error("unknown complexity tier: {0:?}")]
    UnknownTier(String),

    /// A layout mode name that is not force or tree.
    #[error("unknown layout mode: {0:?}")]
    UnknownLayoutMode(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            MapError::UnknownTier("huge".into()).to_string(),
            "unknown complexity tier: \"huge\""
        );
        assert_eq!(
            MapError::InvalidPayload("eof".into()).to_string(),
            "invalid map payload: eof"
        );
    }
}
