//! Error types for filter chain setup

use crate::filters::Phase;
use thiserror::Error;

/// Result type alias for filter chain operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors raised while building or configuring a filter chain.
///
/// Dispatch never produces a `FilterError`: named handlers are resolved when
/// a filter is registered, and errors raised by callbacks or the action body
/// are returned to the caller as the host's own error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    #[error("Handler '{name}' cannot be used as {phase} filter")]
    HandlerKindMismatch { name: String, phase: Phase },

    #[error("Filter '{name}' is not registered as {phase} filter")]
    NotRegistered { name: String, phase: Phase },

    #[error("Filter '{0}' is not registered in any phase")]
    NotRegisteredAnywhere(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for FilterError {
    fn from(err: config::ConfigError) -> Self {
        FilterError::Config(err.to_string())
    }
}
