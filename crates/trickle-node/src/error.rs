//! Errors raised while configuring and running a node.

use trickle_core::error::{IncentiveError, ParamsError};

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error(transparent)]
    Incentive(#[from] IncentiveError),

    #[error("invalid params: {0}")]
    Params(#[from] ParamsError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid time {value:?}: {reason}")]
    Time { value: String, reason: String },

    #[error("invalid {field} {value:?}")]
    Field { field: &'static str, value: String },

    #[error("logging already initialised: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for NodeError {
    fn from(e: config::ConfigError) -> Self {
        NodeError::Config(e.to_string())
    }
}
