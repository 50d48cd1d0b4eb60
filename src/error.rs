//! Crate-wide error type

use crate::library::LibraryError;
use crate::upstream::UpstreamError;

/// Top-level error for service configuration and startup
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Library error: {0}")]
    Library(#[from] LibraryError),

    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
