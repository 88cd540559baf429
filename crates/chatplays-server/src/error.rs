//! Chatplays server: startup and runtime error types.

use chatplays_core::error::ConfigError;
use chatplays_registry::store::StoreError;
use thiserror::Error;

/// Startup and runtime errors for the console host.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable holds a value that cannot be used.
    #[error("invalid value {value:?} for {name}")]
    InvalidEnv {
        /// The variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },

    /// The play settings could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The descriptor file could not be read or written.
    #[error("descriptor store error: {0}")]
    Store(#[from] StoreError),

    /// Console I/O failed.
    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}
