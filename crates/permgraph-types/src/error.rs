//! Error hierarchy for permgraph.

use thiserror::Error;

/// Error returned by a change listener. Boxed so callers can surface their own error types.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all permgraph operations.
#[derive(Debug, Error)]
pub enum PermgraphError {
    #[error("Permission error: {0}")]
    Permission(#[from] PermissionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by permission store operations.
#[derive(Debug, Error)]
pub enum PermissionError {
    /// A required subject, object, role, or role collection was missing.
    /// Raised before any state is touched.
    #[error("Invalid argument: '{name}' is required")]
    InvalidArgument { name: String },

    /// A change listener failed. The mutation that triggered it has already been applied.
    #[error("Permission listener failed: {0}")]
    Listener(#[source] ListenerError),
}

impl PermissionError {
    pub fn invalid_argument(name: impl Into<String>) -> Self {
        Self::InvalidArgument { name: name.into() }
    }
}

/// Errors from configuration and policy file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
