//! Shared error hierarchy for permgraph.

pub mod error;

pub use error::{ConfigError, ListenerError, PermgraphError, PermissionError};
