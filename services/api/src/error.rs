//! services/api/src/error.rs
//!
//! Errors that stop the lesson planner service from starting or serving.
//! Request-level failures never reach this type; handlers turn them into
//! `RestError` responses.

use crate::config::ConfigError;

/// Why `bin/api` exited.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The environment held an unusable setting.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Connecting to Postgres or applying the lesson planner migrations failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Binding the listen address or serving connections failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
