//! Unified error type.

use std::time::Duration;

use crate::config::ConfigError;

/// The error type returned by quill's fallible process-level operations.
///
/// Application-level errors (404, 400, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure failures: reading configuration, binding a port, installing
/// the log sink, or draining connections on shutdown.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("load config: {0}")]
    Config(#[from] ConfigError),

    #[error("load .env: {0}")]
    Dotenv(#[from] dotenvy::Error),

    #[error("install logger: {0}")]
    Logger(String),

    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),
}
