//! Service errors
use cadence_playback::PlaybackError;
use thiserror::Error;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Service errors
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Error reported by the playback session
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The dispatcher thread has stopped
    #[error("Playback service is not running")]
    Disconnected,

    /// A worker thread could not be started
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl From<config::ConfigError> for ServiceError {
    fn from(err: config::ConfigError) -> Self {
        ServiceError::Config(err.to_string())
    }
}
