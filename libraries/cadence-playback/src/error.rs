//! Error types for playback management

use thiserror::Error;

/// Playback errors
///
/// Every variant is advisory: the session reports it and settles in a
/// well-defined state instead of propagating it as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// Navigation attempted on a zero-length effective sequence
    #[error("Source is empty")]
    EmptySource,

    /// Explicit jump beyond the bounds of the effective sequence
    #[error("Index out of range: {index} (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Index names a listing entry that cannot be played ("All Songs")
    #[error("Entry at index {0} is not playable")]
    NotPlayable(usize),

    /// Decode engine failed to prepare or play
    #[error("Decode error: code {0}")]
    Decode(i32),

    /// Catalog load failed
    #[error("Catalog scan failed: {0}")]
    ScanFailed(String),

    /// Catalog load succeeded but found nothing
    #[error("Catalog is empty")]
    EmptyCatalog,

    /// Command needs the catalog but it is still being retrieved
    #[error("Catalog not ready")]
    NotReady,

    /// Seek requested without a loaded decoder
    #[error("No decoder loaded")]
    NoDecoderLoaded,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
