//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog identifier of an item. `0` is reserved for ad-hoc external URLs.
pub type ItemId = u64;

/// A playable unit
///
/// Immutable once constructed. Sources share items through `Arc<Item>`, and
/// identity between sources is the shared allocation, not the field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Opaque catalog identifier (`0` for external URLs)
    pub id: ItemId,

    /// Artist name (may be empty)
    pub artist: String,

    /// Track title. For external URLs this is the URL or path itself.
    pub title: String,

    /// Album name (may be empty)
    pub album: String,

    /// Duration in milliseconds, 0 if unknown
    pub duration_ms: u64,

    /// Key used to fetch cover art
    pub album_art_key: Option<u64>,
}

impl Item {
    /// Create a catalog item
    pub fn new(
        id: ItemId,
        artist: impl Into<String>,
        title: impl Into<String>,
        album: impl Into<String>,
        duration_ms: u64,
        album_art_key: Option<u64>,
    ) -> Self {
        Self {
            id,
            artist: artist.into(),
            title: title.into(),
            album: album.into(),
            duration_ms,
            album_art_key,
        }
    }

    /// Synthetic item for an ad-hoc URL or path that bypasses the catalog
    pub fn external(locator: impl Into<String>) -> Self {
        Self {
            id: 0,
            artist: String::new(),
            title: locator.into(),
            album: String::new(),
            duration_ms: 0,
            album_art_key: None,
        }
    }

    /// Whether this item was created by [`Item::external`]
    pub fn is_external(&self) -> bool {
        self.id == 0
    }

    /// Locator handed to the decode engine
    pub fn locator(&self) -> SourceLocator {
        if self.is_external() {
            SourceLocator::Url(self.title.clone())
        } else {
            SourceLocator::Catalog(self.id)
        }
    }
}

/// What the decode engine should open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceLocator {
    /// Catalog item, resolved by the platform (content URI, file path, ...)
    Catalog(ItemId),

    /// Ad-hoc URL or filesystem path
    Url(String),
}

impl SourceLocator {
    /// Whether the locator points at a network stream
    pub fn is_streaming(&self) -> bool {
        match self {
            SourceLocator::Catalog(_) => false,
            SourceLocator::Url(url) => url.starts_with("http:") || url.starts_with("https:"),
        }
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Catalog(id) => write!(f, "catalog:{id}"),
            SourceLocator::Url(url) => f.write_str(url),
        }
    }
}

/// The four song collections a navigator can play from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceKind {
    /// Full library in scan order
    Library,

    /// Full library sorted by title, case-insensitive
    SortedLibrary,

    /// User-curated order
    UserPlaylist,

    /// Result of the last artist/album filter
    GeneratedPlaylist,
}

impl SourceKind {
    /// All source kinds, in declaration order
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Library,
        SourceKind::SortedLibrary,
        SourceKind::UserPlaylist,
        SourceKind::GeneratedPlaylist,
    ];
}

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Catalog still loading (or failed to load)
    Retrieving,

    /// Decoder not prepared
    Stopped,

    /// Decoder preparing asynchronously
    Preparing,

    /// Logically playing. Output may still be silenced by focus loss.
    Playing,

    /// Paused mid-item
    Paused,
}

/// Why the session is paused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseReason {
    /// Paused by an explicit command
    UserRequest,

    /// Paused because audio focus was lost
    FocusLoss,
}

/// Ownership of the audio output device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFocus {
    /// No focus, must not produce audible output
    None,

    /// No focus, but may play attenuated ("ducking")
    DuckOnly,

    /// Full exclusive focus
    Full,
}

/// Configuration for the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Output gain while ducking, in `[0.0, 1.0]` (default: 0.1)
    pub duck_volume: f32,

    /// Reloads of the same item after a decode error before advancing (default: 1)
    pub max_decode_retries: u8,

    /// Step for fast-forward in milliseconds (default: 3000)
    pub fast_forward_ms: u64,

    /// Step for fast-rewind in milliseconds (default: 4000)
    pub fast_rewind_ms: u64,

    /// Source selected once the catalog is loaded (default: SortedLibrary)
    pub initial_source: SourceKind,

    /// Initial shuffle toggle (default: false)
    pub shuffle: bool,

    /// Initial repeat toggle (default: false)
    pub repeat: bool,
}

/// Default gain applied while ducking
pub const DUCK_VOLUME: f32 = 0.1;

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duck_volume: DUCK_VOLUME,
            max_decode_retries: 1,
            fast_forward_ms: 3000,
            fast_rewind_ms: 4000,
            initial_source: SourceKind::SortedLibrary,
            shuffle: false,
            repeat: false,
        }
    }
}
