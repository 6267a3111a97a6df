//! Session events
//!
//! Event-based communication for UI synchronization. The session queues
//! events as it changes and the runtime drains them after each message.

use crate::types::{AudioFocus, Item, PlaybackState, SourceKind};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Playback state changed
    StateChanged {
        /// The new state
        state: PlaybackState,
    },

    /// The item loaded into the decoder changed
    ItemChanged {
        /// New current item, `None` once the decoder is released
        item: Option<Item>,
    },

    /// Audio focus changed
    FocusChanged { focus: AudioFocus },

    ShuffleChanged { enabled: bool },

    RepeatChanged { enabled: bool },

    /// Active source changed
    SourceChanged {
        source: SourceKind,
        /// Playable items in the new source
        len: usize,
    },

    /// A source's contents were replaced
    SourceRebuilt { source: SourceKind, len: usize },

    /// Catalog finished loading
    CatalogReady {
        /// Number of items found
        count: usize,
    },

    /// Catalog scan failed; the session stays in `Retrieving`
    CatalogFailed { message: String },

    /// Playback was requested but the active source has nothing left to play
    NothingToPlay,

    /// Advisory error
    Error { message: String },
}
