//! Commands accepted by the playback session

use crate::types::{ItemId, SourceKind};
use serde::{Deserialize, Serialize};

/// Transport and navigation commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Start or resume playback
    Play,

    /// Pause playback (cancels a pending auto-play while retrieving)
    Pause,

    /// Play if paused or stopped, otherwise pause
    Toggle,

    /// Stop and release the decoder
    Stop,

    /// Advance to the next item
    Skip,

    /// Go back to the previous item
    Previous,

    /// Seek relative to the current position, in milliseconds
    SeekRelative(i64),

    /// Seek forward by the configured step
    FastForward,

    /// Seek backward by the configured step
    FastRewind,

    /// Play an ad-hoc URL or path outside the catalog
    PlayUrl(String),

    /// Play the item at an index of the active source's listing
    PlayAtIndex(usize),

    /// Play a random item of the active source
    PlayRandom,

    ToggleShuffle,

    ToggleRepeat,

    /// Make a source active
    SelectSource(SourceKind),

    /// Rebuild the generated playlist from an artist
    FilterByArtist(String),

    /// Rebuild the generated playlist from an album
    FilterByAlbum(String),

    /// Replace the user playlist with catalog items, in the given order
    SetUserPlaylist(Vec<ItemId>),
}

impl Command {
    /// Whether handling this command reads or writes navigator state
    ///
    /// Such commands must not run while a playlist rebuild is in flight.
    pub fn reads_navigator(&self) -> bool {
        matches!(
            self,
            Command::Play
                | Command::Toggle
                | Command::Skip
                | Command::Previous
                | Command::PlayAtIndex(_)
                | Command::PlayRandom
                | Command::ToggleShuffle
                | Command::SelectSource(_)
                | Command::FilterByArtist(_)
                | Command::FilterByAlbum(_)
                | Command::SetUserPlaylist(_)
        )
    }
}
