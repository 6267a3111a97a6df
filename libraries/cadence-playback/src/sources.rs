//! Playlist source set
//!
//! Four named sources, each with a base sequence and an optional shuffled
//! projection. All sources share the catalog's `Arc<Item>` allocations.

use crate::catalog::{Catalog, ALL_SONGS};
use crate::shuffle::{pinned_shuffle, position_of};
use crate::types::{Item, SourceKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One row of a source listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceEntry {
    /// A playable item
    Track(Item),

    /// The non-playable "All Songs" sentinel shown after filtered listings
    AllSongs,
}

impl SourceEntry {
    /// Display label for the entry
    pub fn label(&self) -> &str {
        match self {
            SourceEntry::Track(item) => &item.title,
            SourceEntry::AllSongs => ALL_SONGS,
        }
    }
}

/// A single ordered collection of items
#[derive(Debug, Clone, Default)]
pub struct Source {
    items: Vec<Arc<Item>>,
    all_songs_entry: bool,
    shuffled: Option<Vec<Arc<Item>>>,
}

impl Source {
    /// Source over `items` with no sentinel entry
    pub fn new(items: Vec<Arc<Item>>) -> Self {
        Self {
            items,
            all_songs_entry: false,
            shuffled: None,
        }
    }

    /// Source whose listing ends with the "All Songs" sentinel
    pub fn with_all_songs(items: Vec<Arc<Item>>) -> Self {
        Self {
            items,
            all_songs_entry: true,
            shuffled: None,
        }
    }

    /// Generated playlist of every item by `artist`
    pub fn filtered_by_artist(catalog: &Catalog, artist: &str) -> Self {
        Self::with_all_songs(catalog.by_artist(artist))
    }

    /// Generated playlist of every item on `album`, without a sentinel
    pub fn filtered_by_album(catalog: &Catalog, album: &str) -> Self {
        Self::new(catalog.by_album(album))
    }

    /// Base sequence
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Shuffled projection, if one has been built
    pub fn shuffled(&self) -> Option<&[Arc<Item>]> {
        self.shuffled.as_deref()
    }

    /// Sequence navigation walks: the projection when shuffling, else the base
    pub fn sequence(&self, shuffle: bool) -> &[Arc<Item>] {
        match (&self.shuffled, shuffle) {
            (Some(projection), true) => projection,
            _ => &self.items,
        }
    }

    /// Number of playable items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the source has no playable items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the listing carries the "All Songs" sentinel
    pub fn has_all_songs_entry(&self) -> bool {
        self.all_songs_entry
    }

    /// Listing rows for the effective sequence, sentinel last
    pub fn entries(&self, shuffle: bool) -> Vec<SourceEntry> {
        let mut entries: Vec<SourceEntry> = self
            .sequence(shuffle)
            .iter()
            .map(|item| SourceEntry::Track((**item).clone()))
            .collect();
        if self.all_songs_entry {
            entries.push(SourceEntry::AllSongs);
        }
        entries
    }

    /// Build a fresh projection, pinning `current` to the front if present
    pub(crate) fn build_projection<R: Rng + ?Sized>(
        &mut self,
        current: Option<&Arc<Item>>,
        rng: &mut R,
    ) {
        let pinned = current.and_then(|item| position_of(&self.items, item));
        self.shuffled = Some(pinned_shuffle(&self.items, pinned, rng));
    }

    pub(crate) fn has_projection(&self) -> bool {
        self.shuffled.is_some()
    }

    pub(crate) fn clear_projection(&mut self) {
        self.shuffled = None;
    }
}

/// The four sources a navigator switches between
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    library: Source,
    sorted_library: Source,
    user_playlist: Source,
    generated_playlist: Source,
}

impl SourceSet {
    /// Empty set, used while the catalog is being retrieved
    pub fn new() -> Self {
        Self::default()
    }

    /// Library and sorted library from a catalog; playlists start empty
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            library: Source::new(catalog.items().to_vec()),
            sorted_library: Source::new(catalog.sorted_by_title()),
            user_playlist: Source::default(),
            generated_playlist: Source::default(),
        }
    }

    /// Source by kind
    pub fn get(&self, kind: SourceKind) -> &Source {
        match kind {
            SourceKind::Library => &self.library,
            SourceKind::SortedLibrary => &self.sorted_library,
            SourceKind::UserPlaylist => &self.user_playlist,
            SourceKind::GeneratedPlaylist => &self.generated_playlist,
        }
    }

    pub(crate) fn get_mut(&mut self, kind: SourceKind) -> &mut Source {
        match kind {
            SourceKind::Library => &mut self.library,
            SourceKind::SortedLibrary => &mut self.sorted_library,
            SourceKind::UserPlaylist => &mut self.user_playlist,
            SourceKind::GeneratedPlaylist => &mut self.generated_playlist,
        }
    }

    /// Effective length of a source
    pub fn count(&self, kind: SourceKind, shuffle: bool) -> usize {
        self.get(kind).sequence(shuffle).len()
    }

    /// Item at `index` of the effective sequence
    pub fn item_at(&self, kind: SourceKind, shuffle: bool, index: usize) -> Option<Arc<Item>> {
        self.get(kind).sequence(shuffle).get(index).cloned()
    }

    /// Replace a source's base sequence. Its projection is discarded.
    pub(crate) fn replace(&mut self, kind: SourceKind, source: Source) {
        *self.get_mut(kind) = Source {
            shuffled: None,
            ..source
        };
    }

    /// Discard every projection
    pub(crate) fn clear_projections(&mut self) {
        for kind in SourceKind::ALL {
            self.get_mut(kind).clear_projection();
        }
    }
}
