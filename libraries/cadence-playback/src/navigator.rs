//! Cursor over the active source
//!
//! The navigator owns the source set, the active source selection, the
//! shuffle and repeat toggles, and a cursor into the active source's
//! effective sequence (the shuffled projection when shuffle is on, else the
//! base sequence).
//!
//! Laws, for a non-empty effective sequence of length N:
//! - with repeat on, N calls to `next` from any position return to it
//! - `previous` after `next` returns the item `next` moved away from
//! - toggling shuffle twice keeps the current item
//!
//! Forward navigation stops at the end unless repeat is on; backward
//! navigation always wraps.

use crate::catalog::Catalog;
use crate::error::{PlaybackError, Result};
use crate::shuffle::position_of;
use crate::sources::{Source, SourceEntry, SourceSet};
use crate::types::{Item, SourceKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Position in the effective sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    /// Nothing selected yet; the next `next` yields index 0
    BeforeStart,

    /// Index into the effective sequence
    At(usize),
}

/// Navigator over the playlist source set
#[derive(Debug)]
pub struct Navigator {
    sources: SourceSet,
    active: SourceKind,
    shuffle: bool,
    repeat: bool,
    cursor: Cursor,
    rng: StdRng,
}

impl Navigator {
    /// Create an empty navigator with an entropy-seeded shuffle RNG
    pub fn new(active: SourceKind) -> Self {
        Self::with_rng(active, StdRng::from_entropy())
    }

    /// Create an empty navigator with a deterministic shuffle RNG
    pub fn with_seed(active: SourceKind, seed: u64) -> Self {
        Self::with_rng(active, StdRng::seed_from_u64(seed))
    }

    fn with_rng(active: SourceKind, rng: StdRng) -> Self {
        Self {
            sources: SourceSet::new(),
            active,
            shuffle: false,
            repeat: false,
            cursor: Cursor::BeforeStart,
            rng,
        }
    }

    /// Replace all sources from a freshly loaded catalog
    ///
    /// Library and sorted library are rebuilt, playlists are cleared, and the
    /// cursor moves to the first item of the active source.
    pub fn load_catalog(&mut self, catalog: &Catalog) {
        self.sources = SourceSet::from_catalog(catalog);
        if self.shuffle {
            let active = self.sources.get_mut(self.active);
            active.build_projection(None, &mut self.rng);
        }
        self.cursor = self.first_position();
        tracing::debug!(
            source = ?self.active,
            len = self.len(),
            "Navigator loaded catalog"
        );
    }

    // ===== Queries =====

    /// All sources
    pub fn sources(&self) -> &SourceSet {
        &self.sources
    }

    /// Currently selected source
    pub fn active_source(&self) -> SourceKind {
        self.active
    }

    /// Whether shuffle is on
    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// Whether repeat is on
    pub fn is_repeating(&self) -> bool {
        self.repeat
    }

    /// Cursor into the effective sequence
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Length of the effective sequence
    pub fn len(&self) -> usize {
        self.sequence().len()
    }

    /// Whether the effective sequence is empty
    pub fn is_empty(&self) -> bool {
        self.sequence().is_empty()
    }

    /// Effective sequence of the active source
    pub fn sequence(&self) -> &[Arc<Item>] {
        self.sources.get(self.active).sequence(self.shuffle)
    }

    /// Listing of the active source, including the sentinel if it has one
    pub fn listing(&self) -> Vec<SourceEntry> {
        self.sources.get(self.active).entries(self.shuffle)
    }

    /// Item under the cursor
    pub fn current(&self) -> Option<Arc<Item>> {
        match self.cursor {
            Cursor::BeforeStart => None,
            Cursor::At(index) => self.sequence().get(index).cloned(),
        }
    }

    // ===== Movement =====

    /// Advance the cursor
    ///
    /// Past the end, wraps to 0 with repeat on; otherwise returns `None` and
    /// resets the cursor so the following `next` starts over at 0.
    pub fn next(&mut self) -> Option<Arc<Item>> {
        let len = self.len();
        if len == 0 {
            self.cursor = Cursor::BeforeStart;
            return None;
        }

        let target = match self.cursor {
            Cursor::BeforeStart => 0,
            Cursor::At(index) => index + 1,
        };

        if target < len {
            self.cursor = Cursor::At(target);
        } else if self.repeat {
            self.cursor = Cursor::At(0);
        } else {
            self.cursor = Cursor::BeforeStart;
            return None;
        }
        self.current()
    }

    /// Move the cursor back, wrapping from the start to the last item
    pub fn previous(&mut self) -> Option<Arc<Item>> {
        let len = self.len();
        if len == 0 {
            self.cursor = Cursor::BeforeStart;
            return None;
        }

        let target = match self.cursor {
            Cursor::BeforeStart | Cursor::At(0) => len - 1,
            Cursor::At(index) => (index - 1).min(len - 1),
        };
        self.cursor = Cursor::At(target);
        self.current()
    }

    /// Put the cursor on `index` of the effective sequence
    ///
    /// # Errors
    /// `NotPlayable` for the sentinel row, `IndexOutOfRange` past the listing.
    /// The cursor is unchanged on error.
    pub fn jump_to(&mut self, index: usize) -> Result<Arc<Item>> {
        let len = self.len();
        if index >= len {
            if index == len && self.sources.get(self.active).has_all_songs_entry() {
                return Err(PlaybackError::NotPlayable(index));
            }
            return Err(PlaybackError::IndexOutOfRange { index, len });
        }

        self.cursor = Cursor::At(index);
        self.current().ok_or(PlaybackError::IndexOutOfRange { index, len })
    }

    /// Put the cursor on a uniformly random item
    ///
    /// # Errors
    /// `EmptySource` if the effective sequence is empty.
    pub fn random_item(&mut self) -> Result<Arc<Item>> {
        let len = self.len();
        if len == 0 {
            return Err(PlaybackError::EmptySource);
        }

        let index = self.rng.gen_range(0..len);
        self.cursor = Cursor::At(index);
        self.current().ok_or(PlaybackError::EmptySource)
    }

    // ===== Toggles and source changes =====

    /// Flip shuffle, keeping the current item current
    ///
    /// Enabling builds a fresh projection with the current item pinned first
    /// and puts the cursor on it. Disabling discards every projection and
    /// moves the cursor to the current item's base position.
    pub fn toggle_shuffle(&mut self) -> bool {
        let current = self.current();

        if self.shuffle {
            self.shuffle = false;
            self.sources.clear_projections();
        } else {
            self.shuffle = true;
            let active = self.sources.get_mut(self.active);
            active.build_projection(current.as_ref(), &mut self.rng);
        }

        self.cursor = self.position_for(current.as_ref(), None);
        tracing::debug!(shuffle = self.shuffle, cursor = ?self.cursor, "Shuffle toggled");
        self.shuffle
    }

    /// Set shuffle to `enabled`, toggling only if it differs
    pub fn set_shuffle(&mut self, enabled: bool) {
        if self.shuffle != enabled {
            self.toggle_shuffle();
        }
    }

    /// Flip repeat
    pub fn toggle_repeat(&mut self) -> bool {
        self.repeat = !self.repeat;
        self.repeat
    }

    /// Set repeat
    pub fn set_repeat(&mut self, enabled: bool) {
        self.repeat = enabled;
    }

    /// Make `kind` the active source
    ///
    /// The cursor follows the current item if the new source contains it,
    /// otherwise keeps its index clamped to the new length.
    pub fn select_source(&mut self, kind: SourceKind) {
        let current = self.current();
        let previous_index = self.index();

        self.active = kind;
        if self.shuffle && !self.sources.get(kind).has_projection() {
            let active = self.sources.get_mut(kind);
            active.build_projection(current.as_ref(), &mut self.rng);
        }

        self.cursor = self.position_for(current.as_ref(), previous_index);
        tracing::debug!(source = ?kind, cursor = ?self.cursor, "Source selected");
    }

    /// Replace the base sequence of `kind`
    ///
    /// The old projection is discarded. If `kind` is active, a new projection
    /// is built when shuffling and the cursor is remapped as in
    /// [`select_source`](Self::select_source).
    pub fn install_source(&mut self, kind: SourceKind, source: Source) {
        let current = self.current();
        let previous_index = self.index();

        self.sources.replace(kind, source);

        if kind == self.active {
            if self.shuffle {
                let active = self.sources.get_mut(kind);
                active.build_projection(current.as_ref(), &mut self.rng);
            }
            self.cursor = self.position_for(current.as_ref(), previous_index);
        }
        tracing::debug!(
            source = ?kind,
            len = self.sources.get(kind).len(),
            "Source rebuilt"
        );
    }

    /// Rebuild the generated playlist from every item by `artist`
    pub fn filter_by_artist(&mut self, catalog: &Catalog, artist: &str) {
        let source = Source::filtered_by_artist(catalog, artist);
        self.install_source(SourceKind::GeneratedPlaylist, source);
    }

    /// Rebuild the generated playlist from every item on `album`
    pub fn filter_by_album(&mut self, catalog: &Catalog, album: &str) {
        let source = Source::filtered_by_album(catalog, album);
        self.install_source(SourceKind::GeneratedPlaylist, source);
    }

    /// Replace the user playlist
    pub fn set_user_playlist(&mut self, items: Vec<Arc<Item>>) {
        self.install_source(SourceKind::UserPlaylist, Source::new(items));
    }

    // ===== Helpers =====

    fn index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::BeforeStart => None,
            Cursor::At(index) => Some(index),
        }
    }

    fn first_position(&self) -> Cursor {
        if self.is_empty() {
            Cursor::BeforeStart
        } else {
            Cursor::At(0)
        }
    }

    /// Cursor for `item` in the effective sequence, else `fallback` clamped
    fn position_for(&self, item: Option<&Arc<Item>>, fallback: Option<usize>) -> Cursor {
        let len = self.len();
        if len == 0 {
            return Cursor::BeforeStart;
        }
        if let Some(index) = item.and_then(|item| position_of(self.sequence(), item)) {
            return Cursor::At(index);
        }
        Cursor::At(fallback.unwrap_or(0).min(len - 1))
    }
}
