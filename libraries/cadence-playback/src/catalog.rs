//! Song catalog
//!
//! Immutable snapshot of everything the external scanner found. Cheap to
//! clone: items live behind one shared allocation, so a catalog snapshot can
//! be handed to a worker thread without holding the session lock.

use crate::error::{PlaybackError, Result};
use crate::types::{Item, ItemId};
use std::cmp::Ordering;
use std::sync::Arc;

/// Label of the synthetic trailing entry in artist-derived listings
pub const ALL_SONGS: &str = "All Songs";

/// External media-library scanner
///
/// `load_all` may take long (it walks storage), so callers run it off the
/// session's critical path.
pub trait CatalogProvider: Send + Sync {
    /// Return every playable item in scan order
    ///
    /// # Errors
    /// `ScanFailed` on I/O failure. An empty result is reported as
    /// `EmptyCatalog` by [`Catalog::load`].
    fn load_all(&self) -> Result<Vec<Item>>;
}

/// Immutable list of items produced by one scan
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Arc<Vec<Arc<Item>>>,
}

impl Catalog {
    /// Build a catalog from scan results, preserving scan order
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Arc::new(items.into_iter().map(Arc::new).collect()),
        }
    }

    /// Run a provider and wrap its result
    ///
    /// # Errors
    /// Propagates `ScanFailed`; returns `EmptyCatalog` when the scan found nothing.
    pub fn load(provider: &dyn CatalogProvider) -> Result<Self> {
        let items = provider.load_all()?;
        if items.is_empty() {
            return Err(PlaybackError::EmptyCatalog);
        }
        tracing::info!(count = items.len(), "Catalog loaded");
        Ok(Self::new(items))
    }

    /// All items in scan order
    pub fn items(&self) -> &[Arc<Item>] {
        &self.items
    }

    /// Number of items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the scan found nothing
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by catalog id
    pub fn get_by_id(&self, id: ItemId) -> Option<Arc<Item>> {
        self.items.iter().find(|item| item.id == id).cloned()
    }

    /// Items sorted by title, case-insensitive, ascending (stable)
    pub fn sorted_by_title(&self) -> Vec<Arc<Item>> {
        let mut sorted: Vec<Arc<Item>> = self.items.iter().cloned().collect();
        sorted.sort_by(|a, b| compare_ignore_case(&a.title, &b.title));
        sorted
    }

    /// Items whose artist equals `artist`, in scan order
    pub fn by_artist(&self, artist: &str) -> Vec<Arc<Item>> {
        self.items
            .iter()
            .filter(|item| item.artist == artist)
            .cloned()
            .collect()
    }

    /// Items whose album equals `album`, in scan order
    pub fn by_album(&self, album: &str) -> Vec<Arc<Item>> {
        self.items
            .iter()
            .filter(|item| item.album == album)
            .cloned()
            .collect()
    }

    /// Titles in scan order
    pub fn titles(&self) -> Vec<String> {
        self.items.iter().map(|item| item.title.clone()).collect()
    }

    /// Titles sorted case-insensitively
    pub fn sorted_titles(&self) -> Vec<String> {
        let mut titles = self.titles();
        titles.sort_by(|a, b| compare_ignore_case(a, b));
        titles
    }

    /// Distinct artists, sorted case-insensitively
    pub fn artists(&self) -> Vec<String> {
        sorted_distinct(self.items.iter().map(|item| item.artist.as_str()))
    }

    /// Distinct albums, sorted case-insensitively
    pub fn albums(&self) -> Vec<String> {
        sorted_distinct(self.items.iter().map(|item| item.album.as_str()))
    }

    /// Distinct albums by `artist` in scan order, followed by [`ALL_SONGS`]
    pub fn albums_by_artist(&self, artist: &str) -> Vec<String> {
        let mut albums: Vec<String> = Vec::new();
        for item in self.items.iter().filter(|item| item.artist == artist) {
            if !albums.contains(&item.album) {
                albums.push(item.album.clone());
            }
        }
        albums.push(ALL_SONGS.to_string());
        albums
    }
}

/// Case-insensitive ordering used for every sorted listing
pub(crate) fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut distinct: Vec<String> = Vec::new();
    for value in values {
        if !distinct.iter().any(|seen| seen == value) {
            distinct.push(value.to_string());
        }
    }
    distinct.sort_by(|a, b| compare_ignore_case(a, b));
    distinct
}
