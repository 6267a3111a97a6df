//! Cadence - Playback Session
//!
//! Platform-agnostic core of a background media-playback session.
//!
//! This crate provides:
//! - Catalog snapshots with sorted, artist and album listings
//! - Four playlist sources (library, sorted library, user, generated), each
//!   with a lazily built shuffled projection
//! - A navigator with next / previous / jump / random and repeat
//! - Audio focus arbitration (full, duck-only, none)
//! - The playback state machine, with generation-tagged engine events
//!
//! # Architecture
//!
//! `cadence-playback` spawns no threads and does no I/O. The platform media
//! player and the focus system are supplied through traits
//! ([`DecodeEngine`], [`FocusProvider`], [`CatalogProvider`]); the threaded
//! runtime lives in `cadence-service`.
//!
//! # Example
//!
//! ```rust
//! use cadence_playback::{
//!     AlwaysFocused, Catalog, Command, DecodeEngine, EngineEvent, Generation, Item,
//!     PlaybackSession, PlaybackState, SessionConfig, SourceLocator,
//! };
//!
//! struct SilentEngine;
//!
//! impl DecodeEngine for SilentEngine {
//!     fn load(&mut self, _locator: &SourceLocator, _generation: Generation) {}
//!     fn start(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn stop(&mut self) {}
//!     fn seek_to(&mut self, _position_ms: u64) {}
//!     fn set_volume(&mut self, _left: f32, _right: f32) {}
//!     fn release(&mut self) {}
//!     fn position_ms(&self) -> u64 {
//!         0
//!     }
//! }
//!
//! let mut session = PlaybackSession::new(
//!     SessionConfig::default(),
//!     Box::new(SilentEngine),
//!     Box::new(AlwaysFocused),
//! );
//! assert_eq!(session.state(), PlaybackState::Retrieving);
//!
//! let catalog = Catalog::new(vec![Item::new(1, "Artist", "Song", "Album", 180_000, None)]);
//! session.on_catalog_loaded(Ok(catalog));
//!
//! session.handle_command(Command::Play).unwrap();
//! assert_eq!(session.state(), PlaybackState::Preparing);
//!
//! // The engine reports readiness for the load it was given
//! session.on_engine_event(EngineEvent::ready(session.generation()));
//! assert_eq!(session.state(), PlaybackState::Playing);
//! ```

pub mod catalog;
pub mod command;
pub mod engine;
pub mod error;
pub mod events;
pub mod focus;
pub mod navigator;
pub mod session;
pub mod shuffle;
pub mod sources;
pub mod types;

// Re-exports
pub use catalog::{Catalog, CatalogProvider, ALL_SONGS};
pub use command::Command;
pub use engine::{DecodeEngine, EngineEvent, EngineEventKind, Generation};
pub use error::{PlaybackError, Result};
pub use events::SessionEvent;
pub use focus::{AlwaysFocused, FocusArbiter, FocusChange, FocusProvider};
pub use navigator::{Cursor, Navigator};
pub use session::PlaybackSession;
pub use sources::{Source, SourceEntry, SourceSet};
pub use types::{
    AudioFocus, Item, ItemId, PauseReason, PlaybackState, SessionConfig, SourceKind,
    SourceLocator, DUCK_VOLUME,
};
