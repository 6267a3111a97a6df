//! Cadence - Playback Service
//!
//! Threaded runtime for [`cadence_playback::PlaybackSession`].
//!
//! This crate provides:
//! - A dispatcher thread that applies commands, engine callbacks, focus
//!   changes and catalog results to the session one at a time
//! - Background catalog loading, with rescan after a failed scan
//! - Artist/album playlist rebuilds on a worker thread, behind a gate that
//!   holds back navigation until the rebuild is installed
//! - Layered configuration (TOML file + `CADENCE_` environment variables)
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_playback::{AlwaysFocused, Command, DecodeEngine, Generation, SourceLocator};
//! use cadence_playback::{CatalogProvider, Item};
//! use cadence_service::{EngineCallbacks, PlaybackService, ServiceConfig};
//! use std::path::Path;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! struct Scanner;
//!
//! impl CatalogProvider for Scanner {
//!     fn load_all(&self) -> cadence_playback::Result<Vec<Item>> {
//!         Ok(vec![Item::new(1, "Artist", "Song", "Album", 180_000, None)])
//!     }
//! }
//!
//! struct Player {
//!     callbacks: EngineCallbacks,
//! }
//!
//! impl DecodeEngine for Player {
//!     fn load(&mut self, _locator: &SourceLocator, generation: Generation) {
//!         // A real engine prepares asynchronously and reports later
//!         self.callbacks.ready(generation);
//!     }
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
//! let config = ServiceConfig::load(Some(Path::new("cadence.toml")))?;
//! let builder = PlaybackService::builder(config);
//! let player = Player {
//!     callbacks: builder.engine_callbacks(),
//! };
//! let service = builder.start(Arc::new(Scanner), Box::new(player), Box::new(AlwaysFocused))?;
//!
//! service.send(Command::Play)?;
//! while let Some(event) = service.recv_event_timeout(Duration::from_secs(1)) {
//!     println!("{event:?}");
//! }
//! # Ok::<(), cadence_service::ServiceError>(())
//! ```

pub mod config;
pub mod error;
pub mod gate;
pub mod service;

pub use config::ServiceConfig;
pub use error::{Result, ServiceError};
pub use gate::{RebuildGate, RebuildTicket};
pub use service::{CommandSender, EngineCallbacks, FocusListener, PlaybackService, ServiceBuilder};
