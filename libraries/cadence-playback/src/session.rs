//! Playback session - core orchestration
//!
//! Single-writer state machine tying together the navigator, the focus
//! arbiter and the decode engine. Every input (command, engine event, focus
//! notification, catalog result) is applied by one `&mut self` call, so the
//! runtime only has to serialize calls to get a consistent view.
//!
//! States: `Retrieving -> Stopped <-> Preparing -> Playing <-> Paused`.
//! Every load gets a fresh [`Generation`]; engine events from older loads
//! are discarded.

use crate::{
    catalog::Catalog,
    command::Command,
    engine::{DecodeEngine, EngineEvent, EngineEventKind, Generation},
    error::{PlaybackError, Result},
    events::SessionEvent,
    focus::{FocusArbiter, FocusChange, FocusProvider},
    navigator::Navigator,
    sources::{Source, SourceEntry},
    types::{AudioFocus, Item, ItemId, PauseReason, PlaybackState, SessionConfig, SourceKind},
};
use std::sync::Arc;

/// Playback requested before the catalog was ready
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingPlay {
    None,
    Navigator,
    Url(String),
}

/// Decoder lifecycle as seen by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoder {
    Released,
    Loading,
    /// Prepared but not producing output
    Prepared,
    Started,
}

impl Decoder {
    fn is_loaded(self) -> bool {
        matches!(self, Decoder::Prepared | Decoder::Started)
    }
}

/// Background playback session
pub struct PlaybackSession {
    config: SessionConfig,
    state: PlaybackState,
    pause_reason: Option<PauseReason>,
    current_item: Option<Arc<Item>>,
    pending: PendingPlay,
    navigator: Navigator,
    catalog: Option<Catalog>,
    scan_error: Option<PlaybackError>,
    focus: FocusArbiter,
    engine: Box<dyn DecodeEngine>,
    decoder: Decoder,
    generation: Generation,
    retries: u8,
    /// Items given up on since the last successful prepare
    failed_items: usize,
    events: Vec<SessionEvent>,
}

impl PlaybackSession {
    /// Create a session waiting for its catalog
    pub fn new(
        config: SessionConfig,
        engine: Box<dyn DecodeEngine>,
        focus: Box<dyn FocusProvider>,
    ) -> Self {
        let navigator = Navigator::new(config.initial_source);
        Self::with_navigator(config, navigator, engine, focus)
    }

    /// Create a session whose shuffles are reproducible
    pub fn with_seed(
        config: SessionConfig,
        seed: u64,
        engine: Box<dyn DecodeEngine>,
        focus: Box<dyn FocusProvider>,
    ) -> Self {
        let navigator = Navigator::with_seed(config.initial_source, seed);
        Self::with_navigator(config, navigator, engine, focus)
    }

    fn with_navigator(
        config: SessionConfig,
        mut navigator: Navigator,
        engine: Box<dyn DecodeEngine>,
        focus: Box<dyn FocusProvider>,
    ) -> Self {
        navigator.set_shuffle(config.shuffle);
        navigator.set_repeat(config.repeat);

        Self {
            config,
            state: PlaybackState::Retrieving,
            pause_reason: None,
            current_item: None,
            pending: PendingPlay::None,
            navigator,
            catalog: None,
            scan_error: None,
            focus: FocusArbiter::new(focus),
            engine,
            decoder: Decoder::Released,
            generation: Generation::INITIAL,
            retries: 0,
            failed_items: 0,
            events: Vec::new(),
        }
    }

    // ===== Inputs =====

    /// Apply a command
    ///
    /// Commands that do not apply in the current state are ignored.
    ///
    /// # Errors
    /// Advisory only: the session is left in a well-defined state and the
    /// error is also queued as [`SessionEvent::Error`].
    pub fn handle_command(&mut self, command: Command) -> Result<()> {
        tracing::debug!(?command, state = ?self.state, "Handling command");

        let result = match command {
            Command::Play => {
                self.play();
                Ok(())
            }
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Toggle => {
                match self.state {
                    PlaybackState::Paused | PlaybackState::Stopped => self.play(),
                    _ => self.pause(),
                }
                Ok(())
            }
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Skip => {
                self.skip();
                Ok(())
            }
            Command::Previous => {
                self.previous();
                Ok(())
            }
            Command::SeekRelative(delta_ms) => self.seek_relative(delta_ms),
            Command::FastForward => self.seek_relative(step(self.config.fast_forward_ms)),
            Command::FastRewind => self.seek_relative(-step(self.config.fast_rewind_ms)),
            Command::PlayUrl(url) => {
                self.play_url(url);
                Ok(())
            }
            Command::PlayAtIndex(index) => self.play_at_index(index),
            Command::PlayRandom => self.play_random(),
            Command::ToggleShuffle => {
                let enabled = self.navigator.toggle_shuffle();
                self.emit(SessionEvent::ShuffleChanged { enabled });
                Ok(())
            }
            Command::ToggleRepeat => {
                let enabled = self.navigator.toggle_repeat();
                self.emit(SessionEvent::RepeatChanged { enabled });
                Ok(())
            }
            Command::SelectSource(kind) => {
                self.select_source(kind);
                Ok(())
            }
            Command::FilterByArtist(artist) => self.ready_catalog().map(|catalog| {
                self.navigator.filter_by_artist(&catalog, &artist);
                self.source_rebuilt(SourceKind::GeneratedPlaylist);
            }),
            Command::FilterByAlbum(album) => self.ready_catalog().map(|catalog| {
                self.navigator.filter_by_album(&catalog, &album);
                self.source_rebuilt(SourceKind::GeneratedPlaylist);
            }),
            Command::SetUserPlaylist(ids) => self.set_user_playlist(&ids),
        };

        if let Err(error) = &result {
            tracing::warn!(%error, state = ?self.state, "Command failed");
            self.emit_error(error);
        }
        result
    }

    /// Apply the result of a catalog scan
    ///
    /// A failed scan keeps the session in `Retrieving` until a rescan
    /// succeeds. An empty scan is not a failure: the session becomes
    /// `Stopped` with nothing to play.
    pub fn on_catalog_loaded(&mut self, result: Result<Catalog>) {
        let catalog = match result {
            Ok(catalog) => catalog,
            Err(PlaybackError::EmptyCatalog) => {
                tracing::warn!("Catalog scan found no items");
                Catalog::default()
            }
            Err(error) => {
                tracing::error!(%error, "Catalog scan failed");
                self.emit(SessionEvent::CatalogFailed {
                    message: error.to_string(),
                });
                self.scan_error = Some(error);
                return;
            }
        };

        self.navigator.load_catalog(&catalog);
        let count = catalog.len();
        self.catalog = Some(catalog);
        self.scan_error = None;
        self.emit(SessionEvent::CatalogReady { count });

        if self.state == PlaybackState::Retrieving {
            self.set_state(PlaybackState::Stopped);
        }

        match std::mem::replace(&mut self.pending, PendingPlay::None) {
            PendingPlay::None => {}
            PendingPlay::Navigator => self.start_from_navigator(),
            PendingPlay::Url(url) => self.play_url(url),
        }
    }

    /// Apply an asynchronous decode-engine notification
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        if event.generation != self.generation {
            tracing::debug!(
                event_generation = %event.generation,
                generation = %self.generation,
                kind = ?event.kind,
                "Dropping stale engine event"
            );
            return;
        }

        match event.kind {
            EngineEventKind::Ready => self.on_prepared(),
            EngineEventKind::Error(code) => self.on_decode_error(code),
            EngineEventKind::Complete => self.on_completion(),
        }
    }

    /// Apply an audio focus notification
    ///
    /// Logical state never changes here. While playing, output is
    /// reconfigured: attenuated on duckable loss, paused on full loss,
    /// restored on regain.
    pub fn on_focus_change(&mut self, change: FocusChange) {
        let before = self.focus.focus();
        let focus = self.focus.on_change(change);
        if focus != before {
            self.emit(SessionEvent::FocusChanged { focus });
        }

        if self.state == PlaybackState::Playing {
            self.configure_and_start();
        }
    }

    /// Replace a source's contents, remapping the cursor if it is active
    pub fn install_source(&mut self, kind: SourceKind, source: Source) {
        self.navigator.install_source(kind, source);
        self.source_rebuilt(kind);
    }

    /// Stop playback and give back every resource
    pub fn shutdown(&mut self) {
        self.pending = PendingPlay::None;
        self.halt();
        tracing::info!("Playback session shut down");
    }

    // ===== Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Why the session is paused, `None` unless in `Paused`
    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.pause_reason
    }

    /// Item loaded into the decoder
    pub fn current_item(&self) -> Option<Arc<Item>> {
        self.current_item.clone()
    }

    /// Whether the current item is a network stream
    pub fn is_streaming(&self) -> bool {
        self.current_item
            .as_ref()
            .is_some_and(|item| item.locator().is_streaming())
    }

    pub fn is_shuffled(&self) -> bool {
        self.navigator.is_shuffled()
    }

    pub fn is_repeating(&self) -> bool {
        self.navigator.is_repeating()
    }

    pub fn focus(&self) -> AudioFocus {
        self.focus.focus()
    }

    pub fn active_source(&self) -> SourceKind {
        self.navigator.active_source()
    }

    /// Listing of the active source
    pub fn listing(&self) -> Vec<SourceEntry> {
        self.navigator.listing()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Snapshot of the loaded catalog
    pub fn catalog(&self) -> Option<Catalog> {
        self.catalog.clone()
    }

    /// Error of the last failed scan, cleared by a successful one
    pub fn scan_error(&self) -> Option<&PlaybackError> {
        self.scan_error.as_ref()
    }

    /// Generation of the most recent load or stop
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Take queued events, oldest first
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Transport =====

    fn play(&mut self) {
        match self.state {
            PlaybackState::Retrieving => {
                tracing::debug!("Play requested while retrieving, deferring");
                self.pending = PendingPlay::Navigator;
            }
            PlaybackState::Stopped => self.start_from_navigator(),
            PlaybackState::Paused => {
                self.request_focus();
                self.pause_reason = None;
                self.set_state(PlaybackState::Playing);
                self.configure_and_start();
            }
            PlaybackState::Preparing | PlaybackState::Playing => {}
        }
    }

    fn pause(&mut self) {
        match self.state {
            PlaybackState::Retrieving => {
                // Cancels a deferred play
                self.pending = PendingPlay::None;
            }
            PlaybackState::Playing => {
                if self.decoder == Decoder::Started {
                    self.engine.pause();
                    self.decoder = Decoder::Prepared;
                }
                self.pause_reason = Some(PauseReason::UserRequest);
                self.set_state(PlaybackState::Paused);
            }
            _ => {}
        }
    }

    fn stop(&mut self) {
        match self.state {
            PlaybackState::Retrieving => self.pending = PendingPlay::None,
            PlaybackState::Preparing | PlaybackState::Playing | PlaybackState::Paused => {
                self.halt();
            }
            PlaybackState::Stopped => {}
        }
    }

    fn skip(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            tracing::debug!(state = ?self.state, "Skip ignored");
            return;
        }
        self.request_focus();
        self.advance();
    }

    fn previous(&mut self) {
        if !matches!(
            self.state,
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Stopped
        ) {
            tracing::debug!(state = ?self.state, "Previous ignored");
            return;
        }

        match self.navigator.previous() {
            Some(item) => {
                self.request_focus();
                self.begin_load(item, true);
            }
            None => self.emit(SessionEvent::NothingToPlay),
        }
    }

    fn seek_relative(&mut self, delta_ms: i64) -> Result<()> {
        if !self.decoder.is_loaded() {
            return Err(PlaybackError::NoDecoderLoaded);
        }

        let position = self.engine.position_ms();
        let target = if delta_ms < 0 {
            position.saturating_sub(delta_ms.unsigned_abs())
        } else {
            position.saturating_add(delta_ms.unsigned_abs())
        };

        let duration = self.engine.duration_ms().or_else(|| {
            self.current_item
                .as_ref()
                .map(|item| item.duration_ms)
                .filter(|duration| *duration > 0)
        });
        let target = duration.map_or(target, |duration| target.min(duration));

        tracing::debug!(position, target, "Seeking");
        self.engine.seek_to(target);
        Ok(())
    }

    fn play_url(&mut self, url: String) {
        if self.state == PlaybackState::Retrieving {
            tracing::debug!(%url, "URL requested while retrieving, deferring");
            self.pending = PendingPlay::Url(url);
            return;
        }

        self.request_focus();
        self.begin_load(Arc::new(Item::external(url)), true);
    }

    fn play_at_index(&mut self, index: usize) -> Result<()> {
        self.ready_catalog()?;
        let item = self.navigator.jump_to(index)?;
        self.request_focus();
        self.begin_load(item, true);
        Ok(())
    }

    fn play_random(&mut self) -> Result<()> {
        self.ready_catalog()?;
        let item = self.navigator.random_item()?;
        self.request_focus();
        self.begin_load(item, true);
        Ok(())
    }

    // ===== Sources =====

    fn select_source(&mut self, kind: SourceKind) {
        self.navigator.select_source(kind);
        let len = self.navigator.len();
        self.emit(SessionEvent::SourceChanged { source: kind, len });
    }

    fn set_user_playlist(&mut self, ids: &[ItemId]) -> Result<()> {
        let catalog = self.ready_catalog()?;

        let mut items = Vec::with_capacity(ids.len());
        for &id in ids {
            match catalog.get_by_id(id) {
                Some(item) => items.push(item),
                None => tracing::warn!(id, "Unknown item in user playlist, skipping"),
            }
        }

        self.navigator.set_user_playlist(items);
        self.source_rebuilt(SourceKind::UserPlaylist);
        Ok(())
    }

    fn source_rebuilt(&mut self, kind: SourceKind) {
        let len = self.navigator.sources().get(kind).len();
        self.emit(SessionEvent::SourceRebuilt { source: kind, len });
    }

    fn ready_catalog(&self) -> Result<Catalog> {
        self.catalog.clone().ok_or(PlaybackError::NotReady)
    }

    // ===== Decoder =====

    fn start_from_navigator(&mut self) {
        let item = self.navigator.current().or_else(|| self.navigator.next());
        match item {
            Some(item) => {
                self.request_focus();
                self.begin_load(item, true);
            }
            None => {
                tracing::info!(source = ?self.navigator.active_source(), "Nothing to play");
                self.emit(SessionEvent::NothingToPlay);
            }
        }
    }

    /// Move to the next item, or stop at the end of the sequence
    fn advance(&mut self) {
        match self.navigator.next() {
            Some(item) => self.begin_load(item, true),
            None => {
                self.halt();
                self.emit(SessionEvent::NothingToPlay);
            }
        }
    }

    fn begin_load(&mut self, item: Arc<Item>, fresh: bool) {
        if fresh {
            self.retries = 0;
        }
        self.generation = self.generation.next();

        let locator = item.locator();
        tracing::info!(
            generation = %self.generation,
            %locator,
            streaming = locator.is_streaming(),
            "Loading item"
        );

        self.decoder = Decoder::Loading;
        self.pause_reason = None;
        self.set_current_item(Some(item));
        self.set_state(PlaybackState::Preparing);
        self.engine.load(&locator, self.generation);
    }

    /// Release the decoder and focus; invalidates in-flight engine events
    fn halt(&mut self) {
        self.generation = self.generation.next();
        if self.decoder != Decoder::Released {
            self.engine.stop();
            self.engine.release();
            self.decoder = Decoder::Released;
        }
        self.set_current_item(None);
        self.pause_reason = None;
        self.failed_items = 0;
        self.release_focus();
        self.set_state(PlaybackState::Stopped);
    }

    fn on_prepared(&mut self) {
        if self.state != PlaybackState::Preparing || self.decoder != Decoder::Loading {
            tracing::debug!(state = ?self.state, "Ready ignored");
            return;
        }
        self.decoder = Decoder::Prepared;
        self.failed_items = 0;
        self.set_state(PlaybackState::Playing);
        self.configure_and_start();
    }

    fn on_decode_error(&mut self, code: i32) {
        let error = PlaybackError::Decode(code);
        tracing::warn!(code, generation = %self.generation, "Decode engine error");
        self.emit_error(&error);

        if !matches!(
            self.state,
            PlaybackState::Preparing | PlaybackState::Playing | PlaybackState::Paused
        ) {
            return;
        }

        if self.retries < self.config.max_decode_retries {
            if let Some(item) = self.current_item.clone() {
                self.retries += 1;
                tracing::info!(attempt = self.retries, "Retrying item");
                self.begin_load(item, false);
                return;
            }
        }

        // Repeat never exhausts the sequence; stop once every item has failed
        self.failed_items += 1;
        if self.failed_items >= self.navigator.len() {
            tracing::warn!(failed = self.failed_items, "No playable item left");
            self.halt();
            self.emit(SessionEvent::NothingToPlay);
            return;
        }
        self.advance();
    }

    fn on_completion(&mut self) {
        if self.state != PlaybackState::Playing {
            tracing::debug!(state = ?self.state, "Completion ignored");
            return;
        }
        tracing::debug!("Item completed");
        self.advance();
    }

    /// Match decoder output to the current focus
    fn configure_and_start(&mut self) {
        if !self.decoder.is_loaded() {
            return;
        }

        match self.focus.output_gain(self.config.duck_volume) {
            None => {
                if self.decoder == Decoder::Started {
                    self.engine.pause();
                    self.decoder = Decoder::Prepared;
                }
                tracing::debug!("Output held without audio focus");
            }
            Some(gain) => {
                self.engine.set_volume(gain, gain);
                if self.decoder != Decoder::Started {
                    self.engine.start();
                    self.decoder = Decoder::Started;
                }
            }
        }
    }

    // ===== Bookkeeping =====

    fn request_focus(&mut self) {
        let before = self.focus.focus();
        let focus = self.focus.request_focus();
        if focus != before {
            self.emit(SessionEvent::FocusChanged { focus });
        }
    }

    fn release_focus(&mut self) {
        let before = self.focus.focus();
        let focus = self.focus.release_focus();
        if focus != before {
            self.emit(SessionEvent::FocusChanged { focus });
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!(from = ?self.state, to = ?state, "State changed");
            self.state = state;
            self.emit(SessionEvent::StateChanged { state });
        }
    }

    fn set_current_item(&mut self, item: Option<Arc<Item>>) {
        let unchanged = match (&self.current_item, &item) {
            (Some(old), Some(new)) => Arc::ptr_eq(old, new),
            (None, None) => true,
            _ => false,
        };
        self.current_item = item;
        if !unchanged {
            let item = self.current_item.as_ref().map(|item| (**item).clone());
            self.emit(SessionEvent::ItemChanged { item });
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.events.push(event);
    }

    fn emit_error(&mut self, error: &PlaybackError) {
        self.emit(SessionEvent::Error {
            message: error.to_string(),
        });
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("focus", &self.focus)
            .field("current_item", &self.current_item)
            .finish_non_exhaustive()
    }
}

/// Seek step in milliseconds as a signed delta
fn step(ms: u64) -> i64 {
    i64::try_from(ms).unwrap_or(i64::MAX)
}
