//! Playback service
//!
//! Hosts a [`PlaybackSession`] on a dedicated dispatcher thread. Every input
//! (commands, engine callbacks, focus notifications, catalog results) is a
//! message on a channel, and the dispatcher applies them one at a time
//! under the session lock. Handles only enqueue, so an engine may report
//! readiness from inside `load` without deadlocking.

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::gate::RebuildGate;
use cadence_playback::{
    AudioFocus, Catalog, CatalogProvider, Command, DecodeEngine, EngineEvent, EngineEventKind,
    FocusChange, FocusProvider, Generation, Item, PlaybackSession, PlaybackState, SessionEvent,
    Source, SourceEntry, SourceKind,
};
use crossbeam_channel::{bounded, select, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::cell::Cell;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Internal messages, produced by callbacks and workers
#[derive(Debug)]
enum Message {
    Engine(EngineEvent),
    Focus(FocusChange),
    CatalogLoaded(cadence_playback::Result<Catalog>),
    Rescan,
    Shutdown,
}

impl Message {
    /// Whether handling reads or writes navigator state
    fn reads_navigator(&self) -> bool {
        match self {
            Message::Engine(event) => matches!(
                event.kind,
                EngineEventKind::Error(_) | EngineEventKind::Complete
            ),
            Message::CatalogLoaded(_) => true,
            Message::Focus(_) | Message::Rescan | Message::Shutdown => false,
        }
    }
}

/// Generated-playlist rebuild request
#[derive(Debug)]
enum Rebuild {
    Artist(String),
    Album(String),
}

impl Rebuild {
    fn build(&self, catalog: &Catalog) -> Source {
        match self {
            Rebuild::Artist(artist) => Source::filtered_by_artist(catalog, artist),
            Rebuild::Album(album) => Source::filtered_by_album(catalog, album),
        }
    }

    fn into_command(self) -> Command {
        match self {
            Rebuild::Artist(artist) => Command::FilterByArtist(artist),
            Rebuild::Album(album) => Command::FilterByAlbum(album),
        }
    }
}

// ===== Handles =====

/// Clonable handle for submitting commands
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<Command>,
}

impl CommandSender {
    /// Queue a command, blocking while the command queue is full
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| ServiceError::Disconnected)
    }
}

/// Clonable handle a decode engine uses to report back
#[derive(Debug, Clone)]
pub struct EngineCallbacks {
    tx: Sender<Message>,
}

impl EngineCallbacks {
    pub fn ready(&self, generation: Generation) {
        self.deliver(EngineEvent::ready(generation));
    }

    pub fn error(&self, generation: Generation, code: i32) {
        self.deliver(EngineEvent::error(generation, code));
    }

    pub fn complete(&self, generation: Generation) {
        self.deliver(EngineEvent::complete(generation));
    }

    /// Queue an engine event for the dispatcher
    pub fn deliver(&self, event: EngineEvent) {
        if self.tx.send(Message::Engine(event)).is_err() {
            tracing::debug!(?event, "Service stopped, engine event dropped");
        }
    }
}

/// Clonable handle the platform focus system uses to report changes
#[derive(Debug, Clone)]
pub struct FocusListener {
    tx: Sender<Message>,
}

impl FocusListener {
    pub fn gained(&self) {
        self.deliver(FocusChange::Gained);
    }

    pub fn lost(&self, can_duck: bool) {
        self.deliver(FocusChange::Lost { can_duck });
    }

    /// Queue a focus change for the dispatcher
    pub fn deliver(&self, change: FocusChange) {
        if self.tx.send(Message::Focus(change)).is_err() {
            tracing::debug!(?change, "Service stopped, focus change dropped");
        }
    }
}

// ===== Builder =====

/// Two-step construction for engines that need their callbacks up front
///
/// ```rust,no_run
/// # use cadence_service::{PlaybackService, ServiceConfig};
/// # use cadence_playback::{AlwaysFocused, CatalogProvider, DecodeEngine};
/// # use std::sync::Arc;
/// # fn make_engine(_: cadence_service::EngineCallbacks) -> Box<dyn DecodeEngine> { unimplemented!() }
/// # fn provider() -> Arc<dyn CatalogProvider> { unimplemented!() }
/// let builder = PlaybackService::builder(ServiceConfig::default());
/// let engine = make_engine(builder.engine_callbacks());
/// let service = builder.start(provider(), engine, Box::new(AlwaysFocused))?;
/// # Ok::<(), cadence_service::ServiceError>(())
/// ```
pub struct ServiceBuilder {
    config: ServiceConfig,
    internal_tx: Sender<Message>,
    internal_rx: Receiver<Message>,
}

impl ServiceBuilder {
    /// Callbacks to hand to the decode engine
    pub fn engine_callbacks(&self) -> EngineCallbacks {
        EngineCallbacks {
            tx: self.internal_tx.clone(),
        }
    }

    /// Listener to hand to the platform focus system
    pub fn focus_listener(&self) -> FocusListener {
        FocusListener {
            tx: self.internal_tx.clone(),
        }
    }

    /// Build the session from the configuration and start the service
    pub fn start(
        self,
        catalog: Arc<dyn CatalogProvider>,
        engine: Box<dyn DecodeEngine>,
        focus: Box<dyn FocusProvider>,
    ) -> Result<PlaybackService> {
        self.config.validate()?;
        let session = PlaybackSession::new(self.config.session.clone(), engine, focus);
        self.start_session(session, catalog)
    }

    /// Start the service around an existing session
    ///
    /// The session should still be retrieving; its own configuration is
    /// used instead of `config.session`.
    pub fn start_session(
        self,
        session: PlaybackSession,
        catalog: Arc<dyn CatalogProvider>,
    ) -> Result<PlaybackService> {
        self.config.validate()?;

        let (command_tx, command_rx) = bounded(self.config.command_capacity);
        let (event_tx, event_rx) = bounded(self.config.event_capacity);
        let session = Arc::new(Mutex::new(session));

        spawn_loader(Arc::clone(&catalog), self.internal_tx.clone())?;

        let dispatcher = Dispatcher {
            session: Arc::clone(&session),
            gate: Arc::new(RebuildGate::new()),
            internal_tx: self.internal_tx.clone(),
            event_tx,
            catalog,
            loading: Cell::new(true),
        };
        let internal_rx = self.internal_rx;
        let handle = thread::Builder::new()
            .name("cadence-dispatch".into())
            .spawn(move || dispatcher.run(&command_rx, &internal_rx))
            .map_err(|source| ServiceError::Spawn {
                name: "dispatcher",
                source,
            })?;

        tracing::info!(
            command_capacity = self.config.command_capacity,
            event_capacity = self.config.event_capacity,
            "Playback service started"
        );

        Ok(PlaybackService {
            session,
            command_tx,
            internal_tx: self.internal_tx,
            event_rx,
            dispatcher: Some(handle),
        })
    }
}

// ===== Service =====

/// Running playback service
///
/// Dropping the service stops the dispatcher, stops playback and releases
/// the decoder and audio focus.
pub struct PlaybackService {
    session: Arc<Mutex<PlaybackSession>>,
    command_tx: Sender<Command>,
    internal_tx: Sender<Message>,
    event_rx: Receiver<SessionEvent>,
    dispatcher: Option<JoinHandle<()>>,
}

impl PlaybackService {
    /// Begin building a service
    pub fn builder(config: ServiceConfig) -> ServiceBuilder {
        let (internal_tx, internal_rx) = unbounded();
        ServiceBuilder {
            config,
            internal_tx,
            internal_rx,
        }
    }

    /// Start a service whose engine does not need callbacks at construction
    ///
    /// Use [`engine_callbacks`](Self::engine_callbacks) afterwards to wire
    /// the engine up.
    pub fn start(
        config: ServiceConfig,
        catalog: Arc<dyn CatalogProvider>,
        engine: Box<dyn DecodeEngine>,
        focus: Box<dyn FocusProvider>,
    ) -> Result<Self> {
        Self::builder(config).start(catalog, engine, focus)
    }

    // ===== Inputs =====

    /// Queue a command
    pub fn send(&self, command: Command) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| ServiceError::Disconnected)
    }

    pub fn command_sender(&self) -> CommandSender {
        CommandSender {
            tx: self.command_tx.clone(),
        }
    }

    pub fn engine_callbacks(&self) -> EngineCallbacks {
        EngineCallbacks {
            tx: self.internal_tx.clone(),
        }
    }

    pub fn focus_listener(&self) -> FocusListener {
        FocusListener {
            tx: self.internal_tx.clone(),
        }
    }

    /// Retry the catalog scan after a failure
    ///
    /// Ignored once a catalog is loaded or while a scan is running.
    pub fn rescan(&self) -> Result<()> {
        self.internal_tx
            .send(Message::Rescan)
            .map_err(|_| ServiceError::Disconnected)
    }

    // ===== Queries =====

    pub fn state(&self) -> PlaybackState {
        self.session.lock().state()
    }

    /// Item loaded into the decoder
    pub fn current_item(&self) -> Option<Item> {
        self.session
            .lock()
            .current_item()
            .map(|item| (*item).clone())
    }

    pub fn is_streaming(&self) -> bool {
        self.session.lock().is_streaming()
    }

    pub fn is_shuffled(&self) -> bool {
        self.session.lock().is_shuffled()
    }

    pub fn is_repeating(&self) -> bool {
        self.session.lock().is_repeating()
    }

    pub fn focus(&self) -> AudioFocus {
        self.session.lock().focus()
    }

    pub fn active_source(&self) -> SourceKind {
        self.session.lock().active_source()
    }

    /// Listing of the active source
    pub fn listing(&self) -> Vec<SourceEntry> {
        self.session.lock().listing()
    }

    /// Snapshot of the loaded catalog
    pub fn catalog(&self) -> Option<Catalog> {
        self.session.lock().catalog()
    }

    // ===== Events =====

    /// Next queued event, if any
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Next event, waiting up to `timeout`
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop the dispatcher and wait for it to release everything
    pub fn shutdown(mut self) {
        self.stop_dispatcher();
    }

    fn stop_dispatcher(&mut self) {
        let Some(handle) = self.dispatcher.take() else {
            return;
        };

        if self.internal_tx.send(Message::Shutdown).is_err() {
            tracing::warn!("Dispatcher already gone");
        }
        if handle.join().is_err() {
            tracing::error!("Dispatcher thread panicked");
        }
    }
}

impl Drop for PlaybackService {
    fn drop(&mut self) {
        self.stop_dispatcher();
    }
}

// ===== Dispatcher =====

struct Dispatcher {
    session: Arc<Mutex<PlaybackSession>>,
    gate: Arc<RebuildGate>,
    internal_tx: Sender<Message>,
    event_tx: Sender<SessionEvent>,
    catalog: Arc<dyn CatalogProvider>,
    /// A catalog scan is running
    loading: Cell<bool>,
}

impl Dispatcher {
    fn run(self, command_rx: &Receiver<Command>, internal_rx: &Receiver<Message>) {
        tracing::debug!("Dispatcher running");

        loop {
            select! {
                recv(internal_rx) -> message => match message {
                    Ok(Message::Shutdown) | Err(_) => break,
                    Ok(message) => self.handle_message(message),
                },
                recv(command_rx) -> command => match command {
                    Ok(command) => self.handle_command(command),
                    Err(_) => break,
                },
            }
        }

        self.with_session(PlaybackSession::shutdown);
        tracing::info!("Playback service stopped");
    }

    fn handle_command(&self, command: Command) {
        if command.reads_navigator() {
            self.gate.wait_open();
        }

        match command {
            Command::FilterByArtist(artist) => self.rebuild(Rebuild::Artist(artist)),
            Command::FilterByAlbum(album) => self.rebuild(Rebuild::Album(album)),
            command => self.with_session(|session| {
                // Failures are logged and surfaced as events by the session
                let _ = session.handle_command(command);
            }),
        }
    }

    fn handle_message(&self, message: Message) {
        if message.reads_navigator() {
            self.gate.wait_open();
        }

        match message {
            Message::Engine(event) => self.with_session(|session| session.on_engine_event(event)),
            Message::Focus(change) => self.with_session(|session| session.on_focus_change(change)),
            Message::CatalogLoaded(result) => {
                self.loading.set(false);
                self.with_session(|session| session.on_catalog_loaded(result));
            }
            Message::Rescan => self.rescan(),
            Message::Shutdown => {}
        }
    }

    /// Build the generated playlist off the session lock, then install it
    fn rebuild(&self, rebuild: Rebuild) {
        let snapshot = self.session.lock().catalog();
        let Some(catalog) = snapshot else {
            // Let the session reject it as not ready
            let command = rebuild.into_command();
            self.with_session(|session| {
                let _ = session.handle_command(command);
            });
            return;
        };

        let ticket = self.gate.close();
        let session = Arc::clone(&self.session);
        let event_tx = self.event_tx.clone();

        let spawned = thread::Builder::new()
            .name("cadence-rebuild".into())
            .spawn(move || {
                let source = rebuild.build(&catalog);
                tracing::debug!(?rebuild, len = source.len(), "Generated playlist built");

                let mut session = session.lock();
                session.install_source(SourceKind::GeneratedPlaylist, source);
                forward_events(&mut session, &event_tx);
                drop(session);
                drop(ticket);
            });

        // On failure the closure, and with it the ticket, is dropped and the gate reopens
        if let Err(error) = spawned {
            tracing::error!(%error, "Failed to spawn playlist rebuild");
        }
    }

    fn rescan(&self) {
        if self.loading.get() {
            tracing::debug!("Rescan ignored, scan already running");
            return;
        }
        if self.session.lock().state() != PlaybackState::Retrieving {
            tracing::debug!("Rescan ignored, catalog already loaded");
            return;
        }

        match spawn_loader(Arc::clone(&self.catalog), self.internal_tx.clone()) {
            Ok(()) => self.loading.set(true),
            Err(error) => tracing::error!(%error, "Failed to start catalog rescan"),
        }
    }

    fn with_session(&self, apply: impl FnOnce(&mut PlaybackSession)) {
        let mut session = self.session.lock();
        apply(&mut session);
        forward_events(&mut session, &self.event_tx);
    }
}

/// Run the catalog scan on its own thread and post the result
fn spawn_loader(provider: Arc<dyn CatalogProvider>, tx: Sender<Message>) -> Result<()> {
    thread::Builder::new()
        .name("cadence-catalog".into())
        .spawn(move || {
            let result = Catalog::load(provider.as_ref());
            if tx.send(Message::CatalogLoaded(result)).is_err() {
                tracing::debug!("Service stopped before the catalog finished loading");
            }
        })
        .map_err(|source| ServiceError::Spawn {
            name: "catalog",
            source,
        })?;
    Ok(())
}

/// Move queued session events to the event channel, in order
fn forward_events(session: &mut PlaybackSession, event_tx: &Sender<SessionEvent>) {
    for event in session.drain_events() {
        match event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "Event queue full, dropping event");
            }
            Err(TrySendError::Disconnected(_)) => return,
        }
    }
}
