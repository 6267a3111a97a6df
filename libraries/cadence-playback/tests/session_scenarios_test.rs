//! Integration tests for the playback session
//!
//! End-to-end scenarios driven the way a runtime drives the session:
//! commands in, engine and focus notifications back, events drained out.

use cadence_playback::{
    AudioFocus, Catalog, Command, DecodeEngine, EngineEvent, FocusChange, FocusProvider,
    Generation, Item, PlaybackError, PlaybackSession, PlaybackState, SessionConfig, SessionEvent,
    SourceEntry, SourceKind, SourceLocator,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ===== Test Helpers =====

/// Decoder stand-in that remembers what it was told
#[derive(Clone, Default)]
struct MockEngine {
    loads: Arc<Mutex<Vec<(SourceLocator, Generation)>>>,
    volume: Arc<Mutex<Option<f32>>>,
    running: Arc<Mutex<bool>>,
}

impl MockEngine {
    fn last_load(&self) -> Option<(SourceLocator, Generation)> {
        self.loads.lock().unwrap().last().cloned()
    }

    fn load_count(&self) -> usize {
        self.loads.lock().unwrap().len()
    }

    fn volume(&self) -> Option<f32> {
        *self.volume.lock().unwrap()
    }

    fn is_running(&self) -> bool {
        *self.running.lock().unwrap()
    }
}

impl DecodeEngine for MockEngine {
    fn load(&mut self, locator: &SourceLocator, generation: Generation) {
        *self.running.lock().unwrap() = false;
        self.loads.lock().unwrap().push((locator.clone(), generation));
    }

    fn start(&mut self) {
        *self.running.lock().unwrap() = true;
    }

    fn pause(&mut self) {
        *self.running.lock().unwrap() = false;
    }

    fn stop(&mut self) {
        *self.running.lock().unwrap() = false;
    }

    fn seek_to(&mut self, _position_ms: u64) {}

    fn set_volume(&mut self, left: f32, _right: f32) {
        *self.volume.lock().unwrap() = Some(left);
    }

    fn release(&mut self) {
        *self.running.lock().unwrap() = false;
    }

    fn position_ms(&self) -> u64 {
        0
    }
}

/// Focus system that can be told to refuse requests
#[derive(Clone)]
struct SwitchableFocus {
    grant: Arc<Mutex<bool>>,
}

impl FocusProvider for SwitchableFocus {
    fn request(&mut self) -> bool {
        *self.grant.lock().unwrap()
    }

    fn abandon(&mut self) -> bool {
        true
    }
}

fn abc_catalog() -> Catalog {
    Catalog::new(vec![
        Item::new(10, "X", "C", "Third", 60_000, Some(1)),
        Item::new(11, "Y", "A", "First", 60_000, Some(2)),
        Item::new(12, "X", "B", "Second", 60_000, Some(3)),
    ])
}

fn session_with(config: SessionConfig, grant: bool) -> (PlaybackSession, MockEngine, SwitchableFocus) {
    init_logging();
    let engine = MockEngine::default();
    let focus = SwitchableFocus {
        grant: Arc::new(Mutex::new(grant)),
    };
    let mut session =
        PlaybackSession::with_seed(config, 2024, Box::new(engine.clone()), Box::new(focus.clone()));
    session.on_catalog_loaded(Ok(abc_catalog()));
    (session, engine, focus)
}

fn title(session: &PlaybackSession) -> Option<String> {
    session.current_item().map(|item| item.title.clone())
}

fn ready(session: &mut PlaybackSession) {
    let generation = session.generation();
    session.on_engine_event(EngineEvent::ready(generation));
}

// ===== Scenarios =====

#[test]
fn sorted_library_walk_stops_after_last_item() {
    let (mut session, _engine, _) = session_with(SessionConfig::default(), true);
    session
        .handle_command(Command::SelectSource(SourceKind::SortedLibrary))
        .unwrap();

    session.handle_command(Command::Play).unwrap();
    ready(&mut session);
    assert_eq!(title(&session), Some("A".into()));

    session.on_engine_event(EngineEvent::complete(session.generation()));
    ready(&mut session);
    assert_eq!(title(&session), Some("B".into()));

    session.on_engine_event(EngineEvent::complete(session.generation()));
    ready(&mut session);
    assert_eq!(title(&session), Some("C".into()));

    session.on_engine_event(EngineEvent::complete(session.generation()));
    assert_eq!(session.state(), PlaybackState::Stopped);
    assert!(session.current_item().is_none());
    assert!(session.navigator().current().is_none());

    // Playing again starts over
    session.handle_command(Command::Play).unwrap();
    assert_eq!(title(&session), Some("A".into()));
}

#[test]
fn ducking_attenuates_and_regain_restores() {
    let (mut session, engine, _) = session_with(SessionConfig::default(), true);
    session.handle_command(Command::Play).unwrap();
    ready(&mut session);
    assert_eq!(session.focus(), AudioFocus::Full);
    assert_eq!(engine.volume(), Some(1.0));

    session.on_focus_change(FocusChange::Lost { can_duck: true });
    assert_eq!(session.focus(), AudioFocus::DuckOnly);
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(engine.volume(), Some(0.1));
    assert!(engine.is_running());

    session.on_focus_change(FocusChange::Gained);
    assert_eq!(engine.volume(), Some(1.0));
    assert!(engine.is_running());
}

#[test]
fn configured_duck_volume_is_used() {
    let config = SessionConfig {
        duck_volume: 0.25,
        ..SessionConfig::default()
    };
    let (mut session, engine, _) = session_with(config, true);
    session.handle_command(Command::Play).unwrap();
    ready(&mut session);

    session.on_focus_change(FocusChange::Lost { can_duck: true });
    assert_eq!(engine.volume(), Some(0.25));
}

#[test]
fn refused_focus_holds_output_until_granted() {
    let (mut session, engine, _) = session_with(SessionConfig::default(), false);
    session.handle_command(Command::Play).unwrap();
    ready(&mut session);

    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.focus(), AudioFocus::None);
    assert!(!engine.is_running());

    session.on_focus_change(FocusChange::Gained);
    assert!(engine.is_running());
    assert_eq!(engine.volume(), Some(1.0));
}

#[test]
fn stale_ready_after_stop_during_preparing_is_ignored() {
    let (mut session, engine, _) = session_with(SessionConfig::default(), true);
    session.handle_command(Command::Play).unwrap();
    let (_, preparing) = engine.last_load().unwrap();
    assert_eq!(session.state(), PlaybackState::Preparing);

    session.handle_command(Command::Stop).unwrap();
    session.on_engine_event(EngineEvent::ready(preparing));

    assert_eq!(session.state(), PlaybackState::Stopped);
    assert!(!engine.is_running());
    assert_eq!(session.focus(), AudioFocus::None);
}

#[test]
fn stale_error_does_not_trigger_retry() {
    let (mut session, engine, _) = session_with(SessionConfig::default(), true);
    session.handle_command(Command::Play).unwrap();
    let (_, old) = engine.last_load().unwrap();
    session.handle_command(Command::PlayAtIndex(2)).unwrap();

    session.on_engine_event(EngineEvent::error(old, -38));
    assert_eq!(engine.load_count(), 2);
    assert_eq!(title(&session), Some("C".into()));
}

#[test]
fn artist_filter_lists_sentinel_and_rejects_it() {
    let (mut session, engine, _) = session_with(SessionConfig::default(), true);
    session
        .handle_command(Command::FilterByArtist("X".into()))
        .unwrap();
    session
        .handle_command(Command::SelectSource(SourceKind::GeneratedPlaylist))
        .unwrap();

    let listing = session.listing();
    let labels: Vec<&str> = listing.iter().map(SourceEntry::label).collect();
    assert_eq!(labels, vec!["C", "B", "All Songs"]);

    assert_eq!(
        session.handle_command(Command::PlayAtIndex(2)),
        Err(PlaybackError::NotPlayable(2))
    );
    assert_eq!(engine.load_count(), 0);

    session.handle_command(Command::PlayAtIndex(1)).unwrap();
    ready(&mut session);
    assert_eq!(title(&session), Some("B".into()));

    // Navigation never lands on the sentinel
    session.on_engine_event(EngineEvent::complete(session.generation()));
    assert_eq!(session.state(), PlaybackState::Stopped);
}

#[test]
fn shuffle_mid_playback_keeps_item_and_visits_each_once() {
    let (mut session, _engine, _) = session_with(SessionConfig::default(), true);
    session.handle_command(Command::PlayAtIndex(1)).unwrap();
    ready(&mut session);
    assert_eq!(title(&session), Some("B".into()));

    session.handle_command(Command::ToggleShuffle).unwrap();
    assert!(session.is_shuffled());
    assert_eq!(session.navigator().current().map(|i| i.title.clone()), Some("B".into()));

    let mut seen = HashSet::new();
    seen.insert(title(&session).unwrap());
    while session.state() != PlaybackState::Stopped {
        session.handle_command(Command::Skip).unwrap();
        if let Some(title) = title(&session) {
            assert!(seen.insert(title), "item repeated within one shuffled pass");
            ready(&mut session);
        }
    }
    assert_eq!(seen.len(), 3);
}

#[test]
fn filter_while_playing_keeps_current_item() {
    let (mut session, _engine, _) = session_with(SessionConfig::default(), true);
    session
        .handle_command(Command::SelectSource(SourceKind::GeneratedPlaylist))
        .unwrap();
    session
        .handle_command(Command::FilterByArtist("X".into()))
        .unwrap();
    session.handle_command(Command::PlayAtIndex(1)).unwrap();
    ready(&mut session);
    assert_eq!(title(&session), Some("B".into()));

    session
        .handle_command(Command::FilterByAlbum("Second".into()))
        .unwrap();
    assert_eq!(session.state(), PlaybackState::Playing);
    assert_eq!(session.navigator().len(), 1);
    assert_eq!(session.navigator().current().map(|i| i.title.clone()), Some("B".into()));
}

#[test]
fn events_describe_a_play_cycle() {
    let (mut session, _engine, _) = session_with(SessionConfig::default(), true);
    assert_eq!(
        session.drain_events(),
        vec![
            SessionEvent::CatalogReady { count: 3 },
            SessionEvent::StateChanged {
                state: PlaybackState::Stopped
            },
        ]
    );

    session.handle_command(Command::Play).unwrap();
    ready(&mut session);
    let events = session.drain_events();

    assert_eq!(
        events[0],
        SessionEvent::FocusChanged {
            focus: AudioFocus::Full
        }
    );
    assert!(matches!(
        &events[1],
        SessionEvent::ItemChanged { item: Some(item) } if item.title == "A"
    ));
    assert_eq!(
        events[2..],
        [
            SessionEvent::StateChanged {
                state: PlaybackState::Preparing
            },
            SessionEvent::StateChanged {
                state: PlaybackState::Playing
            },
        ]
    );
}

#[test]
fn repeat_and_shuffle_from_config() {
    let config = SessionConfig {
        shuffle: true,
        repeat: true,
        initial_source: SourceKind::Library,
        ..SessionConfig::default()
    };
    let (session, _engine, _) = session_with(config, true);

    assert!(session.is_shuffled());
    assert!(session.is_repeating());
    assert_eq!(session.active_source(), SourceKind::Library);
    assert!(session
        .navigator()
        .sources()
        .get(SourceKind::Library)
        .shuffled()
        .is_some());
}
