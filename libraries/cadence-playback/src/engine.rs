//! Platform-agnostic decode engine trait
//!
//! Abstracts the platform media player. Loading is asynchronous: the engine
//! reports readiness, errors and end-of-item later through [`EngineEvent`]s
//! tagged with the generation passed to [`DecodeEngine::load`].

use crate::types::SourceLocator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic tag identifying one load request
///
/// Every new load, and every stop, moves the session to a fresh generation.
/// Engine events carrying an older generation are stale and get dropped.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    /// Generation before any load
    pub const INITIAL: Generation = Generation(0);

    /// The following generation
    #[must_use]
    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Platform media player
///
/// Implementors must not call back into the session synchronously; results
/// of `load` are delivered as [`EngineEvent`]s through whatever channel the
/// runtime provides. Delivering them from inside `load` is allowed as long
/// as delivery only enqueues.
pub trait DecodeEngine: Send {
    /// Discard any current media and start preparing `locator`
    ///
    /// Completion is reported as `Ready` or `Error` carrying `generation`.
    fn load(&mut self, locator: &SourceLocator, generation: Generation);

    /// Start or resume output of prepared media
    fn start(&mut self);

    /// Pause output, keeping the position
    fn pause(&mut self);

    /// Stop output
    fn stop(&mut self);

    /// Seek to an absolute position in milliseconds
    fn seek_to(&mut self, position_ms: u64);

    /// Set channel gains in `[0.0, 1.0]`
    fn set_volume(&mut self, left: f32, right: f32);

    /// Free decoder resources
    fn release(&mut self);

    /// Current position in milliseconds
    fn position_ms(&self) -> u64;

    /// Duration of the loaded media, if known
    fn duration_ms(&self) -> Option<u64> {
        None
    }
}

/// What happened inside the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEventKind {
    /// Preparation finished; media can be started
    Ready,

    /// Preparation or playback failed with a platform error code
    Error(i32),

    /// Media reached its end
    Complete,
}

/// Asynchronous engine notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Generation of the load this event belongs to
    pub generation: Generation,

    /// Event payload
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn ready(generation: Generation) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Ready,
        }
    }

    pub fn error(generation: Generation, code: i32) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Error(code),
        }
    }

    pub fn complete(generation: Generation) -> Self {
        Self {
            generation,
            kind: EngineEventKind::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase() {
        let first = Generation::INITIAL.next();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 2);
    }

    #[test]
    fn event_constructors() {
        let generation = Generation::INITIAL.next();
        assert_eq!(EngineEvent::ready(generation).kind, EngineEventKind::Ready);
        assert_eq!(
            EngineEvent::error(generation, -38).kind,
            EngineEventKind::Error(-38)
        );
        assert_eq!(EngineEvent::complete(generation).generation, generation);
    }
}
