//! Audio focus arbitration
//!
//! Tracks who owns the audio output and maps that onto the gain the decoder
//! should use. The platform side is a [`FocusProvider`]; loss and regain
//! notifications arrive as [`FocusChange`] values.

use crate::types::AudioFocus;
use serde::{Deserialize, Serialize};

/// Platform audio-focus facility
pub trait FocusProvider: Send {
    /// Ask for exclusive focus. Returns `true` if granted.
    fn request(&mut self) -> bool;

    /// Give focus back. Returns `true` on success.
    fn abandon(&mut self) -> bool;
}

/// Provider for platforms without a focus system: every request is granted
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFocused;

impl FocusProvider for AlwaysFocused {
    fn request(&mut self) -> bool {
        true
    }

    fn abandon(&mut self) -> bool {
        true
    }
}

/// Asynchronous focus notification from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusChange {
    /// Focus (re)gained
    Gained,

    /// Focus lost; `can_duck` allows attenuated output
    Lost { can_duck: bool },
}

/// Focus state machine
pub struct FocusArbiter {
    provider: Box<dyn FocusProvider>,
    focus: AudioFocus,
}

impl FocusArbiter {
    /// Start without focus
    pub fn new(provider: Box<dyn FocusProvider>) -> Self {
        Self {
            provider,
            focus: AudioFocus::None,
        }
    }

    /// Current focus
    pub fn focus(&self) -> AudioFocus {
        self.focus
    }

    /// Request full focus. No-op if already held; unchanged if refused.
    pub fn request_focus(&mut self) -> AudioFocus {
        if self.focus == AudioFocus::Full {
            return self.focus;
        }

        if self.provider.request() {
            self.focus = AudioFocus::Full;
            tracing::debug!("Audio focus granted");
        } else {
            tracing::warn!(focus = ?self.focus, "Audio focus request refused");
        }
        self.focus
    }

    /// Give focus back. Always ends in [`AudioFocus::None`].
    pub fn release_focus(&mut self) -> AudioFocus {
        if self.focus != AudioFocus::None && !self.provider.abandon() {
            tracing::warn!("Audio focus abandon failed");
        }
        self.focus = AudioFocus::None;
        self.focus
    }

    /// Apply a platform notification
    pub fn on_change(&mut self, change: FocusChange) -> AudioFocus {
        self.focus = match change {
            FocusChange::Gained => AudioFocus::Full,
            FocusChange::Lost { can_duck: true } => AudioFocus::DuckOnly,
            FocusChange::Lost { can_duck: false } => AudioFocus::None,
        };
        tracing::debug!(?change, focus = ?self.focus, "Audio focus changed");
        self.focus
    }

    /// Gain the decoder should use, or `None` when output must be silent
    pub fn output_gain(&self, duck_volume: f32) -> Option<f32> {
        match self.focus {
            AudioFocus::None => None,
            AudioFocus::DuckOnly => Some(duck_volume),
            AudioFocus::Full => Some(1.0),
        }
    }
}

impl std::fmt::Debug for FocusArbiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusArbiter")
            .field("focus", &self.focus)
            .finish_non_exhaustive()
    }
}
