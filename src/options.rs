//! Playback configuration.
//!
//! A [`PlayOptions`] value describes how a single play request should
//! start. It is plain configuration data: built once, never mutated by
//! the player.

use serde::{Deserialize, Serialize};

/// Options applied when starting a sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayOptions {
    /// Playback rate multiplier (1.0 = original speed)
    pub pitch: f32,

    /// Restart from the beginning when the end of data is reached
    pub looped: bool,

    /// Start position in milliseconds
    pub seek_ms: Option<u64>,

    /// Fade-in duration in milliseconds (0 = no fade)
    pub fade_in_ms: Option<u64>,

    /// Create the instance without starting output; it stays dormant
    /// until `play()` or `resume()` is called on the returned handle
    pub start_paused: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            looped: false,
            seek_ms: None,
            fade_in_ms: None,
            start_paused: false,
        }
    }
}

impl PlayOptions {
    /// Set the pitch multiplier
    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    /// Enable or disable looping
    pub fn with_loop(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    /// Set the start position
    pub fn with_seek(mut self, ms: u64) -> Self {
        self.seek_ms = Some(ms);
        self
    }

    /// Set the fade-in duration
    pub fn with_fade_in(mut self, ms: u64) -> Self {
        self.fade_in_ms = Some(ms);
        self
    }

    /// Start dormant instead of playing immediately
    pub fn with_start_paused(mut self, paused: bool) -> Self {
        self.start_paused = paused;
        self
    }

    /// Fade-in duration, treating zero as "no fade"
    pub(crate) fn effective_fade_in(&self) -> Option<u64> {
        self.fade_in_ms.filter(|&ms| ms > 0)
    }
}
