//! External audio backend seam.
//!
//! The core never touches audio hardware. Decoding, mixing and output
//! live behind [`AudioBackend`]: the player opens one [`Channel`] per
//! started sound and drives it with the narrow command set below. The
//! backend reports progress back through [`Channel::poll_event`], which
//! the core drains on the update thread, so every notification lands
//! between frames and never mutates state concurrently.

use crate::error::AudioError;
use crate::registry::SoundData;

/// Notification delivered from a channel back to its owning instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Playback is approaching the end of data. Recorded and observable
    /// on the instance, with no further effect; hook for gapless chaining.
    AboutToFinish,

    /// Playback reached the end of data
    Finished,
}

/// One live output channel on the audio backend
pub trait Channel: Send {
    /// Begin producing output
    fn start(&mut self);

    /// Suspend output, keeping position
    fn pause(&mut self);

    /// Continue output from the paused position
    fn resume(&mut self);

    /// Halt output and release the underlying resource
    fn stop(&mut self);

    /// Jump to a position in milliseconds
    fn seek(&mut self, offset_ms: u64);

    /// Change the playback rate
    fn set_pitch(&mut self, pitch: f32);

    /// Change the output volume
    fn set_volume(&mut self, volume: f32);

    /// Change whether playback restarts at end of data
    fn set_loop(&mut self, looped: bool);

    /// Next pending notification, if any. Drained once per tick.
    fn poll_event(&mut self) -> Option<ChannelEvent>;
}

/// Factory for output channels
pub trait AudioBackend: Send + Sync {
    /// Open an output channel for the given sound. A failure here is
    /// reported by the player the same way as an unresolvable resource.
    fn open(&self, sound: &SoundData) -> Result<Box<dyn Channel>, AudioError>;
}
