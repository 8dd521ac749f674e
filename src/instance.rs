//! One playback attempt of a sound and its state machine.
//!
//! A [`SoundInstance`] is a shared handle: the owning
//! [`SoundPlayer`](crate::SoundPlayer) keeps one reference in its
//! bookkeeping and callers may keep any number of others to issue
//! commands later. The instance mutates only its own state; it calls
//! back into the player only to look up the global volume and clock and
//! to remove itself once it has ended.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::backend::{AudioBackend, Channel, ChannelEvent};
use crate::fade::{Fade, FadeDirection};
use crate::player::PlayerShared;
use crate::registry::SoundData;

/// Lifecycle state of a sound instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Constructed, no output yet
    Created,

    /// Producing output at full ramp
    Playing,

    /// Output suspended; position and any in-flight ramp are frozen
    Paused,

    /// Ramping up toward full volume
    FadingIn,

    /// Ramping down toward silence
    FadingOut,

    /// Terminal; the output channel has been released
    Ended,
}

impl PlaybackState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::Ended)
    }

    /// States in which an output channel exists
    pub fn has_output(&self) -> bool {
        matches!(
            self,
            PlaybackState::Playing
                | PlaybackState::Paused
                | PlaybackState::FadingIn
                | PlaybackState::FadingOut
        )
    }
}

/// Handle to one playing sound
#[derive(Clone)]
pub struct SoundInstance {
    shared: Arc<InstanceShared>,
}

/// Two handles are equal when they refer to the same instance
impl PartialEq for SoundInstance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for SoundInstance {}

impl std::fmt::Debug for SoundInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoundInstance")
            .field("id", &self.id())
            .field("state", &self.state())
            .finish()
    }
}

struct InstanceShared {
    player: Weak<PlayerShared>,
    backend: Arc<dyn AudioBackend>,
    data: SoundData,
    inner: Mutex<InstanceInner>,
}

struct InstanceInner {
    state: PlaybackState,
    /// Present only while `state.has_output()`
    channel: Option<Box<dyn Channel>>,
    /// Local volume, multiplied with the player's global volume
    volume: f32,
    pitch: f32,
    looped: bool,
    /// Start offset applied when the channel opens
    pending_seek_ms: Option<u64>,
    fade: Option<Fade>,
    /// Ramp factor currently applied to the channel (1.0 outside fades)
    fade_factor: f32,
    /// State to restore on resume; meaningful only while `Paused`
    resume_to: PlaybackState,
    about_to_finish: bool,
}

impl SoundInstance {
    pub(crate) fn new(
        player: Weak<PlayerShared>,
        backend: Arc<dyn AudioBackend>,
        data: SoundData,
    ) -> Self {
        Self {
            shared: Arc::new(InstanceShared {
                player,
                backend,
                data,
                inner: Mutex::new(InstanceInner {
                    state: PlaybackState::Created,
                    channel: None,
                    volume: 1.0,
                    pitch: 1.0,
                    looped: false,
                    pending_seek_ms: None,
                    fade: None,
                    fade_factor: 1.0,
                    resume_to: PlaybackState::Playing,
                    about_to_finish: false,
                }),
            }),
        }
    }

    /// Resource id this instance was created from
    pub fn id(&self) -> &str {
        self.shared.data.id()
    }

    pub fn state(&self) -> PlaybackState {
        self.shared.inner.lock().state
    }

    /// Local volume of this instance
    pub fn volume(&self) -> f32 {
        self.shared.inner.lock().volume
    }

    pub fn pitch(&self) -> f32 {
        self.shared.inner.lock().pitch
    }

    pub fn is_looped(&self) -> bool {
        self.shared.inner.lock().looped
    }

    /// Whether the backend announced that playback is near the end of data
    pub fn about_to_finish(&self) -> bool {
        self.shared.inner.lock().about_to_finish
    }

    /// Start output. Starts a dormant instance, resumes a paused one,
    /// does nothing otherwise.
    pub fn play(&self) {
        match self.state() {
            PlaybackState::Created => self.start(None),
            PlaybackState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Start or resume with a volume ramp from the current level up to
    /// full. Does nothing on an instance that is already producing output.
    pub fn fade_in(&self, duration_ms: u64) {
        match self.state() {
            PlaybackState::Created => self.start(Some(duration_ms)),
            PlaybackState::Paused => {
                let now_ms = self.player_time();
                {
                    let mut inner = self.shared.inner.lock();
                    if inner.state != PlaybackState::Paused {
                        return;
                    }
                    inner.fade = Some(Fade::new(
                        FadeDirection::In,
                        inner.fade_factor,
                        duration_ms,
                        now_ms,
                    ));
                    inner.resume_to = PlaybackState::FadingIn;
                }
                self.resume();
            }
            _ => {}
        }
    }

    /// Ramp volume down to silence over `duration_ms`, then end. On a
    /// paused instance the ramp is armed and starts running on resume.
    pub fn fade_out(&self, duration_ms: u64) {
        let now_ms = self.player_time();
        let mut inner = self.shared.inner.lock();
        match inner.state {
            PlaybackState::Playing | PlaybackState::FadingIn | PlaybackState::FadingOut => {
                inner.fade = Some(Fade::new(
                    FadeDirection::Out,
                    inner.fade_factor,
                    duration_ms,
                    now_ms,
                ));
                inner.state = PlaybackState::FadingOut;
                tracing::debug!("Fading out '{}' over {}ms", self.id(), duration_ms);
            }
            PlaybackState::Paused => {
                let mut fade = Fade::new(
                    FadeDirection::Out,
                    inner.fade_factor,
                    duration_ms,
                    now_ms,
                );
                fade.freeze(now_ms);
                inner.fade = Some(fade);
                inner.resume_to = PlaybackState::FadingOut;
            }
            PlaybackState::Created | PlaybackState::Ended => {}
        }
    }

    /// Suspend output, freezing position and any in-flight ramp
    pub fn pause(&self) {
        let now_ms = self.player_time();
        let mut inner = self.shared.inner.lock();
        if !inner.state.has_output() || inner.state == PlaybackState::Paused {
            return;
        }
        if let Some(fade) = inner.fade.as_mut() {
            fade.freeze(now_ms);
        }
        inner.resume_to = inner.state;
        inner.state = PlaybackState::Paused;
        if let Some(channel) = inner.channel.as_mut() {
            channel.pause();
        }
    }

    /// Continue from the paused position, restoring the pre-pause state.
    /// On a dormant instance this starts playback.
    pub fn resume(&self) {
        if self.state() == PlaybackState::Created {
            self.start(None);
            return;
        }
        let now_ms = self.player_time();
        let mut inner = self.shared.inner.lock();
        if inner.state != PlaybackState::Paused {
            return;
        }
        if let Some(fade) = inner.fade.as_mut() {
            fade.unfreeze(now_ms);
        }
        inner.state = inner.resume_to;
        if let Some(channel) = inner.channel.as_mut() {
            channel.resume();
        }
    }

    /// Immediately end playback and leave the player's bookkeeping.
    /// Stopping an already-ended instance does nothing.
    pub fn stop(&self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.state == PlaybackState::Ended {
                return;
            }
            end_locked(&mut inner);
        }
        self.deregister();
        tracing::debug!("Stopped '{}'", self.id());
    }

    /// Jump to a position in milliseconds. Before the channel opens the
    /// offset is recorded and applied at open.
    pub fn seek(&self, offset_ms: u64) {
        let mut inner = self.shared.inner.lock();
        let terminal = inner.state.is_terminal();
        match inner.channel.as_mut() {
            Some(channel) => channel.seek(offset_ms),
            None if !terminal => inner.pending_seek_ms = Some(offset_ms),
            None => {}
        }
    }

    pub fn set_pitch(&self, pitch: f32) {
        let mut inner = self.shared.inner.lock();
        inner.pitch = pitch;
        if let Some(channel) = inner.channel.as_mut() {
            channel.set_pitch(pitch);
        }
    }

    pub fn set_loop(&self, looped: bool) {
        let mut inner = self.shared.inner.lock();
        inner.looped = looped;
        if let Some(channel) = inner.channel.as_mut() {
            channel.set_loop(looped);
        }
    }

    /// Set the local volume; the output level is this multiplied by the
    /// player's global volume and any in-flight ramp
    pub fn set_volume(&self, volume: f32) {
        self.shared.inner.lock().volume = volume;
        self.update_volume();
    }

    /// Recompute the effective output volume and push it to the channel.
    /// Never changes state.
    pub(crate) fn update_volume(&self) {
        let global = self.player_volume();
        let mut inner = self.shared.inner.lock();
        let effective = inner.volume * global * inner.fade_factor;
        if let Some(channel) = inner.channel.as_mut() {
            channel.set_volume(effective);
        }
    }

    /// Per-tick update driven by the owning player: progress any ramp,
    /// then drain backend notifications.
    pub(crate) fn tick(&self, now_ms: u64) {
        let global = self.player_volume();
        let ended;
        {
            let mut inner = self.shared.inner.lock();

            if matches!(
                inner.state,
                PlaybackState::FadingIn | PlaybackState::FadingOut
            ) {
                if let Some(fade) = inner.fade {
                    inner.fade_factor = fade.factor(now_ms);
                    if fade.is_complete(now_ms) {
                        match fade.direction() {
                            FadeDirection::In => {
                                inner.fade = None;
                                inner.fade_factor = 1.0;
                                inner.state = PlaybackState::Playing;
                                tracing::debug!("Fade-in complete for '{}'", self.id());
                            }
                            FadeDirection::Out => {
                                end_locked(&mut inner);
                                tracing::debug!("Faded out '{}'", self.id());
                            }
                        }
                    }
                    let effective = inner.volume * global * inner.fade_factor;
                    if let Some(channel) = inner.channel.as_mut() {
                        channel.set_volume(effective);
                    }
                }
            }

            let mut events = Vec::new();
            if let Some(channel) = inner.channel.as_mut() {
                while let Some(event) = channel.poll_event() {
                    events.push(event);
                }
            }
            let mut finished = false;
            for event in events {
                match event {
                    ChannelEvent::AboutToFinish => {
                        inner.about_to_finish = true;
                        tracing::debug!("'{}' is about to finish", self.id());
                    }
                    ChannelEvent::Finished => finished = true,
                }
            }
            if finished {
                end_locked(&mut inner);
                tracing::debug!("'{}' finished", self.id());
            }

            ended = inner.state.is_terminal();
        }
        if ended {
            self.deregister();
        }
    }

    /// Open the channel and begin output. Only valid from `Created`.
    fn start(&self, fade_ms: Option<u64>) {
        let player = match self.shared.player.upgrade() {
            Some(player) => player,
            None => return,
        };
        let now_ms = player.time_ms();
        let global = player.volume();

        {
            let mut inner = self.shared.inner.lock();
            if inner.state != PlaybackState::Created {
                return;
            }

            let mut channel = match self.shared.backend.open(&self.shared.data) {
                Ok(channel) => channel,
                Err(err) => {
                    tracing::warn!("Failed to start '{}': {}", self.id(), err);
                    inner.state = PlaybackState::Ended;
                    return;
                }
            };

            channel.set_pitch(inner.pitch);
            channel.set_loop(inner.looped);
            if let Some(offset_ms) = inner.pending_seek_ms.take() {
                channel.seek(offset_ms);
            }

            match fade_ms {
                Some(duration_ms) => {
                    inner.fade = Some(Fade::new(FadeDirection::In, 0.0, duration_ms, now_ms));
                    inner.fade_factor = 0.0;
                    inner.state = PlaybackState::FadingIn;
                }
                None => {
                    inner.fade_factor = 1.0;
                    inner.state = PlaybackState::Playing;
                }
            }

            channel.set_volume(inner.volume * global * inner.fade_factor);
            channel.start();
            inner.channel = Some(channel);
        }

        player.add_instance(self);
        tracing::debug!("Started '{}'", self.id());
    }

    fn player_time(&self) -> u64 {
        self.shared
            .player
            .upgrade()
            .map(|player| player.time_ms())
            .unwrap_or(0)
    }

    fn player_volume(&self) -> f32 {
        self.shared
            .player
            .upgrade()
            .map(|player| player.volume())
            .unwrap_or(1.0)
    }

    fn deregister(&self) {
        if let Some(player) = self.shared.player.upgrade() {
            player.remove_instance(self);
        }
    }
}

/// End playback: release the channel and enter the terminal state
fn end_locked(inner: &mut InstanceInner) {
    if let Some(mut channel) = inner.channel.take() {
        channel.stop();
    }
    inner.fade = None;
    inner.state = PlaybackState::Ended;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_state() {
        assert!(PlaybackState::Ended.is_terminal());
        assert!(!PlaybackState::Playing.is_terminal());
        assert!(!PlaybackState::Created.is_terminal());
    }

    #[test]
    fn test_output_states() {
        assert!(PlaybackState::Playing.has_output());
        assert!(PlaybackState::Paused.has_output());
        assert!(PlaybackState::FadingIn.has_output());
        assert!(PlaybackState::FadingOut.has_output());
        assert!(!PlaybackState::Created.has_output());
        assert!(!PlaybackState::Ended.has_output());
    }
}
