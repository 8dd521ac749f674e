//! Scheduler owning every live sound instance.
//!
//! The [`SoundPlayer`] is the single entry point for starting sounds and
//! the single driver of per-tick updates. It owns the active set (in
//! activation order), the paused-set bookkeeping used by a global pause,
//! a logical clock that freezes while globally paused, and the global
//! volume multiplier cascaded onto every instance.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::backend::AudioBackend;
use crate::instance::SoundInstance;
use crate::options::PlayOptions;
use crate::registry::{ResourceRegistry, SoundData};

/// Scheduling state shared with the instances this player created.
///
/// Instances hold a `Weak` reference back here for volume and clock
/// lookups and for self-removal when they end. The lock is never held
/// while calling into an instance, and instances never hold their own
/// lock while calling in; every entry point below follows that rule.
pub(crate) struct PlayerShared {
    backend: Arc<dyn AudioBackend>,
    state: Mutex<SchedulerState>,
}

struct SchedulerState {
    /// Active instances, insertion order = activation order
    sounds: Vec<SoundInstance>,
    /// Populated only by a global pause, cleared only by a global resume
    paused_sounds: Vec<SoundInstance>,
    volume: f32,
    /// Logical time in milliseconds; frozen while `paused`
    time_ms: u64,
    last_update: Instant,
    paused: bool,
    registry: Option<Arc<dyn ResourceRegistry>>,
}

impl PlayerShared {
    pub(crate) fn volume(&self) -> f32 {
        self.state.lock().volume
    }

    pub(crate) fn time_ms(&self) -> u64 {
        self.state.lock().time_ms
    }

    pub(crate) fn add_instance(&self, sound: &SoundInstance) {
        let mut state = self.state.lock();
        if !state.sounds.contains(sound) {
            state.sounds.push(sound.clone());
        }
    }

    pub(crate) fn remove_instance(&self, sound: &SoundInstance) {
        let mut state = self.state.lock();
        if let Some(index) = state.sounds.iter().position(|s| s == sound) {
            state.sounds.remove(index);
        }
    }
}

/// Owns and schedules every concurrently playing sound
pub struct SoundPlayer {
    shared: Arc<PlayerShared>,
}

impl SoundPlayer {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        tracing::info!("Sound player ready");
        Self {
            shared: Arc::new(PlayerShared {
                backend,
                state: Mutex::new(SchedulerState {
                    sounds: Vec::new(),
                    paused_sounds: Vec::new(),
                    volume: 1.0,
                    time_ms: 0,
                    last_update: Instant::now(),
                    paused: false,
                    registry: None,
                }),
            }),
        }
    }

    /// Attach the registry used by [`play_id`](Self::play_id)
    pub fn set_registry(&self, registry: Arc<dyn ResourceRegistry>) {
        self.shared.state.lock().registry = Some(registry);
    }

    /// Start a sound from already-resolved data. Returns `None` when the
    /// backend cannot open an output channel.
    pub fn play(&self, data: &SoundData, options: &PlayOptions) -> Option<SoundInstance> {
        let sound = SoundInstance::new(
            Arc::downgrade(&self.shared),
            self.shared.backend.clone(),
            data.clone(),
        );

        sound.set_pitch(options.pitch);
        sound.set_loop(options.looped);
        if let Some(offset_ms) = options.seek_ms {
            sound.seek(offset_ms);
        }

        if let Some(fade_ms) = options.effective_fade_in() {
            sound.fade_in(fade_ms);
        } else if !options.start_paused {
            sound.play();
        }

        if sound.state().is_terminal() {
            return None;
        }
        tracing::debug!("Playing '{}'", data.id());
        Some(sound)
    }

    /// Start a sound by resource id. Returns `None` when no registry is
    /// attached, the id does not resolve, or the channel cannot open.
    pub fn play_id(&self, id: &str, options: &PlayOptions) -> Option<SoundInstance> {
        let registry = self.shared.state.lock().registry.clone();
        let registry = match registry {
            Some(registry) => registry,
            None => {
                tracing::warn!("No resource registry attached, cannot play '{}'", id);
                return None;
            }
        };

        let data = match registry.resolve(id) {
            Some(data) => data,
            None => {
                tracing::warn!("Resource '{}' not found", id);
                return None;
            }
        };

        self.play(&data, options)
    }

    /// Current global volume multiplier
    pub fn volume(&self) -> f32 {
        self.shared.volume()
    }

    /// Set the global volume. Re-applied immediately to every active and
    /// paused sound; no tick is required for the change to be audible.
    pub fn set_volume(&self, volume: f32) {
        let sounds = {
            let mut state = self.shared.state.lock();
            state.volume = volume;
            let mut sounds = state.sounds.clone();
            sounds.extend(state.paused_sounds.iter().cloned());
            sounds
        };
        for sound in &sounds {
            sound.update_volume();
        }
    }

    /// Idempotent insert into the active set
    pub fn add_instance(&self, sound: &SoundInstance) {
        self.shared.add_instance(sound);
    }

    /// Idempotent removal from the active set
    pub fn remove_instance(&self, sound: &SoundInstance) {
        self.shared.remove_instance(sound);
    }

    /// Pause every active sound and freeze the clock. Each paused sound
    /// is remembered (in addition to staying in the active set) so a
    /// global resume can restore exactly what a global pause suspended.
    pub fn pause(&self) {
        let paused = {
            let mut state = self.shared.state.lock();
            let active = state.sounds.clone();
            for sound in active {
                if !state.paused_sounds.contains(&sound) {
                    state.paused_sounds.push(sound);
                }
            }
            state.paused = true;
            state.paused_sounds.clone()
        };
        for sound in &paused {
            sound.pause();
        }
        tracing::debug!("Paused {} sounds", paused.len());
    }

    /// Resume every sound suspended by a global pause and unfreeze the
    /// clock. Clears the paused-set bookkeeping.
    pub fn resume(&self) {
        let paused = {
            let mut state = self.shared.state.lock();
            state.paused = false;
            std::mem::take(&mut state.paused_sounds)
        };
        for sound in &paused {
            sound.resume();
        }
        tracing::debug!("Resumed {} sounds", paused.len());
    }

    /// Stop everything. Each stop removes the instance from the active
    /// set through its own removal callback, so this never mutates the
    /// set while iterating it.
    pub fn stop(&self) {
        loop {
            let last = self.shared.state.lock().sounds.last().cloned();
            match last {
                Some(sound) => sound.stop(),
                None => break,
            }
        }
    }

    /// Stop every active sound created from the given resource id
    pub fn stop_by_id(&self, id: &str) {
        let matching: Vec<SoundInstance> = {
            let state = self.shared.state.lock();
            state
                .sounds
                .iter()
                .filter(|sound| sound.id() == id)
                .cloned()
                .collect()
        };
        for sound in &matching {
            sound.stop();
        }
    }

    /// Begin a fade-out on every active sound. Returns immediately; each
    /// sound ends and is reaped on its own once its ramp completes.
    pub fn fade_out(&self, duration_ms: u64) {
        let sounds = self.shared.state.lock().sounds.clone();
        for sound in &sounds {
            sound.fade_out(duration_ms);
        }
    }

    /// Logical time in milliseconds. Advances with wall time while not
    /// globally paused.
    pub fn time_ms(&self) -> u64 {
        self.shared.time_ms()
    }

    /// Whether a global pause is in effect
    pub fn is_paused(&self) -> bool {
        self.shared.state.lock().paused
    }

    /// Number of sounds in the active set
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().sounds.len()
    }

    /// Number of sounds remembered by a global pause
    pub fn paused_count(&self) -> usize {
        self.shared.state.lock().paused_sounds.len()
    }

    /// Active sound by activation order
    pub fn sound_at(&self, index: usize) -> Option<SoundInstance> {
        self.shared.state.lock().sounds.get(index).cloned()
    }

    /// Advance the clock and drive every active sound. Call once per
    /// frame. Sounds that end during this call are removed in place;
    /// later sounds keep their relative order and are still visited.
    pub fn update(&self) {
        self.update_at(Instant::now());
    }

    pub(crate) fn update_at(&self, now: Instant) {
        let time_ms = {
            let mut state = self.shared.state.lock();
            let delta = now.saturating_duration_since(state.last_update);
            if !state.paused {
                state.time_ms += delta.as_millis() as u64;
            }
            state.last_update = now;
            state.time_ms
        };

        let mut index = 0;
        loop {
            let sound = {
                let state = self.shared.state.lock();
                match state.sounds.get(index) {
                    Some(sound) => sound.clone(),
                    None => break,
                }
            };

            sound.tick(time_ms);
            let ended = sound.state().is_terminal();

            let mut state = self.shared.state.lock();
            let same_slot = state
                .sounds
                .get(index)
                .is_some_and(|current| *current == sound);
            if same_slot {
                if ended {
                    state.sounds.remove(index);
                } else {
                    index += 1;
                }
            }
            // Otherwise the slot changed under us (self-removal); the next
            // sound moved into it, so revisit the same index.
        }
    }
}

impl Drop for SoundPlayer {
    /// Drain all instances so none outlives its owner with a live channel
    fn drop(&mut self) {
        self.stop();
    }
}
