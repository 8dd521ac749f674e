//! Sound instance lifecycle management for interactive applications.
//!
//! Provides the scheduling core of an audio subsystem:
//! - Many independent sound instances playing, pausing, fading and
//!   stopping concurrently
//! - A per-frame scheduler with a pause-aware logical clock
//! - A global volume cascaded multiplicatively onto every instance
//!
//! Decoding and hardware output stay outside this crate, behind the
//! [`AudioBackend`] and [`ResourceRegistry`] traits.
//!
//! ## Architecture
//!
//! ```text
//! SoundPlayer
//!   ├── SoundInstance ("explosion")  ─┐
//!   ├── SoundInstance ("music")      ─┤ active set, driven by
//!   └── SoundInstance ("footsteps")  ─┘ update() once per frame
//!
//! Each SoundInstance:
//!   Created → Playing | FadingIn → Paused ⇄ … → FadingOut → Ended
//!   └── Channel (opened on the AudioBackend when output starts)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use soundstage::{MemoryRegistry, PlayOptions, SoundPlayer};
//!
//! let registry = Arc::new(MemoryRegistry::new());
//! soundstage::registry::initialize(registry.as_ref());
//! registry.insert("explosion", bytes)?;
//!
//! let player = SoundPlayer::new(backend);
//! player.set_registry(registry);
//!
//! // Fire-and-forget, or keep the handle for further commands
//! let handle = player.play_id("explosion", &PlayOptions::default())?;
//! handle.fade_out(2_000);
//!
//! // Once per frame
//! player.update();
//! ```

pub mod backend;
pub mod error;
mod fade;
pub mod instance;
pub mod options;
pub mod player;
pub mod registry;

// Re-export commonly used types
pub use backend::{AudioBackend, Channel, ChannelEvent};
pub use error::AudioError;
pub use instance::{PlaybackState, SoundInstance};
pub use options::PlayOptions;
pub use player::SoundPlayer;
pub use registry::{MemoryRegistry, ResourceRegistry, SoundData, SoundFactory};
