//! Resource registry seam and the in-process registry.
//!
//! The player resolves resource ids through a [`ResourceRegistry`]; the
//! sound subsystem registers its resource-type handler with the registry
//! at init and removes it at teardown. [`MemoryRegistry`] is a complete
//! in-process implementation backed by preloaded byte buffers, enough
//! for applications that load their sound bank up front and for tests.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::AudioError;

/// Resource type tag the sound subsystem registers under
pub const SOUND_TYPE_TAG: &str = "sound";

/// Opaque playable audio payload.
///
/// The core never inspects the bytes; they are handed to the backend
/// when a channel opens. Cloning shares the underlying buffer.
#[derive(Debug, Clone)]
pub struct SoundData {
    id: String,
    bytes: Arc<[u8]>,
}

impl SoundData {
    pub fn new(id: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: id.into(),
            bytes: bytes.into(),
        }
    }

    /// Resource id this data was built from
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw payload handed to the backend
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builds playable sound data from raw asset bytes
pub type SoundFactory = fn(&str, Arc<[u8]>) -> Result<SoundData, AudioError>;

/// External resource registry collaborator
pub trait ResourceRegistry: Send + Sync {
    /// Look up playable audio data by resource id
    fn resolve(&self, id: &str) -> Option<SoundData>;

    /// Register a factory for a resource type tag
    fn register_type(&self, tag: &str, factory: SoundFactory);

    /// Remove a previously registered factory
    fn unregister_type(&self, tag: &str);
}

fn sound_factory(id: &str, bytes: Arc<[u8]>) -> Result<SoundData, AudioError> {
    if bytes.is_empty() {
        return Err(AudioError::InvalidData(format!(
            "empty sound payload for {}",
            id
        )));
    }
    Ok(SoundData::new(id, bytes))
}

/// Register the sound resource handler. Call once at subsystem init.
pub fn initialize(registry: &dyn ResourceRegistry) {
    registry.register_type(SOUND_TYPE_TAG, sound_factory);
    tracing::debug!("Registered resource type '{}'", SOUND_TYPE_TAG);
}

/// Unregister the sound resource handler. Call at subsystem teardown.
pub fn shutdown(registry: &dyn ResourceRegistry) {
    registry.unregister_type(SOUND_TYPE_TAG);
    tracing::debug!("Unregistered resource type '{}'", SOUND_TYPE_TAG);
}

/// In-process registry backed by preloaded byte buffers
pub struct MemoryRegistry {
    factories: Mutex<HashMap<String, SoundFactory>>,
    sounds: Mutex<HashMap<String, SoundData>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: Mutex::new(HashMap::new()),
            sounds: Mutex::new(HashMap::new()),
        }
    }

    /// Build and store a sound from raw bytes using the registered
    /// sound factory. Fails if the sound type was never registered.
    pub fn insert(&self, id: &str, bytes: impl Into<Arc<[u8]>>) -> Result<(), AudioError> {
        let factory = {
            let factories = self.factories.lock();
            match factories.get(SOUND_TYPE_TAG) {
                Some(factory) => *factory,
                None => {
                    return Err(AudioError::UnknownResourceType(SOUND_TYPE_TAG.to_string()))
                }
            }
        };

        let data = factory(id, bytes.into())?;
        self.sounds.lock().insert(id.to_string(), data);
        tracing::debug!("Registered sound '{}'", id);
        Ok(())
    }

    /// Drop a stored sound
    pub fn remove(&self, id: &str) {
        if self.sounds.lock().remove(id).is_some() {
            tracing::debug!("Removed sound '{}'", id);
        }
    }

    /// Number of stored sounds
    pub fn len(&self) -> usize {
        self.sounds.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.lock().is_empty()
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry for MemoryRegistry {
    fn resolve(&self, id: &str) -> Option<SoundData> {
        self.sounds.lock().get(id).cloned()
    }

    fn register_type(&self, tag: &str, factory: SoundFactory) {
        self.factories.lock().insert(tag.to_string(), factory);
    }

    fn unregister_type(&self, tag: &str) {
        self.factories.lock().remove(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_resolve() {
        let registry = MemoryRegistry::new();
        initialize(&registry);

        registry.insert("beep", vec![1u8, 2, 3]).unwrap();
        assert_eq!(registry.len(), 1);

        let data = registry.resolve("beep").unwrap();
        assert_eq!(data.id(), "beep");
        assert_eq!(data.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn test_resolve_missing_returns_none() {
        let registry = MemoryRegistry::new();
        initialize(&registry);
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_insert_without_registered_type_fails() {
        let registry = MemoryRegistry::new();
        let err = registry.insert("beep", vec![1u8]).unwrap_err();
        assert!(matches!(err, AudioError::UnknownResourceType(_)));
    }

    #[test]
    fn test_shutdown_unregisters_type() {
        let registry = MemoryRegistry::new();
        initialize(&registry);
        registry.insert("beep", vec![1u8]).unwrap();

        shutdown(&registry);
        let err = registry.insert("boop", vec![1u8]).unwrap_err();
        assert!(matches!(err, AudioError::UnknownResourceType(_)));
    }

    #[test]
    fn test_empty_payload_rejected() {
        let registry = MemoryRegistry::new();
        initialize(&registry);

        let err = registry.insert("silent", Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, AudioError::InvalidData(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove() {
        let registry = MemoryRegistry::new();
        initialize(&registry);
        registry.insert("beep", vec![1u8]).unwrap();

        registry.remove("beep");
        assert!(registry.resolve("beep").is_none());
        assert!(registry.is_empty());
    }
}
