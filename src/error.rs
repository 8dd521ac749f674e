//! Library-level errors using thiserror for structured error handling.
//!
//! These errors cover the collaborator seams: opening a playback channel
//! on the audio backend and building playable data in the resource
//! registry. A resource that simply cannot be resolved is not an error
//! value; [`SoundPlayer::play_id`](crate::SoundPlayer::play_id) reports it
//! as `None` and the caller is expected to check.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to open playback channel for {id}")]
    OpenFailed {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to decode sound data")]
    DecodeFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid sound data: {0}")]
    InvalidData(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_error_display() {
        let err = AudioError::InvalidData("empty payload".to_string());
        assert_eq!(err.to_string(), "Invalid sound data: empty payload");

        let err = AudioError::UnknownResourceType("music".to_string());
        assert_eq!(err.to_string(), "Unknown resource type: music");
    }

    #[test]
    fn test_error_source_chain() {
        use std::io;

        let io_err = io::Error::new(io::ErrorKind::NotFound, "device not found");
        let open_err = AudioError::OpenFailed {
            id: "beep".to_string(),
            source: Box::new(io_err),
        };

        assert!(open_err.source().is_some());
        assert_eq!(
            open_err.to_string(),
            "Failed to open playback channel for beep"
        );
    }
}
