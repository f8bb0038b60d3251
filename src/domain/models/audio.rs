use anyhow::Result;
use async_trait::async_trait;

/// Encoded audio, either captured from the microphone or returned by the
/// backend for playback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl AudioPayload {
    pub fn wav(bytes: Vec<u8>) -> AudioPayload {
        return AudioPayload {
            bytes,
            mime_type: "audio/wav".to_string(),
            file_name: "recording.wav".to_string(),
        };
    }

    pub fn mp3(bytes: Vec<u8>) -> AudioPayload {
        return AudioPayload {
            bytes,
            mime_type: "audio/mpeg".to_string(),
            file_name: "response.mp3".to_string(),
        };
    }

    pub fn extension(&self) -> &str {
        return self.file_name.rsplit('.').next().unwrap_or("");
    }
}

#[async_trait]
pub trait Recorder {
    /// Acquires the input device and starts buffering frames. Fails when the
    /// device is missing or access to it is denied.
    async fn start(&mut self) -> Result<()>;

    /// Stops capturing and releases the input device before returning. All
    /// frames buffered up to this point are included in the payload. Returns
    /// `None` when no frames were captured.
    async fn stop(&mut self) -> Result<Option<AudioPayload>>;
}

#[async_trait]
pub trait Player {
    /// Starts playing from the beginning of the payload, replacing anything
    /// currently playing. Decoding happens off the async runtime threads.
    async fn play(&mut self, audio: &AudioPayload) -> Result<()>;

    fn stop(&mut self);

    /// False once the payload has played to the end, or after `stop`.
    fn is_playing(&self) -> bool;
}

pub type RecorderBox = Box<dyn Recorder + Send + Sync>;
pub type PlayerBox = Box<dyn Player + Send + Sync>;
