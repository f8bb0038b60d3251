use std::sync::Arc;
use std::time::Instant;

use super::AudioPayload;
use super::Feedback;
use super::Message;
use super::RecordingState;

/// Transient human readable status shown next to the input box. Statuses
/// without an expiry stay until replaced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub expires_at: Option<Instant>,
}

impl Status {
    pub fn persistent(text: &str) -> Status {
        return Status {
            text: text.to_string(),
            expires_at: None,
        };
    }

    pub fn expiring(text: &str, expires_at: Instant) -> Status {
        return Status {
            text: text.to_string(),
            expires_at: Some(expires_at),
        };
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        if let Some(expires_at) = self.expires_at {
            return now >= expires_at;
        }

        return false;
    }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub messages: Vec<Message>,
    pub input: String,
    pub request_in_flight: bool,
    pub recording: RecordingState,
    pub playing: bool,
    pub feedback: Option<Feedback>,
    pub feedback_visible: bool,
    pub last_audio: Option<Arc<AudioPayload>>,
    pub last_error: Option<String>,
    pub status: Option<Status>,
}

impl Session {
    pub fn is_loading(&self) -> bool {
        return self.request_in_flight;
    }

    pub fn is_recording(&self) -> bool {
        return self.recording == RecordingState::Recording;
    }

    /// Typing and sending are locked while a request is outstanding or the
    /// microphone is busy.
    pub fn accepts_input(&self) -> bool {
        return !self.request_in_flight && self.recording.is_idle();
    }

    pub fn can_record(&self) -> bool {
        return !self.request_in_flight && !self.playing && self.recording.is_idle();
    }

    pub fn can_play(&self) -> bool {
        return self.last_audio.is_some() && self.recording.is_idle();
    }
}
