#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::AudioPayload;

/// Prompt used for the synthetic turn that opens every fresh session.
pub const START_LESSON_PROMPT: &str = "Start the lesson";

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnRequest {
    pub prompt: String,
    pub context: String,
    pub is_new_chat: bool,
}

impl LearnRequest {
    pub fn new(prompt: &str, context: String, is_new_chat: bool) -> LearnRequest {
        return LearnRequest {
            prompt: prompt.to_string(),
            context,
            is_new_chat,
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnResponse {
    pub response: String,
    /// Base64 encoded spoken version of the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub context: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub feedback: String,
}

#[async_trait]
pub trait Backend {
    /// Used at startup to verify the backend can be reached.
    async fn health_check(&self) -> Result<()>;

    /// Runs one tutoring turn.
    async fn learn(&self, request: LearnRequest) -> Result<LearnResponse>;

    /// Requests a progress summary for the conversation so far.
    async fn feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse>;

    /// Uploads recorded speech and returns its transcript. A response without
    /// a usable transcript is an error, even with a successful status.
    async fn speech_to_text(&self, audio: AudioPayload) -> Result<String>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
