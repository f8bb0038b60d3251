#[cfg(test)]
#[path = "session_controller_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use base64::Engine;
use tokio::sync::mpsc;

use super::feedback_as_text;
use super::format_feedback;
use crate::domain::models::context_string;
use crate::domain::models::AudioPayload;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::Feedback;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::LearnRequest;
use crate::domain::models::Message;
use crate::domain::models::PlayerBox;
use crate::domain::models::RecorderBox;
use crate::domain::models::RecordingState;
use crate::domain::models::Role;
use crate::domain::models::Session;
use crate::domain::models::Status;
use crate::domain::models::StoreBox;
use crate::domain::models::START_LESSON_PROMPT;

pub const STATUS_RECORDING: &str = "Recording…";
pub const STATUS_PROCESSING: &str = "Processing audio…";
pub const STATUS_TRANSCRIBED: &str = "Transcription complete";

fn decode_audio(audio: Option<String>) -> Option<Arc<AudioPayload>> {
    let encoded = audio?;
    if encoded.is_empty() {
        return None;
    }

    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => return Some(Arc::new(AudioPayload::mp3(bytes))),
        Err(err) => {
            tracing::warn!(error = ?err, "Learn response carried undecodable audio");
            return None;
        }
    }
}

/// Owns the transcript and every transient flag around it. Each operation
/// runs to completion, publishing a snapshot of the session to the UI before
/// and after it suspends on the backend or an audio device. No failure is
/// fatal: every error ends up in the session as something the user can see.
pub struct SessionController {
    backend: BackendBox,
    store: StoreBox,
    recorder: RecorderBox,
    player: PlayerBox,
    session: Session,
    tx: mpsc::UnboundedSender<Event>,
    status_ttl: Duration,
}

impl SessionController {
    pub fn new(
        backend: BackendBox,
        store: StoreBox,
        recorder: RecorderBox,
        player: PlayerBox,
        tx: mpsc::UnboundedSender<Event>,
    ) -> SessionController {
        return SessionController {
            backend,
            store,
            recorder,
            player,
            session: Session::default(),
            tx,
            status_ttl: Duration::from_secs(3),
        };
    }

    pub fn session(&self) -> &Session {
        return &self.session;
    }

    fn publish(&self) {
        let snapshot = Box::new(self.session.clone());
        if self.tx.send(Event::SessionUpdated(snapshot)).is_err() {
            tracing::debug!("Session update dropped, UI is no longer listening");
        }
    }

    async fn persist(&self) {
        if let Err(err) = self.store.save(&self.session.messages).await {
            tracing::error!(error = ?err, "Failed to persist transcript");
        }
    }

    async fn push_message(&mut self, message: Message) {
        self.session.messages.push(message);
        self.persist().await;
    }

    async fn replace_messages(&mut self, messages: Vec<Message>) {
        self.session.messages = messages;
        self.persist().await;
    }

    fn set_error(&mut self, text: String) {
        self.session.status = Some(Status::persistent(&text));
        self.session.last_error = Some(text);
    }

    /// Surfaces an unreachable backend before the first turn fails.
    pub async fn check_backend(&mut self) {
        if let Err(err) = self.backend.health_check().await {
            tracing::warn!(error = ?err, "Backend health check failed");
            self.set_error(format!(
                "The tutor backend can't be reached. Check that it's running. Error: {err}"
            ));
            self.publish();
        }
    }

    /// Restores the persisted transcript, or opens a fresh lesson when there
    /// is none so the transcript is never empty.
    pub async fn initialize(&mut self) {
        match self.store.load().await {
            Ok(messages) => {
                self.session.messages = messages;
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to load persisted transcript");
                self.session.messages = vec![];
            }
        }

        if self.session.messages.is_empty() {
            self.request_turn(true).await;
            return;
        }

        self.publish();
    }

    pub fn set_input(&mut self, text: &str) {
        self.session.input = text.to_string();
    }

    pub async fn send_user_message(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if !self.session.accepts_input() {
            tracing::debug!(
                request_in_flight = self.session.request_in_flight,
                recording = %self.session.recording,
                "Ignoring message while busy"
            );
            return;
        }

        let context = context_string(&self.session.messages);
        self.push_message(Message::user(text)).await;
        self.session.input = "".to_string();

        self.run_turn(LearnRequest::new(text, context, false)).await;
    }

    /// With `is_new_chat` the lesson is restarted and its greeting replaces the
    /// whole transcript. Otherwise the most recent user message is sent again
    /// and the answer is appended.
    pub async fn request_turn(&mut self, is_new_chat: bool) {
        if !self.session.accepts_input() {
            return;
        }

        let request = if is_new_chat {
            LearnRequest::new(
                START_LESSON_PROMPT,
                context_string(&self.session.messages),
                true,
            )
        } else {
            let Some(idx) = self
                .session
                .messages
                .iter()
                .rposition(|message| return message.role == Role::User)
            else {
                self.publish();
                return;
            };

            LearnRequest::new(
                &self.session.messages[idx].content,
                context_string(&self.session.messages[..idx]),
                false,
            )
        };

        self.run_turn(request).await;
    }

    async fn run_turn(&mut self, request: LearnRequest) {
        let is_new_chat = request.is_new_chat;
        self.session.request_in_flight = true;
        self.publish();

        tracing::debug!(is_new_chat, "Sending learn request");
        let res = self.backend.learn(request).await;
        self.session.request_in_flight = false;

        match res {
            Ok(res) => {
                self.session.last_audio = decode_audio(res.audio);
                let message = Message::assistant(&res.response);
                if is_new_chat {
                    self.replace_messages(vec![message]).await;
                } else {
                    self.push_message(message).await;
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "Learn request failed");
                self.push_message(Message::error(&format!(
                    "Failed to get response. Error: {err}"
                )))
                .await;
            }
        }

        self.publish();
    }

    pub async fn start_new_chat(&mut self) {
        if !self.session.accepts_input() {
            return;
        }

        self.session.messages = vec![];
        self.session.feedback = None;
        self.session.feedback_visible = false;
        if let Err(err) = self.store.clear().await {
            tracing::error!(error = ?err, "Failed to clear persisted transcript");
        }
        self.publish();

        self.request_turn(true).await;
    }

    pub async fn request_feedback(&mut self) {
        if !self.session.accepts_input() {
            return;
        }

        self.session.request_in_flight = true;
        self.publish();

        let req = FeedbackRequest {
            context: context_string(&self.session.messages),
        };
        let res = self.backend.feedback(req).await;
        self.session.request_in_flight = false;

        match res {
            Ok(res) => {
                tracing::debug!(
                    feedback = feedback_as_text(&format_feedback(&res.feedback)),
                    "Feedback received"
                );
                self.session.feedback = Some(Feedback::new(&res.feedback));
            }
            Err(err) => {
                tracing::error!(error = ?err, "Feedback request failed");
                self.session.feedback = Some(Feedback::failure(&format!(
                    "Failed to get feedback. Error: {err}"
                )));
            }
        }
        self.session.feedback_visible = true;

        self.publish();
    }

    pub fn dismiss_feedback(&mut self) {
        if !self.session.feedback_visible {
            return;
        }

        self.session.feedback_visible = false;
        self.publish();
    }

    pub async fn begin_recording(&mut self) {
        if !self.session.can_record() {
            tracing::debug!(
                request_in_flight = self.session.request_in_flight,
                playing = self.session.playing,
                recording = %self.session.recording,
                "Ignoring recording request"
            );
            return;
        }

        match self.recorder.start().await {
            Ok(()) => {
                self.session.recording = RecordingState::Recording;
                self.session.last_error = None;
                self.session.status = Some(Status::persistent(STATUS_RECORDING));
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to start recording");
                self.set_error(format!("Could not access the microphone. Error: {err}"));
            }
        }

        self.publish();
    }

    pub async fn end_recording(&mut self) {
        if self.session.recording != RecordingState::Recording {
            return;
        }

        let audio = match self.recorder.stop().await {
            Ok(Some(audio)) => audio,
            Ok(None) => {
                self.session.recording = RecordingState::Idle;
                self.set_error("No audio was recorded. Please try again.".to_string());
                self.publish();
                return;
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to stop recording");
                self.session.recording = RecordingState::Idle;
                self.set_error(format!("Recording failed. Error: {err}"));
                self.publish();
                return;
            }
        };

        self.session.recording = RecordingState::Transcribing;
        self.session.status = Some(Status::persistent(STATUS_PROCESSING));
        self.publish();

        tracing::debug!(bytes = audio.bytes.len(), "Sending recording for transcription");
        let res = self.backend.speech_to_text(audio).await;
        self.session.recording = RecordingState::Idle;

        match res {
            Ok(transcript) => {
                self.session.input = transcript.to_string();
                self.session.last_error = None;
                self.session.status = Some(Status::expiring(
                    STATUS_TRANSCRIBED,
                    Instant::now() + self.status_ttl,
                ));
                if self.tx.send(Event::TranscriptReady(transcript)).is_err() {
                    tracing::debug!("Transcript dropped, UI is no longer listening");
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, "Speech to text failed");
                self.set_error(format!("Speech-to-text failed. Error: {err}"));
            }
        }

        self.publish();
    }

    pub async fn toggle_recording(&mut self) {
        if self.session.recording == RecordingState::Recording {
            self.end_recording().await;
        } else {
            self.begin_recording().await;
        }
    }

    /// Plays the most recent tutor audio from the start, or stops it when it
    /// is already playing.
    pub async fn toggle_playback(&mut self) {
        if self.session.playing {
            self.player.stop();
            self.session.playing = false;
            self.publish();
            return;
        }

        if !self.session.can_play() {
            return;
        }
        let Some(audio) = self.session.last_audio.clone() else {
            return;
        };

        match self.player.play(&audio).await {
            Ok(()) => {
                self.session.playing = true;
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to play audio");
                self.set_error(format!("Could not play audio. Error: {err}"));
            }
        }

        self.publish();
    }

    /// Expires transient statuses and notices playback reaching its end.
    pub fn tick(&mut self, now: Instant) {
        let mut changed = false;

        if let Some(status) = &self.session.status {
            if status.is_expired(now) {
                self.session.status = None;
                changed = true;
            }
        }

        if self.session.playing && !self.player.is_playing() {
            self.session.playing = false;
            changed = true;
        }

        if changed {
            self.publish();
        }
    }
}
