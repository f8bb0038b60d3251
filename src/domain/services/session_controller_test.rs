use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use test_utils::conversation_fixture;
use tokio::sync::mpsc;

use super::SessionController;
use super::STATUS_PROCESSING;
use super::STATUS_RECORDING;
use super::STATUS_TRANSCRIBED;
use crate::domain::models::AudioPayload;
use crate::domain::models::Backend;
use crate::domain::models::Event;
use crate::domain::models::FeedbackRequest;
use crate::domain::models::FeedbackResponse;
use crate::domain::models::LearnRequest;
use crate::domain::models::LearnResponse;
use crate::domain::models::Message;
use crate::domain::models::Player;
use crate::domain::models::Recorder;
use crate::domain::models::RecordingState;
use crate::domain::models::Role;
use crate::domain::models::Store;
use crate::infrastructure::stores::memory::MemoryStore;

#[derive(Default)]
struct BackendCalls {
    learn: Vec<LearnRequest>,
    feedback: Vec<FeedbackRequest>,
    speech_to_text: Vec<AudioPayload>,
}

#[derive(Clone)]
struct FakeBackend {
    calls: Arc<Mutex<BackendCalls>>,
    fail_learn: bool,
    fail_feedback: bool,
    audio: Option<String>,
    transcript: Option<String>,
}

impl Default for FakeBackend {
    fn default() -> FakeBackend {
        return FakeBackend {
            calls: Arc::new(Mutex::new(BackendCalls::default())),
            fail_learn: false,
            fail_feedback: false,
            audio: Some(base64::engine::general_purpose::STANDARD.encode([1, 2, 3])),
            transcript: Some("me llamo Ana".to_string()),
        };
    }
}

impl FakeBackend {
    fn learn_calls(&self) -> Vec<LearnRequest> {
        return self.calls.lock().unwrap().learn.clone();
    }

    fn feedback_calls(&self) -> Vec<FeedbackRequest> {
        return self.calls.lock().unwrap().feedback.clone();
    }

    fn speech_to_text_calls(&self) -> usize {
        return self.calls.lock().unwrap().speech_to_text.len();
    }
}

#[async_trait]
impl Backend for FakeBackend {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.fail_learn {
            bail!("connection refused");
        }
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn learn(&self, request: LearnRequest) -> Result<LearnResponse> {
        let is_new_chat = request.is_new_chat;
        let prompt = request.prompt.to_string();
        self.calls.lock().unwrap().learn.push(request);

        if self.fail_learn {
            bail!("HTTP error! status: 500");
        }

        let response = if is_new_chat {
            "¡Hola! Hoy aprendemos saludos. (Hello! Today we learn greetings.)".to_string()
        } else {
            format!("Muy bien: {prompt}")
        };

        return Ok(LearnResponse {
            response,
            audio: self.audio.clone(),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn feedback(&self, request: FeedbackRequest) -> Result<FeedbackResponse> {
        self.calls.lock().unwrap().feedback.push(request);

        if self.fail_feedback {
            bail!("HTTP error! status: 502");
        }

        return Ok(FeedbackResponse {
            feedback: "1. hola - practice more\n2. 4/5".to_string(),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn speech_to_text(&self, audio: AudioPayload) -> Result<String> {
        self.calls.lock().unwrap().speech_to_text.push(audio);

        return self
            .transcript
            .clone()
            .ok_or_else(|| return anyhow!("Speech-to-text failed: no speech recognized"));
    }
}

#[derive(Clone, Default)]
struct FakeRecorder {
    deny: bool,
    audio: Option<AudioPayload>,
    started: Arc<AtomicBool>,
}

#[async_trait]
impl Recorder for FakeRecorder {
    #[allow(clippy::implicit_return)]
    async fn start(&mut self) -> Result<()> {
        if self.deny {
            bail!("permission denied");
        }
        self.started.store(true, Ordering::SeqCst);
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn stop(&mut self) -> Result<Option<AudioPayload>> {
        self.started.store(false, Ordering::SeqCst);
        return Ok(self.audio.clone());
    }
}

#[derive(Clone, Default)]
struct FakePlayer {
    playing: Arc<AtomicBool>,
}

#[async_trait]
impl Player for FakePlayer {
    async fn play(&mut self, _audio: &AudioPayload) -> Result<()> {
        self.playing.store(true, Ordering::SeqCst);
        return Ok(());
    }

    fn stop(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        return self.playing.load(Ordering::SeqCst);
    }
}

struct Harness {
    controller: SessionController,
    backend: FakeBackend,
    store: MemoryStore,
    recorder: FakeRecorder,
    player: FakePlayer,
    rx: mpsc::UnboundedReceiver<Event>,
}

fn create_harness(backend: FakeBackend, store: MemoryStore, recorder: FakeRecorder) -> Harness {
    let (tx, rx) = mpsc::unbounded_channel::<Event>();
    let player = FakePlayer::default();
    let controller = SessionController::new(
        Box::new(backend.clone()),
        Box::new(store.clone()),
        Box::new(recorder.clone()),
        Box::new(player.clone()),
        tx,
    );

    return Harness {
        controller,
        backend,
        store,
        recorder,
        player,
        rx,
    };
}

fn default_harness() -> Harness {
    return create_harness(
        FakeBackend::default(),
        MemoryStore::default(),
        FakeRecorder {
            audio: Some(AudioPayload::wav(vec![0; 64])),
            ..FakeRecorder::default()
        },
    );
}

fn conversation() -> Vec<Message> {
    return conversation_fixture()
        .into_iter()
        .map(|(role, content)| {
            if role == "user" {
                return Message::user(content);
            }
            return Message::assistant(content);
        })
        .collect();
}

fn snapshots(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<crate::domain::models::Session> {
    let mut res = vec![];
    while let Ok(event) = rx.try_recv() {
        if let Event::SessionUpdated(session) = event {
            res.push(*session);
        }
    }

    return res;
}

mod initialize {
    use super::*;

    #[tokio::test]
    async fn it_greets_when_nothing_is_persisted() -> Result<()> {
        let mut harness = default_harness();
        harness.controller.initialize().await;

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Assistant);
        assert!(!session.is_loading());

        let calls = harness.backend.learn_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "Start the lesson");
        assert!(calls[0].is_new_chat);

        assert_eq!(harness.store.load().await?, session.messages);

        return Ok(());
    }

    #[tokio::test]
    async fn it_restores_persisted_transcript_without_requesting() -> Result<()> {
        let harness = default_harness();
        harness.store.save(&conversation()).await?;

        let mut harness = create_harness(
            harness.backend,
            harness.store,
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        assert_eq!(harness.controller.session().messages, conversation());
        assert!(harness.backend.learn_calls().is_empty());

        let published = snapshots(&mut harness.rx);
        assert_eq!(published.len(), 1);

        return Ok(());
    }

    #[tokio::test]
    async fn it_publishes_loading_before_greeting_arrives() {
        let mut harness = default_harness();
        harness.controller.initialize().await;

        let published = snapshots(&mut harness.rx);
        assert_eq!(published.len(), 2);
        assert!(published[0].is_loading());
        assert!(published[0].messages.is_empty());
        assert!(!published[1].is_loading());
        assert_eq!(published[1].messages.len(), 1);
    }

    #[tokio::test]
    async fn it_shows_error_when_greeting_fails() {
        let mut harness = create_harness(
            FakeBackend {
                fail_learn: true,
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Error);
        assert!(!session.is_loading());
    }
}

mod send_user_message {
    use super::*;

    #[tokio::test]
    async fn it_ignores_empty_and_whitespace_messages() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        let before = harness.controller.session().messages.len();

        harness.controller.send_user_message("").await;
        harness.controller.send_user_message("   ").await;
        harness.controller.send_user_message("\n\t").await;

        assert_eq!(harness.controller.session().messages.len(), before);
        assert_eq!(harness.backend.learn_calls().len(), 1);
    }

    #[tokio::test]
    async fn it_appends_user_and_assistant_messages() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.set_input("hola");

        harness.controller.send_user_message("hola").await;

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), 3);
        assert_eq!(session.messages[1], Message::user("hola"));
        assert_eq!(session.messages[2], Message::assistant("Muy bien: hola"));
        assert_eq!(session.input, "");
        assert!(!session.is_loading());
        assert_eq!(
            session.last_audio.as_ref().map(|audio| return audio.bytes.clone()),
            Some(vec![1, 2, 3])
        );
    }

    #[tokio::test]
    async fn it_sends_prior_transcript_as_context() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.send_user_message("hola").await;

        let calls = harness.backend.learn_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].prompt, "hola");
        assert!(!calls[1].is_new_chat);
        assert_eq!(
            calls[1].context,
            "assistant: ¡Hola! Hoy aprendemos saludos. (Hello! Today we learn greetings.)"
        );
    }

    #[tokio::test]
    async fn it_stores_the_prompt_exactly_as_sent() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.send_user_message("uno\tdos").await;
        harness.controller.send_user_message("tres").await;

        let calls = harness.backend.learn_calls();
        let session = harness.controller.session();
        assert_eq!(calls[1].prompt, "uno\tdos");
        assert_eq!(session.messages[1].content, calls[1].prompt);
        assert!(calls[2].context.contains("user: uno\tdos"));
        assert_eq!(harness.store.load().await.unwrap()[1].content, "uno\tdos");
    }

    #[tokio::test]
    async fn it_appends_error_message_when_request_fails() {
        let harness = default_harness();
        harness.store.save(&conversation()).await.unwrap();
        let mut harness = create_harness(
            FakeBackend {
                fail_learn: true,
                ..FakeBackend::default()
            },
            harness.store,
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;
        let before = harness.controller.session().messages.len();

        harness.controller.send_user_message("adiós").await;

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), before + 2);
        assert_eq!(session.messages[before], Message::user("adiós"));
        assert_eq!(session.messages[before + 1].role, Role::Error);
        insta::assert_snapshot!(session.messages[before + 1].content, @"Failed to get response. Error: HTTP error! status: 500");
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn it_persists_every_change() -> Result<()> {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.send_user_message("hola").await;

        assert_eq!(
            harness.store.load().await?,
            harness.controller.session().messages
        );

        return Ok(());
    }

    #[tokio::test]
    async fn it_clears_audio_when_response_has_none() {
        let mut harness = create_harness(
            FakeBackend {
                audio: None,
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        assert!(harness.controller.session().last_audio.is_none());
        assert!(!harness.controller.session().can_play());
    }

    #[tokio::test]
    async fn it_ignores_undecodable_audio() {
        let mut harness = create_harness(
            FakeBackend {
                audio: Some("not base64!".to_string()),
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        assert_eq!(harness.controller.session().messages.len(), 1);
        assert!(harness.controller.session().last_audio.is_none());
    }

    #[tokio::test]
    async fn it_refuses_while_recording() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.begin_recording().await;
        let before = harness.controller.session().messages.len();

        harness.controller.send_user_message("hola").await;

        assert_eq!(harness.controller.session().messages.len(), before);
        assert_eq!(harness.backend.learn_calls().len(), 1);
    }
}

mod request_turn {
    use super::*;

    #[tokio::test]
    async fn it_resubmits_last_user_message() {
        let harness = default_harness();
        harness.store.save(&conversation()).await.unwrap();
        let mut harness = create_harness(harness.backend, harness.store, FakeRecorder::default());
        harness.controller.initialize().await;

        harness.controller.request_turn(false).await;

        let calls = harness.backend.learn_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].prompt, "por favor");
        assert_eq!(calls[0].context.split('\n').count(), 3);

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), 5);
        assert_eq!(session.messages[4], Message::assistant("Muy bien: por favor"));
    }

    #[tokio::test]
    async fn it_does_nothing_to_resubmit_without_user_messages() {
        let mut harness = default_harness();
        harness.controller.initialize().await;

        harness.controller.request_turn(false).await;

        assert_eq!(harness.backend.learn_calls().len(), 1);
        assert_eq!(harness.controller.session().messages.len(), 1);
    }

    #[tokio::test]
    async fn it_replaces_transcript_on_new_chat() {
        let harness = default_harness();
        harness.store.save(&conversation()).await.unwrap();
        let mut harness = create_harness(harness.backend, harness.store, FakeRecorder::default());
        harness.controller.initialize().await;

        harness.controller.request_turn(true).await;

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Assistant);
    }
}

mod start_new_chat {
    use super::*;

    #[tokio::test]
    async fn it_leaves_a_single_greeting_after_restart() -> Result<()> {
        let harness = default_harness();
        harness.store.save(&conversation()).await?;
        let mut harness = create_harness(harness.backend, harness.store, FakeRecorder::default());
        harness.controller.initialize().await;
        harness.controller.request_feedback().await;

        harness.controller.start_new_chat().await;

        let session = harness.controller.session();
        assert_eq!(session.messages.len(), 1);
        assert!(session.feedback.is_none());
        assert!(!session.feedback_visible);

        let mut restarted = create_harness(
            FakeBackend::default(),
            harness.store.clone(),
            FakeRecorder::default(),
        );
        restarted.controller.initialize().await;

        let messages = &restarted.controller.session().messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::Assistant);
        assert!(restarted.backend.learn_calls().is_empty());

        return Ok(());
    }

    #[tokio::test]
    async fn it_publishes_empty_transcript_before_greeting() {
        let harness = default_harness();
        harness.store.save(&conversation()).await.unwrap();
        let mut harness = create_harness(harness.backend, harness.store, FakeRecorder::default());
        harness.controller.initialize().await;
        snapshots(&mut harness.rx);

        harness.controller.start_new_chat().await;

        let published = snapshots(&mut harness.rx);
        assert!(published[0].messages.is_empty());
        assert!(!published[0].is_loading());
        assert!(published[1].is_loading());
        assert_eq!(published.last().unwrap().messages.len(), 1);
    }
}

mod feedback {
    use super::*;

    #[tokio::test]
    async fn it_shows_feedback() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.send_user_message("hola").await;

        harness.controller.request_feedback().await;

        let session = harness.controller.session();
        let feedback = session.feedback.as_ref().unwrap();
        assert!(!feedback.failed);
        assert_eq!(feedback.text, "1. hola - practice more\n2. 4/5");
        assert!(session.feedback_visible);
        assert!(!session.is_loading());

        let calls = harness.backend.feedback_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].context.split('\n').count(), 3);
    }

    #[tokio::test]
    async fn it_shows_failure_in_feedback_panel() {
        let mut harness = create_harness(
            FakeBackend {
                fail_feedback: true,
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        harness.controller.request_feedback().await;

        let session = harness.controller.session();
        let feedback = session.feedback.as_ref().unwrap();
        assert!(feedback.failed);
        insta::assert_snapshot!(feedback.text, @"Failed to get feedback. Error: HTTP error! status: 502");
        assert!(session.feedback_visible);
        assert!(!session.is_loading());
        assert_eq!(session.messages.len(), 1);
    }

    #[tokio::test]
    async fn it_keeps_feedback_text_when_dismissed() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.request_feedback().await;

        harness.controller.dismiss_feedback();

        let session = harness.controller.session();
        assert!(!session.feedback_visible);
        assert!(session.feedback.is_some());
    }
}

mod recording {
    use super::*;

    #[tokio::test]
    async fn it_transcribes_into_input() {
        let mut harness = default_harness();
        harness.controller.initialize().await;

        harness.controller.begin_recording().await;
        assert_eq!(
            harness.controller.session().recording,
            RecordingState::Recording
        );
        assert!(harness.recorder.started.load(Ordering::SeqCst));
        assert_eq!(
            harness.controller.session().status.as_ref().unwrap().text,
            STATUS_RECORDING
        );
        snapshots(&mut harness.rx);

        harness.controller.end_recording().await;

        let session = harness.controller.session();
        assert_eq!(session.recording, RecordingState::Idle);
        assert_eq!(session.input, "me llamo Ana");
        assert_eq!(session.status.as_ref().unwrap().text, STATUS_TRANSCRIBED);
        assert!(!harness.recorder.started.load(Ordering::SeqCst));
        assert_eq!(harness.backend.speech_to_text_calls(), 1);

        let mut transcribing = false;
        let mut transcript = None;
        while let Ok(event) = harness.rx.try_recv() {
            match event {
                Event::SessionUpdated(session) => {
                    if session.recording == RecordingState::Transcribing {
                        transcribing = true;
                        assert_eq!(session.status.unwrap().text, STATUS_PROCESSING);
                    }
                }
                Event::TranscriptReady(text) => transcript = Some(text),
                _ => (),
            }
        }
        assert!(transcribing);
        assert_eq!(transcript, Some("me llamo Ana".to_string()));
    }

    #[tokio::test]
    async fn it_clears_transcription_status_after_a_while() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.toggle_recording().await;
        harness.controller.toggle_recording().await;

        harness.controller.tick(Instant::now());
        assert!(harness.controller.session().status.is_some());

        harness
            .controller
            .tick(Instant::now() + Duration::from_secs(10));
        assert!(harness.controller.session().status.is_none());
        assert_eq!(harness.controller.session().input, "me llamo Ana");
    }

    #[tokio::test]
    async fn it_never_transcribes_empty_recordings() {
        let mut harness = create_harness(
            FakeBackend::default(),
            MemoryStore::default(),
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        harness.controller.begin_recording().await;
        harness.controller.end_recording().await;

        let session = harness.controller.session();
        assert_eq!(session.recording, RecordingState::Idle);
        assert!(!session.is_recording());
        assert!(session.last_error.is_some());
        assert_eq!(harness.backend.speech_to_text_calls(), 0);
    }

    #[tokio::test]
    async fn it_keeps_input_when_transcription_fails() {
        let mut harness = create_harness(
            FakeBackend {
                transcript: None,
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder {
                audio: Some(AudioPayload::wav(vec![0; 64])),
                ..FakeRecorder::default()
            },
        );
        harness.controller.initialize().await;
        harness.controller.set_input("hola");

        harness.controller.begin_recording().await;
        harness.controller.end_recording().await;

        let session = harness.controller.session();
        assert_eq!(session.recording, RecordingState::Idle);
        assert_eq!(session.input, "hola");
        insta::assert_snapshot!(session.last_error.as_ref().unwrap(), @"Speech-to-text failed. Error: Speech-to-text failed: no speech recognized");
        assert_eq!(
            session.status.as_ref().unwrap().text,
            *session.last_error.as_ref().unwrap()
        );
    }

    #[tokio::test]
    async fn it_stays_idle_when_microphone_is_denied() {
        let mut harness = create_harness(
            FakeBackend::default(),
            MemoryStore::default(),
            FakeRecorder {
                deny: true,
                ..FakeRecorder::default()
            },
        );
        harness.controller.initialize().await;

        harness.controller.begin_recording().await;

        let session = harness.controller.session();
        assert_eq!(session.recording, RecordingState::Idle);
        insta::assert_snapshot!(session.last_error.as_ref().unwrap(), @"Could not access the microphone. Error: permission denied");
        assert!(session.status.as_ref().unwrap().expires_at.is_none());
    }

    #[tokio::test]
    async fn it_refuses_to_record_during_playback() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.toggle_playback().await;

        harness.controller.begin_recording().await;

        assert_eq!(harness.controller.session().recording, RecordingState::Idle);
        assert!(!harness.recorder.started.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn it_ignores_stop_without_recording() {
        let mut harness = default_harness();
        harness.controller.initialize().await;

        harness.controller.end_recording().await;

        assert_eq!(harness.backend.speech_to_text_calls(), 0);
        assert!(harness.controller.session().last_error.is_none());
    }
}

mod playback {
    use super::*;

    #[tokio::test]
    async fn it_does_nothing_without_audio() {
        let mut harness = create_harness(
            FakeBackend {
                audio: None,
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder::default(),
        );
        harness.controller.initialize().await;

        harness.controller.toggle_playback().await;

        assert!(!harness.controller.session().playing);
        assert!(!harness.player.is_playing());
    }

    #[tokio::test]
    async fn it_toggles_playback() {
        let mut harness = default_harness();
        harness.controller.initialize().await;

        harness.controller.toggle_playback().await;
        assert!(harness.controller.session().playing);
        assert!(harness.player.is_playing());

        harness.controller.toggle_playback().await;
        assert!(!harness.controller.session().playing);
        assert!(!harness.player.is_playing());
    }

    #[tokio::test]
    async fn it_notices_natural_end_of_playback() {
        let mut harness = default_harness();
        harness.controller.initialize().await;
        harness.controller.toggle_playback().await;

        harness.player.playing.store(false, Ordering::SeqCst);
        harness.controller.tick(Instant::now());

        assert!(!harness.controller.session().playing);
    }
}

mod check_backend {
    use super::*;

    #[tokio::test]
    async fn it_reports_unreachable_backend() {
        let mut harness = create_harness(
            FakeBackend {
                fail_learn: true,
                ..FakeBackend::default()
            },
            MemoryStore::default(),
            FakeRecorder::default(),
        );

        harness.controller.check_backend().await;

        let session = harness.controller.session();
        assert!(session.last_error.as_ref().unwrap().contains("connection refused"));
        assert!(session.messages.is_empty());
    }
}
