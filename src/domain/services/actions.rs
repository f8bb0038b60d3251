use std::time::Instant;

use anyhow::Result;
use tokio::sync::mpsc;

use super::SessionController;
use crate::domain::models::Action;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Clears the conversation and starts a fresh lesson.
- /feedback /summary (/f) - Shows a summary of your progress so far.
- /play (/p) - Plays the last spoken response from the tutor, or stops it.
- /record (/r) - Starts recording from your microphone, run again to stop and transcribe.
- /quit /exit (/q) - Exit.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+C - Exit.
- CTRL+R - Resubmit your last message to the tutor.
- CTRL+N - Start a new chat.
- CTRL+F - Show progress feedback.
- CTRL+T - Start or stop recording.
- CTRL+P - Play or stop the last spoken response.
- Esc - Close this panel or the feedback panel.

SPECIAL CHARACTERS:
- F1 ¿  F2 ¡  F3 ü  F4 ñ  F5 é  F6 á  F7 í  F8 ó  F9 ú
        "#;

    return text.trim().to_string();
}

pub struct ActionsService {}

impl ActionsService {
    /// Feeds UI intents to the controller one at a time, so a request never
    /// overlaps another operation on the session.
    pub async fn start(
        mut controller: SessionController,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        controller.check_backend().await;
        controller.initialize().await;

        while let Some(action) = rx.recv().await {
            match action {
                Action::DismissFeedback() => {
                    controller.dismiss_feedback();
                }
                Action::NewChat() => {
                    controller.start_new_chat().await;
                }
                Action::RequestFeedback() => {
                    controller.request_feedback().await;
                }
                Action::ResubmitLastMessage() => {
                    controller.request_turn(false).await;
                }
                Action::SendMessage(text) => {
                    controller.send_user_message(&text).await;
                }
                Action::SetInput(text) => {
                    controller.set_input(&text);
                }
                Action::Tick() => {
                    controller.tick(Instant::now());
                }
                Action::TogglePlayback() => {
                    controller.toggle_playback().await;
                }
                Action::ToggleRecording() => {
                    controller.toggle_recording().await;
                }
            }
        }

        return Ok(());
    }
}
