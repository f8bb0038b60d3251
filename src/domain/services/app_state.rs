#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::BubbleList;
use super::Scroll;
use crate::domain::models::Action;
use crate::domain::models::Session;
use crate::domain::models::SlashCommand;

/// What the UI knows about the session: the latest published snapshot plus
/// the layout state derived from it.
#[derive(Default)]
pub struct AppState {
    pub bubble_list: BubbleList,
    pub help_visible: bool,
    pub last_known_height: u16,
    pub last_known_width: u16,
    pub scroll: Scroll,
    pub session: Session,
    /// Set as soon as a request is handed to the controller, so the input is
    /// locked before the controller publishes its own in-flight snapshot.
    pub waiting_for_session: bool,
}

impl AppState {
    pub fn is_busy(&self) -> bool {
        return self.waiting_for_session || !self.session.accepts_input();
    }

    pub fn handle_session_update(&mut self, session: Session) {
        let grew = session.messages.len() != self.session.messages.len();
        self.session = session;
        self.waiting_for_session = false;
        self.sync_dependants();

        if grew {
            self.scroll.last();
        }
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    fn request(&mut self, tx: &mpsc::UnboundedSender<Action>, action: Action) -> Result<()> {
        if self.is_busy() {
            return Ok(());
        }

        self.waiting_for_session = true;
        tx.send(action)?;

        return Ok(());
    }

    pub fn send_message(&mut self, text: &str, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        return self.request(tx, Action::SendMessage(text.to_string()));
    }

    pub fn new_chat(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        return self.request(tx, Action::NewChat());
    }

    pub fn request_feedback(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        return self.request(tx, Action::RequestFeedback());
    }

    pub fn resubmit(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        return self.request(tx, Action::ResubmitLastMessage());
    }

    /// Starts or stops the microphone. The current input is handed over first
    /// so a failed transcription leaves it intact.
    pub fn toggle_recording(
        &mut self,
        input: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<()> {
        if !self.session.is_recording() {
            if self.waiting_for_session || !self.session.can_record() {
                return Ok(());
            }
            tx.send(Action::SetInput(input.to_string()))?;
        }
        tx.send(Action::ToggleRecording())?;

        return Ok(());
    }

    pub fn toggle_playback(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if !self.session.playing && !self.session.can_play() {
            return Ok(());
        }
        tx.send(Action::TogglePlayback())?;

        return Ok(());
    }

    pub fn panel_visible(&self) -> bool {
        return self.help_visible || self.session.feedback_visible;
    }

    pub fn dismiss_panel(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        if self.help_visible {
            self.help_visible = false;
            return Ok(());
        }

        if self.session.feedback_visible {
            tx.send(Action::DismissFeedback())?;
        }

        return Ok(());
    }

    /// Returns `(should_break, should_continue)` for the input loop.
    pub fn handle_slash_commands(
        &mut self,
        input_str: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let Some(command) = SlashCommand::parse(input_str) else {
            return Ok((false, false));
        };

        if command.is_quit() {
            return Ok((true, false));
        }

        if command.is_help() {
            self.help_visible = true;
        } else if command.is_new_chat() {
            self.new_chat(tx)?;
        } else if command.is_feedback() {
            self.request_feedback(tx)?;
        } else if command.is_play() {
            self.toggle_playback(tx)?;
        } else if command.is_record() {
            self.toggle_recording("", tx)?;
        }

        return Ok((false, true));
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(&self.session.messages, self.last_known_width as usize);

        self.scroll
            .set_state(self.bubble_list.len() as u16, self.last_known_height);
    }
}
