#[cfg(test)]
#[path = "scroll_test.rs"]
mod tests;

use ratatui::widgets::ScrollbarState;

const PAGE_SIZE: u16 = 10;

#[derive(Default)]
pub struct Scroll {
    list_length: u16,
    viewport_length: u16,
    pub position: u16,
    pub scrollbar_state: ScrollbarState,
}

impl Scroll {
    fn max_position(&self) -> u16 {
        return self.list_length.saturating_sub(self.viewport_length);
    }

    pub fn up(&mut self) {
        self.up_by(1);
    }

    pub fn up_page(&mut self) {
        self.up_by(PAGE_SIZE);
    }

    pub fn down(&mut self) {
        self.down_by(1);
    }

    pub fn down_page(&mut self) {
        self.down_by(PAGE_SIZE);
    }

    fn up_by(&mut self, lines: u16) {
        self.position = self.position.saturating_sub(lines);
        self.scrollbar_state = self.scrollbar_state.position(self.position);
    }

    fn down_by(&mut self, lines: u16) {
        self.position = self
            .position
            .saturating_add(lines)
            .min(self.max_position());
        self.scrollbar_state = self.scrollbar_state.position(self.position);
    }

    /// Jumps to the most recent message.
    pub fn last(&mut self) {
        self.position = self.max_position();
        self.scrollbar_state.last();
    }

    pub fn is_at_bottom(&self) -> bool {
        return self.position >= self.max_position();
    }

    pub fn set_state(&mut self, list_length: u16, viewport_length: u16) {
        self.list_length = list_length;
        self.viewport_length = viewport_length;
        self.position = self.position.min(self.max_position());
        self.scrollbar_state = self
            .scrollbar_state
            .content_length(list_length)
            .viewport_content_length(viewport_length)
            .position(self.position);
    }
}
