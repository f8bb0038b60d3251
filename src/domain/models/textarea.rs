use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;

pub struct TextArea {}

impl<'a> TextArea {
    pub fn default() -> tui_textarea::TextArea<'a> {
        return TextArea::with_text("");
    }

    /// Builds the input box prefilled with `text`, cursor at the end.
    pub fn with_text(text: &str) -> tui_textarea::TextArea<'a> {
        let mut textarea = if text.is_empty() {
            tui_textarea::TextArea::default()
        } else {
            tui_textarea::TextArea::new(vec![text.to_string()])
        };
        textarea.move_cursor(tui_textarea::CursorMove::End);
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .title("Type your message here... (F1-F9: ¿ ¡ ü ñ é á í ó ú)")
                .padding(Padding::new(1, 1, 0, 0)),
        );

        return textarea;
    }
}
