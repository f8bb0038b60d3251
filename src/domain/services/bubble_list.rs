use std::collections::HashMap;

use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::text::Line;
use ratatui::widgets::Block;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use super::Bubble;
use super::BubbleAlignment;
use crate::domain::models::Message;

#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

struct BubbleCacheEntry {
    message: Message,
    lines: Vec<Line<'static>>,
}

#[derive(Default)]
pub struct BubbleList {
    cache: HashMap<usize, BubbleCacheEntry>,
    line_width: usize,
    lines_len: usize,
}

impl BubbleList {
    pub fn set_messages(&mut self, messages: &[Message], line_width: usize) {
        if self.line_width != line_width {
            self.cache.clear();
            self.line_width = line_width;
        }

        // A reset can shrink the transcript, drop bubbles past the end.
        self.cache.retain(|idx, _| return *idx < messages.len());

        self.lines_len = messages
            .iter()
            .enumerate()
            .map(|(idx, message)| {
                if let Some(cache_entry) = self.cache.get(&idx) {
                    if &cache_entry.message == message {
                        return cache_entry.lines.len();
                    }
                }

                let owned = message.clone();
                let bubble_lines = Bubble::new(
                    &owned,
                    BubbleAlignment::for_role(owned.role),
                    line_width,
                )
                .as_lines()
                .into_iter()
                .map(|line| return to_owned_line(line))
                .collect::<Vec<Line<'static>>>();
                let bubble_line_len = bubble_lines.len();

                self.cache.insert(
                    idx,
                    BubbleCacheEntry {
                        message: owned,
                        lines: bubble_lines,
                    },
                );

                return bubble_line_len;
            })
            .sum();
    }

    pub fn len(&self) -> usize {
        return self.lines_len;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, scroll: u16) {
        let mut indexes: Vec<usize> = self.cache.keys().cloned().collect();
        indexes.sort();
        let lines: Vec<Line<'static>> = indexes
            .iter()
            .flat_map(|idx| {
                return self.cache[idx].lines.to_owned();
            })
            .collect();

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default())
                .scroll((scroll, 0)),
            rect,
        );
    }
}

fn to_owned_line(line: Line<'_>) -> Line<'static> {
    return Line::from(
        line.spans
            .into_iter()
            .map(|span| {
                return ratatui::text::Span::styled(span.content.into_owned(), span.style);
            })
            .collect::<Vec<_>>(),
    );
}
