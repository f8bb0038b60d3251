#[cfg(test)]
#[path = "feedback_test.rs"]
mod tests;

use once_cell::sync::Lazy;
use ratatui::layout::Rect;
use ratatui::prelude::Backend;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Clear;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Wrap;
use ratatui::Frame;
use regex::Regex;

use crate::domain::models::Feedback;
use crate::domain::models::FeedbackItem;

static ITEM_START: Lazy<Regex> = Lazy::new(|| return Regex::new(r"\d+\.\s").unwrap());
static ITEM_NUMBER: Lazy<Regex> = Lazy::new(|| return Regex::new(r"^(\d+\.)\s").unwrap());

fn parse_item(part: &str) -> FeedbackItem {
    let Some(captures) = ITEM_NUMBER.captures(part) else {
        return FeedbackItem {
            number: None,
            text: part.trim().to_string(),
            bullets: vec![],
        };
    };

    let number = captures[1].to_string();
    let rest = &part[captures[0].len()..];
    let mut pieces = rest.split('-');
    let text = pieces.next().unwrap_or("").trim().to_string();
    let bullets = pieces
        .map(|piece| return piece.trim().to_string())
        .filter(|piece| return !piece.is_empty())
        .collect();

    return FeedbackItem {
        number: Some(number),
        text,
        bullets,
    };
}

/// Splits a feedback text into numbered items, starting a new item before
/// every `<integer>. ` and turning hyphen separated pieces of an item into
/// sub-bullets. Text without numbering comes back as a single item.
pub fn format_feedback(text: &str) -> Vec<FeedbackItem> {
    let mut boundaries = ITEM_START
        .find_iter(text)
        .map(|found| return found.start())
        .collect::<Vec<usize>>();
    if boundaries.first() != Some(&0) {
        boundaries.insert(0, 0);
    }
    boundaries.push(text.len());

    return boundaries
        .windows(2)
        .map(|bounds| return &text[bounds[0]..bounds[1]])
        .filter(|part| return !part.trim().is_empty())
        .map(parse_item)
        .collect();
}

/// Plain text rendering of formatted feedback, as written to the debug log.
pub fn feedback_as_text(items: &[FeedbackItem]) -> String {
    return items
        .iter()
        .map(|item| {
            let mut lines = vec![];
            if let Some(number) = &item.number {
                lines.push(format!("{number} {}", item.text).trim_end().to_string());
            } else {
                lines.push(item.text.to_string());
            }
            for bullet in &item.bullets {
                lines.push(format!("  • {bullet}"));
            }
            return lines.join("\n");
        })
        .collect::<Vec<String>>()
        .join("\n");
}

pub struct FeedbackPanel<'a> {
    feedback: &'a Feedback,
}

impl<'a> FeedbackPanel<'a> {
    pub fn new(feedback: &'a Feedback) -> FeedbackPanel<'a> {
        return FeedbackPanel { feedback };
    }

    pub fn as_lines(&self) -> Vec<Line<'a>> {
        if self.feedback.failed {
            return vec![Line::from(Span::styled(
                self.feedback.text.to_string(),
                Style {
                    fg: Some(Color::Red),
                    ..Style::default()
                },
            ))];
        }

        let mut lines: Vec<Line> = vec![];
        for item in format_feedback(&self.feedback.text) {
            let mut spans = vec![];
            if let Some(number) = item.number {
                spans.push(Span::styled(
                    format!("{number} "),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
            }
            spans.push(Span::from(item.text));
            lines.push(Line::from(spans));

            for bullet in item.bullets {
                lines.push(Line::from(format!("  • {bullet}")));
            }
        }

        return lines;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect) {
        render_panel(frame, rect, "Progress Summary (Esc to close)", self.as_lines());
    }
}

/// Draws a modal panel centered over `rect`, covering most of it.
pub fn render_panel<B: Backend>(frame: &mut Frame<B>, rect: Rect, title: &str, lines: Vec<Line>) {
    let width = rect.width.saturating_mul(4) / 5;
    let height = rect.height.saturating_mul(4) / 5;
    let area = Rect::new(
        rect.x + (rect.width - width) / 2,
        rect.y + (rect.height - height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title)
                .padding(Padding::new(1, 1, 1, 1)),
        ),
        area,
    );
}
