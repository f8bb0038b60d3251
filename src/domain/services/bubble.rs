#[cfg(test)]
#[path = "bubble_test.rs"]
mod tests;

use ratatui::style::Color;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;

use crate::domain::models::Message;
use crate::domain::models::Role;

#[derive(PartialEq, Eq)]
pub enum BubbleAlignment {
    Left,
    Right,
}

impl BubbleAlignment {
    pub fn for_role(role: Role) -> BubbleAlignment {
        if role == Role::User {
            return BubbleAlignment::Right;
        }

        return BubbleAlignment::Left;
    }
}

pub struct Bubble<'a> {
    alignment: BubbleAlignment,
    message: &'a Message,
    window_max_width: usize,
}

pub struct BubbleConfig {
    pub bubble_padding: usize,
    pub border_elements_length: usize,
    pub outer_padding_percentage: f32,
}

fn repeat_from_subtractions(text: &str, subtractions: Vec<usize>) -> String {
    let count = subtractions
        .into_iter()
        .map(|e| {
            return e as i64;
        })
        .reduce(|a, b| {
            return a - b;
        })
        .unwrap_or(0);

    if count <= 0 {
        return "".to_string();
    }

    return text.repeat(count as usize);
}

fn char_len(text: &str) -> usize {
    return text.chars().count();
}

impl<'a> Bubble<'a> {
    pub fn new(
        message: &'a Message,
        alignment: BubbleAlignment,
        window_max_width: usize,
    ) -> Bubble<'a> {
        return Bubble {
            alignment,
            message,
            window_max_width,
        };
    }

    pub fn style_config() -> BubbleConfig {
        return BubbleConfig {
            // Unicode character border + padding.
            bubble_padding: 8,
            // left border + left padding + (text, not counted) + right padding + right border +
            // scrollbar.
            border_elements_length: 5,
            outer_padding_percentage: 0.04,
        };
    }

    pub fn as_lines(&self) -> Vec<Line<'a>> {
        let max_line_length = self.get_max_line_length();
        let lines = self
            .message
            .as_string_lines(max_line_length)
            .into_iter()
            .map(|line| {
                return self.text_to_line(line, max_line_length);
            })
            .collect::<Vec<Line<'a>>>();

        return self.wrap_lines_in_bubble(lines, max_line_length);
    }

    fn text_to_line(&self, text: String, max_line_length: usize) -> Line<'a> {
        let line_str_len = char_len(&text);
        let fill = repeat_from_subtractions(" ", vec![max_line_length, line_str_len]);
        let formatted_line_length =
            line_str_len + char_len(&fill) + Bubble::style_config().bubble_padding;

        let wrapped_spans = vec![
            self.highlight_span("│ ".to_string()),
            Span::styled(text, self.text_style()),
            self.highlight_span(format!("{fill} │")),
        ];

        let outer_bubble_padding =
            repeat_from_subtractions(" ", vec![self.window_max_width, formatted_line_length]);

        if self.alignment == BubbleAlignment::Left {
            let mut line_spans = wrapped_spans;
            line_spans.push(Span::from(outer_bubble_padding));
            return Line::from(line_spans);
        }

        let mut line_spans = vec![Span::from(outer_bubble_padding)];
        line_spans.extend(wrapped_spans);

        return Line::from(line_spans);
    }

    fn get_max_line_length(&self) -> usize {
        let style_config = Bubble::style_config();
        // Add a minimum 4% of padding on the side.
        let min_bubble_padding_length = ((self.window_max_width as f32
            * style_config.outer_padding_percentage)
            .ceil()) as usize;

        // Border elements + minimum bubble padding.
        let line_border_width = style_config.border_elements_length + min_bubble_padding_length;

        let mut max_line_length = self
            .message
            .display_text()
            .lines()
            .map(char_len)
            .max()
            .unwrap_or(0);

        let available = self.window_max_width.saturating_sub(line_border_width);
        if max_line_length > available {
            max_line_length = available;
        }

        let name_len = char_len(&self.message.role.display_name());
        if max_line_length < name_len {
            max_line_length = name_len;
        }

        return max_line_length;
    }

    fn wrap_lines_in_bubble(&self, lines: Vec<Line<'a>>, max_line_length: usize) -> Vec<Line<'a>> {
        // Add 2 for the vertical bars.
        let inner_bar = "─".repeat(max_line_length + 2);
        let top_left_border = "╭";
        let mut top_bar = format!("{top_left_border}{inner_bar}╮");
        let bottom_bar = format!("╰{inner_bar}╯");
        let bar_bubble_padding = repeat_from_subtractions(
            " ",
            vec![
                self.window_max_width,
                max_line_length,
                Bubble::style_config().bubble_padding,
            ],
        );

        let name = self.message.role.display_name();
        let top_replace = "─".repeat(char_len(&name));
        top_bar = top_bar.replacen(
            format!("{top_left_border}{top_replace}").as_str(),
            format!("{top_left_border}{name}").as_str(),
            1,
        );

        let (top, bottom) = if self.alignment == BubbleAlignment::Left {
            (
                format!("{top_bar}{bar_bubble_padding}"),
                format!("{bottom_bar}{bar_bubble_padding}"),
            )
        } else {
            (
                format!("{bar_bubble_padding}{top_bar}"),
                format!("{bar_bubble_padding}{bottom_bar}"),
            )
        };

        let mut res = vec![self.highlight_line(top)];
        res.extend(lines);
        res.push(self.highlight_line(bottom));
        return res;
    }

    fn border_style(&self) -> Style {
        match self.message.role {
            Role::Error => {
                return Style {
                    fg: Some(Color::Red),
                    ..Style::default()
                };
            }
            Role::Assistant => {
                return Style {
                    fg: Some(Color::Rgb(7, 87, 91)), // Teal
                    ..Style::default()
                };
            }
            Role::User => return Style::default(),
        }
    }

    fn text_style(&self) -> Style {
        if self.message.role == Role::Error {
            return self.border_style();
        }

        return Style::default();
    }

    fn highlight_span(&self, text: String) -> Span<'a> {
        return Span::styled(text, self.border_style());
    }

    fn highlight_line(&self, text: String) -> Line<'a> {
        return Line::from(self.highlight_span(text));
    }
}
