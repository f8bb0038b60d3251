#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Message {
        return Message {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> Message {
        return Message::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> Message {
        return Message::new(Role::Assistant, content);
    }

    pub fn error(content: &str) -> Message {
        return Message::new(Role::Error, content);
    }

    /// Single line representation the backend parses conversation context from.
    pub fn as_context_line(&self) -> String {
        return format!("{}: {}", self.role, self.content);
    }

    /// Content as drawn in the terminal. Tabs are expanded here only, stored
    /// content stays exactly as sent or received.
    pub fn display_text(&self) -> String {
        return self.content.replace('\t', "  ");
    }

    pub fn as_string_lines(&self, line_max_width: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();
        let text = self.display_text();

        for full_line in text.split('\n') {
            if full_line.trim().is_empty() {
                lines.push(" ".to_string());
                continue;
            }

            let mut char_count = 0;
            let mut current_lines: Vec<&str> = vec![];

            for word in full_line.split(' ') {
                let word_len = word.chars().count();
                if !current_lines.is_empty() && word_len + char_count + 1 > line_max_width {
                    lines.push(current_lines.join(" ").trim_end().to_string());
                    current_lines = vec![word];
                    char_count = word_len + 1;
                } else {
                    current_lines.push(word);
                    char_count += word_len + 1;
                }
            }
            if !current_lines.is_empty() {
                lines.push(current_lines.join(" ").trim_end().to_string());
            }
        }

        return lines;
    }
}

/// Flattens a transcript into the newline joined `role: content` form sent to
/// the backend as conversation context.
pub fn context_string(messages: &[Message]) -> String {
    return messages
        .iter()
        .map(|message| {
            return message.as_context_line();
        })
        .collect::<Vec<String>>()
        .join("\n");
}
