//! Memory window: a bounded, chronological view of recent conversation.
//!
//! The host log is never truncated. Each turn takes the newest
//! `history_limit` records, converts them into turns and keeps at most
//! `window_size` of them, evicting the oldest first.

use persanna_core::message::{ConversationTurn, Message, StoredMessage};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Caps applied when building a window from the host log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSettings {
    /// How many of the newest host records are considered.
    pub history_limit: usize,
    /// Maximum number of turns the window retains.
    pub window_size: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            history_limit: 42,
            window_size: 512,
        }
    }
}

impl WindowSettings {
    pub fn new(history_limit: usize, window_size: usize) -> Self {
        Self {
            history_limit: history_limit.max(1),
            window_size: window_size.max(1),
        }
    }
}

/// Recent turns, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryWindow {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::with_capacity(WindowSettings::default().window_size)
    }
}

impl MemoryWindow {
    /// An empty window holding at most `capacity` turns.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Build the window for a turn from the host log.
    pub fn from_history(history: &[StoredMessage], settings: &WindowSettings) -> Self {
        let limit = settings.history_limit.max(1);
        let start = history.len().saturating_sub(limit);

        let mut window = Self::with_capacity(settings.window_size);
        for record in &history[start..] {
            window.push(ConversationTurn::from(record));
        }
        window
    }

    /// Append a turn, evicting the oldest when full.
    pub fn push(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn newest(&self) -> Option<&ConversationTurn> {
        self.turns.back()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Provider messages for the chat history, each tagged with its speaker.
    pub fn to_messages(&self) -> Vec<Message> {
        self.turns.iter().map(ConversationTurn::to_message).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persanna_core::message::{Role, Speaker};

    fn log(n: usize) -> Vec<StoredMessage> {
        (0..n)
            .map(|i| {
                if i % 2 == 0 {
                    StoredMessage::human(format!("q{i}"), "9:00:00 AM")
                } else {
                    StoredMessage::ai(format!("a{i}"), "9:00:01 AM")
                }
            })
            .collect()
    }

    #[test]
    fn empty_history_gives_empty_window() {
        let window = MemoryWindow::from_history(&[], &WindowSettings::default());
        assert!(window.is_empty());
        assert!(window.to_messages().is_empty());
    }

    #[test]
    fn short_history_is_kept_in_order() {
        let history = log(4);
        let window = MemoryWindow::from_history(&history, &WindowSettings::default());
        let texts: Vec<&str> = window.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q0", "a1", "q2", "a3"]);
    }

    #[test]
    fn history_limit_keeps_newest_records() {
        let history = log(50);
        let window = MemoryWindow::from_history(&history, &WindowSettings::default());
        assert_eq!(window.len(), 42);
        assert_eq!(window.turns().next().unwrap().text, "q8");
        assert_eq!(window.newest().unwrap().text, "a49");
    }

    #[test]
    fn window_size_evicts_oldest() {
        let history = log(10);
        let window = MemoryWindow::from_history(&history, &WindowSettings::new(42, 3));
        assert_eq!(window.len(), 3);
        let texts: Vec<&str> = window.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["a7", "q8", "a9"]);
    }

    #[test]
    fn zero_caps_clamp_to_one() {
        let settings = WindowSettings::new(0, 0);
        assert_eq!(settings, WindowSettings::new(1, 1));

        let history = log(5);
        let window = MemoryWindow::from_history(
            &history,
            &WindowSettings {
                history_limit: 0,
                window_size: 0,
            },
        );
        assert_eq!(window.len(), 1);
        assert_eq!(window.newest().unwrap().text, "q4");
    }

    #[test]
    fn messages_carry_speaker_tags() {
        let history = vec![
            StoredMessage::human("hi there", "1:00:00 PM"),
            StoredMessage::ai("hello!", "1:00:02 PM"),
        ];
        let window = MemoryWindow::from_history(&history, &WindowSettings::default());
        let messages = window.to_messages();

        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].name(), Some("human"));
        assert_eq!(messages[0].content, "hi there");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].name(), Some("ai"));
    }

    #[test]
    fn push_past_capacity() {
        let mut window = MemoryWindow::with_capacity(2);
        for text in ["one", "two", "three"] {
            window.push(ConversationTurn {
                speaker: Speaker::Human,
                text: text.into(),
                timestamp: String::new(),
            });
        }
        assert_eq!(window.capacity(), 2);
        let texts: Vec<&str> = window.turns().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);
    }
}
