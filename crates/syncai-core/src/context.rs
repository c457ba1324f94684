use crate::llm::ChatMessage;
use crate::store::StoredMessage;
use std::collections::VecDeque;

pub const MAX_WINDOW_CHARS: usize = 12_000;
pub const MAX_WINDOW_PAIRS: usize = 10;

/// Builds the bounded conversation context sent to the chat backend.
#[derive(Debug, Clone)]
pub struct HistoryWindower {
    max_chars: usize,
    max_pairs: usize,
}

impl Default for HistoryWindower {
    fn default() -> Self {
        Self {
            max_chars: MAX_WINDOW_CHARS,
            max_pairs: MAX_WINDOW_PAIRS,
        }
    }
}

impl HistoryWindower {
    pub fn new(max_chars: usize, max_pairs: usize) -> Self {
        Self {
            max_chars,
            max_pairs,
        }
    }

    /// Walk the log newest to oldest, collecting messages until either cap
    /// would be exceeded, then append the new utterance last. The new
    /// utterance is exempt from both caps. Messages are never reordered or
    /// truncated internally.
    pub fn window(&self, log: &[StoredMessage], new_text: &str) -> Vec<ChatMessage> {
        let mut collected: VecDeque<ChatMessage> = VecDeque::new();
        let mut total_chars = 0usize;
        let mut pair_count = 0usize;

        for message in log.iter().rev() {
            if message.role == "user" {
                pair_count += 1;
            }
            if pair_count > self.max_pairs {
                break;
            }
            let len = message.content.chars().count();
            if total_chars + len > self.max_chars {
                break;
            }
            let mapped = if message.role == "user" {
                ChatMessage::user(&message.content)
            } else {
                ChatMessage::assistant(&message.content)
            };
            collected.push_front(mapped);
            total_chars += len;
        }

        let mut window: Vec<ChatMessage> = collected.into();
        window.push(ChatMessage::user(new_text));
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    fn msg(role: &str, content: &str) -> StoredMessage {
        let now = chrono::Utc::now().to_rfc3339();
        if role == "user" {
            StoredMessage::user("t", content, now)
        } else {
            StoredMessage::assistant("t", content, now)
        }
    }

    fn log_of_pairs(pairs: usize, content: &str) -> Vec<StoredMessage> {
        let mut log = Vec::new();
        for _ in 0..pairs {
            log.push(msg("user", content));
            log.push(msg("assistant", content));
        }
        log
    }

    #[test]
    fn empty_log_yields_only_new_utterance() {
        let window = HistoryWindower::default().window(&[], "hello");
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[0].content, "hello");
    }

    #[test]
    fn new_utterance_is_always_last() {
        let log = log_of_pairs(2, "hi");
        let window = HistoryWindower::default().window(&log, "latest question");
        assert_eq!(window.last().unwrap().content, "latest question");
    }

    #[test]
    fn preserves_chronological_order_and_roles() {
        let log = vec![
            msg("user", "first"),
            msg("assistant", "second"),
            msg("user", "third"),
            msg("assistant", "fourth"),
        ];
        let window = HistoryWindower::default().window(&log, "fifth");
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third", "fourth", "fifth"]);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[1].role, Role::Assistant);
    }

    #[test]
    fn pair_cap_drops_oldest_turns() {
        let log = log_of_pairs(15, "x");
        let window = HistoryWindower::default().window(&log, "new");
        // Ten full pairs, plus the dangling assistant half of the eleventh
        // pair (the scan only stops once it reaches that pair's user turn),
        // plus the new utterance.
        assert_eq!(window.len(), 22);
        let user_turns = window
            .iter()
            .take(window.len() - 1)
            .filter(|m| m.role == Role::User)
            .count();
        assert_eq!(user_turns, MAX_WINDOW_PAIRS);
    }

    #[test]
    fn char_cap_stops_scan_without_truncating_messages() {
        let big = "a".repeat(7_000);
        let log = vec![
            msg("user", &big),
            msg("assistant", &big),
            msg("user", "small"),
            msg("assistant", "also small"),
        ];
        let window = HistoryWindower::default().window(&log, "new");
        // Scanning newest to oldest, the older 7000-char user message would
        // push the total past 12000, so the scan stops there and nothing
        // older is included. The assistant's 7000-char message still fits.
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec![big.as_str(), "small", "also small", "new"]);
    }

    #[test]
    fn windowed_chars_never_exceed_cap() {
        let chunk = "b".repeat(3_000);
        let log = log_of_pairs(8, &chunk);
        let window = HistoryWindower::default().window(&log, "new");
        let total: usize = window
            .iter()
            .take(window.len() - 1)
            .map(|m| m.content.chars().count())
            .sum();
        assert!(total <= MAX_WINDOW_CHARS);
    }

    #[test]
    fn oversized_new_utterance_is_still_included() {
        let huge = "c".repeat(50_000);
        let window = HistoryWindower::default().window(&log_of_pairs(1, "hi"), &huge);
        assert_eq!(window.last().unwrap().content.len(), 50_000);
    }

    #[test]
    fn unanswered_user_turn_counts_as_a_pair() {
        // A user message with no assistant reply still advances the pair
        // counter when scanning.
        let mut log = log_of_pairs(10, "x");
        log.insert(0, msg("user", "orphan"));
        let window = HistoryWindower::default().window(&log, "new");
        assert!(!window.iter().any(|m| m.content == "orphan"));
    }
}
