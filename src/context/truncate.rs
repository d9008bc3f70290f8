//! Last-resort truncation with no model call.

use std::fmt::Write;

use crate::llm::{Role, Turn};
use crate::types::Message;

/// Headroom left under `max_chars` for the system prompt the caller will
/// prepend to the outbound request.
const RESERVED_MARGIN: usize = 1_000;

/// How many trailing user messages feed the synthetic history digest.
const DIGEST_USER_MESSAGES: usize = 10;

/// Per-message character cap inside the digest.
const DIGEST_MESSAGE_CAP: usize = 300;

/// Truncate a history to fit `max_chars`, without any model call.
///
/// Used when no compressor is wired up. Keeps the first message, condenses
/// prior user input into one synthetic `system` turn, then fills the
/// remaining budget with the most recent messages that fit, preserving
/// chronological order.
#[must_use]
pub fn simple_truncate(messages: &[Message], max_chars: usize) -> Vec<Turn> {
    let Some(first) = messages.first() else {
        return Vec::new();
    };

    let mut result = vec![first.as_turn()];
    let mut used = first.char_len();

    let digest_lines: Vec<String> = messages[1..]
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| format!("- {}", cap_chars(&m.content, DIGEST_MESSAGE_CAP)))
        .collect();

    if !digest_lines.is_empty() {
        let start = digest_lines.len().saturating_sub(DIGEST_USER_MESSAGES);
        let mut digest =
            String::from("[History digest] Information the user has already provided:\n");
        digest.push_str(&digest_lines[start..].join("\n"));
        let _ = write!(
            digest,
            "\n\nContinue from this context; do not ask again for information listed above."
        );

        used += digest.chars().count();
        result.push(Turn::system(digest));
    }

    // Walk backward from the newest message, greedily taking whatever still
    // fits, then restore chronological order. Stops at the first overflow so
    // the included suffix is contiguous.
    let mut remaining = max_chars.saturating_sub(used + RESERVED_MARGIN);
    let mut recent = Vec::new();
    for message in messages[1..].iter().rev() {
        let len = message.char_len();
        if len > remaining {
            break;
        }
        remaining -= len;
        recent.push(message.as_turn());
    }
    recent.reverse();

    result.extend(recent);
    result
}

fn cap_chars(text: &str, cap: usize) -> String {
    if text.chars().count() > cap {
        text.chars().take(cap).collect()
    } else {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(pairs: usize, chars_each: usize) -> Vec<Message> {
        let mut messages = vec![Message::assistant("Welcome!")];
        for i in 0..pairs {
            messages.push(Message::user(format!(
                "{i:02}-{}",
                "u".repeat(chars_each.saturating_sub(3))
            )));
            messages.push(Message::assistant("a".repeat(chars_each)));
        }
        messages
    }

    #[test]
    fn empty_history_yields_empty_output() {
        assert!(simple_truncate(&[], 10_000).is_empty());
    }

    #[test]
    fn first_message_is_always_kept() {
        let messages = history(20, 1_000);
        let result = simple_truncate(&messages, 5_000);
        assert_eq!(result[0].content, "Welcome!");
    }

    #[test]
    fn stays_within_budget() {
        let messages = history(50, 2_000);
        for max_chars in [5_000, 10_000, 50_000, 100_000] {
            let result = simple_truncate(&messages, max_chars);
            let total: usize = result.iter().map(Turn::char_len).sum();
            assert!(
                total <= max_chars,
                "{total} chars exceeds budget {max_chars}"
            );
        }
    }

    #[test]
    fn digest_lists_only_trailing_user_messages() {
        let messages = history(15, 100);
        let result = simple_truncate(&messages, 3_000);

        let digest = &result[1];
        assert_eq!(digest.role, Role::System);
        // 15 user messages, digest keeps the last 10.
        assert!(!digest.content.contains("04-"));
        assert!(digest.content.contains("05-"));
        assert!(digest.content.contains("14-"));
        assert!(digest.content.contains("do not ask again"));
    }

    #[test]
    fn no_digest_without_user_messages() {
        let messages = vec![
            Message::assistant("Welcome!"),
            Message::assistant("Still here."),
        ];
        let result = simple_truncate(&messages, 10_000);
        assert!(result.iter().all(|t| t.role != Role::System));
    }

    #[test]
    fn recent_messages_keep_chronological_order() {
        let messages = history(30, 200);
        let result = simple_truncate(&messages, 10_000);

        let recent: Vec<_> = result
            .iter()
            .skip(2) // head + digest
            .map(|t| t.content.clone())
            .collect();
        assert!(!recent.is_empty());

        // The included suffix must match the tail of the original, in order.
        let tail: Vec<_> = messages[messages.len() - recent.len()..]
            .iter()
            .map(|m| m.content.clone())
            .collect();
        assert_eq!(recent, tail);
    }

    #[test]
    fn tight_budget_drops_recent_messages_but_keeps_head() {
        let messages = history(10, 5_000);
        let result = simple_truncate(&messages, 2_000);

        // Budget too small for any 5,000-char message after the margin.
        assert_eq!(result[0].content, "Welcome!");
        assert!(result.len() <= 2);

        // Below the head-plus-digest floor the budget bound no longer holds:
        // those two entries are emitted unconditionally, so the output may
        // exceed `max_chars`. Only the greedy fill respects the budget.
        let floor: usize = result.iter().map(Turn::char_len).sum();
        let tighter = simple_truncate(&messages, floor.saturating_sub(1));
        assert_eq!(tighter.len(), result.len());
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        // 3,000 CJK characters per message is 9,000 UTF-8 bytes. A 40,000
        // character budget holds all ten messages even though the byte total
        // is far larger.
        let mut messages = vec![Message::assistant("欢迎!")];
        for _ in 0..10 {
            messages.push(Message::user("中".repeat(3_000)));
        }
        let result = simple_truncate(&messages, 40_000);

        let recent = result.iter().filter(|t| t.role == Role::User).count();
        assert_eq!(recent, 10);
        let total: usize = result.iter().map(Turn::char_len).sum();
        assert!(total <= 40_000, "{total} chars exceeds budget");
    }
}
