//! Conversation assembly.
//!
//! Builds the ordered message list sent to the completion provider: one
//! system entry, then every stored turn as a user/assistant pair in original
//! order, then the new user message. The full transcript is replayed on every
//! call; request size grows linearly with conversation length. That is a
//! known scalability boundary of the design, not something this module hides.

use lessonchat_common::{Error, Result};
use lessonchat_gateway::Message;
use lessonchat_store::Turn;

/// System prompt used when a lesson has none configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant helping students learn.";

/// Build the ordered prompt for one send.
///
/// Pure function; fails only when `new_user_message` is empty.
pub fn build_messages(
    system_prompt: &str,
    history: &[Turn],
    new_user_message: &str,
) -> Result<Vec<Message>> {
    if new_user_message.trim().is_empty() {
        return Err(Error::InvalidRequest("message must not be empty".into()));
    }

    let prompt = if system_prompt.trim().is_empty() {
        DEFAULT_SYSTEM_PROMPT
    } else {
        system_prompt
    };

    let mut messages = Vec::with_capacity(2 * history.len() + 2);
    messages.push(Message::system(prompt));

    for turn in history {
        messages.push(Message::user(&turn.user_message));
        messages.push(Message::assistant(&turn.ai_response));
    }

    messages.push(Message::user(new_user_message));

    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_yields_system_then_user() {
        let messages = build_messages("Explain networking simply.", &[], "What is a router?")
            .unwrap();

        assert_eq!(
            messages,
            vec![
                Message::system("Explain networking simply."),
                Message::user("What is a router?"),
            ]
        );
    }

    #[test]
    fn history_is_replayed_in_order() {
        let history = vec![Turn::now("u1", "a1")];
        let messages = build_messages("prompt", &history, "u2").unwrap();

        assert_eq!(
            messages,
            vec![
                Message::system("prompt"),
                Message::user("u1"),
                Message::assistant("a1"),
                Message::user("u2"),
            ]
        );
    }

    #[test]
    fn empty_prompt_falls_back() {
        let messages = build_messages("", &[], "hi").unwrap();
        assert_eq!(messages[0], Message::system(DEFAULT_SYSTEM_PROMPT));

        let messages = build_messages("   ", &[], "hi").unwrap();
        assert_eq!(messages[0], Message::system(DEFAULT_SYSTEM_PROMPT));
    }

    #[test]
    fn empty_message_is_rejected() {
        assert!(matches!(
            build_messages("prompt", &[], ""),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            build_messages("prompt", &[], "  \n "),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn no_truncation_of_long_history() {
        let history: Vec<Turn> = (0..50)
            .map(|i| Turn::now(format!("q{i}"), format!("a{i}")))
            .collect();

        let messages = build_messages("prompt", &history, "latest").unwrap();
        assert_eq!(messages.len(), 102);
        assert_eq!(messages[1], Message::user("q0"));
        assert_eq!(messages[100], Message::assistant("a49"));
        assert_eq!(messages[101], Message::user("latest"));
    }
}
