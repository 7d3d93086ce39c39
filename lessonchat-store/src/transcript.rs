//! Transcript record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user message paired with the assistant's reply.
///
/// Turns are append-only: once stored they are never mutated or removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// What the learner sent (non-empty)
    pub user_message: String,
    /// What the assistant replied
    pub ai_response: String,
    /// Creation instant
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn now(user_message: impl Into<String>, ai_response: impl Into<String>) -> Self {
        Self {
            user_message: user_message.into(),
            ai_response: ai_response.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The (session, lesson) pair addressing exactly one transcript.
///
/// A session id alone is not a valid lookup key: one session identifier can be
/// reused across lessons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub session_id: String,
    pub lesson_id: i64,
}

impl SessionKey {
    pub fn new(session_id: impl Into<String>, lesson_id: i64) -> Self {
        Self {
            session_id: session_id.into(),
            lesson_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serializes_with_expected_fields() {
        let turn = Turn::now("What is a router?", "A router forwards packets.");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["user_message"], "What is a router?");
        assert_eq!(json["ai_response"], "A router forwards packets.");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn session_key_distinguishes_lessons() {
        let a = SessionKey::new("sess_abc_1000", 1);
        let b = SessionKey::new("sess_abc_1000", 2);
        assert_ne!(a, b);
    }
}
