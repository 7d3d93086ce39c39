//! Anti-forgery tokens and session id generation.
//!
//! Tokens are HMAC-SHA256 signatures over the session id and a coarse time
//! tick, truncated to 16 hex characters. A token stays valid for the current
//! and the previous tick, so its effective lifetime is between half the
//! configured TTL and the full TTL. The token proves the caller went through
//! the bootstrap endpoint; it carries no identity claims.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Anti-forgery token state shared across requests.
#[derive(Clone)]
pub struct TokenState {
    secret: Arc<String>,
    ttl_secs: u64,
}

impl TokenState {
    /// Create a new token state with the given signing secret.
    pub fn new(secret: impl Into<String>, ttl_secs: u64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            ttl_secs: ttl_secs.max(2),
        }
    }

    /// Issue a token for a session id.
    pub fn issue(&self, session_id: &str) -> String {
        self.sign(session_id, self.current_tick())
    }

    /// Validate a caller-supplied token for a session id.
    ///
    /// Accepts tokens signed in the current or previous tick.
    pub fn verify(&self, session_id: &str, token: &str) -> bool {
        let tick = self.current_tick();
        token == self.sign(session_id, tick)
            || token == self.sign(session_id, tick.saturating_sub(1))
    }

    fn current_tick(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        // Two ticks per configured lifetime
        now / (self.ttl_secs / 2)
    }

    fn sign(&self, session_id: &str, tick: u64) -> String {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC key of any length is valid");
        mac.update(session_id.as_bytes());
        mac.update(b":");
        mac.update(&tick.to_be_bytes());
        hex::encode(mac.finalize().into_bytes())[..16].to_string()
    }
}

/// Generate a fresh session identifier: `sess_<unique>_<unix-time>`.
///
/// The rest of the system treats these as opaque strings and never validates
/// the format.
pub fn generate_session_id() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!("sess_{}_{}", &unique[..13], now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let tokens = TokenState::new("test-secret", 86_400);
        let token = tokens.issue("sess_abc_1000");
        assert!(tokens.verify("sess_abc_1000", &token));
    }

    #[test]
    fn token_is_bound_to_session() {
        let tokens = TokenState::new("test-secret", 86_400);
        let token = tokens.issue("sess_abc_1000");
        assert!(!tokens.verify("sess_other_2000", &token));
    }

    #[test]
    fn garbage_token_rejected() {
        let tokens = TokenState::new("test-secret", 86_400);
        assert!(!tokens.verify("sess_abc_1000", "not-a-token"));
        assert!(!tokens.verify("sess_abc_1000", ""));
    }

    #[test]
    fn different_secrets_do_not_cross_verify() {
        let a = TokenState::new("secret-a", 86_400);
        let b = TokenState::new("secret-b", 86_400);
        let token = a.issue("sess_abc_1000");
        assert!(!b.verify("sess_abc_1000", &token));
    }

    #[test]
    fn session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("sess_"));
        let parts: Vec<&str> = id.splitn(3, '_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 13);
        assert!(parts[2].parse::<u64>().is_ok());
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }
}
