//! LessonChat Gateway - the completion provider seam.
//!
//! Provides a unified interface for sending an assembled conversation to an
//! external chat-completion endpoint and extracting the reply text. One
//! request attempt per call: no retry, no streaming.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use lessonchat_common::config::ProviderConfig;
use serde::{Deserialize, Serialize};

// ============================================================================
// Client Trait
// ============================================================================

/// Interface to a chat-completion provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send an ordered message list and return the assistant's reply.
    async fn complete(
        &self,
        messages: &[Message],
        settings: &CompletionSettings,
    ) -> Result<CompletionReply, GatewayError>;
}

/// Error from the completion gateway.
///
/// All variants are terminal for the current request; a single failed attempt
/// surfaces directly to the caller.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// No API key configured; no network call was attempted.
    #[error("no API key configured")]
    Configuration,

    /// Transport-level failure (timeout, DNS, connection reset).
    #[error("request to completion provider failed: {0}")]
    Transport(String),

    /// Provider replied, but without the expected reply-text field.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

impl From<GatewayError> for lessonchat_common::Error {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Configuration => {
                Self::ProviderConfiguration("no API key configured".into())
            }
            GatewayError::Transport(msg) => Self::ProviderTransport(msg),
            GatewayError::MalformedResponse(msg) => Self::ProviderResponse(msg),
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".into(),
            content: content.into(),
        }
    }
}

/// Provider settings handed to the gateway at call time.
///
/// The gateway never reads ambient process-wide state; whoever orchestrates a
/// request passes these explicitly.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl From<&ProviderConfig> for CompletionSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// The provider's reply.
#[derive(Debug, Clone)]
pub struct CompletionReply {
    /// Content of the first completion choice
    pub content: String,
    /// Model the provider reports having used
    pub model: String,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        assert_eq!(Message::system("s").role, "system");
        assert_eq!(Message::user("u").role, "user");
        assert_eq!(Message::assistant("a").role, "assistant");
    }

    #[test]
    fn test_settings_from_provider_config() {
        let config = ProviderConfig {
            api_key: Some("sk-test".into()),
            model: "gpt-4".into(),
            max_tokens: 500,
            temperature: 0.2,
            base_url: "https://api.openai.com".into(),
        };

        let settings = CompletionSettings::from(&config);
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.model, "gpt-4");
        assert_eq!(settings.max_tokens, 500);
    }

    #[test]
    fn test_gateway_error_maps_to_common() {
        use lessonchat_common::Error;

        assert!(matches!(
            Error::from(GatewayError::Configuration),
            Error::ProviderConfiguration(_)
        ));
        assert!(matches!(
            Error::from(GatewayError::Transport("refused".into())),
            Error::ProviderTransport(_)
        ));
        assert!(matches!(
            Error::from(GatewayError::MalformedResponse("no choices".into())),
            Error::ProviderResponse(_)
        ));
    }
}
