//! Chat session orchestration.
//!
//! `ChatService` drives a send through its fixed pipeline: validate the
//! request, resolve the lesson prompt, load the stored transcript, assemble
//! the provider conversation, call the completion gateway, persist the new
//! turn, and return the reply. A gateway failure aborts the pipeline before
//! persistence, so failed sends leave no trace in the transcript.

use crate::conversation::build_messages;
use crate::lessons::LessonCatalog;
use chrono::{DateTime, Utc};
use lessonchat_common::config::ProviderConfig;
use lessonchat_common::{Error, Result};
use lessonchat_gateway::{CompletionClient, CompletionSettings};
use lessonchat_store::{TranscriptStore, Turn};
use std::sync::Arc;

/// One chat send, as received from a caller.
#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub session_id: String,
    pub lesson_id: i64,
    pub message: String,
    pub user_id: Option<String>,
}

/// The assistant's reply to one send.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    pub timestamp: DateTime<Utc>,
}

/// Orchestrates transcript storage, conversation assembly, and the
/// completion gateway for one lesson-scoped chat service.
#[derive(Clone)]
pub struct ChatService {
    store: TranscriptStore,
    client: Arc<dyn CompletionClient>,
    lessons: Arc<dyn LessonCatalog>,
    provider: ProviderConfig,
}

impl ChatService {
    pub fn new(
        store: TranscriptStore,
        client: Arc<dyn CompletionClient>,
        lessons: Arc<dyn LessonCatalog>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            store,
            client,
            lessons,
            provider,
        }
    }

    /// Process one send end to end.
    ///
    /// Nothing is persisted unless the gateway call succeeds.
    pub async fn send_message(&self, req: SendMessageRequest) -> Result<ChatReply> {
        self.validate_key(&req.session_id, req.lesson_id)?;
        if req.message.trim().is_empty() {
            return Err(Error::InvalidRequest("message must not be empty".into()));
        }

        let lesson = self
            .lessons
            .lesson(req.lesson_id)
            .ok_or_else(|| Error::InvalidRequest(format!("unknown lesson {}", req.lesson_id)))?;
        if !lesson.enabled {
            return Err(Error::InvalidRequest(format!(
                "lesson {} is not enabled for chat",
                req.lesson_id
            )));
        }

        let history = self
            .store
            .load(&req.session_id, req.lesson_id)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        let messages = build_messages(
            lesson.system_prompt.as_deref().unwrap_or(""),
            &history,
            &req.message,
        )?;

        let settings = CompletionSettings::from(&self.provider);
        let reply = self.client.complete(&messages, &settings).await?;

        tracing::info!(
            session_id = %req.session_id,
            lesson_id = req.lesson_id,
            history_turns = history.len(),
            model = %reply.model,
            "Completed chat turn"
        );

        let turn = Turn::now(req.message, reply.content.clone());
        let timestamp = turn.timestamp;

        self.store
            .append(&req.session_id, req.lesson_id, req.user_id.as_deref(), turn)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(ChatReply {
            reply: reply.content,
            timestamp,
        })
    }

    /// Load the stored transcript for a session key. Read-only.
    pub async fn load_history(&self, session_id: &str, lesson_id: i64) -> Result<Vec<Turn>> {
        self.validate_key(session_id, lesson_id)?;

        self.store
            .load(session_id, lesson_id)
            .await
            .map_err(|e| Error::Internal(e.to_string()))
    }

    fn validate_key(&self, session_id: &str, lesson_id: i64) -> Result<()> {
        if session_id.trim().is_empty() {
            return Err(Error::InvalidRequest("session_id must not be empty".into()));
        }
        if lesson_id <= 0 {
            return Err(Error::InvalidRequest(
                "lesson_id must be a positive integer".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::ConfigLessonCatalog;
    use async_trait::async_trait;
    use lessonchat_common::config::LessonConfig;
    use lessonchat_gateway::{CompletionReply, GatewayError, Message};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Scripted gateway: returns canned replies and records every
    /// conversation it was handed.
    struct ScriptedClient {
        replies: Mutex<Vec<std::result::Result<String, GatewayError>>>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<std::result::Result<String, GatewayError>>) -> Self {
            Self {
                replies: Mutex::new(replies),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<Message>> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(
            &self,
            messages: &[Message],
            _settings: &CompletionSettings,
        ) -> std::result::Result<CompletionReply, GatewayError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let next = self.replies.lock().unwrap().remove(0);
            next.map(|content| CompletionReply {
                content,
                model: "scripted".into(),
                usage: None,
            })
        }
    }

    fn lessons() -> Arc<ConfigLessonCatalog> {
        let mut map = HashMap::new();
        map.insert(
            42,
            LessonConfig {
                system_prompt: Some("Explain networking simply.".into()),
                ..LessonConfig::default()
            },
        );
        map.insert(
            7,
            LessonConfig {
                enabled: false,
                ..LessonConfig::default()
            },
        );
        Arc::new(ConfigLessonCatalog::new(map))
    }

    fn service(
        replies: Vec<std::result::Result<String, GatewayError>>,
    ) -> (TempDir, Arc<ScriptedClient>, ChatService) {
        let tmp = TempDir::new().unwrap();
        let store = TranscriptStore::new(&tmp.path().join("chat.db")).unwrap();
        let client = Arc::new(ScriptedClient::new(replies));
        let svc = ChatService::new(
            store,
            client.clone(),
            lessons(),
            ProviderConfig::default(),
        );
        (tmp, client, svc)
    }

    fn send(session_id: &str, lesson_id: i64, message: &str) -> SendMessageRequest {
        SendMessageRequest {
            session_id: session_id.into(),
            lesson_id,
            message: message.into(),
            user_id: None,
        }
    }

    #[tokio::test]
    async fn send_persists_turn_and_returns_reply() {
        let (_tmp, client, svc) = service(vec![Ok(
            "A router forwards packets between networks.".into()
        )]);

        let reply = svc
            .send_message(send("sess_abc_1000", 42, "What is a router?"))
            .await
            .unwrap();
        assert_eq!(reply.reply, "A router forwards packets between networks.");

        let history = svc.load_history("sess_abc_1000", 42).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_message, "What is a router?");
        assert_eq!(
            history[0].ai_response,
            "A router forwards packets between networks."
        );

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![
                Message::system("Explain networking simply."),
                Message::user("What is a router?"),
            ]
        );
    }

    #[tokio::test]
    async fn second_send_replays_first_turn() {
        let (_tmp, client, svc) = service(vec![Ok("first reply".into()), Ok("second reply".into())]);

        svc.send_message(send("sess_abc_1000", 42, "first question"))
            .await
            .unwrap();
        svc.send_message(send("sess_abc_1000", 42, "second question"))
            .await
            .unwrap();

        let calls = client.calls();
        assert_eq!(
            calls[1],
            vec![
                Message::system("Explain networking simply."),
                Message::user("first question"),
                Message::assistant("first reply"),
                Message::user("second question"),
            ]
        );

        let history = svc.load_history("sess_abc_1000", 42).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn gateway_failure_persists_nothing() {
        let (_tmp, _client, svc) = service(vec![
            Err(GatewayError::Transport("connection reset".into())),
            Ok("recovered".into()),
        ]);

        let err = svc
            .send_message(send("sess_abc_1000", 42, "lost question"))
            .await
            .unwrap_err();
        assert!(err.is_provider());

        // The failed send must not appear in the transcript
        let history = svc.load_history("sess_abc_1000", 42).await.unwrap();
        assert!(history.is_empty());

        svc.send_message(send("sess_abc_1000", 42, "next question"))
            .await
            .unwrap();
        let history = svc.load_history("sess_abc_1000", 42).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].user_message, "next question");
    }

    #[tokio::test]
    async fn unknown_lesson_rejected_before_gateway() {
        let (_tmp, client, svc) = service(vec![]);

        let err = svc
            .send_message(send("sess_abc_1000", 999, "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn disabled_lesson_rejected() {
        let (_tmp, client, svc) = service(vec![]);

        let err = svc
            .send_message(send("sess_abc_1000", 7, "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn invalid_fields_rejected() {
        let (_tmp, client, svc) = service(vec![]);

        for req in [
            send("", 42, "hello"),
            send("sess_abc_1000", 0, "hello"),
            send("sess_abc_1000", -3, "hello"),
            send("sess_abc_1000", 42, "   "),
        ] {
            let err = svc.send_message(req).await.unwrap_err();
            assert!(matches!(err, Error::InvalidRequest(_)));
        }
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn history_for_fresh_session_is_empty() {
        let (_tmp, _client, svc) = service(vec![]);
        let history = svc.load_history("sess_new_123", 42).await.unwrap();
        assert!(history.is_empty());
    }
}
