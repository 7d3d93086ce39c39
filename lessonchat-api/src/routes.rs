//! Route definitions for the LessonChat API.
//!
//! Provides HTTP endpoints for session bootstrap, chat messages, transcript
//! history, and health checks. Every chat endpoint requires the anti-forgery
//! token issued at session bootstrap; the token travels in the request body,
//! bound to the session id it was issued for.

use crate::service::{ChatService, SendMessageRequest};
use crate::token::{generate_session_id, TokenState};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use lessonchat_common::Error;
use lessonchat_store::Turn;
use serde::{Deserialize, Serialize};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: ChatService,
    pub tokens: TokenState,
}

/// Session bootstrap response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub token: String,
}

/// Chat message request body.
#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub session_id: String,
    pub lesson_id: i64,
    pub message: String,
    pub token: String,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Chat message response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessageResponse {
    pub reply: String,
    pub timestamp: String,
}

/// History request body.
#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub session_id: String,
    pub lesson_id: i64,
    pub token: String,
}

/// History response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryTurn>,
    pub count: usize,
}

/// One stored turn, as exposed over the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub user_message: String,
    pub ai_response: String,
    pub timestamp: String,
}

impl From<Turn> for HistoryTurn {
    fn from(turn: Turn) -> Self {
        Self {
            user_message: turn.user_message,
            ai_response: turn.ai_response,
            timestamp: turn.timestamp.to_rfc3339(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

/// Map a service error to an HTTP rejection.
///
/// Provider and internal failures are logged with detail but surface to the
/// caller with a generic message; client errors keep their real message.
fn reject(err: Error) -> Rejection {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let message = if status.is_server_error() {
        tracing::error!(error = %err, "Chat request failed");
        "Failed to get AI response".to_string()
    } else {
        err.to_string()
    };

    (
        status,
        Json(ErrorResponse {
            error: message,
            code: err.code().into(),
        }),
    )
}

fn reject_unauthorized() -> Rejection {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid or expired token".into(),
            code: "UNAUTHORIZED".into(),
        }),
    )
}

/// Build the complete router with all routes.
pub fn build_all_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/chat/sessions", post(create_session_handler))
        .route("/api/v1/chat/messages", post(chat_message_handler))
        .route("/api/v1/chat/history", post(history_handler))
        .with_state(state)
        .merge(health_routes())
}

/// Build health check routes.
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/health", get(health_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Create a fresh session id and its anti-forgery token.
async fn create_session_handler(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session_id = generate_session_id();
    let token = state.tokens.issue(&session_id);

    tracing::debug!(session_id = %session_id, "Created chat session");

    Json(CreateSessionResponse { session_id, token })
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Send one user message and return the assistant's reply.
async fn chat_message_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, Rejection> {
    if !state.tokens.verify(&request.session_id, &request.token) {
        return Err(reject_unauthorized());
    }

    let reply = state
        .service
        .send_message(SendMessageRequest {
            session_id: request.session_id,
            lesson_id: request.lesson_id,
            message: request.message,
            user_id: request.user_id,
        })
        .await
        .map_err(reject)?;

    Ok(Json(ChatMessageResponse {
        reply: reply.reply,
        timestamp: reply.timestamp.to_rfc3339(),
    }))
}

/// Return the stored transcript for a session key.
async fn history_handler(
    State(state): State<AppState>,
    Json(request): Json<HistoryRequest>,
) -> Result<Json<HistoryResponse>, Rejection> {
    if !state.tokens.verify(&request.session_id, &request.token) {
        return Err(reject_unauthorized());
    }

    let turns = state
        .service
        .load_history(&request.session_id, request.lesson_id)
        .await
        .map_err(reject)?;

    let messages: Vec<HistoryTurn> = turns.into_iter().map(HistoryTurn::from).collect();
    let count = messages.len();

    Ok(Json(HistoryResponse { messages, count }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Health Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        service: "lessonchat-api".into(),
    })
}
