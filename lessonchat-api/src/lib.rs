//! LessonChat API - lesson-scoped AI tutoring chat over HTTP.
//!
//! This crate provides the HTTP service for LessonChat:
//! - Session bootstrap with anti-forgery tokens
//! - Chat messages routed through the completion gateway
//! - Transcript history keyed by (session id, lesson id)
//! - Lesson catalog with per-lesson system prompts
//!
//! ## Architecture
//!
//! ```text
//! Client → API (token check → lesson gate) → Completion provider
//!                       ↓
//!                Transcript store
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod conversation;
pub mod lessons;
pub mod routes;
pub mod service;
pub mod token;

pub use routes::AppState;
pub use service::{ChatReply, ChatService, SendMessageRequest};
pub use token::TokenState;

use axum::Router;
use lessonchat_common::config::Config;
use lessonchat_gateway::OpenAiClient;
use lessonchat_store::TranscriptStore;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Build the shared application state from configuration.
///
/// The database path is a parameter so tests can point the service at an
/// isolated temporary store.
pub fn build_state(config: &Config, db_path: &Path) -> anyhow::Result<AppState> {
    let store = TranscriptStore::new(db_path)?;

    let client = Arc::new(OpenAiClient::with_base_url(&config.provider.base_url));
    let catalog = Arc::new(lessons::ConfigLessonCatalog::new(config.lessons.clone()));

    let service = ChatService::new(store, client, catalog, config.provider.clone());

    let secret = config
        .chat
        .token_secret
        .clone()
        .unwrap_or_else(|| "lessonchat-default-secret-change-me!".to_string());
    let tokens = TokenState::new(secret, config.chat.token_ttl_secs);

    Ok(AppState { service, tokens })
}

/// Build the API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::build_all_routes(state).layer(cors)
}

/// Start the API server.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    let state = build_state(config, &config.db_path())?;
    let router = build_router(state);

    tracing::info!("Starting LessonChat API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
