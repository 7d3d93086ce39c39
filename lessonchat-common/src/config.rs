//! Configuration management for LessonChat.
//!
//! Configuration lives in a single JSON file at `~/.lessonchat/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Explicit config file values
//! 2. Environment variables
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `LESSONCHAT_PORT` → server.port
//! - `LESSONCHAT_BIND` → server.host
//! - `LESSONCHAT_TOKEN_SECRET` → chat.token_secret
//! - `LESSONCHAT_DB_PATH` → chat.db_path
//! - `LESSONCHAT_LOG_LEVEL` → observability.log_level
//! - `OPENAI_API_KEY` → provider.api_key

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".lessonchat"),
        |dirs| dirs.home_dir().join(".lessonchat"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server bind configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default: "127.0.0.1" (local only)
    #[serde(default = "default_host")]
    pub host: String,

    /// Port number
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    4500
}

// ============================================================================
// Completion Provider Configuration
// ============================================================================

/// Settings for the external chat-completion provider.
///
/// These are read once at startup and handed to the completion gateway as an
/// explicit value on every call; the gateway itself never reads process-wide
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key. Without one, every send fails before any network call.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens in the completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Base URL of the provider API
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            base_url: default_base_url(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f64 {
    0.7
}

fn default_base_url() -> String {
    "https://api.openai.com".into()
}

// ============================================================================
// Chat Configuration
// ============================================================================

/// Chat session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Secret used to sign anti-forgery tokens. Falls back to
    /// `LESSONCHAT_TOKEN_SECRET` or a development default.
    #[serde(default)]
    pub token_secret: Option<String>,

    /// Anti-forgery token lifetime in seconds
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Transcript database path. Default: `~/.lessonchat/chat.db`
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            token_secret: None,
            token_ttl_secs: default_token_ttl(),
            db_path: None,
        }
    }
}

fn default_token_ttl() -> u64 {
    86_400
}

// ============================================================================
// Lesson Catalog
// ============================================================================

/// Per-lesson settings, owned by whatever admin surface manages lessons.
///
/// The chat core reads only `system_prompt` (and `enabled` as a request gate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonConfig {
    /// Whether the AI assistant is enabled for this lesson
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Display title
    #[serde(default = "default_lesson_title")]
    pub title: String,

    /// Display description
    #[serde(default)]
    pub description: String,

    /// Lesson-specific instruction text prefixed to every provider request.
    /// Empty or absent means the assembler applies the fixed fallback prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            title: default_lesson_title(),
            description: String::new(),
            system_prompt: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_lesson_title() -> String {
    "AI Learning Assistant".into()
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the LessonChat service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Lesson catalog keyed by lesson id
    #[serde(default)]
    pub lessons: HashMap<i64, LessonConfig>,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific path (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("LESSONCHAT_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(bind) = std::env::var("LESSONCHAT_BIND") {
            self.server.host = bind;
        }
        if let Ok(secret) = std::env::var("LESSONCHAT_TOKEN_SECRET") {
            self.chat.token_secret = Some(secret);
        }
        if let Ok(path) = std::env::var("LESSONCHAT_DB_PATH") {
            self.chat.db_path = Some(PathBuf::from(path));
        }
        if let Ok(level) = std::env::var("LESSONCHAT_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.provider.api_key = Some(key);
        }
    }

    /// Resolved transcript database path.
    pub fn db_path(&self) -> PathBuf {
        self.chat
            .db_path
            .clone()
            .unwrap_or_else(|| config_dir().join("chat.db"))
    }

    /// Look up a lesson by id.
    pub fn lesson(&self, lesson_id: i64) -> Option<&LessonConfig> {
        self.lessons.get(&lesson_id)
    }
}
