//! Configuration validation for LessonChat.
//!
//! Ensures required values are present and within valid ranges before the
//! service starts serving requests.

use thiserror::Error;

use crate::config::{Config, ObservabilityConfig, ProviderConfig, ServerConfig};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.server.validate() {
            errors.push(e);
        }
        if let Err(e) = self.provider.validate() {
            errors.push(e);
        }
        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        for lesson_id in self.lessons.keys() {
            if *lesson_id <= 0 {
                errors.push(ValidationError::InvalidValue {
                    field: "lessons".into(),
                    reason: format!("lesson id {} must be positive", lesson_id),
                });
            }
        }

        if self.chat.token_ttl_secs == 0 {
            errors.push(ValidationError::InvalidValue {
                field: "chat.token_ttl_secs".into(),
                reason: "must be greater than zero".into(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }
        if self.host.is_empty() {
            return Err(ValidationError::MissingField {
                field: "server.host".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.model.is_empty() {
            return Err(ValidationError::MissingField {
                field: "provider.model".into(),
            });
        }
        if self.max_tokens == 0 {
            return Err(ValidationError::InvalidValue {
                field: "provider.max_tokens".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::InvalidValue {
                field: "provider.temperature".into(),
                reason: format!("{} is outside the 0.0-2.0 range", self.temperature),
            });
        }
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingField {
                field: "provider.base_url".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("unknown level '{}'", self.log_level),
            });
        }
        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("unknown format '{}'", self.log_format),
            });
        }
        Ok(())
    }
}
