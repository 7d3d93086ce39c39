//! LessonChat API - Main entry point.

use anyhow::Result;
use lessonchat_common::config::Config;
use lessonchat_common::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    // Initialize logging
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    tracing::info!("LessonChat API v{}", env!("CARGO_PKG_VERSION"));

    if config.provider.api_key.is_none() {
        tracing::warn!("No provider API key configured; chat sends will fail until one is set");
    }

    // Start the API server
    lessonchat_api::start_server(&config).await
}
