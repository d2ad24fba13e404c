//! OpenAI client configuration.

use crate::config::{Settings, MISSING_API_KEY};
use crate::error::{CurioError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Create an OpenAI client from settings.
///
/// Fails when no API key can be resolved.
pub fn create_client(settings: &Settings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings
        .resolve_api_key()
        .ok_or_else(|| CurioError::Config(MISSING_API_KEY.to_string()))?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = settings.openai.api_base.as_deref().filter(|b| !b.is_empty()) {
        config = config.with_api_base(base);
    }

    create_client_with_timeout(
        config,
        Duration::from_secs(settings.openai.timeout_seconds),
    )
}

/// Create an OpenAI client with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
