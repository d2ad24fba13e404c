//! Pre-flight checks before talking to the model.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::{Settings, MISSING_API_KEY};
use crate::error::{CurioError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Asking the agent requires an API key.
    Ask,
    /// Tools run locally or against public endpoints.
    Tool,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => check_api_key(settings),
        Operation::Tool => Ok(()),
    }
}

/// Check if an OpenAI API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match settings.resolve_api_key() {
        Some(_) => Ok(()),
        None => Err(CurioError::Config(MISSING_API_KEY.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tools_have_no_requirements() {
        assert!(check(Operation::Tool, &Settings::default()).is_ok());
    }

    #[test]
    fn test_ask_accepts_config_secret() {
        let mut settings = Settings::default();
        settings.openai.api_key = Some("sk-test".to_string());
        assert!(check(Operation::Ask, &settings).is_ok());
    }
}
