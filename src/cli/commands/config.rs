//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, config_path: Option<&str>, settings: Settings) -> Result<()> {
    let path = match config_path {
        Some(p) => Settings::expand_path(p),
        None => Settings::default_config_path(),
    };

    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            if shown.openai.api_key.is_some() {
                shown.openai.api_key = Some("********".to_string());
            }
            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Init => {
            if path.exists() {
                Output::warning(&format!("Config already exists at {}", path.display()));
            } else {
                Settings::default().save_to(&path)?;
                Output::success(&format!("Created default config at {}", path.display()));
            }
        }

        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}
