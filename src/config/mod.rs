//! Configuration module for Curio.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AgentSettings, GeneralSettings, OpenAISettings, PacingSettings, SearchSettings,
    ServerSettings, Settings, API_KEY_ENV, MISSING_API_KEY,
};
