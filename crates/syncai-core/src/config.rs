use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::SyncError;

pub const DEFAULT_MODEL: &str = "gpt-5.2";

/// Persisted application settings: backend credentials and the selected
/// generation model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub chat_api_key: String,
    #[serde(default)]
    pub research_api_key: String,
    #[serde(default = "default_model")]
    pub selected_model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chat_api_key: String::new(),
            research_api_key: String::new(),
            selected_model: default_model(),
        }
    }
}

/// Reported to the UI so it can prompt for missing keys without ever seeing
/// the key material itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyStatus {
    pub chat_configured: bool,
    pub research_configured: bool,
    pub selected_model: String,
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("syncai")
            .join("config.toml")
    }

    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &PathBuf) -> Self {
        if path.exists() {
            if let Ok(content) = std::fs::read_to_string(path) {
                if let Ok(settings) = toml::from_str(&content) {
                    return settings;
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), SyncError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), SyncError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SyncError::Storage(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn keys_configured(&self) -> bool {
        !self.chat_api_key.is_empty() && !self.research_api_key.is_empty()
    }

    pub fn status(&self) -> ApiKeyStatus {
        ApiKeyStatus {
            chat_configured: !self.chat_api_key.is_empty(),
            research_configured: !self.research_api_key.is_empty(),
            selected_model: self.selected_model.clone(),
        }
    }
}
