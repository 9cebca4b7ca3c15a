use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::conversation::{ClientProfile, DEFAULT_STORAGE_KEY};

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "PRAI_API_URL";

pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to PRAI. Select a client on the left and ask anything\u{2014}I'll curate influencers, surface insights, and remember context for this client.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub chat: ChatSettings,
    #[serde(default = "default_clients")]
    pub clients: Vec<ClientProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Empty targets the relative `/chat` path.
    pub base_url: String,
    /// Request timeout; unset or 0 leaves the transport's default.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for the history file. Defaults to ~/.prai/
    pub dir: Option<PathBuf>,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Shown above the client list.
    pub agency: String,
    pub welcome_message: String,
    pub corrupt_state: CorruptStatePolicy,
}

/// What to do when the persisted history cannot be read.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CorruptStatePolicy {
    /// Drop the data and start with empty histories.
    #[default]
    StartEmpty,
    /// Drop the data and seed welcome messages as on a first run.
    Reseed,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_clients() -> Vec<ClientProfile> {
    vec![
        ClientProfile::new("c1", "Greyhouse \u{2014} Client A"),
        ClientProfile::new("c2", "Greyhouse \u{2014} Client B"),
        ClientProfile::new("c3", "Greyhouse \u{2014} Client C"),
    ]
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: Some(30),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dir: None,
            key: default_storage_key(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            agency: "Greyhouse".to_string(),
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            corrupt_state: CorruptStatePolicy::StartEmpty,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            storage: StorageSettings::default(),
            chat: ChatSettings::default(),
            clients: default_clients(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prai")
            .join("config.toml")
    }

    /// Load from the default config path, then apply environment overrides.
    pub fn load() -> Self {
        let mut settings = Self::load_from(&Self::config_path());
        settings.apply_env();
        settings
    }

    /// Load from `path`, falling back to defaults if it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Ignoring invalid config {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn save(&self) -> Result<(), crate::error::PraiError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), crate::error::PraiError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::PraiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// `PRAI_API_URL`, when set, wins over the config file. Set-but-empty
    /// is honored too and targets the relative path.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.api.base_url = url;
        }
    }

    pub fn client(&self, id: &str) -> Option<&ClientProfile> {
        self.clients.iter().find(|c| c.id == id)
    }
}
