use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::client::ApiClient;
use crate::chat::ChatViewModel;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const ENV_BASE_URL: &str = "STORYMATE_BASE_URL";
pub const ENV_USER_ID: &str = "STORYMATE_USER_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("no config directory on this platform")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub user_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: String::new(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "StoryMate")?;
        Some(proj.config_dir().join("storymate.toml"))
    }

    /// Reads the platform config file. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = toml::to_string_pretty(self)?;
        fs::write(path, text).map_err(io_err)
    }

    /// Applies `STORYMATE_*` overrides; `lookup` is usually `std::env::var`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(uid) = lookup(ENV_USER_ID).filter(|v| !v.trim().is_empty()) {
            self.user_id = uid;
        }
        self
    }
}

/// Wires the single shared client into a fresh view-model and hands it to the console.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.user_id.is_empty() {
        log::warn!("no user id configured, the server may return nothing");
    }
    let client = ApiClient::new(&config.base_url)?;
    log::info!("using {}", client.base_url());
    let vm = ChatViewModel::initialize(Arc::new(client), config.user_id);
    crate::ui::console::run(vm).await?;
    Ok(())
}
