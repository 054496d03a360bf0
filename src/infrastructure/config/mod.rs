//! Configuration management
//!
//! `Config` is the YAML file the process starts from. `Settings` is the
//! namespaced key/value view components read at run time; it is assembled once
//! through a `SettingsBuilder` and immutable afterwards.

pub mod settings;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use crate::application::errors::ConfigError;

pub use settings::{ConfigEntry, Settings, SettingsBuilder, ValueKind};

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub log: LogConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    /// Extra namespaced settings, e.g. `skills.fun.greeting: Howdy`
    #[serde(default)]
    pub settings: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SecurityConfig {
    pub encryption_key: Option<String>,
    /// Global admin emails; these pass every permission check
    #[serde(default)]
    pub admins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LogConfig {
    pub level: String,
}

/// Identity used for lines typed into the console sense
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub user_email: String,
    pub user_handle: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            user_email: "console@localhost".to_string(),
            user_handle: "console".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "skillgate".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                path: None,
            },
            security: SecurityConfig {
                encryption_key: None,
                admins: Vec::new(),
            },
            log: LogConfig {
                level: "info".to_string(),
            },
            console: ConsoleConfig::default(),
            settings: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables override file values
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("ENCRYPTION_KEY") {
            self.security.encryption_key = Some(key);
        }

        if let Ok(admins) = std::env::var("GLOBAL_ADMINS") {
            self.security.admins.extend(split_list(&admins));
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log.level = level;
        }

        if let Ok(path) = std::env::var("STORAGE_PATH") {
            self.storage.backend = StorageBackend::Sqlite;
            self.storage.path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.name.trim().is_empty() {
            return Err(ConfigError::MissingField("bot.name".to_string()));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.is_none() {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }
        Ok(())
    }

    /// Seed a settings builder with the `global.*` keys and the file's
    /// `settings` map. Component schemas are declared on top of this.
    pub fn settings_builder(&self) -> SettingsBuilder {
        let mut builder = SettingsBuilder::new();
        builder.set("global.bot.name", serde_json::json!(self.bot.name));
        builder.set("global.log.level", serde_json::json!(self.log.level));
        if !self.security.admins.is_empty() {
            builder.set("global.admins", serde_json::json!(self.security.admins.join(",")));
        }
        builder.defer_yaml(&self.settings);
        builder
    }
}

pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
