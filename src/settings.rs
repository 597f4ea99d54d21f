use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;

pub const DEFAULT_SETTINGS_PATH: &str = "./data/settings.json";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3-haiku";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

// AI service configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AiSettings {
    pub openrouter_api_key: Option<String>, // Absent key disables every model call.
    pub default_model: String,
    pub base_url: String,
}

impl Default for AiSettings {
    fn default() -> Self {
        AiSettings {
            openrouter_api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: "./wpg_engine.db".to_string(),
        }
    }
}

// Application settings with serialization and deserialization capabilities.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub ai: AiSettings,
    pub database: DatabaseSettings,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ai: AiSettings::default(),
            database: DatabaseSettings::default(),
            log_level: "info".to_string(),
            log_dir: PathBuf::from("./data"),
            debug: false,
        }
    }
}

impl Settings {
    // Missing file means defaults; unreadable or invalid JSON is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_settings_from_file(path)
    }

    pub fn load_settings_from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let data = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&data)?;
        Ok(settings)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let data = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        let mut file = fs::File::create(path)?;
        file.write_all(data.as_bytes())?;
        Ok(())
    }

    /// Loads `.env` if present, then applies environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> Result<Self, SettingsError> {
        let _ = dotenvy::dotenv();
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup so the mapping can be exercised without
    /// touching the process environment.
    pub fn apply_overrides<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("AI_OPENROUTER_API_KEY") {
            self.ai.openrouter_api_key = Some(key);
        }
        if let Some(model) = lookup("AI_DEFAULT_MODEL").filter(|m| !m.trim().is_empty()) {
            self.ai.default_model = model;
        }
        if let Some(url) = lookup("AI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.ai.base_url = url;
        }
        if let Some(path) = lookup("DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.database.path = path;
        }
        if let Some(level) = lookup("LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(debug) = lookup("DEBUG") {
            self.debug = parse_bool("DEBUG", &debug)?;
        }
        Ok(self)
    }

    /// The configured key, or `None` when it is missing or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.ai
            .openrouter_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn log_level_filter(&self) -> Result<log::LevelFilter, SettingsError> {
        if self.debug {
            return Ok(log::LevelFilter::Debug);
        }
        self.log_level
            .parse()
            .map_err(|_| SettingsError::InvalidValue {
                key: "log_level".to_string(),
                value: self.log_level.clone(),
            })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
