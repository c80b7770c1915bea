use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::baseline::BaselineMatcher;
use crate::logging::LogConfig;
use crate::progress::CompletionRule;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Signed-in user; lifestyle entries are keyed by it
    pub user_id: Option<String>,

    /// Configuration metadata
    pub metadata: ConfigMetadata,

    /// Target race used for the countdown
    pub race: RaceSettings,

    /// Backend selection
    pub store: StoreSettings,

    /// Baseline test detection
    pub baseline: BaselineSettings,

    /// Week progress rules
    pub progress: ProgressSettings,

    /// Logging setup
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceSettings {
    pub name: String,
    pub date: NaiveDate,
}

/// Which adapter serves the training data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Relational store in a SQLite file
    Sqlite,
    /// Document collections in a JSON snapshot file
    Document,
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "document" | "json" => Ok(StoreBackend::Document),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    pub backend: StoreBackend,

    /// Database file (sqlite) or snapshot file (document)
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSettings {
    /// Case-insensitive keywords identifying baseline tests by activity name
    pub keywords: Vec<String>,
}

impl BaselineSettings {
    pub fn matcher(&self) -> BaselineMatcher {
        BaselineMatcher::new(&self.keywords)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressSettings {
    pub completion_rule: CompletionRule,
}

impl Default for AppConfig {
    fn default() -> Self {
        let now = Utc::now();

        AppConfig {
            user_id: None,
            metadata: ConfigMetadata {
                version: "1.0".to_string(),
                created_at: now,
                updated_at: now,
            },
            race: RaceSettings::default(),
            store: StoreSettings::default(),
            baseline: BaselineSettings::default(),
            progress: ProgressSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for RaceSettings {
    fn default() -> Self {
        RaceSettings {
            name: "Gotland".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 7, 4).unwrap_or_default(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            backend: StoreBackend::Sqlite,
            path: AppConfig::default_data_dir().join("racetracker.db"),
        }
    }
}

impl Default for BaselineSettings {
    fn default() -> Self {
        BaselineSettings {
            keywords: vec!["baseline".to_string()],
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Directory holding the config file and default stores
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".racetracker")
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Load configuration. An explicit path must exist and parse; the
    /// default location falls back to defaults only when no file is there.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_or_default(Self::default_config_path()),
        }
    }

    /// Load `path`, or defaults when the file does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Signed-in user id, empty when none is configured
    pub fn user_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.race.date, deserialized.race.date);
        assert_eq!(deserialized.store.backend, StoreBackend::Sqlite);
        assert_eq!(deserialized.progress.completion_rule, CompletionRule::MeetsTarget);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = AppConfig::default();
        original.user_id = Some("athlete-1".to_string());
        original.store.backend = StoreBackend::Document;
        original.baseline.keywords = vec!["Baseline".to_string(), "hr test".to_string()];

        original.save_to_file(&config_path).unwrap();
        let loaded = AppConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.user_id(), "athlete-1");
        assert_eq!(loaded.store.backend, StoreBackend::Document);
        assert_eq!(loaded.baseline.keywords.len(), 2);
    }

    #[test]
    fn test_missing_config_falls_back_to_defaults() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.race.name, "Gotland");
        assert_eq!(config.user_id(), "");
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "user_id = [unclosed").unwrap();

        assert!(AppConfig::load_or_default(&config_path).is_err());
        assert!(AppConfig::load(Some(config_path.as_path())).is_err());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let temp_dir = tempdir().unwrap();
        let err = AppConfig::load(Some(temp_dir.path().join("absent.toml").as_path())).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("json".parse::<StoreBackend>().unwrap(), StoreBackend::Document);
        assert!("postgres".parse::<StoreBackend>().is_err());
    }
}
