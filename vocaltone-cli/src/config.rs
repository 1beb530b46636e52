//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Uploads above this size never reach the decoder (10 MB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Most files accepted by one batch request
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Defaults for the `train` command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSection {
    /// Root of the SAVEE corpus
    pub data_dir: PathBuf,

    /// Where emotion_model.json, best_model.json, labels.json and
    /// training_history.json are written
    pub output_dir: PathBuf,

    pub epochs: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for TrainingSection {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/SAVEE"),
            output_dir: AppConfig::default_models_dir(),
            epochs: 100,
            batch_size: 32,
            seed: 42,
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Path to configuration file
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Trained classifier weights (emotion_model.json)
    pub model_path: PathBuf,

    /// Label space the weights were trained with (labels.json)
    pub labels_path: PathBuf,

    /// Larger files are rejected before decoding
    pub max_file_bytes: u64,

    /// Most files per `batch` invocation
    pub max_batch_size: usize,

    /// Attach acoustic descriptors to every report
    pub include_descriptors: bool,

    pub training: TrainingSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        let models = Self::default_models_dir();
        Self {
            config_path: Self::default_config_path(),
            model_path: models.join("emotion_model.json"),
            labels_path: models.join("labels.json"),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            include_descriptors: false,
            training: TrainingSection::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, or create it
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_config_path())
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_path = path.as_ref().to_path_buf();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

            let mut config: AppConfig = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?;

            config.config_path = config_path;
            Ok(config)
        } else {
            let config = Self {
                config_path,
                ..Self::default()
            };
            config.save().context("Failed to save default config")?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&self.config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocaltone")
            .join("config.toml")
    }

    pub fn default_models_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocaltone")
            .join("models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.max_file_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_batch_size, 10);
        assert_eq!(config.training.seed, 42);

        let reloaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "include_descriptors = true\nmax_batch_size = 4\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert!(config.include_descriptors);
        assert_eq!(config.max_batch_size, 4);
        assert_eq!(config.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.config_path, path);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "max_batch_size = \"many\"").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }
}
