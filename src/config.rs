//! Configuration for the rainfall prediction library.
//!
//! Everything has a default, so a config file is optional. When one is
//! used it is TOML:
//!
//! ```toml
//! [model]
//! path = "models/rainfall.json"
//!
//! [features]
//! rainfall_column = "rainfall_mm"
//! date_column = "date"
//! max_lag = 7
//! missing_policy = "any_column"
//!
//! [logging]
//! level = "info"
//! file = "rainfall.log"
//! console_timestamps = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::logging::{self, Component, LogLevel};
use crate::model::{DEFAULT_DATE_COLUMN, DEFAULT_MAX_LAG, DEFAULT_RAINFALL_COLUMN, ForecastError};

/// Bundled model, relative to the package root.
pub const DEFAULT_MODEL_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/models/rainfall.json");

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    pub model: ModelConfig,
    pub features: FeatureConfig,
    pub logging: LoggingConfig,
}

/// Where the trained model lives.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// A relative path read by `ForecastConfig::load` is taken relative to
    /// the config file's directory; anywhere else it is relative to the
    /// working directory.
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Which rows `prepare_features` removes as incomplete.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Drop a row with a missing value in any column.
    #[default]
    AnyColumn,
    /// Drop a row only when one of its lag features is missing.
    LagColumnsOnly,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    pub rainfall_column: String,
    pub date_column: String,
    pub max_lag: usize,
    pub missing_policy: MissingPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            rainfall_column: DEFAULT_RAINFALL_COLUMN.to_string(),
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            max_lag: DEFAULT_MAX_LAG,
            missing_policy: MissingPolicy::AnyColumn,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            console_timestamps: false,
        }
    }
}

impl ForecastConfig {
    /// Reads and parses a TOML config file. A relative `[model] path` is
    /// rebased onto the directory holding the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ForecastError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ForecastError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if config.model.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.model.path = dir.join(&config.model.path);
            }
        }
        logging::debug(Component::Config, &format!("Loaded config from {}", path.display()));
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ForecastError> {
        toml::from_str(content).map_err(|e| ForecastError::Config(e.to_string()))
    }

    /// Initialises the global logger from the `[logging]` section.
    pub fn init_logging(&self) {
        logging::init_logger(
            self.logging.level,
            self.logging.file.as_deref(),
            self.logging.console_timestamps,
        );
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ForecastConfig::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.features.max_lag, 7);
        assert_eq!(config.features.rainfall_column, "rainfall_mm");
        assert_eq!(config.model.path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = ForecastConfig::from_toml_str(
            r#"
            [features]
            max_lag = 3
            missing_policy = "lag_columns_only"

            [logging]
            level = "debug"
            "#,
        )
        .expect("partial config should parse");

        assert_eq!(config.features.max_lag, 3);
        assert_eq!(config.features.missing_policy, MissingPolicy::LagColumnsOnly);
        assert_eq!(config.features.date_column, "date");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_parsed_relative_model_path_is_left_as_written() {
        let config = ForecastConfig::from_toml_str("[model]\npath = \"models/other.json\"\n").unwrap();
        assert_eq!(config.model.path, PathBuf::from("models/other.json"));
    }

    #[test]
    fn test_loaded_relative_model_path_follows_config_file() {
        let dir = std::env::temp_dir().join(format!("rainfall_config_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("forecast.toml");
        fs::write(&file, "[model]\npath = \"my_model.json\"\n").unwrap();

        let config = ForecastConfig::load(&file).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.model.path, dir.join("my_model.json"));
    }

    #[test]
    fn test_absolute_model_path_is_kept() {
        let dir = std::env::temp_dir().join(format!("rainfall_config_abs_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let file = dir.join("forecast.toml");
        fs::write(&file, format!("[model]\npath = \"{}\"\n", DEFAULT_MODEL_PATH)).unwrap();

        let config = ForecastConfig::load(&file).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_eq!(config.model.path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_default_model_path_points_into_models_dir() {
        assert!(DEFAULT_MODEL_PATH.ends_with("/models/rainfall.json"));
        assert!(Path::new(DEFAULT_MODEL_PATH).is_absolute());
        assert_eq!(ModelConfig::default().path, PathBuf::from(DEFAULT_MODEL_PATH));
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = ForecastConfig::from_toml_str("[features]\nmax_lag = \"seven\"").unwrap_err();
        assert!(matches!(err, ForecastError::Config(_)), "got {:?}", err);
    }

    #[test]
    fn test_negative_max_lag_is_rejected() {
        assert!(ForecastConfig::from_toml_str("[features]\nmax_lag = -1").is_err());
    }

    #[test]
    fn test_missing_config_file_is_io_error() {
        let err = ForecastConfig::load("/nonexistent/rainfall.toml").unwrap_err();
        assert!(matches!(err, ForecastError::Io { .. }), "got {:?}", err);
    }
}
