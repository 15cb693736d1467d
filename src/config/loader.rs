// src/config/loader.rs
//! Layered configuration loader
//!
//! Defaults, then each existing TOML file in precedence order, then
//! `GAIT_`-prefixed environment variables. Nested keys use a double
//! underscore: `GAIT_FORCE_PLATE__CONTACT_THRESHOLD_N=250`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{constants::paths, PipelineConfig};

/// Configuration loader over a list of candidate files
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    env_prefix: String,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
    #[error("Configuration parse error: {0}")]
    ParseError(String),
    #[error("Configuration validation errors: {}", .0.join("; "))]
    ValidationError(Vec<String>),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create loader over the standard system, user and local paths
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Create loader with custom paths (later paths take precedence)
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            env_prefix: paths::ENV_PREFIX.to_string(),
        }
    }

    /// Use a different environment variable prefix
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the pipeline configuration
    pub fn load(&self) -> Result<PipelineConfig, ConfigError> {
        let mut merged = toml::Value::try_from(PipelineConfig::default())
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        for path in &self.config_paths {
            if !path.exists() {
                continue;
            }
            let overlay = self.load_config_file(path)?;
            debug!(path = %path.display(), "merging configuration file");
            Self::merge_toml_values(&mut merged, overlay);
        }

        self.apply_environment_overrides(&mut merged);

        let config: PipelineConfig = merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)?;

        info!(summary = ?config.get_summary(), "pipeline configuration loaded");
        Ok(config)
    }

    /// Validate a single configuration file without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        config
            .validate_consistency()
            .map_err(ConfigError::ValidationError)
    }

    /// Write a configuration to a TOML file
    pub fn export_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> Result<(), ConfigError> {
        let toml_content =
            toml::to_string_pretty(config).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_config_file(&self, path: &Path) -> Result<toml::Value, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
                for (key, value) in overlay_table {
                    if let Some(base_value) = base_table.get_mut(&key) {
                        Self::merge_toml_values(base_value, value);
                    } else {
                        base_table.insert(key, value);
                    }
                }
            }
            (base_value, overlay_value) => {
                *base_value = overlay_value;
            }
        }
    }

    fn apply_environment_overrides(&self, config: &mut toml::Value) {
        for (key, value) in std::env::vars() {
            let Some(stripped) = key.strip_prefix(&self.env_prefix) else {
                continue;
            };
            let path: Vec<String> = stripped
                .to_lowercase()
                .split("__")
                .map(|s| s.to_string())
                .collect();
            debug!(key = %key, "applying environment override");
            Self::set_nested_value(config, &path, Self::parse_env_value(&value));
        }
    }

    fn parse_env_value(value: &str) -> toml::Value {
        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn set_nested_value(config: &mut toml::Value, path: &[String], value: toml::Value) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut current = config;
        for part in parents {
            let toml::Value::Table(table) = current else {
                return;
            };
            current = table
                .entry(part.clone())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        }
        if let toml::Value::Table(table) = current {
            // Integers written where a float is expected stay floats
            let value = match (table.get(last), value) {
                (Some(toml::Value::Float(_)), toml::Value::Integer(i)) => toml::Value::Float(i as f64),
                (_, v) => v,
            };
            table.insert(last.clone(), value);
        }
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            paths.push(PathBuf::from(home_dir).join(paths::USER_CONFIG_DIR).join("config.toml"));
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));
        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
