use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global picprune configuration
///
/// Option values that belong to closed sets (`strategy`, `hash_method`) are
/// kept as plain strings here and parsed at run time, so a hand-edited file
/// with an unknown value still loads and degrades with a warning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Maximum Hamming distance for two hashes to count as duplicates
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Retention strategy name (keep_first, keep_smallest)
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Perceptual hash method name (phash, ahash, dhash)
    #[serde(default = "default_hash_method")]
    pub hash_method: String,

    /// Hash grid side length; the hash is `hash_size * hash_size` bits
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,

    /// Filename marker identifying copies for keep_first
    #[serde(default = "default_copy_marker")]
    pub copy_marker: String,

    /// Write a debug log to the logs directory
    #[serde(default = "default_log_to_file")]
    pub log_to_file: bool,

    /// Output format preference
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Quiet,
}

fn default_threshold() -> u32 {
    10
}
fn default_strategy() -> String {
    "keep_first".to_string()
}
fn default_hash_method() -> String {
    "dhash".to_string()
}
fn default_hash_size() -> u32 {
    8
}
fn default_copy_marker() -> String {
    "copy".to_string()
}
fn default_log_to_file() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            strategy: default_strategy(),
            hash_method: default_hash_method(),
            hash_size: default_hash_size(),
            copy_marker: default_copy_marker(),
            log_to_file: default_log_to_file(),
            output_format: OutputFormat::Human,
        }
    }
}

impl Config {
    /// Get the picprune data directory (~/.picprune)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".picprune")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from file, or fall back to defaults if it does not exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Parse config from TOML text; missing keys take their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        let dir = Self::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Initialize all picprune directories
    pub fn init_dirs() -> Result<()> {
        for dir in [Self::data_dir(), Self::logs_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }

    /// Set a single key from its string form
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "threshold" => self.threshold = value.parse()?,
            "strategy" => self.strategy = value.to_string(),
            "hash_method" => self.hash_method = value.to_string(),
            "hash_size" => self.hash_size = value.parse()?,
            "copy_marker" => self.copy_marker = value.to_string(),
            "log_to_file" => self.log_to_file = value.parse()?,
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }
}
