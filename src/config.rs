//! Service configuration.
//!
//! Loaded from a single TOML file (default `imgpress.toml` in the working
//! directory). Stock defaults are the base layer; the file only needs the
//! keys it wants to change. A missing file means "all defaults".
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! host = "0.0.0.0"
//! port = 5000
//! max_upload_bytes = 20971520   # 20 MiB
//! max_output_pixels = 50000000  # resize output cap
//!
//! [storage]
//! upload_dir = "uploads"
//!
//! [compression]
//! start_quality = 90
//! quality_floor = 5
//! quality_step = 5
//! scale_factor = 0.9
//! min_dimension = 1
//! ```
//!
//! Unknown keys are rejected to catch typos early. Command-line flags on
//! `imgpress serve` override values from the file.

use crate::compress::CompressionSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Where uploads and transform outputs live.
    pub storage: StorageConfig,
    /// Target-size compression loop tuning.
    pub compression: CompressionSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Largest resize output, in pixels (width × height).
    pub max_output_pixels: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_upload_bytes: 20 * 1024 * 1024,
            max_output_pixels: 50_000_000,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory for uploads and transform outputs. Created on startup.
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
        }
    }
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Validation(
                "server.max_upload_bytes must be positive".into(),
            ));
        }
        if self.server.max_output_pixels == 0 {
            return Err(ConfigError::Validation(
                "server.max_output_pixels must be positive".into(),
            ));
        }
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "storage.upload_dir must not be empty".into(),
            ));
        }
        validate_compression(&self.compression)
    }
}

fn validate_compression(c: &CompressionSettings) -> Result<(), ConfigError> {
    if !(1..=100).contains(&c.start_quality) {
        return Err(ConfigError::Validation(
            "compression.start_quality must be 1-100".into(),
        ));
    }
    if c.quality_floor == 0 || c.quality_floor > c.start_quality {
        return Err(ConfigError::Validation(
            "compression.quality_floor must be between 1 and start_quality".into(),
        ));
    }
    if c.quality_step == 0 {
        return Err(ConfigError::Validation(
            "compression.quality_step must be non-zero".into(),
        ));
    }
    if !(c.scale_factor > 0.0 && c.scale_factor <= 1.0) {
        return Err(ConfigError::Validation(
            "compression.scale_factor must be in (0, 1]".into(),
        ));
    }
    if c.min_dimension == 0 {
        return Err(ConfigError::Validation(
            "compression.min_dimension must be at least 1".into(),
        ));
    }
    Ok(())
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServiceConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load the config file at `path` on top of stock defaults.
///
/// A missing file yields the defaults. A present but malformed or invalid
/// file is an error.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = if path.exists() {
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# imgpress configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
host = "0.0.0.0"
port = 5000

# Largest accepted request body (uploads included), in bytes.
max_upload_bytes = 20971520

# Largest image a resize may produce, in pixels (width x height).
# Requests above this are rejected before any decoding.
max_output_pixels = 50000000

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Uploads and transform outputs (resized-*, compressed-*, ...) live here.
# Created on startup if missing.
upload_dir = "uploads"

# ---------------------------------------------------------------------------
# Target-size compression
# ---------------------------------------------------------------------------
[compression]
# Quality of the first encoding pass (1-100).
start_quality = 90

# Lowest quality tried; the loop stops after a pass at this quality.
quality_floor = 5

# Quality decrease per pass.
quality_step = 5

# Width and height multiplier per pass, in (0, 1].
scale_factor = 0.9

# Passes stop before either dimension would drop below this many pixels.
min_dimension = 1
"##
}
