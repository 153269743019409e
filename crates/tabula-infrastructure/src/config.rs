//! Application configuration.
//!
//! Loaded from `config.toml` in the data directory; a missing file is
//! created with defaults on first load so a fresh installation works without
//! any manual setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tabula_core::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base data directory for all persisted state
    pub data_dir: PathBuf,
    /// Python interpreter used by the execution sandbox
    pub python_bin: String,
    /// Wall-clock budget for one sandbox run
    pub sandbox_timeout_secs: u64,
    /// Rows included in modification previews
    pub preview_rows: usize,
    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Gemini model identifier
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            python_bin: "python3".to_string(),
            sandbox_timeout_secs: 30,
            preview_rows: 5,
            oracle: OracleConfig::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`, writing defaults there first when the
    /// file does not exist.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = AppConfig::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let rendered = toml::to_string_pretty(&config)
                .map_err(|e| tabula_core::TabulaError::Serialization {
                    format: "TOML".to_string(),
                    message: e.to_string(),
                })?;
            std::fs::write(path, rendered)?;
            Ok(config)
        }
    }
}
