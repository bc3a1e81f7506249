//! Bootstrap configuration loading
//!
//! Service URL resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`FCW_SERVICE_URL`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable overriding the service base URL
pub const SERVICE_URL_ENV: &str = "FCW_SERVICE_URL";

/// Default base URL of the clustering service
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000/api";

const APP_DIR: &str = "fcw";

/// Bootstrap configuration loaded from TOML file
///
/// Every field has a built-in default, so an absent file is equivalent to
/// an empty one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Base URL of the remote clustering service
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Per-request timeout. Clustering a large folder can take minutes.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Cadence of the staged progress indicator
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,

    /// Where clustering settings are remembered between sessions
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,

    /// Directory receiving exported result documents
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    300
}

fn default_progress_interval_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            request_timeout_secs: default_request_timeout_secs(),
            progress_interval_ms: default_progress_interval_ms(),
            preferences_path: None,
            export_dir: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Preference file location, falling back to the platform config dir
    pub fn preferences_path(&self) -> PathBuf {
        self.preferences_path
            .clone()
            .unwrap_or_else(default_preferences_path)
    }

    /// Export directory, falling back to the working directory
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Default location of the TOML bootstrap file
pub fn default_config_path() -> PathBuf {
    app_config_dir().join("config.toml")
}

/// Default location of the remembered clustering settings
pub fn default_preferences_path() -> PathBuf {
    app_config_dir().join("settings.json")
}

fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
}

/// Load TOML configuration
///
/// A missing file yields defaults; a file that exists but does not parse
/// is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Write TOML configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Serialization(format!("Encode TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Resolve the service base URL
///
/// Priority: CLI argument → `FCW_SERVICE_URL` → TOML → compiled default.
/// The TOML value already carries the compiled default when the file
/// omits it. Trailing slashes are stripped so endpoints can be appended.
pub fn resolve_service_url(cli_arg: Option<&str>, config: &TomlConfig) -> String {
    let url = if let Some(url) = cli_arg.filter(|u| !u.trim().is_empty()) {
        url.to_string()
    } else if let Some(url) = std::env::var(SERVICE_URL_ENV)
        .ok()
        .filter(|u| !u.trim().is_empty())
    {
        url
    } else {
        config.service_url.clone()
    };

    url.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = TomlConfig::default();
        assert_eq!(config.service_url, "http://localhost:5000/api");
        assert_eq!(config.progress_interval_ms, 2000);
        assert_eq!(config.logging.level, "info");
        assert!(config.export_dir.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str("progress_interval_ms = 50\n").unwrap();
        assert_eq!(config.progress_interval_ms, 50);
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.request_timeout_secs, 300);
    }

    #[test]
    fn test_export_dir_falls_back_to_cwd() {
        let config = TomlConfig::default();
        assert_eq!(config.export_dir(), PathBuf::from("."));
    }
}
