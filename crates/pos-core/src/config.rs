//! Configuration management for the POS client.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/pos-scan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Product/purchase API settings
    pub api: ApiConfig,
    /// Identity of this register, sent with every purchase
    pub terminal: TerminalConfig,
    /// Barcode scanning behaviour
    pub scanner: ScannerConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        let config: Self = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `POS_API_BASE_URL`: Override the product/purchase API base URL
    /// - `POS_SCAN_TIMEOUT_MS`: Override the scan timeout (all device profiles)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup function.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("POS_API_BASE_URL") {
            if !url.trim().is_empty() {
                tracing::debug!("Override api.base_url from env: {}", url);
                self.api.base_url = url;
            }
        }

        if let Some(val) = lookup("POS_SCAN_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                tracing::debug!("Override scanner timeouts from env: {}ms", ms);
                self.scanner.timeout_ms = ms;
                self.scanner.mobile_timeout_ms = ms;
            }
        }
    }

    /// Reject values that would make the client unusable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(invalid("api.base_url", "must not be empty"));
        }
        if self.api.timeout_ms == 0 {
            return Err(invalid("api.timeout_ms", "must be greater than zero"));
        }
        if self.scanner.timeout_ms == 0 {
            return Err(invalid("scanner.timeout_ms", "must be greater than zero"));
        }
        if self.scanner.mobile_timeout_ms == 0 {
            return Err(invalid(
                "scanner.mobile_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.scanner.max_attempts == Some(0) {
            return Err(invalid("scanner.max_attempts", "must be greater than zero"));
        }
        if self.scanner.hint_every_attempts == 0 {
            return Err(invalid(
                "scanner.hint_every_attempts",
                "must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/pos-scan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "pos-scan", "pos-scan").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Product/purchase API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL; `/api/products/{code}` and `/api/purchase` are appended
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl ApiConfig {
    /// Request timeout as a `Duration`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Register identity attached to purchase submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Staff code of the register operator
    pub register_staff_code: String,
    /// Store identifier
    pub store_code: String,
    /// Register identifier
    pub pos_id: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            register_staff_code: "9999999999".to_string(),
            store_code: "30".to_string(),
            pos_id: "90".to_string(),
        }
    }
}

/// Barcode scanning behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Time a desktop session may stream before failing with a timeout
    pub timeout_ms: u64,
    /// Same, for phones and tablets
    pub mobile_timeout_ms: u64,
    /// Optional cap on decode attempts; reaching it also times the session out
    pub max_attempts: Option<u32>,
    /// Decode failures are only reported to the user past this many attempts
    pub hint_after_attempts: u32,
    /// ...and then once every this many attempts
    pub hint_every_attempts: u32,
}

impl ScannerConfig {
    /// Scan timeout for the given device class.
    #[must_use]
    pub fn timeout(&self, mobile: bool) -> Duration {
        if mobile {
            Duration::from_millis(self.mobile_timeout_ms)
        } else {
            Duration::from_millis(self.timeout_ms)
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            mobile_timeout_ms: 10_000,
            max_attempts: None,
            hint_after_attempts: 50,
            hint_every_attempts: 25,
        }
    }
}
