//! Configuration module for CyberVision.
//!
//! One YAML file drives the backend connection, the cache location, the log
//! level and the country delete preset. Every field has a default, so a
//! partial (or missing) file still yields a usable [`Config`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for CyberVision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub integrity: IntegrityConfig,
}

/// Backend (REST) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// When `false` every write goes straight to the local cache.
    pub enabled: bool,
    /// Base URL of the admin API, e.g. `http://localhost:8080/api/admin`.
    pub base_url: String,
    /// Seconds before a request is abandoned and the local fallback is used.
    pub timeout_secs: u64,
}

/// Local cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Path to the SQLite cache file.
    pub path: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Referential-integrity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrityConfig {
    /// Policy applied when a country with companies is deleted without an
    /// explicit choice: `ask` (refuse) or `cascade` (retire the companies).
    pub default_country_policy: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Reads and parses the YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`Config::load`], but any read or parse failure yields the defaults.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Where the CLI looks when `--config` is not given.
    ///
    /// Typically `$XDG_CONFIG_HOME/cybervision/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cybervision")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://localhost:8080/api/admin".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("cybervision")
                .join("cache.db"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            default_country_policy: "ask".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// One rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"remote.timeout_secs"`.
    pub field: String,
    /// What is wrong with the value.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accepted `logging.level` values.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `integrity.default_country_policy`.
pub const VALID_COUNTRY_POLICIES: &[&str] = &["ask", "cascade"];

impl Config {
    /// Checks every section and collects all problems; empty when usable.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        let base_url = self.remote.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            errors.push(ValidationError {
                field: "remote.base_url".into(),
                message: format!("must be an http(s) URL, got '{}'", self.remote.base_url),
            });
        }
        if self.remote.timeout_secs == 0 {
            errors.push(ValidationError {
                field: "remote.timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- cache ---
        if self.cache.path.as_os_str().is_empty() {
            errors.push(ValidationError {
                field: "cache.path".into(),
                message: "must not be empty".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        // --- integrity ---
        if !VALID_COUNTRY_POLICIES.contains(&self.integrity.default_country_policy.as_str()) {
            errors.push(ValidationError {
                field: "integrity.default_country_policy".into(),
                message: format!(
                    "invalid policy '{}'; valid options: {}",
                    self.integrity.default_country_policy,
                    VALID_COUNTRY_POLICIES.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Programmatic construction of a [`Config`], mostly for tests and embedding.
///
/// Unset fields keep their defaults.
///
/// # Example
///
/// ```rust,no_run
/// use cybervision_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .remote_base_url("https://erp.example.com/api/admin")
///     .remote_timeout_secs(5)
///     .logging_level("debug")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Starts from [`Config::default`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_enabled(mut self, enabled: bool) -> Self {
        self.config.remote.enabled = enabled;
        self
    }

    pub fn remote_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.remote.base_url = url.into();
        self
    }

    pub fn remote_timeout_secs(mut self, seconds: u64) -> Self {
        self.config.remote.timeout_secs = seconds;
        self
    }

    // --- cache ---

    pub fn cache_path(mut self, path: PathBuf) -> Self {
        self.config.cache.path = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- integrity ---

    pub fn integrity_default_country_policy(mut self, policy: impl Into<String>) -> Self {
        self.config.integrity.default_country_policy = policy.into();
        self
    }

    // --- build ---

    pub fn build(self) -> Config {
        self.config
    }

    /// Like [`ConfigBuilder::build`], but rejects a configuration with problems.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
