//! Configuration management for bundler-upgraded-yet
//!
//! Configuration is read once at startup: defaults, then an optional TOML
//! file, then environment/CLI overrides applied by the caller. The result is
//! validated into [`Settings`], which is shared read-only for the process
//! lifetime.

pub mod schema;

pub use schema::Config;

use crate::error::{AppError, AppResult};
use schema::RELEASE_PLACEHOLDER;
use semver::Version;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Configuration manager
pub struct ConfigManager {
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a config manager that only uses built-in defaults
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a config manager reading a TOML file
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: Some(path),
        }
    }

    /// Load configuration, falling back to defaults without a file
    pub async fn load(&self) -> AppResult<Config> {
        match self.config_path {
            Some(ref path) => self.load_from_file(path).await,
            None => Ok(Config::default()),
        }
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> AppResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| AppError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Get the config file path, if any
    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Validated, immutable process settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Parsed minimum Bundler version
    pub min_bundler_version: Version,

    /// Threshold exactly as configured, shown in the HTML page
    pub min_bundler_version_text: String,

    pub releases_feed_url: String,
    pub source_url_template: String,

    /// Timeout applied to each outbound HTTP request
    pub upstream_timeout: Duration,

    pub template_path: PathBuf,

    /// Expiry of the cached latest release in seconds
    pub release_ttl_secs: u64,

    /// Upper bound for a single cache operation
    pub cache_op_timeout: Duration,
}

impl Settings {
    /// Validate a configuration into settings
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let text = config.upgrade.min_bundler_version.trim().to_string();
        let min_bundler_version = Version::parse(&text).map_err(|e| {
            AppError::ConfigInvalid(format!("min_bundler_version {:?}: {}", text, e))
        })?;

        if !config
            .upstream
            .source_url_template
            .contains(RELEASE_PLACEHOLDER)
        {
            return Err(AppError::ConfigInvalid(format!(
                "source_url_template must contain {}",
                RELEASE_PLACEHOLDER
            )));
        }

        if config.upstream.timeout_secs == 0 {
            return Err(AppError::ConfigInvalid(
                "upstream timeout_secs must be greater than zero".to_string(),
            ));
        }

        if config.cache.release_ttl_secs == 0 {
            return Err(AppError::ConfigInvalid(
                "cache release_ttl_secs must be greater than zero".to_string(),
            ));
        }

        if config.cache.op_timeout_ms == 0 {
            return Err(AppError::ConfigInvalid(
                "cache op_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            min_bundler_version,
            min_bundler_version_text: text,
            releases_feed_url: config.upstream.releases_feed_url.clone(),
            source_url_template: config.upstream.source_url_template.clone(),
            upstream_timeout: Duration::from_secs(config.upstream.timeout_secs),
            template_path: config.server.template_path.clone(),
            release_ttl_secs: config.cache.release_ttl_secs,
            cache_op_timeout: Duration::from_millis(config.cache.op_timeout_ms),
        })
    }

    /// URL of the source file pinned to a release
    pub fn source_url(&self, release: &str) -> String {
        self.source_url_template
            .replace(RELEASE_PLACEHOLDER, release)
    }
}
