//! Configuration schema for bundler-upgraded-yet
//!
//! Every field has a default, so an empty (or absent) TOML file is valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Atom feed listing upstream buildpack releases
pub const DEFAULT_RELEASES_FEED_URL: &str =
    "https://github.com/heroku/heroku-buildpack-ruby/releases.atom";

/// Raw `ruby.rb` for a given release; `{release}` is substituted per request
pub const DEFAULT_SOURCE_URL_TEMPLATE: &str =
    "https://raw.githubusercontent.com/heroku/heroku-buildpack-ruby/{release}/lib/language_pack/ruby.rb";

/// Placeholder replaced by the release identifier in `source_url_template`
pub const RELEASE_PLACEHOLDER: &str = "{release}";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP listener settings
    pub server: ServerConfig,

    /// Upgrade threshold
    pub upgrade: UpgradeConfig,

    /// Upstream repository locations
    pub upstream: UpstreamConfig,

    /// Cache backend settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: String,

    /// Port to listen on
    pub port: u16,

    /// HTML template with `{{ is_bundler_upgraded }}` and `{{ MIN_BUNDLER_VERSION }}`
    pub template_path: PathBuf,

    /// Maximum number of requests evaluated concurrently
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 9000,
            template_path: PathBuf::from("index.html"),
            workers: 8,
        }
    }
}

/// Upgrade threshold configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    /// Minimum Bundler version the buildpack must ship
    pub min_bundler_version: String,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            min_bundler_version: "1.16.0".to_string(),
        }
    }
}

/// Upstream repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Release feed URL
    pub releases_feed_url: String,

    /// Source file URL template, must contain `{release}`
    pub source_url_template: String,

    /// Timeout for each outbound request in seconds
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            releases_feed_url: DEFAULT_RELEASES_FEED_URL.to_string(),
            source_url_template: DEFAULT_SOURCE_URL_TEMPLATE.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis URL; caching is disabled when unset
    pub redis_url: Option<String>,

    /// Expiry of the cached latest release in seconds
    pub release_ttl_secs: u64,

    /// Upper bound for a single cache operation in milliseconds
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            release_ttl_secs: 3600,
            op_timeout_ms: 500,
        }
    }
}
