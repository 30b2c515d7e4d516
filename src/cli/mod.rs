//! Command line interface

pub mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, Overrides};

use crate::config::{Config, ConfigManager};
use crate::error::AppResult;

/// Load the config file (if any) and apply environment/CLI overrides
pub async fn load_config(cli: &Cli) -> AppResult<Config> {
    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = manager.load().await?;
    cli.overrides.apply(&mut config);
    Ok(config)
}

impl Overrides {
    /// Overlay every value that was given
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref min) = self.min_bundler_version {
            config.upgrade.min_bundler_version = min.clone();
        }
        if let Some(ref url) = self.redis_url {
            config.cache.redis_url = Some(url.clone());
        }
        if let Some(ref format) = self.log_format {
            config.general.log_format = format.clone();
        }
        if let Some(ref bind) = self.bind {
            config.server.bind = bind.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref template) = self.template {
            config.server.template_path = template.clone();
        }
    }
}
