//! CLI command implementations

pub mod check;
pub mod serve;

pub use check::execute as check;
pub use serve::execute as serve;

use crate::cache::CacheLayer;
use crate::config::{Config, Settings};
use crate::error::AppResult;
use crate::evaluator::UpgradeEvaluator;
use crate::upstream::HttpFetcher;
use std::sync::Arc;
use tracing::info;

/// Wire the evaluator from validated configuration
pub fn build_evaluator(config: &Config) -> AppResult<UpgradeEvaluator> {
    let settings = Arc::new(Settings::from_config(config)?);
    let fetcher = Arc::new(HttpFetcher::new(settings.upstream_timeout));
    let cache = CacheLayer::from_redis_url(
        config.cache.redis_url.as_deref(),
        settings.cache_op_timeout,
    );

    info!(
        "Minimum Bundler version {}, cache backend: {}",
        settings.min_bundler_version_text,
        cache.backend_name()
    );

    Ok(UpgradeEvaluator::new(settings, fetcher, cache))
}
