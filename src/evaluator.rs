//! Upgrade evaluation
//!
//! Cached release first, live feed otherwise, then the pinned Bundler
//! version compared against the configured minimum. A missing version
//! answers `false`; any failed upstream call fails the evaluation.

use crate::cache::{CacheLayer, LATEST_RELEASE_KEY};
use crate::config::Settings;
use crate::error::AppResult;
use crate::upstream::{Fetcher, ReleaseResolver, VersionExtractor};
use crate::version;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of one evaluation
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Release the answer was derived from
    pub release: String,

    /// Whether the release came from the cache rather than the feed
    pub release_cached: bool,

    /// Bundler version pinned by the release, if one was found
    pub bundler_version: Option<String>,

    /// Configured minimum
    pub min_bundler_version: String,

    pub upgraded: bool,

    pub checked_at: DateTime<Utc>,
}

/// Answers "has the buildpack's Bundler reached the minimum yet?"
#[derive(Clone)]
pub struct UpgradeEvaluator {
    settings: Arc<Settings>,
    cache: CacheLayer,
    resolver: ReleaseResolver,
    extractor: VersionExtractor,
}

impl UpgradeEvaluator {
    pub fn new(settings: Arc<Settings>, fetcher: Arc<dyn Fetcher>, cache: CacheLayer) -> Self {
        Self {
            resolver: ReleaseResolver::new(fetcher.clone(), cache.clone(), settings.clone()),
            extractor: VersionExtractor::new(fetcher, cache.clone(), settings.clone()),
            settings,
            cache,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Whether the latest release ships at least the minimum Bundler
    pub async fn is_bundler_upgraded(&self) -> AppResult<bool> {
        Ok(self.evaluate().await?.upgraded)
    }

    /// Run the full lookup and report how the answer was reached
    pub async fn evaluate(&self) -> AppResult<Evaluation> {
        let (release, release_cached) = match self.cache.get(LATEST_RELEASE_KEY).await {
            Some(release) if !release.is_empty() => {
                debug!("Using cached release {}", release);
                (release, true)
            }
            _ => (self.resolver.latest_release().await?, false),
        };

        let bundler_version = self.extractor.bundler_version(&release).await?;

        let upgraded = match bundler_version {
            Some(ref found) => version::is_at_least(found, &self.settings.min_bundler_version)?,
            None => false,
        };

        info!(
            release = %release,
            bundler = bundler_version.as_deref().unwrap_or("unknown"),
            minimum = %self.settings.min_bundler_version_text,
            upgraded,
            "Evaluated buildpack Bundler version"
        );

        Ok(Evaluation {
            release,
            release_cached,
            bundler_version,
            min_bundler_version: self.settings.min_bundler_version_text.clone(),
            upgraded,
            checked_at: Utc::now(),
        })
    }
}
