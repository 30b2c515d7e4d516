//! Bundler version pinned by a buildpack release

use super::Fetcher;
use crate::cache::{CacheLayer, BUNDLER_VERSION_HASH};
use crate::config::Settings;
use crate::error::AppResult;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

static BUNDLER_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bBUNDLER_VERSION\s*=\s*"([^"]+)""#).expect("static regex is valid")
});

/// Find the first `BUNDLER_VERSION = "..."` assignment in source text
pub fn extract_bundler_version(source: &str) -> Option<&str> {
    BUNDLER_VERSION_RE
        .captures(source)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|v| !v.is_empty())
}

/// Reads the Bundler version out of a release's `ruby.rb`
#[derive(Clone)]
pub struct VersionExtractor {
    fetcher: Arc<dyn Fetcher>,
    cache: CacheLayer,
    settings: Arc<Settings>,
}

impl VersionExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: CacheLayer, settings: Arc<Settings>) -> Self {
        Self {
            fetcher,
            cache,
            settings,
        }
    }

    /// Fetch the source file for `release` and extract its Bundler version
    ///
    /// `Ok(None)` means the file has no recognizable assignment.
    pub async fn bundler_version(&self, release: &str) -> AppResult<Option<String>> {
        let url = self.settings.source_url(release);
        let source = self.fetcher.fetch_text(&url).await?;

        let Some(version) = extract_bundler_version(&source) else {
            warn!("No BUNDLER_VERSION found in {}", url);
            return Ok(None);
        };

        // Tagged releases never change, the first recorded value stands
        if self
            .cache
            .set_if_absent(BUNDLER_VERSION_HASH, release, version)
            .await
        {
            debug!("Recorded Bundler {} for release {}", version, release);
        }

        Ok(Some(version.to_string()))
    }
}
