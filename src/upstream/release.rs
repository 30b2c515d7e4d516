//! Latest buildpack release from the Atom feed

use super::Fetcher;
use crate::cache::{CacheLayer, LATEST_RELEASE_KEY};
use crate::config::Settings;
use crate::error::{AppError, AppResult};
use std::sync::Arc;
use tracing::debug;

/// Resolves the most recent upstream release identifier
#[derive(Clone)]
pub struct ReleaseResolver {
    fetcher: Arc<dyn Fetcher>,
    cache: CacheLayer,
    settings: Arc<Settings>,
}

impl ReleaseResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>, cache: CacheLayer, settings: Arc<Settings>) -> Self {
        Self {
            fetcher,
            cache,
            settings,
        }
    }

    /// Fetch the feed and return the newest release, refreshing the cache
    pub async fn latest_release(&self) -> AppResult<String> {
        let feed = self
            .fetcher
            .fetch_text(&self.settings.releases_feed_url)
            .await?;
        let release = parse_latest_release(&feed)?;
        debug!("Latest buildpack release: {}", release);

        self.cache
            .set_with_ttl(LATEST_RELEASE_KEY, &release, self.settings.release_ttl_secs)
            .await;

        Ok(release)
    }
}

/// Extract the release identifier from the first entry of an Atom feed
///
/// The identifier is the part of `entry/id` after its last `/`, e.g.
/// `tag:github.com,2008:Repository/1831582/v250` yields `v250`.
pub fn parse_latest_release(feed: &str) -> AppResult<String> {
    let doc = roxmltree::Document::parse(feed)
        .map_err(|e| AppError::MalformedFeed(format!("invalid XML: {}", e)))?;

    let root = doc.root_element();
    let ns = root
        .tag_name()
        .namespace()
        .ok_or_else(|| AppError::MalformedFeed("feed has no XML namespace".to_string()))?;
    if root.tag_name().name() != "feed" {
        return Err(AppError::MalformedFeed(format!(
            "expected <feed> root, found <{}>",
            root.tag_name().name()
        )));
    }

    let entry = root
        .children()
        .find(|n| n.has_tag_name((ns, "entry")))
        .ok_or_else(|| AppError::MalformedFeed("feed has no entries".to_string()))?;

    let id = entry
        .children()
        .find(|n| n.has_tag_name((ns, "id")))
        .and_then(|n| n.text())
        .map(str::trim)
        .ok_or_else(|| AppError::MalformedFeed("first entry has no id".to_string()))?;

    match id.rsplit('/').next() {
        Some(release) if !release.is_empty() => Ok(release.to_string()),
        _ => Err(AppError::MalformedFeed(format!(
            "entry id {:?} has no release segment",
            id
        ))),
    }
}
