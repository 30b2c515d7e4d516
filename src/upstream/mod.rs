//! Upstream buildpack repository access
//!
//! Two fetches per evaluation, strictly ordered: the release feed (skipped
//! on a cache hit), then the source file pinned to that release.

pub mod bundler;
pub mod http;
pub mod release;

pub use bundler::{extract_bundler_version, VersionExtractor};
pub use http::HttpFetcher;
pub use release::{parse_latest_release, ReleaseResolver};

use crate::error::AppResult;
use async_trait::async_trait;

/// Retrieves the body of a URL as text
///
/// Implementations report non-2xx responses, timeouts and transport
/// failures as errors.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> AppResult<String>;
}
