//! Advisory cache for release lookups
//!
//! The cache only saves upstream round trips; it is never a correctness
//! input. Backends implement [`Cache`] and may fail freely: [`CacheLayer`]
//! bounds every operation with a timeout and turns failures into "absent".
//!
//! # Keys
//!
//! | Key | Kind | Value | Expiry |
//! |-----|------|-------|--------|
//! | `latest_buildpack_release` | string | release identifier | 1 hour |
//! | `bundler_version` | hash, field = release | Bundler version | none, write-once |

pub mod memory;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;

use crate::error::AppResult;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// String key holding the most recently resolved release
pub const LATEST_RELEASE_KEY: &str = "latest_buildpack_release";

/// Hash mapping release identifiers to the Bundler version they pin
pub const BUNDLER_VERSION_HASH: &str = "bundler_version";

/// Key-value backend with per-key expiry and a write-once hash field
#[async_trait]
pub trait Cache: Send + Sync {
    /// Read a string key
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// Write a string key that expires after `ttl_secs`
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()>;

    /// Write `grouping[field]` only if it is unset; returns whether it was written
    async fn set_if_absent(&self, grouping: &str, field: &str, value: &str) -> AppResult<bool>;

    /// Backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Cache that stores nothing
pub struct NoCache;

#[async_trait]
impl Cache for NoCache {
    async fn get(&self, _key: &str) -> AppResult<Option<String>> {
        Ok(None)
    }

    async fn set_with_ttl(&self, _key: &str, _value: &str, _ttl_secs: u64) -> AppResult<()> {
        Ok(())
    }

    async fn set_if_absent(&self, _grouping: &str, _field: &str, _value: &str) -> AppResult<bool> {
        Ok(false)
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

/// Infallible front for a cache backend
///
/// Errors and timeouts are logged and reported as a miss (reads) or a
/// skipped write, so callers behave exactly as if no cache were configured.
#[derive(Clone)]
pub struct CacheLayer {
    inner: Arc<dyn Cache>,
    op_timeout: Duration,
}

impl CacheLayer {
    /// Wrap a backend
    pub fn new(inner: Arc<dyn Cache>, op_timeout: Duration) -> Self {
        Self { inner, op_timeout }
    }

    /// A layer with caching disabled
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoCache), Duration::from_millis(1))
    }

    /// Build the layer from an optional Redis URL
    ///
    /// An unusable URL disables caching instead of failing startup.
    pub fn from_redis_url(url: Option<&str>, op_timeout: Duration) -> Self {
        match url.map(str::trim).filter(|u| !u.is_empty()) {
            None => {
                debug!("No Redis URL configured, caching disabled");
                Self::disabled()
            }
            Some(url) => match RedisCache::open(url) {
                Ok(cache) => Self::new(Arc::new(cache), op_timeout),
                Err(e) => {
                    warn!("{}, caching disabled", e);
                    Self::disabled()
                }
            },
        }
    }

    /// Backend name for logs
    pub fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }

    /// Read a string key; `None` on miss, error or timeout
    pub async fn get(&self, key: &str) -> Option<String> {
        self.bounded("get", key, self.inner.get(key)).await.flatten()
    }

    /// Write a string key with expiry; failures are logged and skipped
    pub async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) {
        self.bounded("set", key, self.inner.set_with_ttl(key, value, ttl_secs))
            .await;
    }

    /// Write-once hash field; `false` when not written for any reason
    pub async fn set_if_absent(&self, grouping: &str, field: &str, value: &str) -> bool {
        self.bounded(
            "hsetnx",
            grouping,
            self.inner.set_if_absent(grouping, field, value),
        )
        .await
        .unwrap_or(false)
    }

    async fn bounded<T>(
        &self,
        op: &str,
        key: &str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> Option<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!("Cache {} {} failed, ignoring: {}", op, key, e);
                None
            }
            Err(_) => {
                warn!(
                    "Cache {} {} timed out after {:?}, ignoring",
                    op, key, self.op_timeout
                );
                None
            }
        }
    }
}

impl Default for CacheLayer {
    fn default() -> Self {
        Self::disabled()
    }
}
