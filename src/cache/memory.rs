//! In-process cache backend

use super::Cache;
use crate::error::AppResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Default)]
struct Store {
    /// Value and deadline; `None` never expires
    strings: HashMap<String, (String, Option<Instant>)>,
    hashes: HashMap<String, HashMap<String, String>>,
}

/// Cache kept in process memory, with the same semantics as the Redis backend
#[derive(Default)]
pub struct MemoryCache {
    store: Mutex<Store>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a hash field directly
    pub fn field(&self, grouping: &str, field: &str) -> Option<String> {
        self.lock()
            .hashes
            .get(grouping)
            .and_then(|h| h.get(field))
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        // The store holds plain maps, a poisoned guard is still consistent
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut store = self.lock();
        let expired = match store.strings.get(key) {
            Some((_, deadline)) => deadline.is_some_and(|d| Instant::now() >= d),
            None => return Ok(None),
        };
        if expired {
            store.strings.remove(key);
            return Ok(None);
        }
        Ok(store.strings.get(key).map(|(value, _)| value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        let deadline = Instant::now().checked_add(Duration::from_secs(ttl_secs));
        self.lock()
            .strings
            .insert(key.to_string(), (value.to_string(), deadline));
        Ok(())
    }

    async fn set_if_absent(&self, grouping: &str, field: &str, value: &str) -> AppResult<bool> {
        let mut store = self.lock();
        let hash = store.hashes.entry(grouping.to_string()).or_default();
        if hash.contains_key(field) {
            return Ok(false);
        }
        hash.insert(field.to_string(), value.to_string());
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
