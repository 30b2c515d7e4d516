//! Redis cache backend
//!
//! Connects lazily on first use. Once established, the connection manager
//! reconnects by itself; a failed initial connect is retried on the next
//! operation.

use super::Cache;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Cache backed by a Redis server
pub struct RedisCache {
    client: redis::Client,
    connection: Mutex<Option<ConnectionManager>>,
}

impl RedisCache {
    /// Parse the URL without connecting
    pub fn open(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AppError::Cache(format!("invalid Redis URL: {}", e)))?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
        })
    }

    async fn connection(&self) -> AppResult<ConnectionManager> {
        let mut guard = self.connection.lock().await;
        if let Some(ref conn) = *guard {
            return Ok(conn.clone());
        }

        debug!("Connecting to Redis");
        let conn = ConnectionManager::new(self.client.clone())
            .await
            .map_err(redis_error)?;
        info!("Connected to Redis");
        *guard = Some(conn.clone());
        Ok(conn)
    }
}

fn redis_error(e: redis::RedisError) -> AppError {
    AppError::Cache(e.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection().await?;
        conn.get(key).await.map_err(redis_error)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(redis_error)
    }

    async fn set_if_absent(&self, grouping: &str, field: &str, value: &str) -> AppResult<bool> {
        let mut conn = self.connection().await?;
        conn.hset_nx(grouping, field, value)
            .await
            .map_err(redis_error)
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
