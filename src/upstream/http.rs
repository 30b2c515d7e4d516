//! HTTP fetcher backed by ureq
//!
//! ureq is blocking, so each request runs on tokio's blocking pool and
//! never stalls other in-flight requests.

use super::Fetcher;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use ureq::Agent;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Fetcher issuing real HTTP GET requests
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
}

impl HttpFetcher {
    /// Create a fetcher whose requests each complete within `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }

    fn get_blocking(agent: &Agent, url: &str) -> AppResult<String> {
        let mut response = agent
            .get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => AppError::UpstreamStatus {
                    url: url.to_string(),
                    status,
                },
                other => AppError::fetch(url, other),
            })?;

        response
            .body_mut()
            .read_to_string()
            .map_err(|e| AppError::fetch(url, e))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        debug!("GET {}", url);
        let agent = self.agent.clone();
        let owned_url = url.to_string();

        let body = tokio::task::spawn_blocking(move || Self::get_blocking(&agent, &owned_url))
            .await
            .map_err(|e| AppError::Internal(format!("fetch task failed: {}", e)))??;

        debug!("GET {} returned {} bytes", url, body.len());
        Ok(body)
    }
}
