//! Error types for bundler-upgraded-yet
//!
//! All modules use `AppResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for service operations
pub type AppResult<T> = Result<T, AppError>;

/// All errors that can occur while answering the upgrade question
#[derive(Error, Debug)]
pub enum AppError {
    // Upstream errors
    #[error("Failed to fetch {url}: {reason}")]
    UpstreamFetch { url: String, reason: String },

    #[error("Upstream returned HTTP {status} for {url}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("Malformed release feed: {0}")]
    MalformedFeed(String),

    #[error("Invalid version {value:?}: {reason}")]
    InvalidVersion { value: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    // Cache errors (never surfaced to HTTP clients)
    #[error("Cache error: {0}")]
    Cache(String),

    // Server errors
    #[error("Failed to listen on {addr}: {reason}")]
    ServerBind { addr: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an upstream fetch error
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::UpstreamFetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidVersion {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if the error originates from the upstream repository
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamFetch { .. }
                | Self::UpstreamStatus { .. }
                | Self::MalformedFeed(_)
                | Self::InvalidVersion { .. }
        )
    }

    /// HTTP status used when this error ends a request
    pub fn status_code(&self) -> u16 {
        if self.is_upstream() {
            502
        } else {
            500
        }
    }
}
