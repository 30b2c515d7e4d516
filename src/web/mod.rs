//! Request routing for the single `GET /` endpoint
//!
//! Routing is independent of the HTTP server so it can be exercised
//! directly: method, then path, then content negotiation, and only then
//! the (possibly slow) upstream evaluation.

pub mod negotiate;
pub mod render;

pub use negotiate::{negotiate, MediaType};

use crate::evaluator::UpgradeEvaluator;
use tracing::error;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// Framework-independent response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
    /// Value for an `Allow` header, set on 405 responses
    pub allow: Option<&'static str>,
}

impl Reply {
    pub fn new(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
            allow: None,
        }
    }

    /// Plain-text response
    pub fn plain(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, PLAIN_TEXT, body)
    }
}

/// The web application
pub struct App {
    evaluator: UpgradeEvaluator,
}

impl App {
    pub fn new(evaluator: UpgradeEvaluator) -> Self {
        Self { evaluator }
    }

    /// Answer one request
    ///
    /// `target` is the request target as received, query string included.
    pub async fn handle(&self, method: &str, target: &str, accept: Option<&str>) -> Reply {
        if method != "GET" {
            let mut reply = Reply::plain(405, "GETs only");
            reply.allow = Some("GET");
            return reply;
        }

        let path = target.split(['?', '#']).next().unwrap_or(target);
        if path != "/" {
            return Reply::plain(404, "Root URL only");
        }

        let Some(media) = negotiate(accept) else {
            return Reply::plain(406, "JSON or HTML output only");
        };

        match self.evaluator.is_bundler_upgraded().await {
            Ok(result) => {
                let settings = self.evaluator.settings();
                render::render(
                    media,
                    result,
                    &settings.min_bundler_version_text,
                    &settings.template_path,
                )
                .await
            }
            Err(e) => {
                error!("Evaluation failed for {}: {}", media.essence(), e);
                Reply::plain(
                    e.status_code(),
                    format!("Could not determine the buildpack's Bundler version: {}", e),
                )
            }
        }
    }
}
