//! JSON and HTML representations of the answer

use super::negotiate::MediaType;
use super::Reply;
use std::path::Path;
use tracing::warn;

/// Replaced by the Yes/No fragment
pub const RESULT_PLACEHOLDER: &str = "{{ is_bundler_upgraded }}";

/// Replaced by the configured minimum version
pub const MIN_VERSION_PLACEHOLDER: &str = "{{ MIN_BUNDLER_VERSION }}";

/// `{"result": <bool>}`
pub fn render_json(result: bool) -> String {
    serde_json::json!({ "result": result }).to_string()
}

/// Yes/No paragraph, classed so the page can style each answer
pub fn result_fragment(result: bool) -> &'static str {
    if result {
        r#"<p class="yes"><i class="emoji"></i>Yes</p>"#
    } else {
        r#"<p class="no"><i class="emoji"></i>No</p>"#
    }
}

/// Substitute both placeholders into the page template
pub fn fill_template(template: &str, result: bool, min_version: &str) -> String {
    template
        .replace(RESULT_PLACEHOLDER, result_fragment(result))
        .replace(MIN_VERSION_PLACEHOLDER, min_version)
}

/// Render the answer for the negotiated media type
///
/// An unreadable template yields a plain-text body describing the failure
/// rather than an HTTP error.
pub async fn render(media: MediaType, result: bool, min_version: &str, template: &Path) -> Reply {
    match media {
        MediaType::Json => Reply::new(200, media.content_type(), render_json(result)),
        MediaType::Html => match tokio::fs::read_to_string(template).await {
            Ok(page) => Reply::new(
                200,
                media.content_type(),
                fill_template(&page, result, min_version),
            ),
            Err(e) => {
                warn!("Cannot read template {}: {}", template.display(), e);
                Reply::plain(200, format!("HTML NOT FOUND: {}", e))
            }
        },
    }
}
