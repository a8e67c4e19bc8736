//! Work-item body resolution into prompt content.

use anyhow::{Context, Result};
use providers::Attachment;
use tracing::warn;

/// Resolved article content for one work item.
#[derive(Debug, Default)]
pub struct ArticleContent {
    /// Text substituted into the prompt template.
    pub text: String,
    /// Raw bytes for providers that accept inline data.
    pub attachment: Option<Attachment>,
}

/// Resolve a comment body into article content.
///
/// A body that is a single bare URL is downloaded; PDF payloads get their
/// text extracted and keep the raw bytes as an attachment. Any other body
/// is used verbatim.
///
/// # Errors
///
/// Returns an error when a referenced URL cannot be downloaded. The
/// caller treats this as a per-item failure: the item stays unmarked and
/// is retried next run.
pub async fn resolve(body: &str) -> Result<ArticleContent> {
    let trimmed = body.trim();
    if !is_bare_url(trimmed) {
        return Ok(ArticleContent {
            text: trimmed.to_string(),
            attachment: None,
        });
    }

    let (bytes, content_type) = github::download(trimmed)
        .await
        .with_context(|| format!("Failed to fetch article from {trimmed}"))?;

    Ok(from_download(trimmed, bytes, content_type.as_deref()))
}

fn from_download(url: &str, bytes: Vec<u8>, content_type: Option<&str>) -> ArticleContent {
    if is_pdf(&bytes, content_type, url) {
        let text = match pdf_extract::extract_text_from_mem(&bytes) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(url = %url, error = %e, "PDF text extraction failed, sending bytes only");
                String::new()
            }
        };
        return ArticleContent {
            text,
            attachment: Some(Attachment {
                bytes,
                mime_type: "application/pdf".to_string(),
            }),
        };
    }

    ArticleContent {
        text: String::from_utf8_lossy(&bytes).into_owned(),
        attachment: None,
    }
}

/// A body counts as a bare URL only when the whole trimmed text is one
/// http(s) link.
fn is_bare_url(text: &str) -> bool {
    (text.starts_with("http://") || text.starts_with("https://"))
        && !text.contains(char::is_whitespace)
}

fn is_pdf(bytes: &[u8], content_type: Option<&str>, url: &str) -> bool {
    bytes.starts_with(b"%PDF")
        || content_type.is_some_and(|t| t.contains("application/pdf"))
        || url.split('?').next().unwrap_or(url).ends_with(".pdf")
}
