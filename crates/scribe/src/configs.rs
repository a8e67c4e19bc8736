//! Provider config collection from a config issue's comments.

use anyhow::Result;
use github::{IssueComment, RestClient};
use providers::{ConfigParser, ProviderConfig};
use tracing::debug;

use crate::tracker::ProcessingTracker;

/// Parse provider configs out of config-issue comments.
///
/// Comments carrying a thumbs-down are treated as disabled and skipped.
/// The rest are sorted by creation time ascending (oldest comment =
/// highest priority) before parsing, and incomplete configs are dropped.
pub fn configs_from_comments(comments: &[IssueComment]) -> Vec<ProviderConfig> {
    let mut eligible: Vec<&IssueComment> = comments
        .iter()
        .filter(|c| !ProcessingTracker::issue_comment_processed(c))
        .collect();
    eligible.sort_by_key(|c| c.created_at);

    eligible
        .into_iter()
        .filter_map(|comment| {
            let body = comment.body.as_deref()?;
            let config = ConfigParser::parse(body);
            if config.is_complete() {
                Some(config)
            } else {
                debug!(comment_id = comment.id, "Dropping incomplete provider config");
                None
            }
        })
        .collect()
}

/// Fetch the config issue's comments and extract provider configs.
///
/// # Errors
///
/// Returns an error when the comments cannot be fetched.
pub async fn collect_provider_configs(
    rest: &RestClient,
    owner: &str,
    repo: &str,
    issue_number: u64,
) -> Result<Vec<ProviderConfig>> {
    let comments = rest.list_issue_comments(owner, repo, issue_number).await?;
    Ok(configs_from_comments(&comments))
}
