//! Reaction-marker based processing state.
//!
//! A thumbs-down reaction on the source object is the only durable state
//! this system keeps: absence means eligible, presence means skip. Markers
//! are written after the reply is posted and the write is not atomic with
//! it, so a crash between the two produces one duplicate reply on the next
//! run. Accepted at-least-once trade-off.

use github::{
    DiscussionComment, DiscussionsClient, Issue, IssueComment, RestClient, THUMBS_DOWN_GRAPHQL,
    THUMBS_DOWN_REST,
};
use tracing::warn;

/// Processed predicates and best-effort markers over GitHub reactions.
pub struct ProcessingTracker {
    rest: RestClient,
    discussions: DiscussionsClient,
    owner: String,
    repo: String,
}

impl ProcessingTracker {
    /// Create a tracker for one repository.
    #[must_use]
    pub fn new(
        rest: RestClient,
        discussions: DiscussionsClient,
        owner: &str,
        repo: &str,
    ) -> Self {
        Self {
            rest,
            discussions,
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    /// Whether an issue comment was already handled.
    #[must_use]
    pub fn issue_comment_processed(comment: &IssueComment) -> bool {
        comment.reactions.minus_one > 0
    }

    /// Whether an issue body was already handled.
    #[must_use]
    pub fn issue_processed(issue: &Issue) -> bool {
        issue.reactions.minus_one > 0
    }

    /// Whether a discussion comment was already handled.
    #[must_use]
    pub fn discussion_comment_processed(comment: &DiscussionComment) -> bool {
        comment
            .reactions
            .nodes
            .iter()
            .any(|r| r.content == THUMBS_DOWN_GRAPHQL)
    }

    /// Mark an issue comment as processed.
    ///
    /// Best-effort: a failed write is logged and swallowed so one item
    /// never aborts the batch. The unmarked item is retried next run.
    pub async fn mark_issue_comment(&self, comment_id: u64) {
        if let Err(e) = self
            .rest
            .create_comment_reaction(&self.owner, &self.repo, comment_id, THUMBS_DOWN_REST)
            .await
        {
            warn!(comment_id, error = %e, "Failed to mark issue comment as processed");
        }
    }

    /// Mark an issue body as processed. Best-effort, like
    /// [`mark_issue_comment`](Self::mark_issue_comment).
    pub async fn mark_issue(&self, number: u64) {
        if let Err(e) = self
            .rest
            .create_issue_reaction(&self.owner, &self.repo, number, THUMBS_DOWN_REST)
            .await
        {
            warn!(number, error = %e, "Failed to mark issue as processed");
        }
    }

    /// Mark a discussion comment as processed. Best-effort, like
    /// [`mark_issue_comment`](Self::mark_issue_comment).
    pub async fn mark_discussion_comment(&self, comment_id: &str) {
        if let Err(e) = self
            .discussions
            .add_reaction(comment_id, THUMBS_DOWN_GRAPHQL)
            .await
        {
            warn!(comment_id, error = %e, "Failed to mark discussion comment as processed");
        }
    }
}
