//! GitHub API response models, limited to the fields the pipeline reads.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Thumbs-down content tag on the REST reactions endpoints.
pub const THUMBS_DOWN_REST: &str = "-1";

/// Thumbs-down content tag in the GraphQL `ReactionContent` enum.
pub const THUMBS_DOWN_GRAPHQL: &str = "THUMBS_DOWN";

/// Reaction rollup attached to REST issues and issue comments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReactionRollup {
    #[serde(rename = "+1", default)]
    pub plus_one: u32,
    #[serde(rename = "-1", default)]
    pub minus_one: u32,
}

/// Issue (REST).
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub reactions: ReactionRollup,
}

/// Issue comment (REST).
#[derive(Debug, Clone, Deserialize)]
pub struct IssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub reactions: ReactionRollup,
}

/// Discussion (GraphQL).
#[derive(Debug, Clone, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub number: u64,
    pub title: String,
}

/// Top-level discussion comment with its nested reactions (GraphQL).
#[derive(Debug, Clone, Deserialize)]
pub struct DiscussionComment {
    pub id: String,
    pub body: String,
    #[serde(default)]
    pub reactions: ReactionConnection,
}

/// Nested reaction connection on a discussion comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReactionConnection {
    #[serde(default)]
    pub nodes: Vec<Reaction>,
}

/// Single reaction node (GraphQL).
#[derive(Debug, Clone, Deserialize)]
pub struct Reaction {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_rollup_deserializes_rest_keys() {
        let rollup: ReactionRollup =
            serde_json::from_str(r#"{"+1": 2, "-1": 1, "laugh": 0}"#).unwrap();
        assert_eq!(rollup.plus_one, 2);
        assert_eq!(rollup.minus_one, 1);
    }

    #[test]
    fn test_issue_comment_without_reactions_defaults() {
        let comment: IssueComment = serde_json::from_str(
            r#"{"id": 7, "body": "name: m", "created_at": "2026-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(comment.id, 7);
        assert_eq!(comment.reactions.minus_one, 0);
    }

    #[test]
    fn test_discussion_comment_with_reactions() {
        let comment: DiscussionComment = serde_json::from_str(
            r#"{"id": "DC_x", "body": "text", "reactions": {"nodes": [{"content": "THUMBS_DOWN"}]}}"#,
        )
        .unwrap();
        assert_eq!(comment.reactions.nodes.len(), 1);
        assert_eq!(comment.reactions.nodes[0].content, THUMBS_DOWN_GRAPHQL);
    }
}
