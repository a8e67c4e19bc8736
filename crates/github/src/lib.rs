//! GitHub API clients for the scribe pipeline.
//!
//! This crate provides:
//! - A REST client for issues, issue comments and reactions
//! - A GraphQL client for Discussions (Discussions have no REST surface)
//! - A plain byte downloader for arbitrary URLs

pub mod download;
pub mod graphql;
pub mod models;
pub mod rest;

// Re-export main types
pub use download::download;
pub use graphql::DiscussionsClient;
pub use models::{
    Discussion, DiscussionComment, Issue, IssueComment, Reaction, ReactionConnection,
    ReactionRollup, THUMBS_DOWN_GRAPHQL, THUMBS_DOWN_REST,
};
pub use rest::RestClient;
