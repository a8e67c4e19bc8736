//! Scribe - AI reply bot for GitHub issues and discussions.
//!
//! This crate provides:
//! - Prompt template extraction and placeholder filling
//! - Provider config collection from issue comments
//! - Reaction-marker based processing state
//! - The run pipeline walking discussions and posting generated replies

pub mod article;
pub mod configs;
pub mod pipeline;
pub mod prompts;
pub mod tracker;

// Re-export main types
pub use pipeline::{Pipeline, RunConfig, RunResult};
pub use prompts::{PromptExtractor, PromptRecord, TemplateFiller, PLACEHOLDER};
pub use tracker::ProcessingTracker;
