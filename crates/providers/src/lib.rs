//! Multi-provider LLM invocation with priority-ordered failover.
//!
//! This crate provides:
//! - Free-text provider configuration parsing
//! - OpenAI-compatible and Gemini request/response shaping
//! - Credential-rotating, provider-rotating failover invocation

pub mod config;
pub mod error;
pub mod invoker;

mod gemini;
mod openai;

// Re-export main types
pub use config::{ConfigParser, ProviderConfig, ProviderKind};
pub use error::ProviderError;
pub use invoker::{Attachment, Invocation, Invoker};
