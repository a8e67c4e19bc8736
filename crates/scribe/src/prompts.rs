//! Prompt extraction and template filling.

use regex::Regex;

/// Literal placeholder substituted with the article content.
pub const PLACEHOLDER: &str = "{{article}}";

/// A typed prompt extracted from free text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    /// Matched identifier, e.g. "SummaryPrompt".
    pub kind: String,
    /// Prompt body, trimmed.
    pub content: String,
}

/// Extractor for `<Kind>Prompt:`-prefixed prompt text.
pub struct PromptExtractor;

impl PromptExtractor {
    /// Extract a prompt record from text.
    ///
    /// Only a match anchored at the very start counts: a word token ending
    /// in the literal suffix `Prompt` (case-sensitive), immediately
    /// followed by an ASCII or full-width colon, then the content.
    pub fn extract(raw: &str) -> Option<PromptRecord> {
        let pattern = Regex::new(r"(?s)^(\w+Prompt)[:：](.*)$").expect("Invalid prompt pattern");
        let captures = pattern.captures(raw)?;
        Some(PromptRecord {
            kind: captures[1].to_string(),
            content: captures[2].trim().to_string(),
        })
    }
}

/// Fills the article placeholder in a prompt template.
pub struct TemplateFiller;

impl TemplateFiller {
    /// Replace the first placeholder occurrence with the content.
    ///
    /// Templates without a placeholder get the content appended after a
    /// single space, so the content appears in the result exactly once.
    pub fn fill(template: &str, content: &str) -> String {
        if template.contains(PLACEHOLDER) {
            template.replacen(PLACEHOLDER, content, 1)
        } else {
            format!("{template} {content}")
        }
    }
}
