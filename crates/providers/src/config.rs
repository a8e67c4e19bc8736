//! Free-text provider configuration parser.

use std::fmt;

use url::Url;

/// Request/response shape selector for a provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (bearer-token credential).
    #[default]
    OpenAi,
    /// Gemini generateContent (query-parameter credential).
    Gemini,
    /// Unrecognized type tag, kept opaque. The invoker skips these.
    Other(String),
}

impl ProviderKind {
    /// Parse a lower-cased type tag.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "openai" => Self::OpenAi,
            "gemini" => Self::Gemini,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the invoker knows how to shape requests for this kind.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Gemini => write!(f, "gemini"),
            Self::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// One named model endpoint with its ordered credentials.
///
/// List order of `keys` is priority order. Configs themselves are ordered
/// by their source comment's creation time before they reach the invoker.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    /// Model identifier sent with every request.
    pub name: String,
    /// Endpoint URL. May be empty for kinds with a default endpoint.
    pub endpoint: String,
    /// Credentials, tried in order. Duplicates are allowed.
    pub keys: Vec<String>,
    /// Request shaping kind.
    pub kind: ProviderKind,
}

impl ProviderConfig {
    /// Whether this config carries everything the invoker needs.
    ///
    /// Incomplete configs are dropped by batch extraction and never reach
    /// the invoker.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        if self.name.is_empty() || self.keys.is_empty() {
            return false;
        }
        match self.kind {
            // Chat-completion endpoints have no default URL.
            ProviderKind::OpenAi => Url::parse(&self.endpoint).is_ok(),
            ProviderKind::Gemini | ProviderKind::Other(_) => true,
        }
    }
}

/// Parser for free-text provider configuration comments.
///
/// The format is one `key: value` pair per line, e.g.
///
/// ```text
/// name: gpt-4o-mini
/// url: https://api.openai.com/v1/chat/completions
/// key: sk-primary
/// key: sk-backup
/// type: openai
/// ```
pub struct ConfigParser;

impl ConfigParser {
    /// Parse a comment body into a provider config.
    ///
    /// Never fails: unmatched lines are ignored and missing fields simply
    /// leave the config incomplete.
    pub fn parse(raw: &str) -> ProviderConfig {
        let mut config = ProviderConfig::default();

        for line in raw.lines() {
            // First ASCII or full-width colon splits key from value.
            let Some(idx) = line.find([':', '：']) else {
                continue;
            };
            let key = line[..idx].to_lowercase();
            let sep_len = line[idx..].chars().next().map_or(1, char::len_utf8);
            let value = unquote(line[idx + sep_len..].trim_end_matches('\r').trim());

            // Ordered match chain: a key containing several of these
            // substrings resolves to the first match.
            if key.contains("name") {
                config.name = value.to_string();
            } else if key.contains("url") {
                config.endpoint = value.to_string();
            } else if key.contains("key") {
                config.keys.push(value.to_string());
            } else if key.contains("type") {
                config.kind = ProviderKind::parse(&value.to_lowercase());
            }
        }

        config
    }
}

/// Strip one layer of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = ConfigParser::parse(
            "name: gemini-2.0-flash\nurl: https://example.com/v1\nkey: K1\nkey: K2\ntype: gemini",
        );
        assert_eq!(config.name, "gemini-2.0-flash");
        assert_eq!(config.endpoint, "https://example.com/v1");
        assert_eq!(config.keys, vec!["K1", "K2"]);
        assert_eq!(config.kind, ProviderKind::Gemini);
        assert!(config.is_complete());
    }

    #[test]
    fn test_parse_fullwidth_colon_and_quotes() {
        let config = ConfigParser::parse("name：\"gpt-4o\"\nkey：'secret'\n");
        assert_eq!(config.name, "gpt-4o");
        assert_eq!(config.keys, vec!["secret"]);
    }

    #[test]
    fn test_last_occurrence_wins_for_name_and_url() {
        let config = ConfigParser::parse("name: first\nname: second\nurl: https://a\nurl: https://b");
        assert_eq!(config.name, "second");
        assert_eq!(config.endpoint, "https://b");
    }

    #[test]
    fn test_duplicate_keys_accumulate_in_order() {
        let config = ConfigParser::parse("key: a\nkey: a\nkey: b");
        assert_eq!(config.keys, vec!["a", "a", "b"]);
    }

    #[test]
    fn test_key_substring_precedence() {
        // "keyname" contains both "name" and "key"; name wins.
        let config = ConfigParser::parse("keyname: value");
        assert_eq!(config.name, "value");
        assert!(config.keys.is_empty());
    }

    #[test]
    fn test_case_insensitive_keys() {
        let config = ConfigParser::parse("Model Name: m\nAPI-KEY: k\nType: GEMINI");
        assert_eq!(config.name, "m");
        assert_eq!(config.keys, vec!["k"]);
        assert_eq!(config.kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_unrecognized_type_kept_opaque() {
        let config = ConfigParser::parse("name: m\nkey: k\ntype: Claude");
        assert_eq!(config.kind, ProviderKind::Other("claude".to_string()));
        assert!(!config.kind.is_supported());
        // Still complete; the invoker decides to skip it.
        assert!(config.is_complete());
    }

    #[test]
    fn test_missing_url_incomplete_for_openai() {
        let config = ConfigParser::parse("name: gpt-4o\nkey: k");
        assert_eq!(config.kind, ProviderKind::OpenAi);
        assert!(!config.is_complete());
    }

    #[test]
    fn test_missing_url_complete_for_gemini() {
        let config = ConfigParser::parse("name: gemini-2.0-flash\nkey: k\ntype: gemini");
        assert!(config.is_complete());
    }

    #[test]
    fn test_unmatched_lines_ignored() {
        let config = ConfigParser::parse("hello world\nname: m\njust a colon: here\nkey: k");
        assert_eq!(config.name, "m");
        assert_eq!(config.keys, vec!["k"]);
    }

    #[test]
    fn test_empty_input() {
        let config = ConfigParser::parse("");
        assert!(config.name.is_empty());
        assert!(!config.is_complete());
    }
}
