//! Gemini generateContent requests.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::invoker::Attachment;

/// Default API base when the config carries no endpoint.
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Sampling temperature sent with every request.
const TEMPERATURE: f32 = 0.7;

/// Output token cap sent with every request.
const MAX_OUTPUT_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

/// One part of a user turn: text, or inline binary data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Build the generateContent URL with the credential as a query parameter.
fn request_url(endpoint: &str, model: &str, key: &str) -> String {
    let base = if endpoint.is_empty() {
        format!("{DEFAULT_API_BASE}/v1beta/models/{model}:generateContent")
    } else {
        endpoint.to_string()
    };
    format!("{base}?key={}", urlencoding::encode(key))
}

/// Build the request body. The attachment, when present, becomes an
/// inline-data part in the same user turn as the prompt text.
fn build_request(prompt: &str, attachment: Option<&Attachment>) -> GenerateRequest {
    let mut parts = vec![Part {
        text: Some(prompt.to_string()),
        inline_data: None,
    }];

    if let Some(attachment) = attachment {
        parts.push(Part {
            text: None,
            inline_data: Some(InlineData {
                mime_type: attachment.mime_type.clone(),
                data: STANDARD.encode(&attachment.bytes),
            }),
        });
    }

    GenerateRequest {
        contents: vec![Content { role: "user", parts }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: MAX_OUTPUT_TOKENS,
        },
    }
}

/// Perform a single generateContent attempt with one credential.
pub(crate) async fn attempt(
    client: &Client,
    endpoint: &str,
    key: &str,
    model: &str,
    prompt: &str,
    attachment: Option<&Attachment>,
) -> Result<String> {
    let url = request_url(endpoint, model, key);
    let request = build_request(prompt, attachment);

    let response = client
        .post(&url)
        .json(&request)
        .send()
        .await
        .map_err(|e| anyhow!("generateContent request failed: {e}"))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| anyhow!("failed to read generateContent response: {e}"))?;

    if !status.is_success() {
        return Err(anyhow!("generateContent returned {status}: {body}"));
    }

    let parsed: GenerateResponse = serde_json::from_str(&body)
        .map_err(|e| anyhow!("malformed generateContent response: {e}"))?;

    // No candidates usually means the safety filter dropped the response.
    // Soft failure: the invoker falls through to the next credential.
    parsed
        .candidates
        .first()
        .and_then(|c| c.content.parts.first())
        .and_then(|p| p.text.clone())
        .ok_or_else(|| anyhow!("generateContent response carried no candidates"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_default_base() {
        let url = request_url("", "gemini-2.0-flash", "k1");
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=k1"
        );
    }

    #[test]
    fn test_request_url_custom_endpoint_and_encoding() {
        let url = request_url("https://proxy.local/gen", "m", "a/b");
        assert_eq!(url, "https://proxy.local/gen?key=a%2Fb");
    }

    #[test]
    fn test_body_without_attachment_has_single_text_part() {
        let request = build_request("hello", None);
        let value = serde_json::to_value(&request).unwrap();

        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["text"], "hello");
        assert!(parts[0].get("inlineData").is_none());
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 4096);
    }

    #[test]
    fn test_body_with_attachment_adds_inline_data_part() {
        let attachment = Attachment {
            bytes: vec![1, 2, 3],
            mime_type: "application/pdf".to_string(),
        };
        let request = build_request("summarize", Some(&attachment));
        let value = serde_json::to_value(&request).unwrap();

        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["text"], "summarize");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[1]["inlineData"]["data"], STANDARD.encode([1, 2, 3]));
        assert_eq!(value["contents"][0]["role"], "user");
    }

    #[test]
    fn test_extract_first_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"poem"}]}}]}"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .and_then(|p| p.text.clone());
        assert_eq!(text.as_deref(), Some("poem"));
    }

    #[test]
    fn test_empty_candidates_deserializes() {
        let parsed: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }
}
