//! OpenAI-compatible chat completion requests.

use anyhow::{anyhow, Result};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Sampling temperature sent with every request.
const TEMPERATURE: f32 = 0.7;

/// Output token cap sent with every request.
const MAX_TOKENS: u32 = 4096;

/// Chat completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat message.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Perform a single chat completion attempt with one credential.
pub(crate) async fn attempt(
    client: &Client,
    endpoint: &str,
    key: &str,
    model: &str,
    prompt: &str,
) -> Result<String> {
    let request = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    };

    let response = client
        .post(endpoint)
        .header(AUTHORIZATION, format!("Bearer {key}"))
        .json(&request)
        .send()
        .await
        .map_err(|e| anyhow!("chat request failed: {e}"))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| anyhow!("failed to read chat response: {e}"))?;

    if !status.is_success() {
        return Err(anyhow!("chat endpoint returned {status}: {body}"));
    }

    let value: Value =
        serde_json::from_str(&body).map_err(|e| anyhow!("malformed chat response: {e}"))?;

    Ok(extract_text(&value))
}

/// Extract the generated text from a chat completion response.
///
/// Falls back from the message content to the legacy completion `text`
/// field, and finally to the stringified raw body rather than failing.
fn extract_text(value: &Value) -> String {
    let choice = &value["choices"][0];
    choice["message"]["content"]
        .as_str()
        .or_else(|| choice["text"].as_str())
        .map(ToString::to_string)
        .unwrap_or_else(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: vec![ChatMessage {
                role: "user",
                content: "hello",
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
        assert_eq!(value["max_tokens"], 4096);
    }

    #[test]
    fn test_extract_message_content() {
        let value = json!({"choices": [{"message": {"content": "out"}}]});
        assert_eq!(extract_text(&value), "out");
    }

    #[test]
    fn test_extract_legacy_text_field() {
        let value = json!({"choices": [{"text": "legacy"}]});
        assert_eq!(extract_text(&value), "legacy");
    }

    #[test]
    fn test_extract_falls_back_to_raw_body() {
        let value = json!({"unexpected": true});
        assert_eq!(extract_text(&value), value.to_string());
    }
}
