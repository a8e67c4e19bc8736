//! Priority-ordered provider failover.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::ProviderError;
use crate::{gemini, openai};

/// Per-attempt network budget. No overall deadline is enforced, so the
/// worst case is configs x credentials x this timeout.
const CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Binary payload forwarded to providers that accept inline data.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// Raw bytes, base64-encoded exactly once at request-build time.
    pub bytes: Vec<u8>,
    /// MIME type, e.g. `application/pdf`.
    pub mime_type: String,
}

/// Successful invocation outcome.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Normalized generated text.
    pub text: String,
    /// Model name of the config that produced the text.
    pub provider: String,
}

/// Invokes providers in priority order until one call succeeds.
///
/// Credentials within one config are interchangeable (rotated or backup
/// keys for the same provider) and are tried in list order. Configs are
/// not interchangeable and are tried in their author-declared order.
pub struct Invoker {
    client: Client,
}

impl Invoker {
    /// Create an invoker with the fixed per-call timeout.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(CALL_TIMEOUT)
            .build()
            .context("Failed to build provider HTTP client")?;
        Ok(Self { client })
    }

    /// Try every credential of every config in order and return the first
    /// success. The first successful call returns immediately; no further
    /// configs or credentials are attempted.
    pub async fn invoke(
        &self,
        configs: &[ProviderConfig],
        prompt: &str,
        attachment: Option<&Attachment>,
    ) -> Result<Invocation, ProviderError> {
        let mut attempts = 0usize;
        let mut last_error: Option<String> = None;

        for config in configs {
            if !config.kind.is_supported() {
                debug!(
                    provider = %config.name,
                    kind = %config.kind,
                    "Skipping provider with unsupported type"
                );
                continue;
            }

            for key in &config.keys {
                attempts += 1;

                match self.attempt(config, key, prompt, attachment).await {
                    Ok(text) => {
                        debug!(provider = %config.name, attempts, "Provider call succeeded");
                        return Ok(Invocation {
                            text,
                            provider: config.name.clone(),
                        });
                    }
                    Err(e) => {
                        warn!(
                            provider = %config.name,
                            error = %e,
                            "Provider call failed, trying next credential"
                        );
                        last_error = Some(e.to_string());
                    }
                }
            }
            // All credentials for this config exhausted; fall through.
        }

        match last_error {
            Some(last) => Err(ProviderError::AllFailed { attempts, last }),
            None => Err(ProviderError::NoProviderAvailable),
        }
    }

    /// One network call with one credential, shaped by the config's kind.
    async fn attempt(
        &self,
        config: &ProviderConfig,
        key: &str,
        prompt: &str,
        attachment: Option<&Attachment>,
    ) -> Result<String> {
        match &config.kind {
            ProviderKind::OpenAi => {
                openai::attempt(&self.client, &config.endpoint, key, &config.name, prompt).await
            }
            ProviderKind::Gemini => {
                gemini::attempt(
                    &self.client,
                    &config.endpoint,
                    key,
                    &config.name,
                    prompt,
                    attachment,
                )
                .await
            }
            ProviderKind::Other(tag) => Err(anyhow!("unsupported provider type: {tag}")),
        }
    }
}
