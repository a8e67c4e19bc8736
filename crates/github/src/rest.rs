//! GitHub REST client for issues, issue comments and reactions.

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Serialize;
use tracing::debug;

use crate::models::{Issue, IssueComment};

const GITHUB_API_URL: &str = "https://api.github.com";

/// REST page size; GitHub's maximum.
const PAGE_SIZE: usize = 100;

/// GitHub REST client.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

/// Request to create a reaction.
#[derive(Debug, Serialize)]
struct CreateReactionRequest<'a> {
    content: &'a str,
}

impl RestClient {
    /// Create a new REST client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("scribe/0.3"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: GITHUB_API_URL.to_string(),
        })
    }

    /// Point the client at a different API base URL (mock servers).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// List open issues carrying the given label.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn list_issues_by_label(
        &self,
        owner: &str,
        repo: &str,
        label: &str,
    ) -> Result<Vec<Issue>> {
        let url = format!("{}/repos/{owner}/{repo}/issues", self.api_url);

        let response = self
            .client
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .query(&[
                ("labels", label),
                ("state", "open"),
                ("per_page", "100"),
            ])
            .send()
            .await
            .context("Failed to send issue list request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("GitHub API error listing issues: {status} - {body}"));
        }

        response
            .json()
            .await
            .context("Failed to parse issue list response")
    }

    /// List every comment of an issue, following pagination.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    pub async fn list_issue_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<IssueComment>> {
        let url = format!(
            "{}/repos/{owner}/{repo}/issues/{number}/comments",
            self.api_url
        );
        let mut comments = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .client
                .get(&url)
                .header(AUTHORIZATION, format!("Bearer {}", self.token))
                .query(&[
                    ("per_page", PAGE_SIZE.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .context("Failed to send comment list request")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(anyhow!(
                    "GitHub API error listing comments: {status} - {body}"
                ));
            }

            let batch: Vec<IssueComment> = response
                .json()
                .await
                .context("Failed to parse comment list response")?;
            let done = batch.len() < PAGE_SIZE;
            comments.extend(batch);

            if done {
                break;
            }
            page += 1;
        }

        debug!(owner = %owner, repo = %repo, number, count = comments.len(), "Fetched issue comments");
        Ok(comments)
    }

    /// Create a reaction on an issue comment.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_comment_reaction(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        content: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/repos/{owner}/{repo}/issues/comments/{comment_id}/reactions",
            self.api_url
        );
        self.post_reaction(&url, content).await
    }

    /// Create a reaction on an issue itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn create_issue_reaction(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        content: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/repos/{owner}/{repo}/issues/{number}/reactions",
            self.api_url
        );
        self.post_reaction(&url, content).await
    }

    async fn post_reaction(&self, url: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&CreateReactionRequest { content })
            .send()
            .await
            .context("Failed to send reaction request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "GitHub API error creating reaction: {status} - {body}"
            ));
        }

        Ok(())
    }
}
