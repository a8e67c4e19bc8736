//! Scribe pipeline - orchestrates the fetch-fill-invoke-reply-mark flow.

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use chrono::Utc;
use github::{Discussion, DiscussionsClient, Issue, RestClient};
use providers::{Invoker, ProviderConfig};

use crate::article;
use crate::configs;
use crate::prompts::{PromptExtractor, PromptRecord, TemplateFiller};
use crate::tracker::ProcessingTracker;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Repository in owner/repo form.
    pub repo: String,
    /// Label of the issue holding provider configs.
    pub config_label: String,
    /// Label of the issue holding prompt templates.
    pub template_label: String,
    /// Title of the target discussion. Created when missing.
    pub discussion_title: String,
    /// Discussion category used when creating the discussion.
    pub category: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            repo: String::new(),
            config_label: "ai-config".to_string(),
            template_label: "ai-template".to_string(),
            discussion_title: Utc::now().format("%Y-%m-%d").to_string(),
            category: "General".to_string(),
        }
    }
}

/// Result of a single run.
#[derive(Debug, Default)]
pub struct RunResult {
    /// Complete provider configs loaded.
    pub configs: usize,
    /// Usable prompt templates found.
    pub templates: usize,
    /// Discussion comments inspected.
    pub comments_seen: usize,
    /// Replies posted.
    pub replies: usize,
    /// Comments skipped because they were already marked.
    pub skipped: usize,
    /// Per-item errors (the batch keeps going).
    pub errors: Vec<String>,
}

/// A prompt template plus the source it is marked on after use.
#[derive(Debug, Clone)]
pub struct Template {
    pub record: PromptRecord,
    pub source: TemplateSource,
}

/// Where a template came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateSource {
    /// The template issue's own body.
    IssueBody { number: u64 },
    /// A comment on the template issue.
    IssueComment { id: u64 },
}

/// Pipeline orchestrator.
pub struct Pipeline {
    config: RunConfig,
    rest: RestClient,
    discussions: DiscussionsClient,
    invoker: Invoker,
    tracker: ProcessingTracker,
    owner: String,
    repo: String,
}

impl Pipeline {
    /// Create a pipeline talking to the real GitHub APIs.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed repository identifier or when an
    /// HTTP client cannot be constructed.
    pub fn new(config: RunConfig, token: &str) -> Result<Self> {
        let rest = RestClient::new(token)?;
        let discussions = DiscussionsClient::new(token)?;
        Self::with_clients(config, rest, discussions)
    }

    /// Create a pipeline over caller-supplied clients (mock servers).
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed repository identifier.
    pub fn with_clients(
        config: RunConfig,
        rest: RestClient,
        discussions: DiscussionsClient,
    ) -> Result<Self> {
        let (owner, repo) = parse_repo(&config.repo)?;
        let tracker = ProcessingTracker::new(rest.clone(), discussions.clone(), &owner, &repo);
        let invoker = Invoker::new()?;

        Ok(Self {
            config,
            rest,
            discussions,
            invoker,
            tracker,
            owner,
            repo,
        })
    }

    /// Run a single batch.
    ///
    /// `used_templates` accumulates the template sources consumed during
    /// this run. It is scoped to the run and discarded afterwards; the
    /// durable state is the reaction marker.
    ///
    /// # Errors
    ///
    /// Returns an error only for fatal setup failures (missing labeled
    /// issues, no usable provider config, missing discussion category).
    /// Per-item failures are logged, counted and skipped.
    pub async fn run(&self, used_templates: &mut HashSet<TemplateSource>) -> Result<RunResult> {
        let mut result = RunResult::default();

        tracing::info!(repo = %self.config.repo, "Starting run");

        // Shared preconditions; failures here abort the whole run.
        let config_issue = self.issue_by_label(&self.config.config_label).await?;
        let provider_configs: Vec<ProviderConfig> = configs::collect_provider_configs(
            &self.rest,
            &self.owner,
            &self.repo,
            config_issue.number,
        )
        .await?;
        if provider_configs.is_empty() {
            return Err(anyhow!(
                "No complete provider config on issue #{}",
                config_issue.number
            ));
        }
        result.configs = provider_configs.len();

        let template_issue = self.issue_by_label(&self.config.template_label).await?;
        let templates = self.collect_templates(&template_issue).await?;
        result.templates = templates.len();

        let discussion = self.ensure_discussion().await?;

        let comments = self
            .discussions
            .list_discussion_comments(&self.owner, &self.repo, discussion.number)
            .await?;
        result.comments_seen = comments.len();

        // Work items. Failures past this point stay local to one item.
        for comment in &comments {
            if ProcessingTracker::discussion_comment_processed(comment) {
                tracing::debug!(comment_id = %comment.id, "Already processed, skipping");
                result.skipped += 1;
                continue;
            }

            let Some(template) = next_template(&templates, used_templates) else {
                tracing::info!("No unused template left, stopping");
                break;
            };

            let content = match article::resolve(&comment.body).await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(comment_id = %comment.id, error = %e, "Failed to resolve article");
                    result.errors.push(format!("{}: {e}", comment.id));
                    continue;
                }
            };

            let prompt = TemplateFiller::fill(&template.record.content, &content.text);

            let invocation = match self
                .invoker
                .invoke(&provider_configs, &prompt, content.attachment.as_ref())
                .await
            {
                Ok(i) => i,
                Err(e) => {
                    tracing::warn!(comment_id = %comment.id, error = %e, "Generation failed");
                    result.errors.push(format!("{}: {e}", comment.id));
                    continue;
                }
            };

            if let Err(e) = self
                .discussions
                .add_discussion_comment(&discussion.id, Some(&comment.id), &invocation.text)
                .await
            {
                tracing::error!(comment_id = %comment.id, error = %e, "Failed to post reply");
                result
                    .errors
                    .push(format!("{}: reply failed: {e}", comment.id));
                continue;
            }

            // Reply is live; now write the markers. Marking is best-effort
            // and not atomic with the post above.
            self.tracker.mark_discussion_comment(&comment.id).await;
            self.mark_template(&template).await;
            used_templates.insert(template.source.clone());
            result.replies += 1;

            tracing::info!(
                comment_id = %comment.id,
                provider = %invocation.provider,
                template = %template.record.kind,
                "Posted reply"
            );
        }

        tracing::info!(
            configs = result.configs,
            templates = result.templates,
            comments = result.comments_seen,
            replies = result.replies,
            skipped = result.skipped,
            errors = result.errors.len(),
            "Run complete"
        );

        Ok(result)
    }

    /// First open issue carrying the label. Missing issue is fatal.
    async fn issue_by_label(&self, label: &str) -> Result<Issue> {
        let issues = self
            .rest
            .list_issues_by_label(&self.owner, &self.repo, label)
            .await?;
        issues.into_iter().next().ok_or_else(|| {
            anyhow!(
                "No open issue labeled {label} in {}/{}",
                self.owner,
                self.repo
            )
        })
    }

    /// Extract unprocessed templates from the template issue's body and
    /// comments.
    async fn collect_templates(&self, issue: &Issue) -> Result<Vec<Template>> {
        let mut templates = Vec::new();

        if !ProcessingTracker::issue_processed(issue) {
            if let Some(record) = issue.body.as_deref().and_then(PromptExtractor::extract) {
                templates.push(Template {
                    record,
                    source: TemplateSource::IssueBody {
                        number: issue.number,
                    },
                });
            }
        }

        let comments = self
            .rest
            .list_issue_comments(&self.owner, &self.repo, issue.number)
            .await?;
        for comment in comments {
            if ProcessingTracker::issue_comment_processed(&comment) {
                continue;
            }
            if let Some(record) = comment.body.as_deref().and_then(PromptExtractor::extract) {
                templates.push(Template {
                    record,
                    source: TemplateSource::IssueComment { id: comment.id },
                });
            }
        }

        Ok(templates)
    }

    /// Find the target discussion by title, creating it when missing.
    async fn ensure_discussion(&self) -> Result<Discussion> {
        if let Some(found) = self
            .discussions
            .find_discussion(&self.owner, &self.repo, &self.config.discussion_title)
            .await?
        {
            return Ok(found);
        }

        let (repository_id, category_id) = self
            .discussions
            .repository_and_category(&self.owner, &self.repo, &self.config.category)
            .await?;

        self.discussions
            .create_discussion(
                &repository_id,
                &category_id,
                &self.config.discussion_title,
                &self.config.discussion_title,
            )
            .await
    }

    async fn mark_template(&self, template: &Template) {
        match template.source {
            TemplateSource::IssueBody { number } => self.tracker.mark_issue(number).await,
            TemplateSource::IssueComment { id } => self.tracker.mark_issue_comment(id).await,
        }
    }
}

/// First template not yet consumed in this run.
fn next_template(templates: &[Template], used: &HashSet<TemplateSource>) -> Option<Template> {
    templates.iter().find(|t| !used.contains(&t.source)).cloned()
}

/// Split an `owner/repo` identifier.
///
/// # Errors
///
/// Returns an error unless the input is exactly `owner/repo`.
pub fn parse_repo(repo: &str) -> Result<(String, String)> {
    let mut parts = repo.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
            Ok((owner.to_string(), name.to_string()))
        }
        _ => Err(anyhow!(
            "Invalid repository identifier: {repo} (expected owner/repo)"
        )),
    }
}
