//! Scribe CLI - AI reply bot for GitHub issues and discussions.

use std::collections::HashSet;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use github::RestClient;
use scribe::configs;
use scribe::pipeline::{parse_repo, Pipeline, RunConfig};

/// Scribe CLI - generate AI replies for GitHub discussion comments.
#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "AI reply bot for GitHub issues and discussions")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single batch (for scheduled workflow use)
    Run {
        /// GitHub repository (owner/repo format)
        #[arg(long)]
        repo: String,

        /// Label of the issue holding provider configs
        #[arg(long, default_value = "ai-config")]
        config_label: String,

        /// Label of the issue holding prompt templates
        #[arg(long, default_value = "ai-template")]
        template_label: String,

        /// Target discussion title (defaults to today's date)
        #[arg(long)]
        discussion: Option<String>,

        /// Discussion category used when creating the discussion
        #[arg(long, default_value = "General")]
        category: String,
    },

    /// Parse and display the active provider configs
    Providers {
        /// GitHub repository (owner/repo format)
        #[arg(long)]
        repo: String,

        /// Label of the issue holding provider configs
        #[arg(long, default_value = "ai-config")]
        config_label: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("scribe=debug,providers=debug,github=debug,info")
    } else {
        EnvFilter::new("scribe=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            repo,
            config_label,
            template_label,
            discussion,
            category,
        } => {
            tracing::info!(repo, config_label, template_label, "Starting batch");
            run_batch(repo, config_label, template_label, discussion, category).await
        }
        Commands::Providers { repo, config_label } => run_providers(&repo, &config_label).await,
    }
}

fn github_token() -> Result<String> {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GH_TOKEN"))
        .map_err(|_| anyhow::anyhow!("GITHUB_TOKEN or GH_TOKEN not set"))
}

async fn run_batch(
    repo: String,
    config_label: String,
    template_label: String,
    discussion: Option<String>,
    category: String,
) -> Result<()> {
    let token = github_token()?;

    let config = RunConfig {
        repo,
        config_label,
        template_label,
        discussion_title: discussion
            .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string()),
        category,
    };

    let pipeline = Pipeline::new(config, &token)?;
    let mut used_templates = HashSet::new();
    let result = pipeline.run(&mut used_templates).await?;

    // Print summary
    println!("\nRun summary");
    println!("   Configs: {}", result.configs);
    println!("   Templates: {}", result.templates);
    println!("   Comments: {}", result.comments_seen);
    println!("   Replies: {}", result.replies);
    println!("   Skipped: {}", result.skipped);

    if !result.errors.is_empty() {
        println!("   Errors: {}", result.errors.len());
        for err in &result.errors {
            eprintln!("     - {err}");
        }
    }

    Ok(())
}

async fn run_providers(repo: &str, config_label: &str) -> Result<()> {
    let token = github_token()?;
    let rest = RestClient::new(&token)?;
    let (owner, name) = parse_repo(repo)?;

    let issues = rest.list_issues_by_label(&owner, &name, config_label).await?;
    let issue = issues
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("No open issue labeled {config_label} in {repo}"))?;

    let configs = configs::collect_provider_configs(&rest, &owner, &name, issue.number).await?;

    if configs.is_empty() {
        println!("No complete provider configs on issue #{}.", issue.number);
        return Ok(());
    }

    println!("Provider configs on issue #{} (priority order):\n", issue.number);
    for (i, config) in configs.iter().enumerate() {
        let endpoint = if config.endpoint.is_empty() {
            "(default)"
        } else {
            config.endpoint.as_str()
        };
        println!("{}. {} [{}]", i + 1, config.name, config.kind);
        println!("   endpoint: {endpoint}");
        println!("   credentials: {}", config.keys.len());
    }

    Ok(())
}
