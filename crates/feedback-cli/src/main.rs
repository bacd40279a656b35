//! feedback: submit and vote on mobile app feedback from a terminal
//!
//! Talks to the same issue tracker repository as the mobile clients and
//! keeps its own vote ledger, so it counts as one more device.

mod commands;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use feedback_sdk::{FeedbackConfig, FeedbackSubmission};
use tracing::{debug, info};

use commands::FeedbackCommands;

#[derive(Parser)]
#[command(name = "feedback")]
#[command(about = "Submit and vote on bug reports and feature requests")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "feedback.toml")]
    config: PathBuf,

    /// GitHub token (overrides config file)
    #[arg(long, env = "FEEDBACK_GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository owner (overrides config file)
    #[arg(long, env = "FEEDBACK_GITHUB_OWNER")]
    owner: Option<String>,

    /// Repository name (overrides config file)
    #[arg(long, env = "FEEDBACK_GITHUB_REPO")]
    repo: Option<String>,

    /// Vote ledger file (overrides config file)
    #[arg(long, env = "FEEDBACK_LEDGER_PATH")]
    ledger: Option<PathBuf>,

    #[command(subcommand)]
    command: FeedbackCommands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("feedback_sdk=warn".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = FeedbackConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Flags win over the file
    if let Some(token) = cli.token {
        config.tracker.token = Some(token);
    }
    if let Some(owner) = cli.owner {
        config.tracker.owner = owner;
    }
    if let Some(repo) = cli.repo {
        config.tracker.repo = repo;
    }
    if let Some(ledger) = cli.ledger {
        config.ledger.path = ledger;
    }

    info!(
        owner = %config.tracker.owner,
        repo = %config.tracker.repo,
        "Using feedback repository"
    );
    debug!(ledger = %config.ledger.path.display(), "Vote ledger");

    let feedback = FeedbackSubmission::from_config(&config)?;
    let output = commands::execute_command(&feedback, cli.command).await?;
    println!("{}", output);
    Ok(())
}
