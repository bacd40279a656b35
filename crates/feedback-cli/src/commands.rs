//! Feedback subcommands
//!
//! Each command runs against a [`FeedbackSubmission`] and returns the text
//! to print, so the same code serves the binary and the tests.

use clap::Subcommand;
use feedback_sdk::{
    Category, FeedbackError, FeedbackSubmission, NewFeedback, Record, RecordFilter,
};
use feedback_tracker_client::ReactionKind;
use std::fmt::Write;

/// Feedback CLI commands
#[derive(Debug, Subcommand)]
pub enum FeedbackCommands {
    /// List open feedback, most voted first
    List {
        /// Which records to show (all, bugs, features)
        #[arg(short, long, default_value = "all")]
        filter: RecordFilter,
    },

    /// Show one record with its comments
    Show {
        number: u64,
    },

    /// Submit a bug report or feature request
    Submit {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: String,

        /// bug or feature
        #[arg(short, long)]
        category: Category,

        /// Optional contact email
        #[arg(short, long)]
        email: Option<String>,

        /// Device summary (defaults to this machine's OS and architecture)
        #[arg(long)]
        device_info: Option<String>,
    },

    /// Vote for a record, once per device
    Vote {
        number: u64,
    },

    /// List records this device voted for
    Voted,

    /// Forget local votes (remote counts are unchanged)
    ResetVotes,

    /// List comments on a record
    Comments {
        number: u64,
    },

    /// Comment on a record
    Comment {
        number: u64,

        #[arg(short, long)]
        body: String,
    },

    /// React to a record (+1, -1, laugh, confused, heart, hooray, rocket, eyes)
    React {
        number: u64,

        #[arg(short, long)]
        kind: ReactionKind,
    },
}

/// Device summary used when none is given
pub fn default_device_info() -> String {
    format!(
        "Platform: {} ({})\nClient: feedback-cli {}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        env!("CARGO_PKG_VERSION")
    )
}

/// Execute a command and return its output
pub async fn execute_command(
    feedback: &FeedbackSubmission,
    cmd: FeedbackCommands,
) -> anyhow::Result<String> {
    match cmd {
        FeedbackCommands::List { filter } => {
            let records = feedback.store().list_records(filter).await?;
            if records.is_empty() {
                return Ok("No open feedback.".to_string());
            }
            let voted = feedback.voted_records().await;
            let mut out = String::new();
            for record in &records {
                writeln!(out, "{}", summary_line(record, voted.contains(&record.number)))?;
            }
            Ok(out.trim_end().to_string())
        }

        FeedbackCommands::Show { number } => {
            let record = feedback.store().fetch_record(number).await?;
            let comments = feedback.store().list_comments(number).await?;
            let voted = feedback.has_voted(number).await;

            let mut out = String::new();
            writeln!(out, "{}", summary_line(&record, voted))?;
            if let Some(author) = &record.author {
                writeln!(out, "Opened by {} at {}", author, record.created_at)?;
            }
            writeln!(out)?;
            writeln!(out, "{}", record.displayable_body())?;
            if !comments.is_empty() {
                writeln!(out, "\nComments:")?;
                for comment in &comments {
                    let who = comment
                        .user
                        .as_ref()
                        .map(|u| u.login.as_str())
                        .unwrap_or("anonymous");
                    writeln!(out, "- {} ({}): {}", who, comment.created_at, comment.body)?;
                }
            }
            Ok(out.trim_end().to_string())
        }

        FeedbackCommands::Submit {
            title,
            description,
            category,
            email,
            device_info,
        } => {
            let mut draft = NewFeedback::new(title, description, category)
                .with_device_info(device_info.unwrap_or_else(default_device_info));
            if let Some(email) = email {
                draft = draft.with_contact_email(email);
            }
            let number = feedback.submit_feedback(&draft).await?;
            Ok(format!("Submitted {} #{}", category, number))
        }

        FeedbackCommands::Vote { number } => match feedback.cast_vote(number).await {
            Ok(count) => Ok(format!("Voted for #{} ({} votes)", number, count)),
            Err(FeedbackError::AlreadyVoted(n)) => {
                Ok(format!("You already voted for #{}", n))
            }
            Err(e) => Err(e.into()),
        },

        FeedbackCommands::Voted => {
            let voted = feedback.voted_records().await;
            if voted.is_empty() {
                return Ok("No votes recorded on this device.".to_string());
            }
            let numbers: Vec<String> = voted.iter().map(|n| format!("#{}", n)).collect();
            Ok(numbers.join(" "))
        }

        FeedbackCommands::ResetVotes => {
            feedback.reset_votes().await?;
            Ok("Local votes cleared.".to_string())
        }

        FeedbackCommands::Comments { number } => {
            let comments = feedback.store().list_comments(number).await?;
            if comments.is_empty() {
                return Ok(format!("No comments on #{}.", number));
            }
            let lines: Vec<String> = comments
                .iter()
                .map(|c| format!("[{}] {}", c.created_at, c.body))
                .collect();
            Ok(lines.join("\n"))
        }

        FeedbackCommands::Comment { number, body } => {
            let comment = feedback.store().add_comment(number, &body).await?;
            Ok(format!("Commented on #{} (comment {})", number, comment.id))
        }

        FeedbackCommands::React { number, kind } => {
            feedback.store().add_reaction(number, kind).await?;
            Ok(format!("Reacted {} to #{}", kind, number))
        }
    }
}

fn summary_line(record: &Record, voted: bool) -> String {
    let category = record
        .category()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "other".to_string());
    format!(
        "#{:<5} {:>4} votes{} [{}] {}",
        record.number,
        record.vote_count(),
        if voted { " *" } else { "  " },
        category,
        record.title
    )
}
