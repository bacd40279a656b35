//! Feedback SDK
//!
//! Anonymous bug reports and feature requests from mobile clients, stored as
//! issues on a remote tracker. There is no backend of our own: every piece
//! of state lives either in an issue body or in a small file on the device.
//!
//! ## Pieces
//!
//! - [`codec`]: reads and rewrites the `👍 Votes: N` counter and the
//!   metadata sections embedded in an issue body
//! - [`RecordStore`]: listing, creation and vote increments against an
//!   [`IssueTracker`], with an observable cache of the last listing
//! - [`VoteLedger`]: the per-device set of records already voted on
//! - [`FeedbackSubmission`]: `submit_feedback` and the deduplicated
//!   `cast_vote`
//!
//! ## Example
//!
//! ```rust,ignore
//! use feedback_sdk::{Category, FeedbackConfig, FeedbackSubmission, NewFeedback};
//!
//! let config = FeedbackConfig::load("feedback.toml")?;
//! let feedback = FeedbackSubmission::from_config(&config)?;
//!
//! let number = feedback
//!     .submit_feedback(&NewFeedback::new("Dark mode", "Please!", Category::FeatureRequest))
//!     .await?;
//!
//! match feedback.cast_vote(number).await {
//!     Ok(count) => println!("now at {count} votes"),
//!     Err(e) if e.is_already_voted() => println!("already voted"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod ledger;
pub mod model;
pub mod store;
pub mod submission;

pub use config::{FeedbackConfig, LedgerConfig};
pub use error::{FeedbackError, Result};
pub use ledger::{FileLedgerStorage, LedgerStorage, MemoryLedgerStorage, VoteLedger};
pub use model::{Category, NewFeedback, Record, RecordFilter};
pub use store::{RecordStore, StoreState};
pub use submission::FeedbackSubmission;

pub use feedback_tracker_client::{Comment, IssueTracker, ReactionKind, TrackerConfig};
