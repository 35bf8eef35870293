//! Platform access (inbox, threads, accounts).
//!
//! The pipeline only talks to the [`Platform`] trait; [`reddit::RedditClient`]
//! is the production implementation.

use crate::domain::{CommentNode, InboxItem, MoreComments, Submission};
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod listing;
pub mod reddit;

pub use reddit::{RedditClient, RedditCredentials};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("request to {endpoint} failed")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("unexpected response from {endpoint}: {reason}")]
    Malformed { endpoint: String, reason: String },

    #[error("account {0} is suspended, deleted or otherwise unavailable")]
    UnavailableAccount(String),

    #[error("authentication failed: {0}")]
    Auth(String),
}

/// Every platform call the bot makes.
///
/// All calls block; one network round trip per call unless noted.
pub trait Platform {
    /// Unread inbox items, oldest first.
    fn unread_inbox(&self) -> Result<Vec<InboxItem>, PlatformError>;

    fn mark_read(&self, fullname: &str) -> Result<(), PlatformError>;

    fn reply(&self, fullname: &str, text: &str) -> Result<(), PlatformError>;

    /// Fetch a thread and its first page of top-level comments.
    fn submission(&self, id: &str) -> Result<Submission, PlatformError>;

    /// Fetch the children behind a continuation placeholder.
    ///
    /// The result may end with a new placeholder when more pages remain.
    fn expand(&self, more: &MoreComments) -> Result<Vec<CommentNode>, PlatformError>;

    fn account_created(&self, name: &str) -> Result<DateTime<Utc>, PlatformError>;

    /// Subreddit names of the account's `limit` most recent comments and posts.
    fn recent_activity(&self, name: &str, limit: usize) -> Result<Vec<String>, PlatformError>;
}
