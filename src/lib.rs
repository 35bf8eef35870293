//! thread-integrity: summarise who is commenting in a Reddit thread
//!
//! The bot watches its inbox for private messages containing a thread link,
//! walks the thread's top-level comments, profiles each distinct author and
//! replies with a pastebin link to a table of account ages and in/out
//! subreddit activity.

pub mod bot;
pub mod cli;
pub mod config;
pub mod domain;
pub mod extract;
pub mod paste;
pub mod platform;
pub mod rank;
pub mod render;
pub mod thread;
