//! Thread analysis: comment-tree resolution and author statistics.

pub mod aggregate;
pub mod resolver;

pub use aggregate::{aggregate_authors, top_level_authors};
pub use resolver::{resolve_comments, ResolvedThread};
