//! Expansion of a lazily paginated comment listing into concrete comments.

use crate::domain::{Comment, CommentNode, Submission};
use crate::platform::{Platform, PlatformError};

/// Log expansion progress every this many pages.
const PROGRESS_EVERY: usize = 10;

/// Top-level listing with every trailing placeholder expanded.
#[derive(Debug, Clone)]
pub struct ResolvedThread {
    pub comments: Vec<Comment>,
    /// Number of placeholder pages fetched.
    pub expansions: usize,
}

/// Expand the submission's listing until its tail is a concrete comment.
///
/// Each round replaces the trailing placeholder with the nodes fetched for it,
/// so comments already resolved keep their relative order. `on_first_expansion`
/// runs once, right before the first page is fetched.
pub fn resolve_comments<P, F>(
    platform: &P,
    submission: Submission,
    mut on_first_expansion: F,
) -> Result<ResolvedThread, PlatformError>
where
    P: Platform + ?Sized,
    F: FnMut(),
{
    let mut nodes = submission.comments;
    let mut expansions = 0usize;

    while let Some(CommentNode::Continuation(more)) = nodes.last() {
        if expansions == 0 {
            on_first_expansion();
        }
        let fetched = platform.expand(more)?;
        nodes.pop();
        nodes.extend(fetched);

        expansions += 1;
        if expansions % PROGRESS_EVERY == 0 {
            tracing::debug!("More comments: {}", expansions);
        }
    }
    if expansions > 0 {
        tracing::debug!("More calls: {}", expansions);
    }

    let mut skipped = 0usize;
    let comments = nodes
        .into_iter()
        .filter_map(|node| match node {
            CommentNode::Concrete(comment) => Some(comment),
            CommentNode::Continuation(_) => {
                skipped += 1;
                None
            }
        })
        .collect();
    if skipped > 0 {
        tracing::debug!("Dropped {} interior placeholders", skipped);
    }

    Ok(ResolvedThread { comments, expansions })
}
