//! Per-author statistics for the top-level commenters of a thread.

use crate::domain::{AuthorRecord, Comment};
use crate::platform::{Platform, PlatformError};
use crate::rank::{insert_sorted, SortKey};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

const PROGRESS_EVERY: usize = 10;

/// Distinct authors of depth-0 comments, in order of first appearance.
///
/// Comments without an author (deleted accounts) are skipped.
pub fn top_level_authors(comments: &[Comment]) -> Vec<String> {
    let mut seen = HashSet::new();
    comments
        .iter()
        .filter(|comment| comment.is_top_level())
        .filter_map(|comment| comment.author.as_deref())
        .filter(|author| seen.insert(*author))
        .map(str::to_string)
        .collect()
}

/// Fetch stats for each author and build the sorted report table.
///
/// Authors whose account cannot be read are logged and left out; the rest of
/// the batch continues. One platform round trip pair per author.
pub fn aggregate_authors<P>(
    platform: &P,
    authors: &[String],
    subreddit: &str,
    now: DateTime<Utc>,
    activity_limit: usize,
    sort: SortKey,
) -> Vec<AuthorRecord>
where
    P: Platform + ?Sized,
{
    let target = subreddit.to_lowercase();
    let total = authors.len();
    let mut table = Vec::with_capacity(total);

    tracing::debug!("Authors: 0 / {}", total);
    for (i, name) in authors.iter().enumerate() {
        match author_record(platform, name, &target, now, activity_limit) {
            Ok(record) => insert_sorted(&mut table, record, sort),
            Err(err) => tracing::debug!(author = %name, error = %err, "Bad redditor object"),
        }
        if (i + 1) % PROGRESS_EVERY == 0 {
            tracing::debug!("Authors: {} / {}", i + 1, total);
        }
    }
    if total % PROGRESS_EVERY != 0 {
        tracing::debug!("Authors: {} / {}", total, total);
    }

    table
}

fn author_record<P>(
    platform: &P,
    name: &str,
    target: &str,
    now: DateTime<Utc>,
    activity_limit: usize,
) -> Result<AuthorRecord, PlatformError>
where
    P: Platform + ?Sized,
{
    let created = platform.account_created(name)?;
    let age_days = u32::try_from((now - created).num_days().max(0)).unwrap_or(u32::MAX);

    let (mut in_count, mut out_count) = (0u32, 0u32);
    for subreddit in platform.recent_activity(name, activity_limit)?.iter().take(activity_limit) {
        if subreddit.to_lowercase() == target {
            in_count += 1;
        } else {
            out_count += 1;
        }
    }

    Ok(AuthorRecord::new(name, age_days, in_count, out_count))
}
