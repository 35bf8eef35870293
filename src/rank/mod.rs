//! Ordered insertion of author records into the report table.

use crate::domain::AuthorRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Report ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Youngest accounts first.
    #[default]
    Age,
    /// Most subreddit-loyal authors first.
    Ratio,
}

impl SortKey {
    /// Whether `candidate` belongs strictly before `existing`.
    ///
    /// Ratio ordering has two tiers: authors with no outside activity come
    /// first, ranked by inside activity; everyone else is ranked by
    /// `in - out`. Both tiers are descending.
    pub fn precedes(self, candidate: &AuthorRecord, existing: &AuthorRecord) -> bool {
        match self {
            SortKey::Age => candidate.age_days < existing.age_days,
            SortKey::Ratio => match (candidate.out_count == 0, existing.out_count == 0) {
                (true, true) => candidate.in_count > existing.in_count,
                (true, false) => true,
                (false, true) => false,
                (false, false) => candidate.balance() > existing.balance(),
            },
        }
    }
}

/// Insert `record` before the first entry it strictly precedes, else append.
///
/// Records that tie with existing entries land after them, so the table stays
/// stable in insertion order.
pub fn insert_sorted(table: &mut Vec<AuthorRecord>, record: AuthorRecord, sort: SortKey) {
    let position = table.iter().position(|existing| sort.precedes(&record, existing));
    match position {
        Some(index) => table.insert(index, record),
        None => table.push(record),
    }
}
