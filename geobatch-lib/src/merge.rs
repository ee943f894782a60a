//! Joining results back onto the rows they were computed from.

use std::collections::HashMap;
use std::fmt::Display;

use log::warn;
use serde::Serialize;

use crate::{ApiResult, RowId, ValidationVerdict};

/// Anything that belongs to exactly one input row
pub trait Keyed {
    /// The row this value belongs to
    fn row_id(&self) -> RowId;
}

impl<T: Keyed + ?Sized> Keyed for &T {
    fn row_id(&self) -> RowId {
        (**self).row_id()
    }
}

impl Keyed for ApiResult {
    fn row_id(&self) -> RowId {
        self.row_id
    }
}

impl Keyed for ValidationVerdict {
    fn row_id(&self) -> RowId {
        self.row_id
    }
}

impl<A: Keyed, B> Keyed for (A, B) {
    fn row_id(&self) -> RowId {
        self.0.row_id()
    }
}

/// Something the caller should know about a merge, but not fail on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeWarning {
    /// Not a single row matched
    NoMatches,
    /// Some rows had no partner on the other side
    Unmatched {
        /// Original rows without a result
        original: usize,
        /// Results without an original row
        results: usize,
    },
}

impl Display for MergeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatches => write!(f, "No matching records found between the datasets"),
            Self::Unmatched { original, results } => write!(
                f,
                "{original} original row(s) without result and {results} result(s) without original row were dropped"
            ),
        }
    }
}

/// Rows that matched plus everything that did not
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome<L, R> {
    /// Matched pairs, in the order of the original rows
    pub rows: Vec<(L, R)>,
    /// Original rows without a result
    pub unmatched_original: Vec<RowId>,
    /// Results without an original row, or duplicate results for a row
    pub unmatched_results: Vec<RowId>,
}

impl<L, R> MergeOutcome<L, R> {
    /// The warning to report for this merge, if any
    #[must_use]
    pub fn warning(&self) -> Option<MergeWarning> {
        if self.rows.is_empty() {
            Some(MergeWarning::NoMatches)
        } else if self.unmatched_original.is_empty() && self.unmatched_results.is_empty() {
            None
        } else {
            Some(MergeWarning::Unmatched {
                original: self.unmatched_original.len(),
                results: self.unmatched_results.len(),
            })
        }
    }
}

/// Inner join of `results` onto `original` by row id.
///
/// Rows without a partner are dropped and reported in the outcome. An empty
/// join is a warning, not an error. If several results share a row id the
/// first one wins.
pub fn merge<L, R>(original: Vec<L>, results: Vec<R>) -> MergeOutcome<L, R>
where
    L: Keyed,
    R: Keyed,
{
    let outcome = join(original, results);
    if let Some(warning) = outcome.warning() {
        warn!("{warning}");
    }
    outcome
}

/// Like [`merge`], but silent.
///
/// For joins that are expected to be incomplete, such as the results of a
/// run that is still in progress.
pub fn join<L, R>(original: Vec<L>, results: Vec<R>) -> MergeOutcome<L, R>
where
    L: Keyed,
    R: Keyed,
{
    let mut by_row: HashMap<RowId, R> = HashMap::with_capacity(results.len());
    let mut unmatched_results = Vec::new();
    for result in results {
        let id = result.row_id();
        if by_row.contains_key(&id) {
            unmatched_results.push(id);
        } else {
            by_row.insert(id, result);
        }
    }

    let mut rows = Vec::with_capacity(original.len());
    let mut unmatched_original = Vec::new();
    for row in original {
        match by_row.remove(&row.row_id()) {
            Some(result) => rows.push((row, result)),
            None => unmatched_original.push(row.row_id()),
        }
    }

    unmatched_results.extend(by_row.into_keys());
    unmatched_results.sort_unstable();

    MergeOutcome {
        rows,
        unmatched_original,
        unmatched_results,
    }
}
