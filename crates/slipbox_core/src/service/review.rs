//! Review helpers over the corpus store.
//!
//! # Responsibility
//! - Apply many review decisions at once without aborting on conflicts.
//! - List high-score skips worth a second look.
//! - Resolve partial ids typed by a reviewer.
//!
//! # Invariants
//! - Batch decisions are last-writer-wins; every overwrite of a decided
//!   entry is reported back and logged by the store.

use crate::config::ScoringProfile;
use crate::model::entry::{CorpusEntry, EntryId};
use crate::repo::entry_repo::{
    ConflictError, CorpusStore, DispositionOutcome, DispositionRequest, EntryListQuery, StoreError,
    StoreResult,
};
use log::info;

/// Outcome of [`record_review_batch`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Requests that were written, in request order.
    pub applied: Vec<EntryId>,
    /// Decided entries that were overwritten by this batch.
    pub conflicts: Vec<ConflictError>,
    /// Requests naming ids the store does not know.
    pub not_found: Vec<EntryId>,
}

/// Records `requests` in order, overwriting earlier decisions.
///
/// Unknown ids are collected instead of failing the batch; any other store
/// error aborts it.
pub fn record_review_batch<S: CorpusStore>(
    store: &S,
    requests: &[DispositionRequest],
) -> StoreResult<BatchReport> {
    let mut report = BatchReport::default();
    for request in requests {
        let request = request.clone().overriding();
        match store.set_disposition(&request) {
            Ok(DispositionOutcome::Applied) => report.applied.push(request.id),
            Ok(DispositionOutcome::Overridden { previous }) => {
                report.conflicts.push(ConflictError {
                    id: request.id.clone(),
                    current: previous,
                    requested: request.disposition,
                });
                report.applied.push(request.id);
            }
            Err(StoreError::NotFound(id)) => report.not_found.push(id),
            Err(err) => return Err(err),
        }
    }

    info!(
        "event=review_batch module=service status=ok applied={} conflicts={} not_found={}",
        report.applied.len(),
        report.conflicts.len(),
        report.not_found.len()
    );
    Ok(report)
}

/// Skipped entries scoring at or above the profile's review threshold,
/// highest first.
pub fn review_high_score_skips<S: CorpusStore>(
    store: &S,
    profile: &ScoringProfile,
    limit: u32,
) -> StoreResult<Vec<CorpusEntry>> {
    store.list_high_score_skips(profile.config().feedback.review_skip_threshold, limit)
}

/// Result of resolving a reviewer-typed id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdMatch {
    Found(EntryId),
    Ambiguous(Vec<EntryId>),
    NotFound,
}

/// Resolves `fragment` to an entry id: an exact id wins, otherwise the
/// fragment must occur in exactly one id.
pub fn resolve_entry_id<S: CorpusStore>(store: &S, fragment: &str) -> StoreResult<IdMatch> {
    if store.get_entry(fragment)?.is_some() {
        return Ok(IdMatch::Found(fragment.to_string()));
    }

    let mut matches = store
        .list_entries(&EntryListQuery::default())?
        .into_iter()
        .map(|entry| entry.id)
        .filter(|id| id.contains(fragment))
        .collect::<Vec<_>>();
    matches.sort();

    Ok(match matches.len() {
        0 => IdMatch::NotFound,
        1 => IdMatch::Found(matches.remove(0)),
        _ => IdMatch::Ambiguous(matches),
    })
}
