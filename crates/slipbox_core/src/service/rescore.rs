//! Scan and rescore drivers.
//!
//! # Responsibility
//! - Register and score every document a source exposes (`scan`).
//! - Re-apply the current profile to every undecided entry (`rescore`).
//!
//! # Invariants
//! - Decided entries are never rescored; entries that become decided while
//!   a pass is running are reported as protected.
//! - Documents are scored in parallel, but all results land in one store
//!   transaction, so a pass is all-or-nothing.
//! - Running `rescore` twice without a profile change reports no changes.

use crate::config::ScoringProfile;
use crate::model::document::Document;
use crate::model::entry::{Disposition, EntryId, EntrySeed, ScoreUpdate};
use crate::repo::entry_repo::{CorpusStore, EntryListQuery, UpsertOutcome};
use crate::scoring::score_document;
use crate::service::ServiceResult;
use crate::source::DocumentSource;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;

/// Score movement of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreChange {
    pub id: EntryId,
    pub previous: u32,
    pub current: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RescoreReport {
    /// Entries whose total score moved, in id order.
    pub changed: Vec<ScoreChange>,
    pub unchanged_count: usize,
    /// Entries the source no longer has; left untouched.
    pub missing: Vec<EntryId>,
    /// Entries decided while the pass was running.
    pub protected: Vec<EntryId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub new_entries: Vec<EntryId>,
    pub rescored: usize,
    pub skipped_decided: usize,
    /// Listed by the source but gone before they could be read.
    pub missing: Vec<EntryId>,
}

enum Loaded {
    Scored(ScoreUpdate),
    Missing(EntryId),
}

/// Re-applies `profile` to every unscored entry.
pub fn rescore<S, D>(store: &S, source: &D, profile: &ScoringProfile) -> ServiceResult<RescoreReport>
where
    S: CorpusStore,
    D: DocumentSource + Sync,
{
    let started_at = Instant::now();
    let entries = store.list_entries(&EntryListQuery {
        disposition: Some(Disposition::Unscored),
        ..EntryListQuery::default()
    })?;

    let seeds = entries
        .into_iter()
        .map(|entry| EntrySeed {
            id: entry.id,
            source_path: entry.source_path,
            created_on: entry.created_on,
        })
        .collect::<Vec<_>>();

    let (updates, missing) = load_and_score(source, profile, seeds);
    let outcomes = store.apply_score_batch(&updates)?;

    let mut report = RescoreReport {
        missing,
        ..RescoreReport::default()
    };
    for (update, outcome) in updates.iter().zip(outcomes) {
        let current = update.breakdown.total_score;
        match outcome {
            UpsertOutcome::Written {
                previous_score: Some(previous),
            } if previous != current => report.changed.push(ScoreChange {
                id: update.seed.id.clone(),
                previous,
                current,
            }),
            UpsertOutcome::Written { .. } => report.unchanged_count += 1,
            UpsertOutcome::Protected { .. } => report.protected.push(update.seed.id.clone()),
        }
    }
    report.changed.sort_by(|a, b| a.id.cmp(&b.id));

    info!(
        "event=rescore module=service status=ok config_version={} scored={} changed={} unchanged={} missing={} protected={} duration_ms={}",
        profile.version(),
        updates.len(),
        report.changed.len(),
        report.unchanged_count,
        report.missing.len(),
        report.protected.len(),
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

/// Registers every listed document and scores all undecided ones.
pub fn scan<S, D>(store: &S, source: &D, profile: &ScoringProfile) -> ServiceResult<ScanReport>
where
    S: CorpusStore,
    D: DocumentSource + Sync,
{
    let started_at = Instant::now();
    let known = store
        .list_entries(&EntryListQuery::default())?
        .into_iter()
        .map(|entry| (entry.id, entry.disposition))
        .collect::<HashMap<_, _>>();

    let mut report = ScanReport::default();
    let mut seeds = Vec::new();
    for document_ref in source.list()? {
        match known.get(&document_ref.id) {
            Some(disposition) if disposition.is_decided() => report.skipped_decided += 1,
            Some(_) => seeds.push(document_ref.seed()),
            None => {
                report.new_entries.push(document_ref.id.clone());
                seeds.push(document_ref.seed());
            }
        }
    }

    let (updates, missing) = load_and_score(source, profile, seeds);
    report.missing = missing;
    report
        .new_entries
        .retain(|id| !report.missing.contains(id));

    let outcomes = store.apply_score_batch(&updates)?;
    for (update, outcome) in updates.iter().zip(outcomes) {
        match outcome {
            UpsertOutcome::Written {
                previous_score: Some(_),
            } => report.rescored += 1,
            UpsertOutcome::Written {
                previous_score: None,
            } => {}
            UpsertOutcome::Protected { .. } => {
                report.skipped_decided += 1;
                report.new_entries.retain(|id| id != &update.seed.id);
            }
        }
    }

    info!(
        "event=scan module=service status=ok config_version={} new={} rescored={} skipped_decided={} missing={} duration_ms={}",
        profile.version(),
        report.new_entries.len(),
        report.rescored,
        report.skipped_decided,
        report.missing.len(),
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

fn load_and_score<D>(
    source: &D,
    profile: &ScoringProfile,
    seeds: Vec<EntrySeed>,
) -> (Vec<ScoreUpdate>, Vec<EntryId>)
where
    D: DocumentSource + Sync,
{
    let loaded = seeds
        .into_par_iter()
        .map(|seed| {
            let document = match source.load(&seed.id) {
                Ok(Some(document)) => document,
                Ok(None) => return Loaded::Missing(seed.id),
                Err(err) => {
                    warn!(
                        "event=document_load module=service status=warn id={} error={}",
                        seed.id, err
                    );
                    Document::unreadable(seed.id.clone(), seed.created_on)
                }
            };
            let breakdown = score_document(&document, profile);
            Loaded::Scored(ScoreUpdate { seed, breakdown })
        })
        .collect::<Vec<_>>();

    let mut updates = Vec::with_capacity(loaded.len());
    let mut missing = Vec::new();
    for item in loaded {
        match item {
            Loaded::Scored(update) => updates.push(update),
            Loaded::Missing(id) => {
                warn!("event=document_load module=service status=warn id={id} reason=missing");
                missing.push(id);
            }
        }
    }
    (updates, missing)
}
