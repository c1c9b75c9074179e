//! Corpus entry store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist every document's last score, breakdown and review disposition.
//! - Serialize writes so concurrent workers never lose each other's updates.
//!
//! # Invariants
//! - Every write runs inside one `IMMEDIATE` transaction; a crash leaves
//!   either the old or the new row, never a partial one.
//! - `upsert_score` is a no-op for decided entries.
//! - A disposition write on a decided entry is either rejected with a
//!   `ConflictError` or, with the override flag, applied last-writer-wins.
//!   Both paths record a conflict row and log a warning.
//! - Read paths reject unreadable rows instead of guessing.

use crate::db::DbError;
use crate::model::breakdown::{ScoreBreakdown, ScoreReason};
use crate::model::entry::{CorpusEntry, Disposition, EntryId, EntrySeed, ScoreUpdate};
use chrono::NaiveDate;
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    source_path,
    created_on,
    score,
    reason,
    breakdown,
    disposition,
    disposition_reason,
    output_refs,
    config_version,
    last_scored_at,
    decided_at
FROM corpus_entries";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Labels of the unscored score distribution, highest band first.
const DISTRIBUTION_LABELS: [&str; 6] = ["50+", "40-49", "30-39", "20-29", "10-19", "0-9"];

pub type StoreResult<T> = Result<T, StoreError>;

/// Raised when a disposition write targets an already decided entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictError {
    pub id: EntryId,
    pub current: Disposition,
    pub requested: Disposition,
}

impl Display for ConflictError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "entry `{}` is already decided as {}; refusing to record {} without override",
            self.id, self.current, self.requested
        )
    }
}

impl Error for ConflictError {}

/// Store error for corpus persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    NotFound(EntryId),
    Conflict(ConflictError),
    InvalidTransition {
        id: EntryId,
        from: Disposition,
        to: Disposition,
    },
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "corpus entry not found: {id}"),
            Self::Conflict(err) => write!(f, "{err}"),
            Self::InvalidTransition { id, from, to } => {
                write!(f, "entry `{id}` cannot move from {from} to {to}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted entry data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Conflict(err) => Some(err),
            Self::NotFound(_) | Self::InvalidTransition { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a score write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Score stored; `previous_score` is `None` for a new entry.
    Written { previous_score: Option<u32> },
    /// Entry is decided; nothing was written.
    Protected { disposition: Disposition },
}

/// One review decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionRequest {
    pub id: EntryId,
    pub disposition: Disposition,
    pub reason: Option<String>,
    pub output_refs: Vec<String>,
    /// Allows replacing an existing decision (last writer wins).
    pub override_existing: bool,
}

impl DispositionRequest {
    pub fn new(id: impl Into<EntryId>, disposition: Disposition) -> Self {
        Self {
            id: id.into(),
            disposition,
            reason: None,
            output_refs: Vec::new(),
            override_existing: false,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_output_refs(mut self, refs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.output_refs = refs.into_iter().map(Into::into).collect();
        self
    }

    pub fn overriding(mut self) -> Self {
        self.override_existing = true;
        self
    }
}

/// Result of an accepted disposition write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispositionOutcome {
    Applied,
    Overridden { previous: Disposition },
}

/// How a recorded conflict was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    Rejected,
    Overwritten,
}

impl ConflictResolution {
    fn as_str(self) -> &'static str {
        match self {
            Self::Rejected => "rejected",
            Self::Overwritten => "overwritten",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "rejected" => Some(Self::Rejected),
            "overwritten" => Some(Self::Overwritten),
            _ => None,
        }
    }
}

/// Audit row for a disposition write that hit a decided entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispositionConflict {
    pub entry_id: EntryId,
    pub previous: Disposition,
    pub requested: Disposition,
    pub resolution: ConflictResolution,
    /// Epoch milliseconds.
    pub recorded_at: i64,
}

/// Query options for listing entries.
#[derive(Debug, Clone, Default)]
pub struct EntryListQuery {
    pub disposition: Option<Disposition>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Processing totals across the corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorpusStats {
    pub total: usize,
    pub gold: usize,
    pub skip: usize,
    pub pending: usize,
}

impl CorpusStats {
    pub fn processed(&self) -> usize {
        self.gold + self.skip
    }

    /// Share of decided entries marked gold, `None` before any decision.
    pub fn gold_rate(&self) -> Option<f64> {
        let processed = self.processed();
        (processed > 0).then(|| self.gold as f64 / processed as f64)
    }
}

/// Count of unscored entries in one score band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreBucket {
    pub label: &'static str,
    pub count: usize,
}

/// Repository interface for corpus entries.
pub trait CorpusStore {
    /// Inserts an unscored entry when absent; refreshes source metadata
    /// otherwise. Returns `true` when the entry was created.
    fn register_entry(&self, seed: &EntrySeed) -> StoreResult<bool>;
    /// Writes a fresh score unless the entry is decided.
    fn upsert_score(&self, id: &str, breakdown: &ScoreBreakdown) -> StoreResult<UpsertOutcome>;
    /// Registers and scores many entries in one transaction. Entries created
    /// by the batch report `previous_score: None`.
    fn apply_score_batch(&self, updates: &[ScoreUpdate]) -> StoreResult<Vec<UpsertOutcome>>;
    /// Records a review decision.
    fn set_disposition(&self, request: &DispositionRequest) -> StoreResult<DispositionOutcome>;
    /// Moves a skipped entry back to unscored for re-review.
    fn reopen_skip(&self, id: &str) -> StoreResult<()>;
    fn get_entry(&self, id: &str) -> StoreResult<Option<CorpusEntry>>;
    /// Highest-score unscored entries, oldest first on ties.
    fn get_top_unscored(&self, n: u32) -> StoreResult<Vec<CorpusEntry>>;
    fn list_entries(&self, query: &EntryListQuery) -> StoreResult<Vec<CorpusEntry>>;
    /// Skipped entries at or above `min_score`, highest first.
    fn list_high_score_skips(&self, min_score: u32, limit: u32) -> StoreResult<Vec<CorpusEntry>>;
    fn stats(&self) -> StoreResult<CorpusStats>;
    /// Unscored entries per score band, highest band first.
    fn score_distribution(&self) -> StoreResult<Vec<ScoreBucket>>;
    fn list_conflicts(&self) -> StoreResult<Vec<DispositionConflict>>;
    /// Inserts a complete entry when absent. Returns `true` when inserted.
    fn import_entry(&self, entry: &CorpusEntry) -> StoreResult<bool>;
}

/// SQLite-backed corpus store.
pub struct SqliteCorpusStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCorpusStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn write_tx(&self) -> StoreResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    fn query_entries(&self, sql: &str, bind_values: Vec<Value>) -> StoreResult<Vec<CorpusEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }
}

impl CorpusStore for SqliteCorpusStore<'_> {
    fn register_entry(&self, seed: &EntrySeed) -> StoreResult<bool> {
        let tx = self.write_tx()?;
        let created = register_in_tx(&tx, seed)?;
        tx.commit()?;
        Ok(created)
    }

    fn upsert_score(&self, id: &str, breakdown: &ScoreBreakdown) -> StoreResult<UpsertOutcome> {
        let tx = self.write_tx()?;
        let outcome = upsert_in_tx(&tx, id, breakdown)?;
        tx.commit()?;
        Ok(outcome)
    }

    fn apply_score_batch(&self, updates: &[ScoreUpdate]) -> StoreResult<Vec<UpsertOutcome>> {
        let tx = self.write_tx()?;
        let mut outcomes = Vec::with_capacity(updates.len());
        for update in updates {
            let created = register_in_tx(&tx, &update.seed)?;
            let outcome = match upsert_in_tx(&tx, &update.seed.id, &update.breakdown)? {
                UpsertOutcome::Written { .. } if created => UpsertOutcome::Written {
                    previous_score: None,
                },
                outcome => outcome,
            };
            outcomes.push(outcome);
        }
        tx.commit()?;
        Ok(outcomes)
    }

    fn set_disposition(&self, request: &DispositionRequest) -> StoreResult<DispositionOutcome> {
        let tx = self.write_tx()?;
        let current = current_disposition(&tx, &request.id)?;

        if request.disposition == Disposition::Unscored {
            if !request.override_existing {
                return Err(StoreError::InvalidTransition {
                    id: request.id.clone(),
                    from: current,
                    to: Disposition::Unscored,
                });
            }
            reopen_in_tx(&tx, &request.id)?;
            tx.commit()?;
            info!(
                "event=disposition_reopen module=repo status=ok id={} previous={}",
                request.id, current
            );
            return Ok(if current.is_decided() {
                DispositionOutcome::Overridden { previous: current }
            } else {
                DispositionOutcome::Applied
            });
        }

        if current.is_decided() {
            if !request.override_existing {
                record_conflict(&tx, request, current, ConflictResolution::Rejected)?;
                tx.commit()?;
                warn!(
                    "event=disposition_conflict module=repo status=warn resolution=rejected id={} current={} requested={}",
                    request.id, current, request.disposition
                );
                return Err(StoreError::Conflict(ConflictError {
                    id: request.id.clone(),
                    current,
                    requested: request.disposition,
                }));
            }

            write_decision(&tx, request)?;
            record_conflict(&tx, request, current, ConflictResolution::Overwritten)?;
            tx.commit()?;
            warn!(
                "event=disposition_conflict module=repo status=warn resolution=overwritten id={} previous={} requested={}",
                request.id, current, request.disposition
            );
            return Ok(DispositionOutcome::Overridden { previous: current });
        }

        write_decision(&tx, request)?;
        tx.commit()?;
        info!(
            "event=disposition_set module=repo status=ok id={} disposition={} output_refs={}",
            request.id,
            request.disposition,
            request.output_refs.len()
        );
        Ok(DispositionOutcome::Applied)
    }

    fn reopen_skip(&self, id: &str) -> StoreResult<()> {
        let tx = self.write_tx()?;
        let current = current_disposition(&tx, id)?;
        if current != Disposition::Skip {
            return Err(StoreError::InvalidTransition {
                id: id.to_string(),
                from: current,
                to: Disposition::Unscored,
            });
        }
        reopen_in_tx(&tx, id)?;
        tx.commit()?;
        info!("event=disposition_reopen module=repo status=ok id={id} previous=skip");
        Ok(())
    }

    fn get_entry(&self, id: &str) -> StoreResult<Option<CorpusEntry>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_entry_row(row)?));
        }
        Ok(None)
    }

    fn get_top_unscored(&self, n: u32) -> StoreResult<Vec<CorpusEntry>> {
        self.query_entries(
            &format!(
                "{ENTRY_SELECT_SQL}
                 WHERE disposition = 'unscored'
                   AND reason != 'malformed'
                 ORDER BY score DESC, created_on IS NULL, created_on ASC, id ASC
                 LIMIT ?;"
            ),
            vec![Value::Integer(i64::from(n))],
        )
    }

    fn list_entries(&self, query: &EntryListQuery) -> StoreResult<Vec<CorpusEntry>> {
        let mut sql = format!("{ENTRY_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(disposition) = query.disposition {
            sql.push_str(" AND disposition = ?");
            bind_values.push(Value::Text(disposition.as_str().to_string()));
        }

        sql.push_str(" ORDER BY score DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.query_entries(&sql, bind_values)
    }

    fn list_high_score_skips(&self, min_score: u32, limit: u32) -> StoreResult<Vec<CorpusEntry>> {
        self.query_entries(
            &format!(
                "{ENTRY_SELECT_SQL}
                 WHERE disposition = 'skip'
                   AND score >= ?
                 ORDER BY score DESC, id ASC
                 LIMIT ?;"
            ),
            vec![
                Value::Integer(i64::from(min_score)),
                Value::Integer(i64::from(limit)),
            ],
        )
    }

    fn stats(&self) -> StoreResult<CorpusStats> {
        let (total, gold, skip, pending) = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(disposition = 'gold'), 0),
                COALESCE(SUM(disposition = 'skip'), 0),
                COALESCE(SUM(disposition = 'unscored'), 0)
             FROM corpus_entries;",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;

        Ok(CorpusStats {
            total: count_from_db(total)?,
            gold: count_from_db(gold)?,
            skip: count_from_db(skip)?,
            pending: count_from_db(pending)?,
        })
    }

    fn score_distribution(&self) -> StoreResult<Vec<ScoreBucket>> {
        let mut counts = [0usize; DISTRIBUTION_LABELS.len()];
        let mut stmt = self.conn.prepare(
            "SELECT MIN(score / 10, 5) AS band, COUNT(*)
             FROM corpus_entries
             WHERE disposition = 'unscored'
             GROUP BY band;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let band = count_from_db(row.get::<_, i64>(0)?)?;
            let count = count_from_db(row.get::<_, i64>(1)?)?;
            // Band 5 ("50+") is the first label.
            let slot = DISTRIBUTION_LABELS.len() - 1 - band.min(DISTRIBUTION_LABELS.len() - 1);
            counts[slot] += count;
        }

        Ok(DISTRIBUTION_LABELS
            .into_iter()
            .zip(counts)
            .map(|(label, count)| ScoreBucket { label, count })
            .collect())
    }

    fn list_conflicts(&self) -> StoreResult<Vec<DispositionConflict>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, previous, requested, resolution, recorded_at
             FROM disposition_conflicts
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut conflicts = Vec::new();
        while let Some(row) = rows.next()? {
            let resolution_text: String = row.get("resolution")?;
            conflicts.push(DispositionConflict {
                entry_id: row.get("entry_id")?,
                previous: parse_disposition(&row.get::<_, String>("previous")?)?,
                requested: parse_disposition(&row.get::<_, String>("requested")?)?,
                resolution: ConflictResolution::parse(&resolution_text).ok_or_else(|| {
                    StoreError::InvalidData(format!(
                        "invalid resolution `{resolution_text}` in disposition_conflicts.resolution"
                    ))
                })?,
                recorded_at: row.get("recorded_at")?,
            });
        }
        Ok(conflicts)
    }

    fn import_entry(&self, entry: &CorpusEntry) -> StoreResult<bool> {
        let breakdown_json = entry.breakdown.as_ref().map(to_json).transpose()?;
        let output_refs_json = to_json(&entry.output_refs)?;

        let tx = self.write_tx()?;
        let changed = tx.execute(
            "INSERT OR IGNORE INTO corpus_entries (
                id,
                source_path,
                created_on,
                score,
                reason,
                breakdown,
                disposition,
                disposition_reason,
                output_refs,
                config_version,
                last_scored_at,
                decided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
            params![
                entry.id,
                entry.source_path,
                entry.created_on.map(format_date),
                entry.score,
                entry.reason.as_str(),
                breakdown_json,
                entry.disposition.as_str(),
                entry.disposition_reason,
                output_refs_json,
                entry.config_version,
                entry.last_scored_at,
                entry.decided_at,
            ],
        )?;
        tx.commit()?;
        Ok(changed == 1)
    }
}

fn register_in_tx(tx: &Transaction<'_>, seed: &EntrySeed) -> StoreResult<bool> {
    let created = tx.execute(
        "INSERT OR IGNORE INTO corpus_entries (id, source_path, created_on)
         VALUES (?1, ?2, ?3);",
        params![seed.id, seed.source_path, seed.created_on.map(format_date)],
    )?;
    if created == 0 {
        tx.execute(
            "UPDATE corpus_entries
             SET
                source_path = COALESCE(?2, source_path),
                created_on = COALESCE(?3, created_on)
             WHERE id = ?1;",
            params![seed.id, seed.source_path, seed.created_on.map(format_date)],
        )?;
    }
    Ok(created == 1)
}

fn upsert_in_tx(
    tx: &Transaction<'_>,
    id: &str,
    breakdown: &ScoreBreakdown,
) -> StoreResult<UpsertOutcome> {
    let breakdown_json = to_json(breakdown)?;
    let existing = tx
        .query_row(
            "SELECT disposition, score FROM corpus_entries WHERE id = ?1;",
            [id],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)),
        )
        .optional()?;

    let previous_score = match existing {
        Some((disposition_text, score)) => {
            let disposition = parse_disposition(&disposition_text)?;
            if disposition.is_decided() {
                return Ok(UpsertOutcome::Protected { disposition });
            }
            Some(score)
        }
        None => {
            tx.execute("INSERT INTO corpus_entries (id) VALUES (?1);", [id])?;
            None
        }
    };

    tx.execute(
        "UPDATE corpus_entries
         SET
            score = ?2,
            reason = ?3,
            breakdown = ?4,
            config_version = ?5,
            last_scored_at = (strftime('%s', 'now') * 1000),
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1
           AND disposition = 'unscored';",
        params![
            id,
            breakdown.total_score,
            breakdown.reason.as_str(),
            breakdown_json,
            breakdown.config_version,
        ],
    )?;

    Ok(UpsertOutcome::Written { previous_score })
}

fn current_disposition(tx: &Transaction<'_>, id: &str) -> StoreResult<Disposition> {
    let text = tx
        .query_row(
            "SELECT disposition FROM corpus_entries WHERE id = ?1;",
            [id],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    parse_disposition(&text)
}

fn write_decision(tx: &Transaction<'_>, request: &DispositionRequest) -> StoreResult<()> {
    tx.execute(
        "UPDATE corpus_entries
         SET
            disposition = ?2,
            disposition_reason = ?3,
            output_refs = ?4,
            decided_at = (strftime('%s', 'now') * 1000),
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        params![
            request.id,
            request.disposition.as_str(),
            request.reason,
            to_json(&request.output_refs)?,
        ],
    )?;
    Ok(())
}

fn reopen_in_tx(tx: &Transaction<'_>, id: &str) -> StoreResult<()> {
    tx.execute(
        "UPDATE corpus_entries
         SET
            disposition = 'unscored',
            disposition_reason = NULL,
            output_refs = '[]',
            decided_at = NULL,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE id = ?1;",
        [id],
    )?;
    Ok(())
}

fn record_conflict(
    tx: &Transaction<'_>,
    request: &DispositionRequest,
    previous: Disposition,
    resolution: ConflictResolution,
) -> StoreResult<()> {
    tx.execute(
        "INSERT INTO disposition_conflicts (entry_id, previous, requested, resolution)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            request.id,
            previous.as_str(),
            request.disposition.as_str(),
            resolution.as_str(),
        ],
    )?;
    Ok(())
}

fn parse_entry_row(row: &Row<'_>) -> StoreResult<CorpusEntry> {
    let id: String = row.get("id")?;

    let created_on = match row.get::<_, Option<String>>("created_on")? {
        Some(text) => Some(NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|_| {
            StoreError::InvalidData(format!(
                "invalid date `{text}` in corpus_entries.created_on for `{id}`"
            ))
        })?),
        None => None,
    };

    let reason_text: String = row.get("reason")?;
    let reason = ScoreReason::parse(&reason_text).ok_or_else(|| {
        StoreError::InvalidData(format!(
            "invalid reason `{reason_text}` in corpus_entries.reason for `{id}`"
        ))
    })?;

    let breakdown = match row.get::<_, Option<String>>("breakdown")? {
        Some(json) => Some(serde_json::from_str::<ScoreBreakdown>(&json).map_err(|err| {
            StoreError::InvalidData(format!(
                "unreadable breakdown for `{id}` in corpus_entries.breakdown: {err}"
            ))
        })?),
        None => None,
    };

    let output_refs_json: String = row.get("output_refs")?;
    let output_refs = serde_json::from_str::<Vec<String>>(&output_refs_json).map_err(|err| {
        StoreError::InvalidData(format!(
            "unreadable output refs for `{id}` in corpus_entries.output_refs: {err}"
        ))
    })?;

    Ok(CorpusEntry {
        source_path: row.get("source_path")?,
        created_on,
        score: row.get("score")?,
        reason,
        breakdown,
        disposition: parse_disposition(&row.get::<_, String>("disposition")?)?,
        disposition_reason: row.get("disposition_reason")?,
        output_refs,
        config_version: row.get("config_version")?,
        last_scored_at: row.get("last_scored_at")?,
        decided_at: row.get("decided_at")?,
        id,
    })
}

fn parse_disposition(value: &str) -> StoreResult<Disposition> {
    Disposition::parse(value)
        .ok_or_else(|| StoreError::InvalidData(format!("invalid disposition `{value}`")))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> StoreResult<String> {
    serde_json::to_string(value)
        .map_err(|err| StoreError::InvalidData(format!("failed to encode entry data: {err}")))
}

fn count_from_db(value: i64) -> StoreResult<usize> {
    usize::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("negative count `{value}` in corpus_entries")))
}
