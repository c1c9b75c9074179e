//! JSON manifest snapshots.
//!
//! # Responsibility
//! - Export the corpus store as a human-readable JSON snapshot.
//! - Import snapshots and the legacy processing manifest into a store.
//!
//! # Invariants
//! - Exports are written to a temp file beside the target and renamed into
//!   place; readers never observe a half-written snapshot.
//! - Imports never overwrite entries that already exist in the store.

use crate::model::breakdown::{ScoreBreakdown, ScoreMetrics, ScoreReason};
use crate::model::document::created_on_from_file_name;
use crate::model::entry::{CorpusEntry, Disposition};
use crate::repo::entry_repo::{CorpusStats, CorpusStore, EntryListQuery, StoreError};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Config version stamped on breakdowns rebuilt from legacy metrics.
pub const LEGACY_CONFIG_VERSION: u32 = 0;

#[derive(Debug)]
pub enum ManifestError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    UnsupportedFormat(u32),
    Store(StoreError),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "manifest io failed for `{}`: {source}", path.display()),
            Self::Json { path, source } => {
                write!(f, "manifest `{}` is not valid JSON: {source}", path.display())
            }
            Self::UnsupportedFormat(version) => write!(
                f,
                "snapshot format {version} is newer than supported {SNAPSHOT_FORMAT_VERSION}"
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::UnsupportedFormat(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for ManifestError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub total: usize,
    pub processed: usize,
    pub gold: usize,
    pub skip: usize,
    pub pending: usize,
}

impl From<CorpusStats> for SnapshotStats {
    fn from(stats: CorpusStats) -> Self {
        Self {
            total: stats.total,
            processed: stats.processed(),
            gold: stats.gold,
            skip: stats.skip,
            pending: stats.pending,
        }
    }
}

/// Full store snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub exported_at: String,
    pub stats: SnapshotStats,
    /// Sorted by id.
    pub entries: Vec<CorpusEntry>,
}

/// Counts reported by the import functions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub already_present: usize,
}

/// Writes a snapshot of every entry to `path` atomically.
pub fn export_snapshot<S: CorpusStore>(store: &S, path: impl AsRef<Path>) -> Result<Snapshot, ManifestError> {
    let path = path.as_ref();
    let mut entries = store.list_entries(&EntryListQuery::default())?;
    entries.sort_by(|a, b| a.id.cmp(&b.id));

    let snapshot = Snapshot {
        format_version: SNAPSHOT_FORMAT_VERSION,
        exported_at: Utc::now().to_rfc3339(),
        stats: store.stats()?.into(),
        entries,
    };
    write_json_atomically(path, &snapshot)?;

    info!(
        "event=manifest_export module=manifest status=ok entries={} path={}",
        snapshot.entries.len(),
        path.display()
    );
    Ok(snapshot)
}

/// Loads a snapshot written by [`export_snapshot`] into `store`.
pub fn import_snapshot<S: CorpusStore>(store: &S, path: impl AsRef<Path>) -> Result<ImportReport, ManifestError> {
    let path = path.as_ref();
    let snapshot: Snapshot = read_json(path)?;
    if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
        return Err(ManifestError::UnsupportedFormat(snapshot.format_version));
    }

    let report = import_all(store, &snapshot.entries)?;
    info!(
        "event=manifest_import module=manifest status=ok kind=snapshot inserted={} already_present={} path={}",
        report.inserted,
        report.already_present,
        path.display()
    );
    Ok(report)
}

#[derive(Debug, Deserialize)]
struct LegacyManifest {
    #[serde(default)]
    files: BTreeMap<String, LegacyEntry>,
}

#[derive(Debug, Deserialize)]
struct LegacyEntry {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    flowers_extracted: Vec<String>,
    #[serde(default)]
    processed_date: Option<String>,
    #[serde(default)]
    clusters_hit: Option<Vec<String>>,
    #[serde(default)]
    structural_hits: Option<usize>,
    #[serde(default)]
    novel_framing_hits: Option<usize>,
    #[serde(default)]
    density: Option<f64>,
    #[serde(default)]
    word_count: Option<usize>,
    #[serde(default)]
    turn_count: Option<usize>,
}

impl LegacyEntry {
    /// Metrics recorded by the old scorer, `None` when the entry carries none.
    fn metrics(&self) -> Option<ScoreMetrics> {
        let recorded = self.clusters_hit.is_some()
            || self.structural_hits.is_some()
            || self.novel_framing_hits.is_some()
            || self.density.is_some()
            || self.word_count.is_some()
            || self.turn_count.is_some();
        if !recorded {
            return None;
        }
        let clusters_hit = self.clusters_hit.clone().unwrap_or_default();
        Some(ScoreMetrics {
            word_count: self.word_count.unwrap_or(0),
            turn_count: self.turn_count.unwrap_or(0),
            density: self.density.unwrap_or(0.0),
            domain_hits: clusters_hit.len(),
            clusters_hit,
            generic_hits: 0,
            structural_hits: self.structural_hits.unwrap_or(0),
            novel_framing_hits: self.novel_framing_hits.unwrap_or(0),
            low_value_hits: 0,
        })
    }
}

/// Imports the JSON processing manifest kept by earlier tooling.
///
/// Legacy entries keep the metrics the old scorer recorded as a breakdown
/// without contributions, stamped with config version 0. Undecided entries
/// get a full breakdown on the next scan or rescore pass.
pub fn import_legacy_manifest<S: CorpusStore>(
    store: &S,
    path: impl AsRef<Path>,
) -> Result<ImportReport, ManifestError> {
    let path = path.as_ref();
    let legacy: LegacyManifest = read_json(path)?;

    let entries = legacy
        .files
        .into_iter()
        .map(|(name, legacy_entry)| legacy_to_entry(name, legacy_entry))
        .collect::<Vec<_>>();

    let report = import_all(store, &entries)?;
    info!(
        "event=manifest_import module=manifest status=ok kind=legacy inserted={} already_present={} path={}",
        report.inserted,
        report.already_present,
        path.display()
    );
    Ok(report)
}

fn legacy_to_entry(name: String, legacy: LegacyEntry) -> CorpusEntry {
    let disposition = match legacy.status.as_deref() {
        None => Disposition::Unscored,
        Some(status) => Disposition::parse(status).unwrap_or_else(|| {
            warn!(
                "event=manifest_import module=manifest status=warn id={name} reason=unknown_status value={status}"
            );
            Disposition::Unscored
        }),
    };
    let reason = match legacy.reason.as_deref() {
        Some("corrupted") => ScoreReason::Malformed,
        Some(text) => ScoreReason::parse(text).unwrap_or(ScoreReason::Neutral),
        None => ScoreReason::Neutral,
    };
    let decided_at = match disposition {
        Disposition::Unscored => None,
        Disposition::Gold | Disposition::Skip => legacy
            .processed_date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|at| at.and_utc().timestamp_millis()),
    };

    let score = legacy
        .score
        .map_or(0, |score| u32::try_from(score.max(0)).unwrap_or(u32::MAX));
    let breakdown = legacy.metrics().map(|metrics| ScoreBreakdown {
        config_version: LEGACY_CONFIG_VERSION,
        contributions: Vec::new(),
        layers: Vec::new(),
        raw_total: i64::from(score),
        total_score: score,
        reason,
        metrics,
    });

    let mut entry = CorpusEntry::unscored(name);
    entry.created_on = created_on_from_file_name(&entry.id);
    entry.source_path = legacy.path;
    entry.score = score;
    entry.reason = reason;
    entry.breakdown = breakdown;
    entry.disposition = disposition;
    entry.output_refs = legacy.flowers_extracted;
    entry.decided_at = decided_at;
    entry
}

fn import_all<S: CorpusStore>(store: &S, entries: &[CorpusEntry]) -> Result<ImportReport, ManifestError> {
    let mut report = ImportReport::default();
    for entry in entries {
        if store.import_entry(entry)? {
            report.inserted += 1;
        } else {
            report.already_present += 1;
        }
    }
    Ok(report)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ManifestError> {
    let file = std::fs::File::open(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ManifestError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json_atomically<T: Serialize>(path: &Path, value: &T) -> Result<(), ManifestError> {
    let io_err = |source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = NamedTempFile::new_in(parent).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| ManifestError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_err)?;
    }
    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|err| io_err(err.error))?;
    Ok(())
}
