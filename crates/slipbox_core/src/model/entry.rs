//! Corpus entry model.
//!
//! # Responsibility
//! - Define the durable per-document record kept by the store.
//! - Define the review disposition lifecycle.
//!
//! # Invariants
//! - `disposition` moves `Unscored -> Gold | Skip` once; any other transition
//!   is an explicit override.
//! - `score`/`breakdown`/`config_version` only change while `Unscored`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::breakdown::{ScoreBreakdown, ScoreReason};

/// Stable document identifier (the source file name).
pub type EntryId = String;

/// Human or agent verdict on one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Not reviewed yet; still eligible for rescoring.
    Unscored,
    /// Reviewed and knowledge was extracted.
    Gold,
    /// Reviewed and nothing worth keeping was found.
    Skip,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unscored => "unscored",
            Self::Gold => "gold",
            Self::Skip => "skip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unscored" => Some(Self::Unscored),
            "gold" => Some(Self::Gold),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    pub fn is_decided(self) -> bool {
        self != Self::Unscored
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable record of one document's last score and review outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub id: EntryId,
    pub source_path: Option<String>,
    pub created_on: Option<NaiveDate>,
    pub score: u32,
    pub reason: ScoreReason,
    /// Absent for entries imported from a legacy manifest.
    pub breakdown: Option<ScoreBreakdown>,
    pub disposition: Disposition,
    pub disposition_reason: Option<String>,
    /// Identifiers of notes created from this document.
    pub output_refs: Vec<String>,
    pub config_version: u32,
    /// Epoch milliseconds.
    pub last_scored_at: Option<i64>,
    /// Epoch milliseconds.
    pub decided_at: Option<i64>,
}

impl CorpusEntry {
    /// Creates an unscored, never-scored entry.
    pub fn unscored(id: impl Into<EntryId>) -> Self {
        Self {
            id: id.into(),
            source_path: None,
            created_on: None,
            score: 0,
            reason: ScoreReason::Neutral,
            breakdown: None,
            disposition: Disposition::Unscored,
            disposition_reason: None,
            output_refs: Vec::new(),
            config_version: 0,
            last_scored_at: None,
            decided_at: None,
        }
    }

    /// Cluster names recorded in the stored breakdown.
    pub fn clusters_hit(&self) -> &[String] {
        match &self.breakdown {
            Some(breakdown) => &breakdown.metrics.clusters_hit,
            None => &[],
        }
    }
}

/// Registration data supplied when a document is first seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySeed {
    pub id: EntryId,
    pub source_path: Option<String>,
    pub created_on: Option<NaiveDate>,
}

/// One score write for a batch update.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreUpdate {
    pub seed: EntrySeed,
    pub breakdown: ScoreBreakdown,
}

#[cfg(test)]
mod tests {
    use super::Disposition;

    #[test]
    fn disposition_parse_is_case_insensitive() {
        assert_eq!(Disposition::parse(" Gold "), Some(Disposition::Gold));
        assert_eq!(Disposition::parse("SKIP"), Some(Disposition::Skip));
        assert_eq!(Disposition::parse("maybe"), None);
    }

    #[test]
    fn only_unscored_is_undecided() {
        assert!(!Disposition::Unscored.is_decided());
        assert!(Disposition::Gold.is_decided());
        assert!(Disposition::Skip.is_decided());
    }
}
