//! Core domain logic for slipbox conversation triage.
//! This crate is the single source of truth for scoring and review invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod manifest;
pub mod model;
pub mod repo;
pub mod scoring;
pub mod service;
pub mod source;

pub use config::{ConfigError, ConfigValidationError, ScoringConfig, ScoringProfile};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::breakdown::{LayerId, ScoreBreakdown, ScoreReason, SignalContribution};
pub use model::document::Document;
pub use model::entry::{CorpusEntry, Disposition, EntryId};
pub use repo::entry_repo::{
    ConflictError, CorpusStore, DispositionOutcome, DispositionRequest, SqliteCorpusStore,
    StoreError, StoreResult, UpsertOutcome,
};
pub use scoring::score_document;
pub use service::feedback::{analyze, FeedbackFinding, FeedbackReport, FindingKind};
pub use service::rescore::{rescore, scan, RescoreReport, ScanReport};
pub use service::review::{record_review_batch, BatchReport};
pub use service::{ServiceError, ServiceResult};
pub use source::{DocumentSource, InMemorySource, MarkdownDirectory};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
