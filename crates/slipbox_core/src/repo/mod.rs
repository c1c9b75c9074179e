//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the corpus store contract used by scoring drivers and review
//!   workers.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Scores of decided entries are never overwritten by the scoring path.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod entry_repo;
