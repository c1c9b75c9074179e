//! Domain model for scored conversation documents.
//!
//! # Responsibility
//! - Define the document, breakdown and corpus entry shapes shared by the
//!   scoring engine, the store and the feedback analyzer.
//!
//! # Invariants
//! - Every corpus record is identified by a stable `EntryId`.
//! - A breakdown is a pure function of (document, configuration).

pub mod breakdown;
pub mod document;
pub mod entry;
