//! Conversation document model.
//!
//! # Responsibility
//! - Hold immutable transcript text with derived word/turn metadata.
//! - Flag malformed exports so scoring can treat them as empty text.
//!
//! # Invariants
//! - Metrics are derived once at construction and never recomputed.
//! - A malformed document reports zero words and zero turns.

use chrono::NaiveDate;

use crate::model::entry::EntryId;

/// Marker left behind by broken exports where message parts were objects.
pub const CORRUPTION_MARKER: &str = "[object Object]";

const TURN_MARKERS: &[&str] = &["## User", "## Assistant"];

/// One conversation transcript as supplied by the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: EntryId,
    text: String,
    created_on: Option<NaiveDate>,
    word_count: usize,
    turn_count: usize,
    malformed: bool,
}

impl Document {
    /// Builds a document and derives word/turn counts from `text`.
    ///
    /// Text containing [`CORRUPTION_MARKER`] is kept but flagged malformed.
    pub fn new(id: impl Into<EntryId>, text: impl Into<String>, created_on: Option<NaiveDate>) -> Self {
        let text = text.into();
        if text.contains(CORRUPTION_MARKER) {
            return Self {
                id: id.into(),
                text,
                created_on,
                word_count: 0,
                turn_count: 0,
                malformed: true,
            };
        }

        let word_count = text.split_whitespace().count();
        let turn_count = TURN_MARKERS
            .iter()
            .map(|marker| text.matches(marker).count())
            .sum();

        Self {
            id: id.into(),
            text,
            created_on,
            word_count,
            turn_count,
            malformed: false,
        }
    }

    /// Placeholder for content the source could not read.
    pub fn unreadable(id: impl Into<EntryId>, created_on: Option<NaiveDate>) -> Self {
        Self {
            id: id.into(),
            text: String::new(),
            created_on,
            word_count: 0,
            turn_count: 0,
            malformed: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_on
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn turn_count(&self) -> usize {
        self.turn_count
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed
    }
}

/// Parses the `YYYY-MM-DD` prefix used by exported conversation file names.
pub fn created_on_from_file_name(name: &str) -> Option<NaiveDate> {
    let prefix = name.get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::{created_on_from_file_name, Document};
    use chrono::NaiveDate;

    #[test]
    fn derives_word_and_turn_counts() {
        let doc = Document::new(
            "a.md",
            "## User\nhow do I price this\n## Assistant\nstart from value",
            None,
        );
        assert_eq!(doc.turn_count(), 2);
        assert_eq!(doc.word_count(), 12);
        assert!(!doc.is_malformed());
    }

    #[test]
    fn corruption_marker_flags_document_as_malformed() {
        let doc = Document::new("b.md", "## User\n[object Object]\n", None);
        assert!(doc.is_malformed());
        assert_eq!(doc.word_count(), 0);
        assert_eq!(doc.turn_count(), 0);
    }

    #[test]
    fn parses_date_prefix_from_file_name() {
        assert_eq!(
            created_on_from_file_name("2024-03-09-pricing-strategy.md"),
            NaiveDate::from_ymd_opt(2024, 3, 9)
        );
        assert_eq!(created_on_from_file_name("notes.md"), None);
        assert_eq!(created_on_from_file_name("2024-13-40-bad.md"), None);
    }
}
