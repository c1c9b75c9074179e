//! Document sources consumed by the scan and rescore drivers.
//!
//! # Responsibility
//! - Define the seam through which transcripts reach the scoring engine.
//! - Provide a markdown-directory source and an in-memory source.
//!
//! # Invariants
//! - `list` returns references sorted by id.
//! - `load` returns `Ok(None)` for ids the source no longer has; it never
//!   invents content.

use crate::model::document::{created_on_from_file_name, Document};
use crate::model::entry::{EntryId, EntrySeed};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const MARKDOWN_EXTENSION: &str = "md";

/// Lightweight listing record for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: EntryId,
    pub source_path: Option<String>,
    pub created_on: Option<NaiveDate>,
}

impl DocumentRef {
    pub fn seed(&self) -> EntrySeed {
        EntrySeed {
            id: self.id.clone(),
            source_path: self.source_path.clone(),
            created_on: self.created_on,
        }
    }
}

#[derive(Debug)]
pub enum SourceError {
    Io { path: PathBuf, source: std::io::Error },
    InvalidId(String),
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
            Self::InvalidId(id) => write!(f, "invalid document id `{id}`"),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidId(_) => None,
        }
    }
}

/// Supplier of conversation documents.
pub trait DocumentSource {
    fn list(&self) -> Result<Vec<DocumentRef>, SourceError>;
    fn load(&self, id: &str) -> Result<Option<Document>, SourceError>;
}

/// One `.md` file per conversation, named `YYYY-MM-DD-slug.md`.
#[derive(Debug, Clone)]
pub struct MarkdownDirectory {
    root: PathBuf,
}

impl MarkdownDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, SourceError> {
        let plain = Path::new(id)
            .file_name()
            .is_some_and(|name| name == std::ffi::OsStr::new(id));
        if id.is_empty() || !plain {
            return Err(SourceError::InvalidId(id.to_string()));
        }
        Ok(self.root.join(id))
    }
}

impl DocumentSource for MarkdownDirectory {
    fn list(&self) -> Result<Vec<DocumentRef>, SourceError> {
        let io_err = |source| SourceError::Io {
            path: self.root.clone(),
            source,
        };

        let mut refs = Vec::new();
        for dir_entry in std::fs::read_dir(&self.root).map_err(io_err)? {
            let path = dir_entry.map_err(io_err)?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(MARKDOWN_EXTENSION)
            {
                continue;
            }
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            refs.push(DocumentRef {
                id: name.to_string(),
                created_on: created_on_from_file_name(name),
                source_path: Some(path.display().to_string()),
            });
        }
        refs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(refs)
    }

    fn load(&self, id: &str) -> Result<Option<Document>, SourceError> {
        let path = self.path_for(id)?;
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        let text = String::from_utf8_lossy(&bytes);
        Ok(Some(Document::new(
            id,
            text.into_owned(),
            created_on_from_file_name(id),
        )))
    }
}

/// Source backed by a map of id to text.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: BTreeMap<EntryId, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<EntryId>, text: impl Into<String>) {
        self.documents.insert(id.into(), text.into());
    }

    pub fn remove(&mut self, id: &str) -> Option<String> {
        self.documents.remove(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<I, T> FromIterator<(I, T)> for InMemorySource
where
    I: Into<EntryId>,
    T: Into<String>,
{
    fn from_iter<It: IntoIterator<Item = (I, T)>>(iter: It) -> Self {
        let mut source = Self::new();
        for (id, text) in iter {
            source.insert(id, text);
        }
        source
    }
}

impl DocumentSource for InMemorySource {
    fn list(&self) -> Result<Vec<DocumentRef>, SourceError> {
        Ok(self
            .documents
            .keys()
            .map(|id| DocumentRef {
                id: id.clone(),
                source_path: None,
                created_on: created_on_from_file_name(id),
            })
            .collect())
    }

    fn load(&self, id: &str) -> Result<Option<Document>, SourceError> {
        Ok(self
            .documents
            .get(id)
            .map(|text| Document::new(id, text.clone(), created_on_from_file_name(id))))
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentSource, InMemorySource, MarkdownDirectory, SourceError};
    use chrono::NaiveDate;

    #[test]
    fn markdown_directory_lists_only_markdown_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("2024-05-02-b.md"), "## User\nhi").unwrap();
        std::fs::write(dir.path().join("2024-05-01-a.md"), "## User\nhello").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let source = MarkdownDirectory::new(dir.path());
        let refs = source.list().unwrap();
        let ids = refs.iter().map(|r| r.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["2024-05-01-a.md", "2024-05-02-b.md"]);
        assert_eq!(refs[0].created_on, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn markdown_directory_reads_invalid_utf8_lossily() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.md"), b"## User\npricing \xff model").unwrap();

        let doc = MarkdownDirectory::new(dir.path())
            .load("x.md")
            .unwrap()
            .unwrap();
        assert_eq!(doc.turn_count(), 1);
        assert!(doc.text().contains("pricing"));
    }

    #[test]
    fn markdown_directory_reports_missing_and_rejects_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = MarkdownDirectory::new(dir.path());
        assert!(source.load("gone.md").unwrap().is_none());
        assert!(matches!(
            source.load("../escape.md"),
            Err(SourceError::InvalidId(_))
        ));
    }

    #[test]
    fn in_memory_source_round_trips_documents() {
        let source: InMemorySource = [("2023-01-01-a.md", "alpha"), ("b.md", "beta")]
            .into_iter()
            .collect();
        assert_eq!(source.list().unwrap().len(), 2);
        assert_eq!(source.load("b.md").unwrap().unwrap().text(), "beta");
        assert!(source.load("c.md").unwrap().is_none());
    }
}
