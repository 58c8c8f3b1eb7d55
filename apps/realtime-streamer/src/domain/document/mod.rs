//! Document Source
//!
//! The fixed corpus every session replays. Loaded once at start-up and shared
//! read-only for the life of the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Dashboard page compiled into the binary.
const BUNDLED_DASHBOARD: &str = include_str!("../../../assets/dashboard.html");

/// Immutable corpus text.
#[derive(Debug, Clone)]
pub struct Document {
    text: Arc<str>,
    origin: String,
}

impl Document {
    /// Create a document from in-memory text.
    #[must_use]
    pub fn new(text: impl Into<Arc<str>>, origin: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: origin.into(),
        }
    }

    /// The corpus text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Size of the corpus in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the corpus is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Where the corpus came from (`bundled` or a file path).
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

/// Where to load the corpus from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DocumentSource {
    /// The dashboard page compiled into the binary.
    #[default]
    Bundled,
    /// A UTF-8 file read once at start-up.
    File(PathBuf),
}

impl DocumentSource {
    /// Select a source from an optional path.
    #[must_use]
    pub fn from_path(path: Option<&Path>) -> Self {
        path.map_or(Self::Bundled, |p| Self::File(p.to_path_buf()))
    }

    /// Load the corpus.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the file cannot be read or is empty.
    /// There is no fallback; callers treat this as fatal.
    pub async fn load(&self) -> Result<Document, DocumentError> {
        match self {
            Self::Bundled => Ok(Document::new(BUNDLED_DASHBOARD, "bundled")),
            Self::File(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| DocumentError::Unreadable {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                if text.is_empty() {
                    return Err(DocumentError::Empty { path: path.clone() });
                }
                Ok(Document::new(text, path.display().to_string()))
            }
        }
    }
}

/// Document loading errors.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read as UTF-8 text.
    #[error("cannot read document {}: {reason}", .path.display())]
    Unreadable {
        /// Document path.
        path: PathBuf,
        /// Underlying I/O error.
        reason: String,
    },

    /// File exists but has no content.
    #[error("document {} is empty", .path.display())]
    Empty {
        /// Document path.
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn bundled_document_is_dashboard() {
        let doc = DocumentSource::Bundled.load().await.unwrap();
        assert!(doc.text().starts_with("<!DOCTYPE html>"));
        assert!(doc.len() > 10_000);
        assert_eq!(doc.origin(), "bundled");
    }

    #[tokio::test]
    async fn file_document_loads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<p>hello</p>").unwrap();

        let source = DocumentSource::from_path(Some(file.path()));
        let doc = source.load().await.unwrap();
        assert_eq!(doc.text(), "<p>hello</p>");
        assert_eq!(doc.origin(), file.path().display().to_string());
    }

    #[tokio::test]
    async fn missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = DocumentSource::File(dir.path().join("missing.html"));
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, DocumentError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn empty_file_is_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = DocumentSource::File(file.path().to_path_buf())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, DocumentError::Empty { .. }));
    }

    #[test]
    fn source_defaults_to_bundled() {
        assert_eq!(DocumentSource::from_path(None), DocumentSource::Bundled);
        assert_eq!(DocumentSource::default(), DocumentSource::Bundled);
    }

    #[test]
    fn clones_share_text() {
        let doc = Document::new("abc", "test");
        let other = doc.clone();
        assert!(Arc::ptr_eq(&doc.text, &other.text));
        assert!(!doc.is_empty());
    }
}
