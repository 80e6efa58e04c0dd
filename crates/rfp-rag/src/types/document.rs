//! Document and chunk types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Source filename used when a document has none
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Already-extracted document text. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename or source identifier
    pub filename: Option<String>,
    /// Raw text
    text: String,
    /// SHA-256 of the text, hex encoded
    pub content_hash: String,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a document from text
    pub fn new(text: impl Into<String>, filename: Option<String>) -> Self {
        let text = text.into();
        let content_hash = hex::encode(Sha256::digest(text.as_bytes()));
        Self {
            id: Uuid::new_v4(),
            filename,
            text,
            content_hash,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Read a plain-text document; invalid UTF-8 is replaced lossily
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| Error::not_found(format!("{}: {}", path.display(), e)))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(Self::new(text, filename))
    }

    /// Document text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Filename, or `"unknown"`
    pub fn source_name(&self) -> &str {
        self.filename.as_deref().unwrap_or(UNKNOWN_SOURCE)
    }
}

/// A contiguous slice of a document's text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Sequence index within the chunking pass (0-based)
    pub index: usize,
    /// Text content
    pub text: String,
    /// Offset of the first word in the whitespace tokenisation of the source
    pub token_start: usize,
    /// Number of whitespace-separated words
    pub token_count: usize,
    /// Leading words shared with the previous chunk
    pub overlap_with_previous: usize,
}

impl Chunk {
    /// Words of this chunk that are not shared with the previous one
    pub fn fresh_tokens(&self) -> impl Iterator<Item = &str> {
        self.text.split_whitespace().skip(self.overlap_with_previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_content_hash_is_stable() {
        let a = Document::new("Budget is $500,000.", None);
        let b = Document::new("Budget is $500,000.", Some("rfp.txt".to_string()));
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.id, b.id);
        assert_eq!(a.source_name(), "unknown");
        assert_eq!(b.source_name(), "rfp.txt");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "The current system handles 10,000 transactions per day.").unwrap();

        let doc = Document::from_file(file.path()).unwrap();
        assert!(doc.text().starts_with("The current system"));
        assert!(doc.source_name().ends_with(".txt"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = Document::from_file("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_fresh_tokens_skip_overlap() {
        let chunk = Chunk {
            index: 1,
            text: "c d e f".to_string(),
            token_start: 2,
            token_count: 4,
            overlap_with_previous: 2,
        };
        assert_eq!(chunk.fresh_tokens().collect::<Vec<_>>(), vec!["e", "f"]);
    }
}
