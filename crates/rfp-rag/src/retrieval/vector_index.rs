//! File-backed vector index with brute-force cosine search

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::embeddings::{cosine_similarity, l2_norm};
use crate::error::{Error, Result};

/// Metadata stored next to each chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Source document name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Position of the chunk in its document
    #[serde(default, alias = "chunk_id", skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
    /// Any other caller-supplied fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl IndexMetadata {
    pub fn for_chunk(filename: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            filename: Some(filename.into()),
            chunk_index: Some(chunk_index),
            extra: serde_json::Map::new(),
        }
    }
}

/// One stored (text, vector, metadata) triple
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: IndexMetadata,
}

/// Search hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub entry: IndexEntry,
    /// Cosine similarity to the query
    pub score: f32,
    /// Insertion position in the index
    pub position: usize,
}

/// Index statistics
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub total_entries: usize,
    pub dimension: Option<usize>,
    pub storage_path: Option<PathBuf>,
    /// Size of the persisted file, 0 when absent
    pub storage_bytes: u64,
}

/// On-disk layout: three parallel arrays
#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedIndex {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadata: Vec<IndexMetadata>,
}

#[derive(Debug, Default)]
struct IndexState {
    entries: Vec<IndexEntry>,
    dimension: Option<usize>,
}

impl IndexState {
    fn check(&self, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::InvalidVector("empty vector".to_string()));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(Error::InvalidVector("vector has non-finite components".to_string()));
        }
        if let Some(expected) = self.dimension {
            if vector.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        if l2_norm(vector) == 0.0 {
            return Err(Error::InvalidVector("zero-magnitude vector".to_string()));
        }
        Ok(())
    }

    fn push(&mut self, text: String, vector: Vec<f32>, metadata: IndexMetadata) -> Result<()> {
        self.check(&vector)?;
        self.dimension = Some(vector.len());
        self.entries.push(IndexEntry {
            text,
            vector,
            metadata,
        });
        Ok(())
    }
}

/// Append-only store of chunk embeddings.
///
/// The whole index lives in memory and is rewritten to its JSON file after
/// every mutation. A single process is assumed to own the file.
pub struct VectorIndex {
    path: Option<PathBuf>,
    state: RwLock<IndexState>,
}

impl VectorIndex {
    /// Index that is never persisted
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(IndexState::default()),
        }
    }

    /// Load the index stored at `path`; a missing file is an empty index.
    ///
    /// A file that exists but cannot be read back is `CorruptIndex`, never
    /// silently replaced by an empty index.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let state = if path.exists() {
            let state = load(&path)?;
            tracing::info!(
                "Loaded vector index from {} ({} entries)",
                path.display(),
                state.entries.len()
            );
            state
        } else {
            tracing::info!("No vector index at {}, starting empty", path.display());
            IndexState::default()
        };

        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    /// Append one entry and persist
    pub fn add(&self, text: impl Into<String>, vector: Vec<f32>, metadata: IndexMetadata) -> Result<()> {
        let mut state = self.state.write();
        state.push(text.into(), vector, metadata)?;
        if let Err(e) = self.persist(&state) {
            // Keep memory and disk in step
            state.entries.pop();
            if state.entries.is_empty() {
                state.dimension = None;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Append a batch and persist once. All entries are validated before
    /// any is stored.
    pub fn extend(&self, entries: Vec<IndexEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.write();
        let mut staged = IndexState {
            entries: Vec::new(),
            dimension: state.dimension,
        };
        for entry in &entries {
            staged.check(&entry.vector)?;
            staged.dimension = Some(entry.vector.len());
        }

        let previous_len = state.entries.len();
        let previous_dimension = state.dimension;
        let added = entries.len();
        state.dimension = staged.dimension;
        state.entries.extend(entries);

        if let Err(e) = self.persist(&state) {
            state.entries.truncate(previous_len);
            state.dimension = previous_dimension;
            return Err(e);
        }

        tracing::debug!("Added {} entries to vector index", added);
        Ok(added)
    }

    /// Top `top_k` entries by cosine similarity, highest first; equal scores
    /// keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredEntry>> {
        let state = self.state.read();
        if state.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored = Vec::with_capacity(state.entries.len());
        for (position, entry) in state.entries.iter().enumerate() {
            let score = cosine_similarity(&entry.vector, query)?;
            scored.push((position, score));
        }

        // Stable sort, so ties stay in insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| ScoredEntry {
                entry: state.entries[position].clone(),
                score,
                position,
            })
            .collect())
    }

    /// Remove every entry and persist the empty index
    pub fn clear(&self) -> Result<()> {
        let mut state = self.state.write();
        let previous = std::mem::take(&mut *state);
        if let Err(e) = self.persist(&state) {
            *state = previous;
            return Err(e);
        }
        tracing::info!("Cleared vector index ({} entries removed)", previous.entries.len());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension shared by all stored vectors
    pub fn dimension(&self) -> Option<usize> {
        self.state.read().dimension
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn stats(&self) -> IndexStats {
        let state = self.state.read();
        let storage_bytes = self
            .path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        IndexStats {
            total_entries: state.entries.len(),
            dimension: state.dimension,
            storage_path: self.path.clone(),
            storage_bytes,
        }
    }

    /// Write through a temp file in the same directory, then rename over the target
    fn persist(&self, state: &IndexState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let persisted = PersistedIndex {
            chunks: state.entries.iter().map(|e| e.text.clone()).collect(),
            embeddings: state.entries.iter().map(|e| e.vector.clone()).collect(),
            metadata: state.entries.iter().map(|e| e.metadata.clone()).collect(),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, &persisted)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

fn load(path: &Path) -> Result<IndexState> {
    let corrupt = |message: String| Error::corrupt_index(path.display().to_string(), message);

    let raw = std::fs::read_to_string(path)?;
    let persisted: PersistedIndex =
        serde_json::from_str(&raw).map_err(|e| corrupt(e.to_string()))?;

    let n = persisted.chunks.len();
    if persisted.embeddings.len() != n || persisted.metadata.len() != n {
        return Err(corrupt(format!(
            "parallel arrays differ in length (chunks {}, embeddings {}, metadata {})",
            n,
            persisted.embeddings.len(),
            persisted.metadata.len()
        )));
    }

    let mut state = IndexState::default();
    for (i, ((text, vector), metadata)) in persisted
        .chunks
        .into_iter()
        .zip(persisted.embeddings)
        .zip(persisted.metadata)
        .enumerate()
    {
        state
            .push(text, vector, metadata)
            .map_err(|e| corrupt(format!("entry {}: {}", i, e)))?;
    }
    Ok(state)
}
