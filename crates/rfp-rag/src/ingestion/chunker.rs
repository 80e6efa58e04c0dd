//! Text chunking with word, window, sentence and paragraph policies

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// How text is split into chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ChunkPolicy {
    /// Consecutive groups of exactly `max_tokens` words
    Fixed { max_tokens: usize },
    /// Windows of `chunk_size` words advancing by `chunk_size - overlap`
    Overlapping { chunk_size: usize, overlap: usize },
    /// Whole sentences packed up to `max_words`
    Sentence { max_words: usize },
    /// Whole paragraphs packed up to `max_words`, long paragraphs split by words
    Paragraph { max_words: usize },
}

impl ChunkPolicy {
    /// Reject sizes that would never make progress
    pub fn validate(&self) -> Result<()> {
        match *self {
            ChunkPolicy::Fixed { max_tokens: 0 } => {
                Err(Error::config("max_tokens must be greater than 0"))
            }
            ChunkPolicy::Overlapping { chunk_size: 0, .. } => {
                Err(Error::config("chunk_size must be greater than 0"))
            }
            ChunkPolicy::Overlapping { chunk_size, overlap } if overlap >= chunk_size => {
                Err(Error::config(format!(
                    "overlap ({}) must be smaller than chunk_size ({})",
                    overlap, chunk_size
                )))
            }
            ChunkPolicy::Sentence { max_words: 0 } | ChunkPolicy::Paragraph { max_words: 0 } => {
                Err(Error::config("max_words must be greater than 0"))
            }
            _ => Ok(()),
        }
    }
}

/// Text chunker bound to one validated policy.
///
/// Empty or whitespace-only input yields no chunks under every policy.
#[derive(Debug, Clone)]
pub struct TextChunker {
    policy: ChunkPolicy,
}

impl TextChunker {
    /// Create a chunker, rejecting invalid sizes
    pub fn new(policy: ChunkPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> ChunkPolicy {
        self.policy
    }

    /// Split text into ordered chunks
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chunks = match self.policy {
            ChunkPolicy::Fixed { max_tokens } => split_fixed(text, max_tokens),
            ChunkPolicy::Overlapping { chunk_size, overlap } => {
                split_overlapping(text, chunk_size, overlap)
            }
            ChunkPolicy::Sentence { max_words } => split_sentences(text, max_words),
            ChunkPolicy::Paragraph { max_words } => split_paragraphs(text, max_words),
        };
        tracing::debug!("Chunked {} bytes into {} chunks ({:?})", text.len(), chunks.len(), self.policy);
        chunks
    }
}

/// Fixed-size word groups, no overlap
pub fn chunk_text(text: &str, max_tokens: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(ChunkPolicy::Fixed { max_tokens })?.chunk(text))
}

/// Overlapping word windows
pub fn chunk_text_with_overlap(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(ChunkPolicy::Overlapping { chunk_size, overlap })?.chunk(text))
}

/// Greedy sentence packing
pub fn chunk_by_sentences(text: &str, max_words: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(ChunkPolicy::Sentence { max_words })?.chunk(text))
}

/// Greedy paragraph packing
pub fn chunk_by_paragraphs(text: &str, max_words: usize) -> Result<Vec<Chunk>> {
    Ok(TextChunker::new(ChunkPolicy::Paragraph { max_words })?.chunk(text))
}

/// Assigns sequence indices as chunks are emitted
#[derive(Default)]
struct ChunkSink {
    chunks: Vec<Chunk>,
}

impl ChunkSink {
    fn push(&mut self, text: String, token_start: usize, token_count: usize, overlap: usize) {
        let index = self.chunks.len();
        self.chunks.push(Chunk {
            index,
            text,
            token_start,
            token_count,
            overlap_with_previous: overlap,
        });
    }
}

fn split_fixed(text: &str, max_tokens: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut sink = ChunkSink::default();
    push_fixed(&mut sink, &words, 0, max_tokens);
    sink.chunks
}

fn push_fixed(sink: &mut ChunkSink, words: &[&str], base: usize, max_tokens: usize) {
    for (i, group) in words.chunks(max_tokens).enumerate() {
        sink.push(group.join(" "), base + i * max_tokens, group.len(), 0);
    }
}

fn split_overlapping(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut sink = ChunkSink::default();
    if words.is_empty() {
        return sink.chunks;
    }

    let step = chunk_size - overlap;
    let mut start = 0usize;
    let mut previous_end = 0usize;

    loop {
        let end = (start + chunk_size).min(words.len());
        let shared = if start == 0 { 0 } else { previous_end.saturating_sub(start) };
        sink.push(words[start..end].join(" "), start, end - start, shared);

        if end >= words.len() {
            break;
        }
        previous_end = end;
        start += step;
    }

    sink.chunks
}

fn split_sentences(text: &str, max_words: usize) -> Vec<Chunk> {
    let sentences = text
        .split_sentence_bounds()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    pack(sentences, max_words, " ", false)
}

fn split_paragraphs(text: &str, max_words: usize) -> Vec<Chunk> {
    let paragraphs = paragraph_break()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty());
    pack(paragraphs, max_words, "\n\n", true)
}

/// Greedily packs units into chunks of at most `max_words` words.
///
/// An oversized unit becomes its own chunk, or is split into fixed word
/// groups when `split_oversized` is set.
fn pack<'a>(
    units: impl Iterator<Item = &'a str>,
    max_words: usize,
    separator: &str,
    split_oversized: bool,
) -> Vec<Chunk> {
    let mut sink = ChunkSink::default();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0usize;
    let mut current_start = 0usize;
    let mut consumed = 0usize;

    for unit in units {
        let unit_words = unit.split_whitespace().count();

        if current_words + unit_words <= max_words {
            if current.is_empty() {
                current_start = consumed;
            }
            current.push(unit);
            current_words += unit_words;
        } else {
            if !current.is_empty() {
                sink.push(current.join(separator), current_start, current_words, 0);
                current.clear();
                current_words = 0;
            }

            if split_oversized && unit_words > max_words {
                let words: Vec<&str> = unit.split_whitespace().collect();
                push_fixed(&mut sink, &words, consumed, max_words);
            } else {
                current.push(unit);
                current_words = unit_words;
                current_start = consumed;
            }
        }

        consumed += unit_words;
    }

    if !current.is_empty() {
        sink.push(current.join(separator), current_start, current_words, 0);
    }

    sink.chunks
}

/// Blank line(s) separating paragraphs
fn paragraph_break() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n[ \t\r\f\v]*\n\s*").expect("valid paragraph regex"))
}
