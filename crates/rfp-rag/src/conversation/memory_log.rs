//! Append-only memory log shared across conversations

use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Written to a new log file
pub const MEMORY_HEADER: &str =
    "# Agent Memory\n\nThis file stores learned experiences and facts from past interactions.\n";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One learned fact
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRecord {
    pub category: String,
    pub content: String,
    pub timestamp: DateTime<Local>,
}

impl MemoryRecord {
    /// `### category` heading, timestamp line, content
    pub fn render(&self) -> String {
        format!(
            "\n### {}\n**Recorded:** {}\n{}\n",
            self.category,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.content
        )
    }
}

/// Memory log held fully in memory and appended to its file on every record
#[derive(Debug)]
pub struct MemoryLog {
    path: Option<PathBuf>,
    content: String,
}

impl MemoryLog {
    /// Load the log at `path`, creating it with the standard header if missing
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = if path.exists() {
            std::fs::read_to_string(&path)?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, MEMORY_HEADER)?;
            tracing::info!("Created memory log at {}", path.display());
            MEMORY_HEADER.to_string()
        };

        Ok(Self {
            path: Some(path),
            content,
        })
    }

    /// Log that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            content: MEMORY_HEADER.to_string(),
        }
    }

    /// Full log text
    pub fn text(&self) -> &str {
        &self.content
    }

    /// True while nothing beyond the header has been recorded
    pub fn is_empty(&self) -> bool {
        let body = self.content.trim();
        body.is_empty() || body == MEMORY_HEADER.trim()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a record to the file, then to the in-memory copy
    pub fn record(&mut self, category: &str, content: &str) -> Result<MemoryRecord> {
        let category = category.trim();
        if category.is_empty() {
            return Err(Error::InvalidInput("memory category is empty".to_string()));
        }

        let record = MemoryRecord {
            category: category.to_string(),
            content: content.trim().to_string(),
            timestamp: Local::now(),
        };
        let entry = record.render();

        if let Some(path) = &self.path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(entry.as_bytes())?;
        }
        self.content.push_str(&entry);

        tracing::debug!("Recorded memory under '{}'", record.category);
        Ok(record)
    }
}
