//! Heading-delimited knowledge document

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};

fn heading() -> &'static Regex {
    static HEADING: OnceLock<Regex> = OnceLock::new();
    HEADING.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").expect("valid heading regex"))
}

/// One `heading -> body` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeSection {
    pub heading: String,
    pub body: String,
}

/// Sections of a markdown knowledge document in document order.
///
/// Every heading level delimits a section; text before the first heading
/// is ignored. Lookup by heading is case-insensitive and exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    sections: Vec<KnowledgeSection>,
}

impl KnowledgeBase {
    pub fn parse(text: &str) -> Self {
        let mut kb = Self::default();
        let mut current: Option<String> = None;
        let mut lines: Vec<&str> = Vec::new();

        for line in text.lines() {
            if let Some(caps) = heading().captures(line) {
                if let Some(name) = current.take() {
                    kb.set(name, lines.join("\n").trim().to_string());
                }
                current = Some(caps[2].trim().to_string());
                lines.clear();
            } else if current.is_some() {
                lines.push(line);
            }
        }
        if let Some(name) = current {
            kb.set(name, lines.join("\n").trim().to_string());
        }
        kb
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::not_found(format!("knowledge document {}: {}", path.display(), e))
        })?;
        let kb = Self::parse(&text);
        tracing::info!("Loaded {} sections from {}", kb.len(), path.display());
        Ok(kb)
    }

    /// A repeated heading replaces the earlier body but keeps its position
    fn set(&mut self, heading: String, body: String) {
        match self.sections.iter_mut().find(|s| s.heading == heading) {
            Some(existing) => existing.body = body,
            None => self.sections.push(KnowledgeSection { heading, body }),
        }
    }

    /// Body of the section whose heading equals `name`, ignoring case
    pub fn get(&self, name: &str) -> Option<&str> {
        let wanted = name.trim().to_lowercase();
        self.sections
            .iter()
            .find(|s| s.heading.to_lowercase() == wanted)
            .map(|s| s.body.as_str())
    }

    pub fn section_names(&self) -> Vec<&str> {
        self.sections.iter().map(|s| s.heading.as_str()).collect()
    }

    /// Sections whose body contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<&KnowledgeSection> {
        let needle = query.to_lowercase();
        self.sections
            .iter()
            .filter(|s| s.body.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn sections(&self) -> &[KnowledgeSection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "Preamble is ignored.\n\n# Overview\nCity portal upgrade.\n\n## Pricing Details\nFixed price of $500,000.\n\n### Timeline\n\n  Go-live in Q3.  \n";

    #[test]
    fn test_parse_all_levels() {
        let kb = KnowledgeBase::parse(DOC);
        assert_eq!(kb.section_names(), vec!["Overview", "Pricing Details", "Timeline"]);
        assert_eq!(kb.get("overview"), Some("City portal upgrade."));
        assert_eq!(kb.get("TIMELINE"), Some("Go-live in Q3."));
    }

    #[test]
    fn test_no_partial_heading_match() {
        let kb = KnowledgeBase::parse(DOC);
        assert_eq!(kb.get("Pricing"), None);
        assert!(kb.get("pricing details").is_some());
    }

    #[test]
    fn test_no_headings() {
        let kb = KnowledgeBase::parse("just text\n#not a heading\n####### seven");
        assert!(kb.is_empty());
    }

    #[test]
    fn test_duplicate_heading_keeps_position() {
        let kb = KnowledgeBase::parse("## A\none\n## B\ntwo\n## A\nthree\n");
        assert_eq!(kb.section_names(), vec!["A", "B"]);
        assert_eq!(kb.get("a"), Some("three"));
    }

    #[test]
    fn test_search_bodies() {
        let kb = KnowledgeBase::parse(DOC);
        let hits = kb.search("FIXED PRICE");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].heading, "Pricing Details");
        assert!(kb.search("blockchain").is_empty());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            KnowledgeBase::from_file("/nonexistent/kb.md"),
            Err(Error::NotFound(_))
        ));
    }
}
