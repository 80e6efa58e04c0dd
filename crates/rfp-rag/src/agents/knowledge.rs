//! Knowledge-base document assembled from agent results

use std::path::Path;

use crate::error::Result;

use super::orchestrator::OrchestrationReport;

/// Markdown document with one `## AGENT_NAME` section per agent result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeDocument {
    text: String,
}

impl KnowledgeDocument {
    pub fn from_results(report: &OrchestrationReport) -> Self {
        let mut text = String::new();
        for result in report.results() {
            text.push_str(&format!("## {}\n", result.agent_name.to_uppercase()));
            text.push_str(&result.text);
            text.push_str("\n\n");
        }
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Overwrite `path` with the document
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.text)?;
        tracing::info!("Knowledge base written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentResult;
    use crate::conversation::KnowledgeBase;
    use crate::error::Error;

    fn report() -> OrchestrationReport {
        let mut report = OrchestrationReport::default();
        report.insert(AgentResult::completed("pain_points", "Manual data entry."));
        report.insert(AgentResult::failed("gap", &Error::execution("timeout")));
        report
    }

    #[test]
    fn test_layout() {
        let doc = KnowledgeDocument::from_results(&report());
        assert_eq!(
            doc.as_str(),
            "## PAIN_POINTS\nManual data entry.\n\n## GAP\nError during analysis: Execution error: timeout\n\n"
        );
    }

    #[test]
    fn test_sections_parse_back() {
        let doc = KnowledgeDocument::from_results(&report());
        let kb = KnowledgeBase::parse(doc.as_str());
        assert_eq!(kb.section_names(), vec!["PAIN_POINTS", "GAP"]);
        assert_eq!(kb.get("pain_points"), Some("Manual data entry."));
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("kb.md");
        KnowledgeDocument::from_results(&report()).write_to(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().starts_with("## PAIN_POINTS\n"));
    }
}
