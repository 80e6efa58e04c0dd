//! Built-in specialist agents and prompt overrides

use std::path::Path;

use crate::error::{Error, Result};

use super::template::PromptTemplate;

/// A specialist agent is nothing more than a name bound to a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub name: String,
    /// Stem of the override file in a prompts directory
    pub prompt_file: String,
    pub template: PromptTemplate,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, template: PromptTemplate) -> Self {
        let name = name.into();
        Self {
            prompt_file: name.clone(),
            name,
            template,
        }
    }
}

const RFP_PREAMBLE: &str = "You are an experienced solution consultant analysing a Request for Proposal (RFP).";

/// (name, prompt file stem, task)
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "introduction",
        "introduction",
        "Write a short introduction of the RFP: who is issuing it, the purpose of the engagement and the expected outcome.",
    ),
    (
        "challenges",
        "challenges",
        "List the key challenges the client faces today. Give each challenge a one-line title followed by a short explanation.",
    ),
    (
        "pain_points",
        "pain_points",
        "Identify the pain points of the client's users and operations. Quote the RFP where possible.",
    ),
    (
        "business_process",
        "business_process",
        "Describe the business processes in scope, step by step, including the actors and systems involved in each step.",
    ),
    (
        "gap",
        "gap",
        "Perform a gap analysis: describe the current state, the desired state and the gaps between them.",
    ),
    (
        "personas",
        "persona",
        "Identify the user personas mentioned or implied by the RFP. For each persona give the role, goals and frustrations.",
    ),
    (
        "constraints",
        "constraints",
        "List the constraints stated in the RFP: budget, timeline, technology, regulatory and organisational.",
    ),
    (
        "functional_requirements",
        "functional_requirements",
        "Extract the functional requirements as a numbered list. Keep the wording of the RFP.",
    ),
    (
        "nfr",
        "nfr",
        "Extract the non-functional requirements (performance, availability, security, scalability, compliance) as a numbered list.",
    ),
    (
        "architecture",
        "architect",
        "Propose a high-level solution architecture that satisfies the requirements. Name the main components and how they interact.",
    ),
    (
        "assumptions",
        "assumptions",
        "List the assumptions a vendor would have to make to respond to this RFP, where the document is silent or ambiguous.",
    ),
    (
        "impact",
        "impact",
        "Write impactful statements describing the business value a successful delivery would bring to the client.",
    ),
];

fn builtin_template(task: &str) -> String {
    format!(
        "{preamble}\n\n{task}\nOnly use information from the RFP text. Answer in markdown.\n\nRFP text:\n{{{{input}}}}\n",
        preamble = RFP_PREAMBLE,
        task = task
    )
}

/// Ordered registry of specialist agents
#[derive(Debug, Clone, Default)]
pub struct AgentCatalog {
    specs: Vec<AgentSpec>,
}

impl AgentCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// The twelve built-in agents, in analysis order
    pub fn builtin() -> Self {
        let specs = BUILTIN
            .iter()
            .map(|(name, file, task)| AgentSpec {
                name: name.to_string(),
                prompt_file: file.to_string(),
                template: PromptTemplate::trusted(builtin_template(task)),
            })
            .collect();
        Self { specs }
    }

    /// Replace templates with `<dir>/<prompt_file>.txt` where such a file exists
    pub fn with_prompts_dir(mut self, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::config(format!(
                "prompts directory {} does not exist",
                dir.display()
            )));
        }

        for spec in &mut self.specs {
            let path = dir.join(format!("{}.txt", spec.prompt_file));
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path)?;
            spec.template = PromptTemplate::new(text).map_err(|e| {
                Error::config(format!("{}: {}", path.display(), e))
            })?;
            tracing::debug!("Loaded prompt override for {} from {}", spec.name, path.display());
        }
        Ok(self)
    }

    /// Add an agent; an existing agent of the same name is replaced in place
    pub fn insert(&mut self, spec: AgentSpec) {
        match self.specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AgentSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs for `order`, or the whole catalog when `order` is empty.
    /// Unknown names are a configuration error.
    pub fn select(&self, order: &[String]) -> Result<Vec<AgentSpec>> {
        if order.is_empty() {
            return Ok(self.specs.clone());
        }
        order
            .iter()
            .map(|name| {
                self.get(name).cloned().ok_or_else(|| {
                    Error::config(format!(
                        "unknown agent '{}'; available agents: {}",
                        name,
                        self.names().join(", ")
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog() {
        let catalog = AgentCatalog::builtin();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.names()[0], "introduction");
        assert_eq!(catalog.get("personas").unwrap().prompt_file, "persona");
        let rendered = catalog.get("gap").unwrap().template.render("SAMPLE RFP");
        assert!(rendered.contains("gap analysis"));
        assert!(rendered.ends_with("SAMPLE RFP\n"));
    }

    #[test]
    fn test_builtin_templates_are_valid() {
        for spec in &AgentCatalog::builtin().specs {
            assert!(PromptTemplate::new(spec.template.as_str()).is_ok(), "{}", spec.name);
        }
    }

    #[test]
    fn test_prompt_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("architect.txt"), "Design for: {{input}}").unwrap();

        let catalog = AgentCatalog::builtin().with_prompts_dir(dir.path()).unwrap();
        assert_eq!(
            catalog.get("architecture").unwrap().template.render("x"),
            "Design for: x"
        );
        // untouched agents keep the built-in prompt
        assert!(catalog.get("nfr").unwrap().template.as_str().contains("non-functional"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("gap.txt"), "no placeholder here").unwrap();
        assert!(matches!(
            AgentCatalog::builtin().with_prompts_dir(dir.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_select_and_insert() {
        let mut catalog = AgentCatalog::builtin();
        let order = vec!["gap".to_string(), "impact".to_string()];
        let selected = catalog.select(&order).unwrap();
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[1].name, "impact");

        assert!(matches!(
            catalog.select(&["pricing".to_string()]),
            Err(Error::Config(_))
        ));

        catalog.insert(AgentSpec::new("gap", PromptTemplate::new("G {{input}}").unwrap()));
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.names()[4], "gap");
        assert_eq!(catalog.get("gap").unwrap().template.render("t"), "G t");
    }
}
