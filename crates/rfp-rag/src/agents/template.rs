//! Prompt templates with a single input placeholder

use crate::error::{Error, Result};

/// Placeholder replaced by the analysed text
pub const INPUT_PLACEHOLDER: &str = "{{input}}";

/// Prompt text containing exactly one `{{input}}` placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        match text.matches(INPUT_PLACEHOLDER).count() {
            1 => Ok(Self { text }),
            0 => Err(Error::config(format!(
                "prompt template has no {} placeholder",
                INPUT_PLACEHOLDER
            ))),
            n => Err(Error::config(format!(
                "prompt template has {} {} placeholders, expected one",
                n, INPUT_PLACEHOLDER
            ))),
        }
    }

    /// Built-in text known to hold exactly one placeholder
    pub(crate) fn trusted(text: String) -> Self {
        Self { text }
    }

    /// Substitute `input` for the placeholder
    pub fn render(&self, input: &str) -> String {
        self.text.replacen(INPUT_PLACEHOLDER, input, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let template = PromptTemplate::new("Summarise:\n{{input}}\nEnd.").unwrap();
        assert_eq!(template.render("the RFP"), "Summarise:\nthe RFP\nEnd.");
    }

    #[test]
    fn test_input_containing_placeholder_is_not_expanded_twice() {
        let template = PromptTemplate::new("A {{input}} B").unwrap();
        assert_eq!(template.render("{{input}}"), "A {{input}} B");
    }

    #[test]
    fn test_placeholder_count_enforced() {
        assert!(matches!(PromptTemplate::new("no slot"), Err(Error::Config(_))));
        assert!(matches!(
            PromptTemplate::new("{{input}} and {{input}}"),
            Err(Error::Config(_))
        ));
    }
}
