//! Prompt templates file.
//!
//! Layout:
//! ```yaml
//! version: "1.0"
//! partials:
//!   contract: |
//!     ...
//! templates:
//!   generic:
//!     description: ...
//!     template: |
//!       ...
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::PromptError;

/// Embedded copy of `templates/prompts.yaml`
pub const BUILTIN_TEMPLATES: &str = include_str!("../templates/prompts.yaml");

#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    #[serde(default)]
    pub partials: BTreeMap<String, String>,
    pub templates: BTreeMap<String, Template>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    pub fn from_yaml(yaml: &str) -> Result<Self, PromptError> {
        serde_yaml::from_str(yaml).map_err(|e| PromptError::Templates(e.to_string()))
    }

    pub fn builtin() -> Result<Self, PromptError> {
        Self::from_yaml(BUILTIN_TEMPLATES)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.keys().map(|s| s.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_parses() {
        let file = TemplatesFile::builtin().unwrap();
        assert_eq!(file.version, "1.0");
        for name in ["already_formatted", "job_postings", "financial", "text_heavy", "generic"] {
            assert!(file.get(name).is_some(), "missing template {name}");
        }
        assert!(file.partials.contains_key("contract"));
        assert!(file.partials.contains_key("dsl"));
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            TemplatesFile::from_yaml("templates: ["),
            Err(PromptError::Templates(_))
        ));
    }
}
