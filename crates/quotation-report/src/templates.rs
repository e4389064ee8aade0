//! Preview template loading.
//!
//! Templates live in a YAML file with named Handlebars templates:
//!
//! ```yaml
//! version: "1.0"
//! templates:
//!   preview:
//!     description: Price preview before finalizing
//!     template: "Total Cost: {{money totals.total}}"
//! ```

use crate::RenderError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Templates shipped with the workspace, used when no path is configured.
pub const DEFAULT_TEMPLATES: &str = include_str!("../../../templates/preview.yaml");

/// Top-level templates file structure
#[derive(Debug, Clone, Deserialize)]
pub struct TemplatesFile {
    pub version: String,
    pub templates: HashMap<String, Template>,
}

/// A single template definition
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub description: String,
    pub template: String,
}

impl TemplatesFile {
    /// Load templates from a YAML file
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RenderError::Template(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse templates from YAML content
    pub fn from_yaml(yaml: &str) -> Result<Self, RenderError> {
        serde_yaml::from_str(yaml).map_err(|e| RenderError::Template(format!("invalid templates YAML: {}", e)))
    }

    /// The shipped default templates.
    pub fn builtin() -> Result<Self, RenderError> {
        Self::from_yaml(DEFAULT_TEMPLATES)
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// List all template names
    pub fn list_templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_templates_parse() {
        let file = TemplatesFile::builtin().unwrap();
        assert!(file.get("preview").is_some());
        assert!(file.get("finalized").is_some());
    }

    #[test]
    fn test_invalid_yaml() {
        let err = TemplatesFile::from_yaml("templates: [").unwrap_err();
        assert!(matches!(err, RenderError::Template(_)));
    }

    #[test]
    fn test_list_is_sorted() {
        let file = TemplatesFile::from_yaml(
            r#"
version: "1.0"
templates:
  zeta:
    description: last
    template: "z"
  alpha:
    description: first
    template: "a"
"#,
        )
        .unwrap();
        assert_eq!(file.list_templates(), vec!["alpha", "zeta"]);
    }
}
