//! Text previews rendered with Handlebars.
//!
//! Custom helpers:
//! - money: Format number as dollars (50 -> "$50.00")
//! - percent: Format a rate as percentage (0.1 -> "10%")
//! - default: Fallback text for null values

use crate::table::{self, ItemTable};
use crate::templates::TemplatesFile;
use crate::RenderError;
use handlebars::{handlebars_helper, no_escape, Handlebars};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

handlebars_helper!(money_helper: |amount: f64| table::money(amount));
handlebars_helper!(percent_helper: |rate: f64| table::percent(rate));
handlebars_helper!(default_helper: |value: Json, fallback: str| {
    if value.is_null() {
        Value::String(fallback.to_string())
    } else {
        value.clone()
    }
});

/// Data available to the `preview` template.
#[derive(Debug, Serialize)]
pub struct PreviewData<'a> {
    pub table: &'a ItemTable,
    pub reference: Option<&'a str>,
    pub issued_count: u64,
}

/// Data available to the `finalized` template.
#[derive(Debug, Serialize)]
pub struct FinalizedData<'a> {
    pub table: &'a ItemTable,
    pub quotation_number: u64,
    pub document: Option<String>,
}

/// Compiled preview templates with registered helpers
pub struct PreviewRenderer<'a> {
    handlebars: Handlebars<'a>,
    templates: TemplatesFile,
}

impl<'a> PreviewRenderer<'a> {
    pub fn new(templates: TemplatesFile) -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        handlebars.register_escape_fn(no_escape);

        handlebars.register_helper("money", Box::new(money_helper));
        handlebars.register_helper("percent", Box::new(percent_helper));
        handlebars.register_helper("default", Box::new(default_helper));

        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| RenderError::Template(format!("{}: {}", name, e)))?;
        }

        Ok(Self { handlebars, templates })
    }

    /// Renderer over the shipped templates.
    pub fn builtin() -> Result<Self, RenderError> {
        Self::new(TemplatesFile::builtin()?)
    }

    pub fn load(path: &Path) -> Result<Self, RenderError> {
        Self::new(TemplatesFile::load(path)?)
    }

    /// Render a named template with data
    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String, RenderError> {
        if self.templates.get(template_name).is_none() {
            return Err(RenderError::Template(format!("unknown template `{}`", template_name)));
        }
        self.handlebars
            .render(template_name, data)
            .map_err(|e| RenderError::Render(e.to_string()))
    }

    pub fn preview(&self, data: &PreviewData<'_>) -> Result<String, RenderError> {
        self.render("preview", data)
    }

    pub fn finalized(&self, data: &FinalizedData<'_>) -> Result<String, RenderError> {
        self.render("finalized", data)
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}
