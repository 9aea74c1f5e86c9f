//! Handlebars rendering for prompt templates.
//!
//! Prompts are plain text, so HTML escaping is disabled. Strict mode is on:
//! a template referring to a field the context does not carry fails instead
//! of rendering an empty string.

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use serde_json::Value;

use crate::templates::TemplatesFile;
use crate::PromptError;

// Comma-separated list, "none" when empty
handlebars_helper!(join: |items: array| {
    if items.is_empty() {
        "none".to_string()
    } else {
        items
            .iter()
            .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    }
});

pub struct TemplateRenderer<'a> {
    handlebars: Handlebars<'a>,
    templates: TemplatesFile,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(templates: TemplatesFile) -> Result<Self, PromptError> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("join", Box::new(join));

        for (name, body) in &templates.partials {
            handlebars
                .register_partial(name, body)
                .map_err(|e| PromptError::Templates(format!("partial {}: {}", name, e)))?;
        }
        for (name, template) in &templates.templates {
            handlebars
                .register_template_string(name, &template.template)
                .map_err(|e| PromptError::Templates(format!("template {}: {}", name, e)))?;
        }

        Ok(TemplateRenderer { handlebars, templates })
    }

    pub fn render<T: Serialize>(&self, template_name: &str, data: &T) -> Result<String, PromptError> {
        if self.templates.get(template_name).is_none() {
            return Err(PromptError::UnknownTemplate(template_name.to_string()));
        }
        self.handlebars
            .render(template_name, data)
            .map_err(|e| PromptError::Render(e.to_string()))
    }

    pub fn render_string(&self, template: &str, data: &Value) -> Result<String, PromptError> {
        self.handlebars
            .render_template(template, data)
            .map_err(|e| PromptError::Render(e.to_string()))
    }

    pub fn list_templates(&self) -> Vec<&str> {
        self.templates.list_templates()
    }
}
