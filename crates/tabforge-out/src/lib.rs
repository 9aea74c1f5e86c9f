//! tabforge-out: prompt selection.
//!
//! Maps a [`SchemaProfile`] to one of five fixed prompt templates and renders
//! it with the profile's column roles. Rendering is deterministic: the same
//! profile always yields the same prompt text.
//!
//! ```
//! use tabforge_core::{DataType, SchemaProfile};
//! use tabforge_out::{PromptStrategySelector, PromptTemplate};
//!
//! let profile = SchemaProfile {
//!     data_type: DataType::Numerical,
//!     has_target: false,
//!     target_column: None,
//!     text_columns: vec![],
//!     categorical_columns: vec![],
//!     numerical_columns: vec!["x".into()],
//!     boolean_columns: vec![],
//!     needs_feature_engineering: true,
//!     columns: vec!["x".into()],
//! };
//! let spec = PromptStrategySelector::builtin().unwrap().select(&profile).unwrap();
//! assert_eq!(spec.template, PromptTemplate::Generic);
//! assert!(spec.text.contains("V1 through V28"));
//! ```

pub mod renderer;
pub mod templates;

use renderer::TemplateRenderer;
use serde::{Deserialize, Serialize};
use tabforge_core::{DataType, SchemaProfile};
use templates::TemplatesFile;
use thiserror::Error;
use tracing::debug;

/// Text columns named explicitly in a prompt
pub const MAX_TEXT_COLUMNS: usize = 4;
/// Categorical columns named explicitly in a prompt
pub const MAX_CATEGORICAL_COLUMNS: usize = 6;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("PROMPT/templates: {0}")]
    Templates(String),
    #[error("PROMPT/unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("PROMPT/render: {0}")]
    Render(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    AlreadyFormatted,
    JobPostings,
    Financial,
    TextHeavy,
    Generic,
}

impl PromptTemplate {
    pub fn for_data_type(data_type: DataType) -> Self {
        match data_type {
            DataType::AlreadyFormatted => PromptTemplate::AlreadyFormatted,
            DataType::JobPostings => PromptTemplate::JobPostings,
            DataType::Financial => PromptTemplate::Financial,
            DataType::TextHeavy => PromptTemplate::TextHeavy,
            DataType::Numerical | DataType::Mixed => PromptTemplate::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptTemplate::AlreadyFormatted => "already_formatted",
            PromptTemplate::JobPostings => "job_postings",
            PromptTemplate::Financial => "financial",
            PromptTemplate::TextHeavy => "text_heavy",
            PromptTemplate::Generic => "generic",
        }
    }
}

/// Template identifier plus rendered text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub template: PromptTemplate,
    pub text: String,
}

/// Render context handed to handlebars
#[derive(Debug, Serialize)]
struct PromptContext<'p> {
    data_type: &'p str,
    columns: String,
    has_target: bool,
    target_column: &'p str,
    text_columns: Vec<String>,
    categorical_columns: Vec<String>,
    numerical_columns: &'p [String],
    boolean_columns: &'p [String],
}

impl<'p> PromptContext<'p> {
    fn from_profile(profile: &'p SchemaProfile) -> Self {
        PromptContext {
            data_type: profile.data_type.as_str(),
            columns: profile.columns.join(", "),
            has_target: profile.has_target,
            target_column: profile.target_column.as_deref().unwrap_or("none"),
            text_columns: capped(&profile.text_columns, MAX_TEXT_COLUMNS),
            categorical_columns: capped(&profile.categorical_columns, MAX_CATEGORICAL_COLUMNS),
            numerical_columns: &profile.numerical_columns,
            boolean_columns: &profile.boolean_columns,
        }
    }
}

fn capped(names: &[String], max: usize) -> Vec<String> {
    let mut out: Vec<String> = names.iter().take(max).cloned().collect();
    if names.len() > max {
        out.push(format!("... ({} more)", names.len() - max));
    }
    out
}

pub struct PromptStrategySelector {
    renderer: TemplateRenderer<'static>,
}

impl PromptStrategySelector {
    pub fn new(templates: TemplatesFile) -> Result<Self, PromptError> {
        let renderer = TemplateRenderer::new(templates)?;
        for template in [
            PromptTemplate::AlreadyFormatted,
            PromptTemplate::JobPostings,
            PromptTemplate::Financial,
            PromptTemplate::TextHeavy,
            PromptTemplate::Generic,
        ] {
            if !renderer.list_templates().contains(&template.as_str()) {
                return Err(PromptError::UnknownTemplate(template.as_str().to_string()));
            }
        }
        Ok(Self { renderer })
    }

    /// Selector over the templates shipped with the crate
    pub fn builtin() -> Result<Self, PromptError> {
        Self::new(TemplatesFile::builtin()?)
    }

    pub fn select(&self, profile: &SchemaProfile) -> Result<PromptSpec, PromptError> {
        let template = PromptTemplate::for_data_type(profile.data_type);
        let context = PromptContext::from_profile(profile);
        let text = self.renderer.render(template.as_str(), &context)?;
        debug!(template = template.as_str(), chars = text.len(), "prompt rendered");
        Ok(PromptSpec { template, text })
    }
}
