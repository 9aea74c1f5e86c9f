//! Data Model: SchemaProfile, GeneratedCode
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse dataset category inferred by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    AlreadyFormatted,
    JobPostings,
    Financial,
    TextHeavy,
    Numerical,
    Mixed,
}

impl DataType {
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::AlreadyFormatted => "already_formatted",
            DataType::JobPostings => "job_postings",
            DataType::Financial => "financial",
            DataType::TextHeavy => "text_heavy",
            DataType::Numerical => "numerical",
            DataType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of an input table's column roles.
///
/// Created once per transformation request and never mutated afterwards.
/// Role lists are disjoint, and the target column never appears in them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaProfile {
    pub data_type: DataType,
    pub has_target: bool,
    pub target_column: Option<String>,
    pub text_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub numerical_columns: Vec<String>,
    pub boolean_columns: Vec<String>,
    pub needs_feature_engineering: bool,
    /// Every input column name, in input order
    pub columns: Vec<String>,
}

impl SchemaProfile {
    /// Columns assigned to any role, in role order
    pub fn assigned_columns(&self) -> impl Iterator<Item = &String> {
        self.text_columns
            .iter()
            .chain(&self.categorical_columns)
            .chain(&self.numerical_columns)
            .chain(&self.boolean_columns)
    }
}

/// Where a piece of transformation logic came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrigin {
    Generated,
    Fallback,
}

/// Program text returned by the code-generation service, fences removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCode {
    pub text: String,
    pub origin: CodeOrigin,
}

impl GeneratedCode {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: CodeOrigin::Generated,
        }
    }

    pub fn hash(&self) -> String {
        format!("blake3:{}", blake3::hash(self.text.as_bytes()))
    }
}
