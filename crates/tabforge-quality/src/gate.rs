//! Schema gate for executed programs.
//!
//! `validate` is the plain superset check against `V1..V28, Amount, label`.
//! `evaluate` runs the full set of checks and produces a verdict (OK, BLOCK)
//! that names missing and extra columns.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tabforge_core::{target_columns, Table, TargetFrame};
use tracing::debug;

pub const VERDICT_OK: &str = "OK";
pub const VERDICT_BLOCK: &str = "BLOCK";

/// Single check result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

impl Check {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVerdict {
    /// "OK" | "BLOCK"
    pub verdict: String,
    pub checks: Vec<Check>,
    pub missing: Vec<String>,
    /// Present but outside the target schema; discarded on projection
    pub extra: Vec<String>,
    pub summary: String,
}

impl SchemaVerdict {
    pub fn passed(&self) -> bool {
        self.verdict == VERDICT_OK
    }
}

#[derive(Debug, Clone)]
pub struct SchemaValidator {
    required: Vec<String>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self {
            required: target_columns(),
        }
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column set is a superset of the target schema
    pub fn validate(&self, table: &Table) -> bool {
        self.required.iter().all(|c| table.has_column(c))
    }

    pub fn evaluate(&self, table: &Table, expected_rows: Option<usize>) -> SchemaVerdict {
        self.assess(table, expected_rows).0
    }

    /// Gate and project in one step. A blocked verdict comes back as the error.
    pub fn accept(&self, table: &Table, expected_rows: Option<usize>) -> Result<TargetFrame, SchemaVerdict> {
        match self.assess(table, expected_rows) {
            (verdict, Some(frame)) if verdict.passed() => Ok(frame),
            (verdict, _) => Err(verdict),
        }
    }

    fn assess(&self, table: &Table, expected_rows: Option<usize>) -> (SchemaVerdict, Option<TargetFrame>) {
        let mut checks = Vec::new();
        let present: HashSet<String> = table.column_names().into_iter().collect();
        let required: HashSet<&str> = self.required.iter().map(String::as_str).collect();

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|c| !present.contains(*c))
            .cloned()
            .collect();
        let extra: Vec<String> = table
            .column_names()
            .into_iter()
            .filter(|c| !required.contains(c.as_str()))
            .collect();

        if missing.is_empty() {
            checks.push(Check::new("target_columns", CheckStatus::Ok, "all 30 target columns present"));
        } else {
            checks.push(Check::new(
                "target_columns",
                CheckStatus::Fail,
                format!("missing {}: {}", missing.len(), missing.join(", ")),
            ));
        }

        if !extra.is_empty() {
            checks.push(Check::new(
                "extra_columns",
                CheckStatus::Warn,
                format!("{} extra column(s) will be dropped", extra.len()),
            ));
        }

        if let Some(expected) = expected_rows {
            if table.num_rows() == expected {
                checks.push(Check::new("row_count", CheckStatus::Ok, format!("{} rows", expected)));
            } else {
                checks.push(Check::new(
                    "row_count",
                    CheckStatus::Fail,
                    format!("{} rows, expected {}", table.num_rows(), expected),
                ));
            }
        }

        let mut frame = None;
        if missing.is_empty() {
            match TargetFrame::conform(table) {
                Ok(f) => {
                    checks.push(Check::new("cell_types", CheckStatus::Ok, "numeric features, binary label"));
                    frame = Some(f);
                }
                Err(e) => checks.push(Check::new("cell_types", CheckStatus::Fail, e.to_string())),
            }
        }

        let failed: Vec<&Check> = checks.iter().filter(|c| c.status == CheckStatus::Fail).collect();
        let (verdict, summary) = if failed.is_empty() {
            (VERDICT_OK, "result conforms to the target schema".to_string())
        } else {
            let names: Vec<&str> = failed.iter().map(|c| c.name.as_str()).collect();
            (VERDICT_BLOCK, format!("failed checks: {}", names.join(", ")))
        };
        debug!(verdict, missing = missing.len(), extra = extra.len(), "schema gate evaluated");

        let verdict = SchemaVerdict {
            verdict: verdict.to_string(),
            checks,
            missing,
            extra,
            summary,
        };
        (verdict, frame)
    }
}
