//! Column-name patterns used by the classifier.
//!
//! All comparisons are case-insensitive on the whole column name.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `V` followed by digits only, e.g. `V1`, `v17`
    static ref V_COLUMN: Regex = Regex::new(r"(?i)^v[0-9]+$").unwrap();
}

/// Target candidates, first match in column order wins
pub const TARGET_CANDIDATES: &[&str] = &[
    "fraudulent",
    "fraud",
    "class",
    "label",
    "target",
    "is_fake",
    "is_spam",
];

/// Class-like names required by the already-formatted short-circuit
pub const CLASS_NAMES: &[&str] = &["class", "label", "target"];

pub const AMOUNT_NAME: &str = "amount";

pub const JOB_POSTING_MARKERS: &[&str] = &["title", "description", "job_id"];

pub const FINANCIAL_MARKERS: &[&str] = &["transaction", "amount", "time"];

pub fn is_v_column(name: &str) -> bool {
    V_COLUMN.is_match(name)
}

/// Case-insensitive membership in a name set
pub fn is_one_of(name: &str, names: &[&str]) -> bool {
    names.iter().any(|n| name.eq_ignore_ascii_case(n))
}
