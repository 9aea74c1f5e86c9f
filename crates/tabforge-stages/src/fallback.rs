//! FallbackSynthesizer: deterministic, total construction of the target schema.
//!
//! Slot filling order is numerical columns, then categorical columns as dense
//! codes, then boolean columns as 0/1, until the 28 slots run out. Columns
//! that do not fit are left unused. An already-formatted input copies its
//! `V<i>` columns into the matching slots instead.

use std::collections::HashMap;
use tabforge_core::{
    Column, DataType, Label, SchemaProfile, Table, TargetFrame, Value, FEATURE_COUNT,
};
use tracing::{info, warn};

/// Amount sources, first match wins (case-insensitive)
pub const AMOUNT_CANDIDATES: &[&str] = &["amount", "salary_range", "price", "value"];

/// Category that missing categorical cells are encoded as
pub const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(&self, table: &Table, profile: &SchemaProfile) -> TargetFrame {
        let rows = table.num_rows();
        let mut frame = TargetFrame::zeros(rows);

        let slots_used = if profile.data_type == DataType::AlreadyFormatted {
            copy_v_columns(table, &mut frame)
        } else {
            fill_by_role(table, profile, &mut frame)
        };

        let amount_source = AMOUNT_CANDIDATES.iter().find_map(|name| table.column_ci(name));
        if let Some(column) = amount_source {
            frame.fill_amount(column.values.iter().map(|v| v.coerce_f64().unwrap_or(0.0)));
        }

        let target = profile
            .target_column
            .as_deref()
            .filter(|_| profile.has_target)
            .and_then(|name| table.column(name));
        if let Some(column) = target {
            frame.fill_labels(labels(column));
        }

        info!(
            data_type = %profile.data_type,
            rows,
            slots_used,
            amount = amount_source.map(|c| c.name.as_str()).unwrap_or("none"),
            label = target.map(|c| c.name.as_str()).unwrap_or("none"),
            "fallback synthesized"
        );
        frame
    }
}

/// `V<i>` (any case) into slot `i - 1`
fn copy_v_columns(table: &Table, frame: &mut TargetFrame) -> usize {
    let mut used = 0;
    for slot in 0..FEATURE_COUNT {
        if let Some(column) = table.column_ci(&format!("V{}", slot + 1)) {
            frame.fill_feature(slot, column.values.iter().map(|v| v.coerce_f64().unwrap_or(0.0)));
            used += 1;
        }
    }
    used
}

fn fill_by_role(table: &Table, profile: &SchemaProfile, frame: &mut TargetFrame) -> usize {
    let numerical = profile.numerical_columns.iter().filter_map(|n| table.column(n)).map(numeric_values);
    let categorical = profile.categorical_columns.iter().filter_map(|n| table.column(n)).map(category_codes);
    let boolean = profile.boolean_columns.iter().filter_map(|n| table.column(n)).map(boolean_values);

    let mut used = 0;
    for (slot, values) in numerical.chain(categorical).chain(boolean).take(FEATURE_COUNT).enumerate() {
        frame.fill_feature(slot, values);
        used = slot + 1;
    }

    let assigned = profile.numerical_columns.len() + profile.categorical_columns.len() + profile.boolean_columns.len();
    if assigned > FEATURE_COUNT {
        warn!(assigned, slots = FEATURE_COUNT, "more role columns than feature slots, extra columns unused");
    }
    used
}

fn numeric_values(column: &Column) -> Vec<f64> {
    column.values.iter().map(|v| v.coerce_f64().unwrap_or(0.0)).collect()
}

/// Dense ordinal codes in first-seen order; missing cells share one category
fn category_codes(column: &Column) -> Vec<f64> {
    let mut codes: HashMap<String, usize> = HashMap::new();
    column
        .values
        .iter()
        .map(|v| {
            let key = if v.is_missing() { UNKNOWN_CATEGORY.to_string() } else { v.to_string() };
            let next = codes.len();
            *codes.entry(key).or_insert(next) as f64
        })
        .collect()
}

fn boolean_values(column: &Column) -> Vec<f64> {
    column
        .values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) if x != 0.0 => 1.0,
            _ => 0.0,
        })
        .collect()
}

/// Only 0/1 sources are valid labels; anything else is logged and mapped to legit
fn labels(column: &Column) -> Vec<Label> {
    let mut malformed = 0usize;
    let labels = column
        .values
        .iter()
        .map(|v| {
            if v.is_missing() {
                return Label::Legit;
            }
            let bit = match v {
                Value::Bool(b) => Some(i64::from(*b)),
                other => other.coerce_f64().map(|x| x.trunc() as i64),
            };
            bit.and_then(Label::from_bit).unwrap_or_else(|| {
                malformed += 1;
                Label::Legit
            })
        })
        .collect();
    if malformed > 0 {
        warn!(column = %column.name, malformed, "label values outside {{0, 1}} coerced to 0");
    }
    labels
}
