//! Target schema: `V1..V28`, `Amount`, `label`.
//!
//! `TargetFrame` is the typed form of a conformant table. Its shape cannot
//! drift from the contract: exactly 28 feature vectors, one amount vector and
//! one label vector, all of the same length, labels restricted to {0,1}.

use crate::error::SchemaMismatch;
use crate::table::{Column, Table, Value};
use serde::{Deserialize, Serialize};

/// Number of engineered feature slots
pub const FEATURE_COUNT: usize = 28;

pub const AMOUNT_COLUMN: &str = "Amount";
pub const LABEL_COLUMN: &str = "label";

/// `V{slot+1}` for a zero-based slot
pub fn feature_name(slot: usize) -> String {
    format!("V{}", slot + 1)
}

/// Canonical output column list, in order
pub fn target_columns() -> Vec<String> {
    let mut cols: Vec<String> = (0..FEATURE_COUNT).map(feature_name).collect();
    cols.push(AMOUNT_COLUMN.to_string());
    cols.push(LABEL_COLUMN.to_string());
    cols
}

/// Model input columns: features plus amount
pub fn model_input_columns() -> Vec<String> {
    let mut cols: Vec<String> = (0..FEATURE_COUNT).map(feature_name).collect();
    cols.push(AMOUNT_COLUMN.to_string());
    cols
}

/// Binary class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Legit = 0,
    Fraud = 1,
}

impl Label {
    pub fn from_bit(bit: i64) -> Option<Self> {
        match bit {
            0 => Some(Label::Legit),
            1 => Some(Label::Fraud),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// Feature matrix handed to the downstream classifier
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` values per row
    pub rows: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFrame {
    features: Vec<Vec<f64>>,
    amount: Vec<f64>,
    label: Vec<Label>,
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

impl TargetFrame {
    /// All-zero frame with `rows` rows
    pub fn zeros(rows: usize) -> Self {
        Self {
            features: vec![vec![0.0; rows]; FEATURE_COUNT],
            amount: vec![0.0; rows],
            label: vec![Label::Legit; rows],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.amount.len()
    }

    /// Overwrite feature `slot` (zero-based). Out-of-range slots are ignored,
    /// short iterators leave the remaining rows untouched.
    pub fn fill_feature(&mut self, slot: usize, values: impl IntoIterator<Item = f64>) {
        if let Some(target) = self.features.get_mut(slot) {
            for (cell, v) in target.iter_mut().zip(values) {
                *cell = finite_or_zero(v);
            }
        }
    }

    pub fn fill_amount(&mut self, values: impl IntoIterator<Item = f64>) {
        for (cell, v) in self.amount.iter_mut().zip(values) {
            *cell = finite_or_zero(v);
        }
    }

    pub fn fill_labels(&mut self, values: impl IntoIterator<Item = Label>) {
        for (cell, v) in self.label.iter_mut().zip(values) {
            *cell = v;
        }
    }

    pub fn feature(&self, slot: usize) -> Option<&[f64]> {
        self.features.get(slot).map(Vec::as_slice)
    }

    pub fn amount(&self) -> &[f64] {
        &self.amount
    }

    pub fn labels(&self) -> &[Label] {
        &self.label
    }

    /// Project a superset table onto the target schema.
    ///
    /// Missing numeric cells become 0. Extra columns are discarded.
    pub fn conform(table: &Table) -> Result<Self, SchemaMismatch> {
        let missing: Vec<String> = target_columns()
            .into_iter()
            .filter(|c| !table.has_column(c))
            .collect();
        if !missing.is_empty() {
            return Err(SchemaMismatch::MissingColumns(missing));
        }

        let rows = table.num_rows();
        let mut frame = Self::zeros(rows);
        for slot in 0..FEATURE_COUNT {
            let name = feature_name(slot);
            let values = numeric_cells(table, &name)?;
            frame.fill_feature(slot, values);
        }
        frame.fill_amount(numeric_cells(table, AMOUNT_COLUMN)?);

        let mut labels = Vec::with_capacity(rows);
        if let Some(column) = table.column(LABEL_COLUMN) {
            for (row, value) in column.values.iter().enumerate() {
                labels.push(label_cell(row, value)?);
            }
        }
        frame.fill_labels(labels);
        Ok(frame)
    }

    /// Render as a plain table with canonical column order
    pub fn to_table(&self) -> Table {
        let mut columns: Vec<Column> = self
            .features
            .iter()
            .enumerate()
            .map(|(slot, values)| {
                Column::new(
                    feature_name(slot),
                    values.iter().map(|v| Value::Float(*v)).collect(),
                )
            })
            .collect();
        columns.push(Column::new(
            AMOUNT_COLUMN,
            self.amount.iter().map(|v| Value::Float(*v)).collect(),
        ));
        columns.push(Column::new(
            LABEL_COLUMN,
            self.label.iter().map(|l| Value::Int(l.as_i64())).collect(),
        ));
        // names are fixed and lengths agree by construction
        Table::from_columns(columns).unwrap_or_default()
    }

    /// `V1..V28, Amount` as a row-major matrix
    pub fn feature_matrix(&self) -> FeatureMatrix {
        let rows = (0..self.num_rows())
            .map(|row| {
                let mut r: Vec<f64> = self.features.iter().map(|f| f[row]).collect();
                r.push(self.amount[row]);
                r
            })
            .collect();
        FeatureMatrix {
            columns: model_input_columns(),
            rows,
        }
    }
}

fn numeric_cells(table: &Table, name: &str) -> Result<Vec<f64>, SchemaMismatch> {
    let Some(column) = table.column(name) else {
        return Err(SchemaMismatch::MissingColumns(vec![name.to_string()]));
    };
    column
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            if value.is_missing() {
                return Ok(0.0);
            }
            value.as_f64().ok_or_else(|| SchemaMismatch::NonNumeric {
                column: name.to_string(),
                row,
                value: value.to_string(),
            })
        })
        .collect()
}

fn label_cell(row: usize, value: &Value) -> Result<Label, SchemaMismatch> {
    if value.is_missing() {
        return Ok(Label::Legit);
    }
    let bit = match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        _ => None,
    };
    bit.and_then(Label::from_bit)
        .ok_or_else(|| SchemaMismatch::LabelOutOfDomain {
            row,
            value: value.to_string(),
        })
}
