//! SchemaClassifier: column roles and coarse dataset category.
//!
//! Evaluation order:
//! 1. already-formatted short-circuit
//! 2. target detection
//! 3. per-column role assignment (target and empty columns excluded)
//! 4. dataset-type inference in fixed priority order

use crate::patterns::{
    is_one_of, is_v_column, AMOUNT_NAME, CLASS_NAMES, FINANCIAL_MARKERS, JOB_POSTING_MARKERS,
    TARGET_CANDIDATES,
};
use tabforge_core::{
    ClassificationError, ClassifierConfig, Column, DataType, SchemaProfile, Table, Value,
};
use tracing::{debug, info};

/// Role of a single column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Text,
    Categorical,
    Numerical,
    Boolean,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaClassifier {
    config: ClassifierConfig,
}

impl SchemaClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Profile `table`. Fails only when the table has no columns.
    pub fn classify(&self, table: &Table) -> Result<SchemaProfile, ClassificationError> {
        if table.is_empty() {
            return Err(ClassificationError::EmptyInput);
        }
        let columns = table.column_names();

        let mut profile = SchemaProfile {
            data_type: DataType::Mixed,
            has_target: false,
            target_column: None,
            text_columns: Vec::new(),
            categorical_columns: Vec::new(),
            numerical_columns: Vec::new(),
            boolean_columns: Vec::new(),
            needs_feature_engineering: true,
            columns: columns.clone(),
        };

        if let Some(class_column) = self.already_formatted(&columns) {
            profile.data_type = DataType::AlreadyFormatted;
            profile.needs_feature_engineering = false;
            profile.has_target = true;
            profile.target_column = Some(class_column);
            info!(data_type = %profile.data_type, "schema classified");
            return Ok(profile);
        }

        profile.target_column = columns
            .iter()
            .find(|c| is_one_of(c, TARGET_CANDIDATES))
            .cloned();
        profile.has_target = profile.target_column.is_some();

        for column in table.columns() {
            if profile.target_column.as_deref() == Some(column.name.as_str()) {
                continue;
            }
            let Some(role) = self.column_role(column) else {
                debug!(column = %column.name, "skipping empty column");
                continue;
            };
            let list = match role {
                ColumnRole::Text => &mut profile.text_columns,
                ColumnRole::Categorical => &mut profile.categorical_columns,
                ColumnRole::Numerical => &mut profile.numerical_columns,
                ColumnRole::Boolean => &mut profile.boolean_columns,
            };
            list.push(column.name.clone());
        }

        profile.data_type = infer_data_type(&columns, &profile);
        info!(
            data_type = %profile.data_type,
            target = ?profile.target_column,
            text = profile.text_columns.len(),
            categorical = profile.categorical_columns.len(),
            numerical = profile.numerical_columns.len(),
            boolean = profile.boolean_columns.len(),
            "schema classified"
        );
        Ok(profile)
    }

    /// Returns the class-like column when the table already has the target shape
    fn already_formatted(&self, columns: &[String]) -> Option<String> {
        let v_count = columns.iter().filter(|c| is_v_column(c)).count();
        let has_amount = columns.iter().any(|c| c.eq_ignore_ascii_case(AMOUNT_NAME));
        let class_column = columns.iter().find(|c| is_one_of(c, CLASS_NAMES));

        if v_count >= self.config.already_formatted_min_v_columns && has_amount {
            class_column.cloned()
        } else {
            None
        }
    }

    /// Role of a column, `None` when it holds no non-missing value
    pub fn column_role(&self, column: &Column) -> Option<ColumnRole> {
        let present: Vec<&Value> = column.present().collect();
        if present.is_empty() {
            return None;
        }
        if present.iter().all(|v| is_binary_like(v)) {
            return Some(ColumnRole::Boolean);
        }
        if present.iter().all(|v| v.is_numeric()) {
            return Some(ColumnRole::Numerical);
        }

        let lengths: Vec<usize> = present
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.chars().count())
            .collect();
        if lengths.is_empty() {
            return Some(ColumnRole::Categorical);
        }
        let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
        if mean > self.config.text_length_threshold {
            Some(ColumnRole::Text)
        } else {
            Some(ColumnRole::Categorical)
        }
    }
}

/// Value set contained in {0, 1, true, false}
fn is_binary_like(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::Int(i) => *i == 0 || *i == 1,
        Value::Float(f) => *f == 0.0 || *f == 1.0,
        _ => false,
    }
}

fn infer_data_type(columns: &[String], profile: &SchemaProfile) -> DataType {
    if columns.iter().any(|c| is_one_of(c, JOB_POSTING_MARKERS)) {
        DataType::JobPostings
    } else if columns.iter().any(|c| is_one_of(c, FINANCIAL_MARKERS)) {
        DataType::Financial
    } else if profile.text_columns.len() > 2 {
        DataType::TextHeavy
    } else if profile.numerical_columns.len() > 10 {
        DataType::Numerical
    } else {
        DataType::Mixed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, values: Vec<Value>) -> Column {
        Column::new(name, values)
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn test_empty_table_fails() {
        let err = SchemaClassifier::default().classify(&Table::new()).unwrap_err();
        assert_eq!(err, ClassificationError::EmptyInput);
    }

    #[test]
    fn test_column_roles() {
        let classifier = SchemaClassifier::default();
        let long = "a rather long free text value over twenty chars";

        let cases = [
            (col("b", vec![Value::Int(0), Value::Int(1), Value::Null]), Some(ColumnRole::Boolean)),
            (col("b2", vec![Value::Bool(true), Value::Float(0.0)]), Some(ColumnRole::Boolean)),
            (col("n", vec![Value::Int(3), Value::Float(1.5)]), Some(ColumnRole::Numerical)),
            (col("t", vec![text(long), text(long)]), Some(ColumnRole::Text)),
            (col("c", vec![text("NY"), text("LA")]), Some(ColumnRole::Categorical)),
            (col("e", vec![Value::Null, Value::Float(f64::NAN)]), None),
        ];
        for (column, expected) in cases {
            assert_eq!(classifier.column_role(&column), expected, "column {}", column.name);
        }
    }

    #[test]
    fn test_target_excluded_from_roles() {
        let table = Table::from_columns(vec![
            col("amount_usd", vec![Value::Float(3.0), Value::Float(9.0)]),
            col("Fraud", vec![Value::Int(0), Value::Int(1)]),
        ])
        .unwrap();
        let profile = SchemaClassifier::default().classify(&table).unwrap();
        assert!(profile.has_target);
        assert_eq!(profile.target_column.as_deref(), Some("Fraud"));
        assert!(profile.assigned_columns().all(|c| c != "Fraud"));
        assert_eq!(profile.numerical_columns, vec!["amount_usd"]);
    }

    #[test]
    fn test_first_target_candidate_wins() {
        let table = Table::from_columns(vec![
            col("label", vec![Value::Int(1)]),
            col("fraudulent", vec![Value::Int(0)]),
        ])
        .unwrap();
        let profile = SchemaClassifier::default().classify(&table).unwrap();
        assert_eq!(profile.target_column.as_deref(), Some("label"));
        assert_eq!(profile.boolean_columns, vec!["fraudulent"]);
    }

    #[test]
    fn test_data_type_priority() {
        let classifier = SchemaClassifier::default();

        // job-posting markers outrank financial ones
        let both = Table::from_columns(vec![
            col("Time", vec![Value::Int(1)]),
            col("title", vec![text("x")]),
        ])
        .unwrap();
        assert_eq!(classifier.classify(&both).unwrap().data_type, DataType::JobPostings);

        let financial = Table::from_columns(vec![col("Time", vec![Value::Int(7)])]).unwrap();
        assert_eq!(classifier.classify(&financial).unwrap().data_type, DataType::Financial);

        let numerical = Table::from_columns(
            (0..11).map(|i| col(&format!("f{i}"), vec![Value::Float(i as f64 + 2.5)])).collect(),
        )
        .unwrap();
        assert_eq!(classifier.classify(&numerical).unwrap().data_type, DataType::Numerical);

        let long = "lorem ipsum dolor sit amet consectetur";
        let text_heavy = Table::from_columns(
            (0..3).map(|i| col(&format!("t{i}"), vec![text(long)])).collect(),
        )
        .unwrap();
        assert_eq!(classifier.classify(&text_heavy).unwrap().data_type, DataType::TextHeavy);

        let mixed = Table::from_columns(vec![col("city", vec![text("Paris")])]).unwrap();
        assert_eq!(classifier.classify(&mixed).unwrap().data_type, DataType::Mixed);
    }
}
