//! tabforge-quality: the schema gate between program execution and result.
//!
//! ```
//! use tabforge_core::TargetFrame;
//! use tabforge_quality::SchemaValidator;
//!
//! let table = TargetFrame::zeros(2).to_table();
//! let validator = SchemaValidator::new();
//! assert!(validator.validate(&table));
//! assert!(validator.evaluate(&table, Some(2)).passed());
//! ```

pub mod gate;

pub use gate::{Check, CheckStatus, SchemaValidator, SchemaVerdict, VERDICT_BLOCK, VERDICT_OK};

#[cfg(test)]
mod tests {
    use super::*;
    use tabforge_core::{Column, Table, TargetFrame, Value};

    fn target_table(rows: usize) -> Table {
        TargetFrame::zeros(rows).to_table()
    }

    #[test]
    fn test_superset_passes_and_extras_are_reported() {
        let mut table = target_table(3);
        table.set_column(Column::new("Time", vec![Value::Int(0); 3])).unwrap();

        let validator = SchemaValidator::new();
        assert!(validator.validate(&table));

        let verdict = validator.evaluate(&table, Some(3));
        assert!(verdict.passed());
        assert_eq!(verdict.extra, vec!["Time"]);
        assert!(verdict.checks.iter().any(|c| c.name == "extra_columns" && c.status == CheckStatus::Warn));
    }

    #[test]
    fn test_missing_columns_block() {
        let table = target_table(2).select(&["V1", "V2", "Amount"]).unwrap();
        let validator = SchemaValidator::new();
        assert!(!validator.validate(&table));

        let verdict = validator.evaluate(&table, None);
        assert_eq!(verdict.verdict, VERDICT_BLOCK);
        assert_eq!(verdict.missing.len(), 27);
        assert!(verdict.missing.contains(&"label".to_string()));
    }

    #[test]
    fn test_label_out_of_domain_blocks() {
        let mut table = target_table(2);
        table.set_column(Column::new("label", vec![Value::Int(0), Value::Int(2)])).unwrap();

        let validator = SchemaValidator::new();
        assert!(validator.validate(&table));
        let err = validator.accept(&table, Some(2)).unwrap_err();
        assert!(err.checks.iter().any(|c| c.name == "cell_types" && c.status == CheckStatus::Fail));
    }

    #[test]
    fn test_row_count_mismatch_blocks() {
        let validator = SchemaValidator::new();
        let verdict = validator.evaluate(&target_table(2), Some(5));
        assert!(!verdict.passed());
        assert_eq!(verdict.summary, "failed checks: row_count");
    }

    #[test]
    fn test_accept_projects() {
        let mut table = target_table(1);
        table.set_column(Column::new("extra", vec![Value::Text("x".into())])).unwrap();
        let frame = SchemaValidator::new().accept(&table, Some(1)).unwrap();
        assert_eq!(frame.to_table().num_columns(), 30);
    }
}
