//! Downstream classifier interface.
//!
//! A model sees exactly `V1..V28, Amount` in that order; the label column is
//! never part of its input.

use tabforge_core::schema::model_input_columns;
use tabforge_core::{FeatureMatrix, Label};
use thiserror::Error;

use crate::result::TransformationResult;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("MODEL/expected columns [{}], got [{}]", .expected.join(", "), .got.join(", "))]
    ColumnMismatch { expected: Vec<String>, got: Vec<String> },
    #[error("MODEL/{0}")]
    Inference(String),
}

pub trait FraudModel: Send + Sync {
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, ModelError>;

    /// Fraud probability per row
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError>;
}

/// Predictions for one transformation result
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub labels: Vec<Label>,
    pub probabilities: Vec<f64>,
}

impl Scored {
    pub fn flagged(&self) -> usize {
        self.labels.iter().filter(|l| **l == Label::Fraud).count()
    }
}

pub fn check_columns(features: &FeatureMatrix) -> Result<(), ModelError> {
    let expected = model_input_columns();
    if features.columns != expected {
        return Err(ModelError::ColumnMismatch {
            expected,
            got: features.columns.clone(),
        });
    }
    Ok(())
}

pub fn score(model: &dyn FraudModel, result: &TransformationResult) -> Result<Scored, ModelError> {
    let features = result.frame.feature_matrix();
    check_columns(&features)?;
    let labels = model.predict(&features)?;
    let probabilities = model.predict_proba(&features)?;
    if labels.len() != features.rows.len() || probabilities.len() != features.rows.len() {
        return Err(ModelError::Inference(format!(
            "model returned {} labels and {} probabilities for {} rows",
            labels.len(),
            probabilities.len(),
            features.rows.len()
        )));
    }
    Ok(Scored { labels, probabilities })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransformationOrchestrator;
    use tabforge_core::{Column, EngineConfig, Table, Value, AMOUNT_COLUMN};

    /// Flags rows whose amount exceeds a fixed threshold
    struct AmountThreshold(f64);

    impl AmountThreshold {
        fn amount_index(features: &FeatureMatrix) -> Result<usize, ModelError> {
            features
                .columns
                .iter()
                .position(|c| c == AMOUNT_COLUMN)
                .ok_or_else(|| ModelError::Inference("no Amount column".into()))
        }
    }

    impl FraudModel for AmountThreshold {
        fn predict(&self, features: &FeatureMatrix) -> Result<Vec<Label>, ModelError> {
            Ok(self
                .predict_proba(features)?
                .into_iter()
                .map(|p| if p >= 0.5 { Label::Fraud } else { Label::Legit })
                .collect())
        }

        fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
            let idx = Self::amount_index(features)?;
            Ok(features.rows.iter().map(|r| if r[idx] > self.0 { 0.9 } else { 0.1 }).collect())
        }
    }

    #[tokio::test]
    async fn test_score_transformed_result() {
        let table = Table::from_columns(vec![Column::new(
            "price",
            vec![Value::Float(5.0), Value::Float(500.0), Value::Float(50.0)],
        )])
        .unwrap();
        let orchestrator = TransformationOrchestrator::builder(EngineConfig::default()).build().unwrap();
        let result = orchestrator.transform_offline(&table).await.unwrap();

        let scored = score(&AmountThreshold(100.0), &result).unwrap();
        assert_eq!(scored.labels, vec![Label::Legit, Label::Fraud, Label::Legit]);
        assert_eq!(scored.flagged(), 1);
    }

    #[test]
    fn test_column_order_is_enforced() {
        let mut columns = model_input_columns();
        columns.swap(0, 1);
        let err = check_columns(&FeatureMatrix { columns, rows: vec![] }).unwrap_err();
        assert!(matches!(err, ModelError::ColumnMismatch { .. }));
        assert!(err.to_string().starts_with("MODEL/expected columns [V1, V2"));
    }
}
