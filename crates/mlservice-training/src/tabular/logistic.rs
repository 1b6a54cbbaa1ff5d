use crate::artifacts::Metrics;
use crate::dataset::{Dataset, Table};
use crate::error::{TrainingError, TrainingResult};
use crate::model::{Model, Params, Prediction};
use crate::tabular::metrics::{evaluate_classification, DECISION_THRESHOLD};
use crate::tabular::{with_columns, FeatureEncoder, TabularColumns};
use serde::{Deserialize, Serialize};

const DEFAULT_LEARNING_RATE: f64 = 0.1;
const DEFAULT_EPOCHS: f64 = 500.0;
/// Upper bound on `epochs`; larger requests are rejected before fitting.
pub const MAX_EPOCHS: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LogisticState {
    encoder: FeatureEncoder,
    means: Vec<f64>,
    scales: Vec<f64>,
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LogisticState {
    fn standardize(&self, rows: &mut [Vec<f64>]) {
        for row in rows {
            for ((x, mean), scale) in row.iter_mut().zip(&self.means).zip(&self.scales) {
                *x = (*x - mean) / scale;
            }
        }
    }

    fn probability(&self, row: &[f64]) -> f64 {
        let z = self.intercept + row.iter().zip(&self.coefficients).map(|(x, w)| x * w).sum::<f64>();
        sigmoid(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Binary classifier trained with batch gradient descent on standardized features.
///
/// Hyperparameters: `learning_rate` (0.1), `epochs` (500, at most [`MAX_EPOCHS`]), `l2` (0.0). The target
/// column must hold 0/1 labels.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: Params,
    state: Option<LogisticState>,
}

impl LogisticRegression {
    pub const KIND: &'static str = "logistic_regression";

    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params, state: None }
    }

    fn roles(&self) -> TabularColumns<'_> {
        TabularColumns::new(&self.params)
    }

    fn learned(&self) -> TrainingResult<&LogisticState> {
        self.state.as_ref().ok_or_else(|| TrainingError::Model("logistic regression has no learned weights".to_string()))
    }

    /// Positive-class probability for every row.
    pub fn predict_proba(&self, table: &Table) -> TrainingResult<Vec<f64>> {
        let state = self.learned()?;
        let mut rows = state.encoder.transform(table)?;
        state.standardize(&mut rows);
        Ok(rows.iter().map(|row| state.probability(row)).collect())
    }

    fn labels(&self, table: &Table) -> TrainingResult<Vec<f64>> {
        let target = self.roles().target_column();
        let labels = table.numeric_column(&target)?;
        if let Some(bad) = labels.iter().find(|y| **y != 0.0 && **y != 1.0) {
            return Err(TrainingError::Dataset(format!("target column {target} must hold 0/1 labels, found {bad}")));
        }
        Ok(labels)
    }
}

fn log_loss(state: &LogisticState, rows: &[Vec<f64>], labels: &[f64]) -> f64 {
    let eps = 1e-12;
    let total: f64 = rows
        .iter()
        .zip(labels)
        .map(|(row, y)| {
            let p = state.probability(row).clamp(eps, 1.0 - eps);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    total / rows.len().max(1) as f64
}

impl Model for LogisticRegression {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn fit(&mut self, train: &Dataset, eval: Option<&Dataset>) -> TrainingResult<()> {
        let table = train.require_table()?;
        let roles = self.roles();
        let learning_rate = roles.hyperparameter_f64("learning_rate", DEFAULT_LEARNING_RATE);
        let epochs = roles.hyperparameter_f64("epochs", DEFAULT_EPOCHS);
        if !(1.0..=MAX_EPOCHS).contains(&epochs) {
            return Err(TrainingError::Dataset(format!("epochs must be between 1 and {MAX_EPOCHS}, got {epochs}")));
        }
        let epochs = epochs as usize;
        let l2 = roles.hyperparameter_f64("l2", 0.0).max(0.0);

        let encoder = FeatureEncoder::fit(table, &roles)?;
        let labels = self.labels(table)?;
        let mut rows = encoder.transform(table)?;
        let width = encoder.width();
        let n = rows.len() as f64;

        let mut means = vec![0.0; width];
        for row in &rows {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x / n;
            }
        }
        let mut scales = vec![0.0; width];
        for row in &rows {
            for ((s, x), m) in scales.iter_mut().zip(row).zip(&means) {
                *s += (x - m).powi(2) / n;
            }
        }
        for s in &mut scales {
            *s = if *s > 0.0 { s.sqrt() } else { 1.0 };
        }

        let mut state = LogisticState { encoder, means, scales, intercept: 0.0, coefficients: vec![0.0; width] };
        state.standardize(&mut rows);

        for _ in 0..epochs {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;
            for (row, y) in rows.iter().zip(&labels) {
                let residual = state.probability(row) - y;
                grad_b += residual / n;
                for (g, x) in grad_w.iter_mut().zip(row) {
                    *g += residual * x / n;
                }
            }
            for (w, g) in state.coefficients.iter_mut().zip(&grad_w) {
                *w -= learning_rate * (g + l2 * *w);
            }
            state.intercept -= learning_rate * grad_b;
        }

        let train_loss = log_loss(&state, &rows, &labels);
        match eval.and_then(Dataset::as_table) {
            Some(eval_table) => {
                let eval_labels = self.labels(eval_table)?;
                let mut eval_rows = state.encoder.transform(eval_table)?;
                state.standardize(&mut eval_rows);
                let eval_loss = log_loss(&state, &eval_rows, &eval_labels);
                tracing::debug!(epochs, train_loss, eval_loss, "Fitted logistic regression");
            }
            None => tracing::debug!(epochs, train_loss, "Fitted logistic regression"),
        }

        self.state = Some(state);
        Ok(())
    }

    fn infer(&self, data: &Dataset) -> TrainingResult<Prediction> {
        let table = data.require_table()?;
        let roles = self.roles();
        let probabilities = self.predict_proba(table)?;
        let labels = probabilities.iter().map(|p| if *p > DECISION_THRESHOLD { 1.0 } else { 0.0 }).collect();

        let mut output = table.clone();
        with_columns(
            &mut output,
            &[(roles.prediction_column(), labels), (roles.predict_proba_column(), probabilities)],
        )?;
        Ok(Prediction::Table(output))
    }

    fn score(&self, data: &Dataset) -> TrainingResult<Metrics> {
        let table = data.require_table()?;
        let roles = self.roles();
        let mut predictions = Table::new();
        predictions.push_numeric(roles.predict_proba_column(), &self.predict_proba(table)?)?;
        evaluate_classification(
            table,
            &predictions,
            &roles.target_column(),
            &roles.prediction_column(),
            &roles.predict_proba_column(),
        )
    }

    fn state(&self) -> TrainingResult<serde_json::Value> {
        Ok(serde_json::to_value(&self.state)?)
    }

    fn restore(&mut self, state: serde_json::Value) -> TrainingResult<()> {
        self.state = serde_json::from_value(state)?;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn separable() -> Dataset {
        let mut table = Table::new();
        table.push_numeric("x", &[-3.0, -2.0, -1.0, 1.0, 2.0, 3.0]).unwrap();
        table.push_numeric("target", &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        Dataset::Table(table)
    }

    #[test]
    fn test_learns_separable_data() {
        let mut model = LogisticRegression::new(Params::new());
        model.fit(&separable(), None).unwrap();

        let metrics = model.score(&separable()).unwrap();
        assert_eq!(metrics["accuracy"], Some(1.0));
        assert_eq!(metrics["auc_score"], Some(1.0));
    }

    #[test]
    fn test_infer_emits_labels_and_probabilities() {
        let mut model = LogisticRegression::new(Params::new());
        model.fit(&separable(), Some(&separable())).unwrap();

        let prediction = model.infer(&separable()).unwrap();
        let table = prediction.as_table().unwrap();
        assert_eq!(table.numeric_column("prediction").unwrap(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let proba = table.numeric_column("predict_proba").unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_rejects_non_binary_target() {
        let mut table = Table::new();
        table.push_numeric("x", &[1.0, 2.0]).unwrap();
        table.push_numeric("target", &[0.0, 2.0]).unwrap();

        let mut model = LogisticRegression::new(Params::new());
        let err = model.fit(&Dataset::Table(table), None).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
    }

    #[test]
    fn test_rejects_unbounded_epochs() {
        for epochs in [json!(1e18), json!(0), json!(-5)] {
            let params = json!({"hyperparameters": {"epochs": epochs}}).as_object().cloned().unwrap();
            let mut model = LogisticRegression::new(params);
            let err = model.fit(&separable(), None).unwrap_err();
            assert!(matches!(err, TrainingError::Dataset(_)), "{err}");
            assert!(!model.is_ready());
        }
    }

    #[test]
    fn test_restore_reproduces_probabilities() {
        let params = json!({"hyperparameters": {"epochs": 50}}).as_object().cloned().unwrap();
        let mut model = LogisticRegression::new(params.clone());
        model.fit(&separable(), None).unwrap();

        let mut restored = LogisticRegression::new(params);
        restored.restore(model.state().unwrap()).unwrap();
        let table = separable();
        let table = table.as_table().unwrap();
        assert_eq!(restored.predict_proba(table).unwrap(), model.predict_proba(table).unwrap());
    }
}
