use crate::artifacts::Metrics;
use crate::dataset::{Dataset, Table};
use crate::error::{TrainingError, TrainingResult};
use crate::model::{Model, Params, Prediction};
use crate::tabular::metrics::evaluate_regression;
use crate::tabular::{with_columns, FeatureEncoder, TabularColumns};
use serde::{Deserialize, Serialize};

/// Diagonal jitter keeping the normal equations solvable for collinear features.
const RIDGE_FLOOR: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearState {
    encoder: FeatureEncoder,
    intercept: f64,
    coefficients: Vec<f64>,
}

/// Least-squares regression with optional L2 penalty (`hyperparameters.l2`).
#[derive(Debug, Clone)]
pub struct LinearRegression {
    params: Params,
    state: Option<LinearState>,
}

impl LinearRegression {
    pub const KIND: &'static str = "linear_regression";

    #[must_use]
    pub fn new(params: Params) -> Self {
        Self { params, state: None }
    }

    fn roles(&self) -> TabularColumns<'_> {
        TabularColumns::new(&self.params)
    }

    fn learned(&self) -> TrainingResult<&LinearState> {
        self.state.as_ref().ok_or_else(|| TrainingError::Model("linear regression has no learned coefficients".to_string()))
    }

    /// Intercept followed by one coefficient per encoded feature.
    #[must_use]
    pub fn coefficients(&self) -> Option<(f64, &[f64])> {
        self.state.as_ref().map(|s| (s.intercept, s.coefficients.as_slice()))
    }

    pub fn predict_values(&self, table: &Table) -> TrainingResult<Vec<f64>> {
        let state = self.learned()?;
        let rows = state.encoder.transform(table)?;
        Ok(rows
            .iter()
            .map(|row| state.intercept + row.iter().zip(&state.coefficients).map(|(x, w)| x * w).sum::<f64>())
            .collect())
    }
}

impl Model for LinearRegression {
    fn kind(&self) -> &str {
        Self::KIND
    }

    fn fit(&mut self, train: &Dataset, _eval: Option<&Dataset>) -> TrainingResult<()> {
        let table = train.require_table()?;
        let roles = self.roles();
        let encoder = FeatureEncoder::fit(table, &roles)?;
        let rows = encoder.transform(table)?;
        let target = table.numeric_column(&roles.target_column())?;
        let l2 = roles.hyperparameter_f64("l2", 0.0).max(0.0);

        // Normal equations over [1, x]: (XᵀX + λI) β = Xᵀy, intercept unpenalized.
        let dim = encoder.width() + 1;
        let mut gram = vec![vec![0.0; dim]; dim];
        let mut moment = vec![0.0; dim];
        for (row, y) in rows.iter().zip(&target) {
            let augmented: Vec<f64> = std::iter::once(1.0).chain(row.iter().copied()).collect();
            for i in 0..dim {
                moment[i] += augmented[i] * y;
                for j in 0..dim {
                    gram[i][j] += augmented[i] * augmented[j];
                }
            }
        }
        for (i, diag) in gram.iter_mut().enumerate().skip(1) {
            diag[i] += l2 + RIDGE_FLOOR;
        }

        let beta = solve(gram, moment)
            .ok_or_else(|| TrainingError::Model("design matrix is singular; set hyperparameters.l2".to_string()))?;

        tracing::debug!(features = dim - 1, rows = rows.len(), "Fitted linear regression");
        self.state = Some(LinearState { encoder, intercept: beta[0], coefficients: beta[1..].to_vec() });
        Ok(())
    }

    fn infer(&self, data: &Dataset) -> TrainingResult<Prediction> {
        let table = data.require_table()?;
        let values = self.predict_values(table)?;
        let mut output = table.clone();
        with_columns(&mut output, &[(self.roles().prediction_column(), values)])?;
        Ok(Prediction::Table(output))
    }

    fn score(&self, data: &Dataset) -> TrainingResult<Metrics> {
        let table = data.require_table()?;
        let roles = self.roles();
        let mut predictions = Table::new();
        predictions.push_numeric(roles.prediction_column(), &self.predict_values(table)?)?;
        evaluate_regression(table, &predictions, &roles.target_column(), &roles.prediction_column())
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

/// Gaussian elimination with partial pivoting. `None` for singular systems.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset(x: &[f64], y: &[f64]) -> Dataset {
        let mut table = Table::new();
        table.push_numeric("x", x).unwrap();
        table.push_numeric("target", y).unwrap();
        Dataset::Table(table)
    }

    #[test]
    fn test_recovers_line() {
        let mut model = LinearRegression::new(Params::new());
        model.fit(&dataset(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0]), None).unwrap();

        let (intercept, coefficients) = model.coefficients().unwrap();
        assert!((intercept - 1.0).abs() < 1e-6);
        assert!((coefficients[0] - 2.0).abs() < 1e-6);

        let metrics = model.score(&dataset(&[4.0, 5.0], &[9.0, 11.0])).unwrap();
        assert!(metrics["mse"].unwrap() < 1e-9);
        assert!((metrics["r2"].unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_infer_appends_prediction_column() {
        let params = json!({"columns": {"features": ["x"], "prediction": "yhat"}}).as_object().cloned().unwrap();
        let mut model = LinearRegression::new(params);
        model.fit(&dataset(&[0.0, 1.0, 2.0], &[0.0, 2.0, 4.0]), None).unwrap();

        let prediction = model.infer(&dataset(&[5.0], &[0.0])).unwrap();
        let table = prediction.as_table().unwrap();
        let yhat = table.numeric_column("yhat").unwrap();
        assert!((yhat[0] - 10.0).abs() < 1e-6);
        assert!(table.has_column("x"));
    }

    #[test]
    fn test_state_round_trip() {
        let mut model = LinearRegression::new(Params::new());
        model.fit(&dataset(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]), None).unwrap();

        let mut restored = LinearRegression::new(Params::new());
        restored.restore(model.state().unwrap()).unwrap();
        assert_eq!(restored.coefficients(), model.coefficients());
    }

    #[test]
    fn test_rejects_non_tabular_input() {
        let mut model = LinearRegression::new(Params::new());
        let err = model.fit(&Dataset::Reference("blob.bin".to_string()), None).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
    }

    #[test]
    fn test_solve_singular() {
        assert!(solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }
}
