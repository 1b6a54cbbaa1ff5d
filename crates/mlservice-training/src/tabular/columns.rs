use crate::model::Params;
use serde_json::Value;

pub const DEFAULT_TARGET: &str = "target";
pub const DEFAULT_PREDICTION: &str = "prediction";
pub const DEFAULT_PREDICT_PROBA: &str = "predict_proba";

/// Column roles and hyperparameters read from a tabular model's params.
///
/// Roles live under `params.columns` (`features`, `target`, `prediction`,
/// `predict_proba`, `categorical`); hyperparameters under `params.hyperparameters`.
#[derive(Debug, Clone, Copy)]
pub struct TabularColumns<'a> {
    params: &'a Params,
}

impl<'a> TabularColumns<'a> {
    #[must_use]
    pub fn new(params: &'a Params) -> Self {
        Self { params }
    }

    fn columns(&self) -> Option<&'a serde_json::Map<String, Value>> {
        self.params.get("columns").and_then(Value::as_object)
    }

    fn string_role(&self, role: &str, default: &str) -> String {
        self.columns()
            .and_then(|c| c.get(role))
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    }

    fn list_role(&self, role: &str) -> Vec<String> {
        self.columns()
            .and_then(|c| c.get(role))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn feature_columns(&self) -> Vec<String> {
        self.list_role("features")
    }

    #[must_use]
    pub fn target_column(&self) -> String {
        self.string_role("target", DEFAULT_TARGET)
    }

    #[must_use]
    pub fn prediction_column(&self) -> String {
        self.string_role("prediction", DEFAULT_PREDICTION)
    }

    #[must_use]
    pub fn predict_proba_column(&self) -> String {
        self.string_role("predict_proba", DEFAULT_PREDICT_PROBA)
    }

    #[must_use]
    pub fn categorical_columns(&self) -> Vec<String> {
        self.list_role("categorical")
    }

    #[must_use]
    pub fn hyperparameters(&self) -> Params {
        self.params
            .get("hyperparameters")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn hyperparameter_f64(&self, name: &str, default: f64) -> f64 {
        self.params
            .get("hyperparameters")
            .and_then(|h| h.get(name))
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    /// Columns that never act as features.
    #[must_use]
    pub fn reserved_columns(&self) -> [String; 3] {
        [self.target_column(), self.prediction_column(), self.predict_proba_column()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: serde_json::Value) -> Params {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_defaults() {
        let p = Params::new();
        let cols = TabularColumns::new(&p);
        assert!(cols.feature_columns().is_empty());
        assert_eq!(cols.target_column(), "target");
        assert_eq!(cols.prediction_column(), "prediction");
        assert_eq!(cols.predict_proba_column(), "predict_proba");
        assert!(cols.categorical_columns().is_empty());
        assert!(cols.hyperparameters().is_empty());
    }

    #[test]
    fn test_configured_roles() {
        let p = params(json!({
            "columns": {
                "features": ["age", "plan"],
                "target": "churned",
                "categorical": ["plan"]
            },
            "hyperparameters": {"learning_rate": 0.05}
        }));
        let cols = TabularColumns::new(&p);
        assert_eq!(cols.feature_columns(), vec!["age", "plan"]);
        assert_eq!(cols.target_column(), "churned");
        assert_eq!(cols.categorical_columns(), vec!["plan"]);
        assert!((cols.hyperparameter_f64("learning_rate", 0.1) - 0.05).abs() < f64::EPSILON);
        assert!((cols.hyperparameter_f64("epochs", 500.0) - 500.0).abs() < f64::EPSILON);
    }
}
