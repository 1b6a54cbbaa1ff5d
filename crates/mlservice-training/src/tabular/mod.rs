//! Tabular model variants: column roles, feature encoding, evaluators and
//! the two built-in estimators.

pub mod columns;
pub mod features;
pub mod metrics;

mod linear;
mod logistic;

pub use columns::TabularColumns;
pub use features::FeatureEncoder;
pub use linear::LinearRegression;
pub use logistic::LogisticRegression;
pub use metrics::{classification_metrics, evaluate_classification, evaluate_regression, regression_metrics};

use crate::dataset::Table;
use crate::error::TrainingResult;

/// Append (or overwrite) numeric output columns on a copy of the input table.
pub(crate) fn with_columns(table: &mut Table, outputs: &[(String, Vec<f64>)]) -> TrainingResult<()> {
    for (name, values) in outputs {
        table.push_numeric(name.as_str(), values)?;
    }
    Ok(())
}
