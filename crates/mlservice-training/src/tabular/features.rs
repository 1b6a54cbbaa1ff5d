use crate::dataset::{Cell, Table};
use crate::error::{TrainingError, TrainingResult};
use crate::tabular::TabularColumns;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
enum FeatureColumn {
    Numeric { name: String },
    /// One-hot over the categories seen at fit time, first category dropped.
    /// Unseen categories encode as all zeros.
    OneHot { name: String, categories: Vec<String> },
}

impl FeatureColumn {
    fn width(&self) -> usize {
        match self {
            Self::Numeric { .. } => 1,
            Self::OneHot { categories, .. } => categories.len().saturating_sub(1),
        }
    }
}

/// Turns table rows into numeric feature vectors, remembering the encoding
/// learned on the training table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<FeatureColumn>,
}

impl FeatureEncoder {
    /// Learn the encoding from a training table.
    ///
    /// With no configured feature columns every non-reserved column is used.
    pub fn fit(table: &Table, roles: &TabularColumns<'_>) -> TrainingResult<Self> {
        let reserved = roles.reserved_columns();
        let mut features = roles.feature_columns();
        if features.is_empty() {
            features = table
                .column_names()
                .filter(|name| !reserved.iter().any(|r| r == name))
                .map(ToString::to_string)
                .collect();
        }
        if features.is_empty() {
            return Err(TrainingError::Dataset("no feature columns available".to_string()));
        }

        let categorical = roles.categorical_columns();
        let mut columns = Vec::with_capacity(features.len());
        for name in features {
            let column = table
                .column(&name)
                .ok_or_else(|| TrainingError::Dataset(format!("feature column not found: {name}")))?;

            if categorical.contains(&name) {
                let mut categories: Vec<String> = column.values.iter().map(Cell::key).collect();
                categories.sort();
                categories.dedup();
                columns.push(FeatureColumn::OneHot { name, categories });
            } else {
                columns.push(FeatureColumn::Numeric { name });
            }
        }

        Ok(Self { columns })
    }

    /// Number of encoded features per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.columns.iter().map(FeatureColumn::width).sum()
    }

    /// Encode every row of `table`.
    pub fn transform(&self, table: &Table) -> TrainingResult<Vec<Vec<f64>>> {
        let rows = table.num_rows();
        let mut matrix = vec![Vec::with_capacity(self.width()); rows];

        for feature in &self.columns {
            match feature {
                FeatureColumn::Numeric { name } => {
                    let values = table.numeric_column(name)?;
                    for (row, value) in matrix.iter_mut().zip(values) {
                        row.push(value);
                    }
                }
                FeatureColumn::OneHot { name, categories } => {
                    let column = table
                        .column(name)
                        .ok_or_else(|| TrainingError::Dataset(format!("feature column not found: {name}")))?;
                    for (row, cell) in matrix.iter_mut().zip(&column.values) {
                        let key = cell.key();
                        row.extend(categories.iter().skip(1).map(|c| if *c == key { 1.0 } else { 0.0 }));
                    }
                }
            }
        }

        Ok(matrix)
    }
}
