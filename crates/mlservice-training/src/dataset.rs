use crate::error::{TrainingError, TrainingResult};
use serde::{Deserialize, Serialize};

/// A single tabular value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Missing,
}

impl Cell {
    /// Parse a raw CSV field. Empty fields are missing; numeric fields become numbers.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }
        trimmed.parse::<f64>().map_or_else(|_| Self::Text(raw.to_string()), Self::Number)
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(t) => t.trim().parse().ok(),
            Self::Missing => None,
        }
    }

    /// Category key used for one-hot encoding and label comparison.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(t) => t.clone(),
            Self::Missing => String::new(),
        }
    }

    fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Number),
            serde_json::Value::Bool(b) => Self::Number(if *b { 1.0 } else { 0.0 }),
            serde_json::Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

/// Column-major table, the in-memory form of CSV and JSONL sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(columns: Vec<Column>) -> TrainingResult<Self> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column.name, column.values)?;
        }
        Ok(table)
    }

    /// Build a table from JSON objects. Column order follows first appearance.
    pub fn from_records(records: &[serde_json::Map<String, serde_json::Value>]) -> Self {
        let mut names: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
        }

        let columns = names
            .into_iter()
            .map(|name| {
                let values = records
                    .iter()
                    .map(|r| r.get(&name).map_or(Cell::Missing, Cell::from_json))
                    .collect();
                Column { name, values }
            })
            .collect();

        Self { columns }
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Extract a column as numbers, failing on missing or non-numeric cells.
    pub fn numeric_column(&self, name: &str) -> TrainingResult<Vec<f64>> {
        let column = self
            .column(name)
            .ok_or_else(|| TrainingError::Dataset(format!("column not found: {name}")))?;

        column
            .values
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.as_f64().ok_or_else(|| {
                    TrainingError::Dataset(format!("column {name} row {row} is not numeric"))
                })
            })
            .collect()
    }

    /// Append a column, replacing an existing one of the same name.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<Cell>) -> TrainingResult<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.num_rows() {
            return Err(TrainingError::Dataset(format!(
                "column {name} has {} rows, table has {}",
                values.len(),
                self.num_rows()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// Append a numeric column.
    pub fn push_numeric(&mut self, name: impl Into<String>, values: &[f64]) -> TrainingResult<()> {
        self.push_column(name, values.iter().copied().map(Cell::Number).collect())
    }
}

/// An in-memory dataset resolved from a source identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Dataset {
    Table(Table),
    Document(serde_json::Value),
    /// Unrecognized extension; the source identifier is passed through unchanged.
    Reference(String),
}

impl Dataset {
    #[must_use]
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn require_table(&self) -> TrainingResult<&Table> {
        self.as_table().ok_or_else(|| {
            TrainingError::Dataset(format!("expected tabular data, got {}", self.describe()))
        })
    }

    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Table(_) => "table",
            Self::Document(_) => "document",
            Self::Reference(_) => "reference",
        }
    }
}
