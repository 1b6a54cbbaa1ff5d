use crate::dataset::{Cell, Column, Dataset, Table};
use crate::error::{TrainingError, TrainingResult};
use std::path::Path;

/// Resolve a source identifier to a dataset.
///
/// `None` resolves to `None`. `.csv` and `.jsonl` load as tables, `.json` as a
/// document, and any other extension is passed through as a [`Dataset::Reference`].
pub fn load_data(source: Option<&str>) -> TrainingResult<Option<Dataset>> {
    let Some(source) = source else {
        return Ok(None);
    };

    let path = Path::new(source);
    if !path.exists() {
        return Err(TrainingError::SourceNotFound(path.to_path_buf()));
    }

    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    let dataset = match extension.as_deref() {
        Some("csv") => Dataset::Table(read_csv(path)?),
        Some("jsonl") => Dataset::Table(read_jsonl(path)?),
        Some("json") => {
            let bytes = std::fs::read(path)?;
            let document = serde_json::from_slice(&bytes)
                .map_err(|e| TrainingError::Dataset(format!("failed to parse json document: {e}")))?;
            Dataset::Document(document)
        }
        _ => Dataset::Reference(source.to_string()),
    };

    tracing::debug!(source, kind = dataset.describe(), "Loaded dataset");
    Ok(Some(dataset))
}

fn read_csv(path: &Path) -> TrainingResult<Table> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(ToString::to_string).collect();
    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (idx, values) in columns.iter_mut().enumerate() {
            values.push(record.get(idx).map_or(Cell::Missing, Cell::parse));
        }
    }

    Table::from_columns(
        headers
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column { name, values })
            .collect(),
    )
}

fn read_jsonl(path: &Path) -> TrainingResult<Table> {
    let contents = std::fs::read_to_string(path)?;
    let mut records = Vec::new();

    for (idx, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| {
            TrainingError::Dataset(format!("failed to parse jsonl line {}: {}", idx + 1, e))
        })?;
        records.push(record);
    }

    Ok(Table::from_records(&records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn path_str(path: &Path) -> &str {
        path.to_str().unwrap()
    }

    #[test]
    fn test_none_source_is_absent() {
        assert!(load_data(None).unwrap().is_none());
    }

    #[test]
    fn test_missing_source_fails() {
        let err = load_data(Some("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, TrainingError::SourceNotFound(_)));
    }

    #[test]
    fn test_json_loads_as_document() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();

        let dataset = load_data(Some(path_str(&path))).unwrap().unwrap();
        assert_eq!(dataset, Dataset::Document(serde_json::json!({"a": 1})));
    }

    #[test]
    fn test_unknown_extension_passes_through() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("weights.bin");
        std::fs::write(&path, [0u8, 1, 2]).unwrap();

        let dataset = load_data(Some(path_str(&path))).unwrap().unwrap();
        assert_eq!(dataset, Dataset::Reference(path_str(&path).to_string()));
    }

    #[test]
    fn test_csv_loads_as_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("train.csv");
        std::fs::write(&path, ",col1\n0,1\n1,2\n2,3\n").unwrap();

        let dataset = load_data(Some(path_str(&path))).unwrap().unwrap();
        let table = dataset.require_table().unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.numeric_column("col1").unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_jsonl_loads_as_table() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rows.jsonl");
        std::fs::write(&path, "{\"x\": 1}\n\n{\"x\": 2}\n").unwrap();

        let dataset = load_data(Some(path_str(&path))).unwrap().unwrap();
        assert_eq!(dataset.require_table().unwrap().numeric_column("x").unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_jsonl_reports_bad_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rows.jsonl");
        std::fs::write(&path, "{\"x\": 1}\nnot json\n").unwrap();

        let err = load_data(Some(path_str(&path))).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_malformed_json_is_dataset_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data.json");
        std::fs::write(&path, "{\"a\": ").unwrap();

        let err = load_data(Some(path_str(&path))).unwrap_err();
        assert!(matches!(err, TrainingError::Dataset(_)));
        assert!(err.is_client_error());
    }
}
