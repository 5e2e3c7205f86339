//! Tabular records: loading, schema validation, healing, imputation.
//!
//! Stages are pure: each takes a `&Dataset` and returns a new one.

pub mod schema;
mod validate;
mod impute;
mod normalize;
pub mod synthetic;

pub use schema::{ColumnGenerator, ColumnKind, ColumnSpec, SchemaSpec};
pub use validate::validate;
pub use impute::impute;
pub use normalize::normalize;

use crate::error::{PipelineError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    /// Parse a raw CSV cell. Empty and NaN cells are null.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
            return Value::Null;
        }
        match s.parse::<f64>() {
            Ok(v) if v.is_finite() => Value::Number(v),
            _ => Value::Text(s.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn to_cell(&self) -> String {
        match self {
            Value::Number(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Null => String::new(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// Column-major table. Every column holds exactly `rows` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: IndexMap<String, Vec<Value>>,
    rows: usize,
}

impl Dataset {
    /// Empty table with a fixed row count (columns are added later).
    pub fn with_rows(rows: usize) -> Self {
        Self {
            columns: IndexMap::new(),
            rows,
        }
    }

    /// Build from a header and row-major cells. Short rows are padded with nulls.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<Value>>) -> Self {
        let n = rows.len();
        let mut columns: IndexMap<String, Vec<Value>> = headers
            .iter()
            .map(|h| (h.clone(), Vec::with_capacity(n)))
            .collect();
        for mut row in rows {
            row.resize(headers.len(), Value::Null);
            for (h, cell) in headers.iter().zip(row) {
                if let Some(col) = columns.get_mut(h) {
                    col.push(cell);
                }
            }
        }
        Self { columns, rows: n }
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Numeric view of a column; non-numeric cells read as `None`.
    pub fn numeric(&self, name: &str) -> Option<Vec<Option<f64>>> {
        self.column(name)
            .map(|c| c.iter().map(Value::as_f64).collect())
    }

    /// Insert or replace a column. Length must equal the row count.
    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows, "column length mismatch");
        self.columns.insert(name.into(), values);
    }

    /// Keep only rows for which `keep(row_index)` is true.
    pub fn retain_rows(&self, keep: impl Fn(usize) -> bool) -> Dataset {
        let kept: Vec<usize> = (0..self.rows).filter(|&i| keep(i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), kept.iter().map(|&i| col[i].clone()).collect()))
            .collect();
        Dataset {
            columns,
            rows: kept.len(),
        }
    }

    /// Write as CSV with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut w = csv::Writer::from_path(path)?;
        w.write_record(self.columns.keys())?;
        for i in 0..self.rows {
            w.write_record(self.columns.values().map(|c| c[i].to_cell()))?;
        }
        w.flush()?;
        Ok(())
    }
}

/// Load a CSV dataset from disk.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Value::parse).collect::<Vec<_>>());
    }
    if rows.is_empty() {
        return Err(PipelineError::EmptyDataset(path.to_path_buf()));
    }
    let ds = Dataset::from_rows(&headers, rows);
    info!(rows = ds.n_rows(), columns = headers.len(), path = %path.display(), "loaded dataset");
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_cells() {
        assert_eq!(Value::parse("12.5"), Value::Number(12.5));
        assert_eq!(Value::parse(" Rural "), Value::Text("Rural".into()));
        assert_eq!(Value::parse(""), Value::Null);
        assert_eq!(Value::parse("NaN"), Value::Null);
    }

    #[test]
    fn load_missing_file() {
        let err = load_csv(Path::new("definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::NotFound(_)));
    }

    #[test]
    fn load_header_only_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, "a,b\n").unwrap();
        assert!(matches!(load_csv(&path), Err(PipelineError::EmptyDataset(_))));
    }

    #[test]
    fn csv_write_then_load_keeps_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "score,area\n10,Urban\n,Rural").unwrap();
        drop(f);

        let ds = load_csv(&path).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column("score").unwrap()[1], Value::Null);

        let out = dir.path().join("out.csv");
        ds.write_csv(&out).unwrap();
        assert_eq!(load_csv(&out).unwrap(), ds);
    }

    #[test]
    fn retain_rows_filters_all_columns() {
        let ds = Dataset::from_rows(
            &["x".to_string(), "y".to_string()],
            vec![
                vec![1.0.into(), "a".into()],
                vec![2.0.into(), "b".into()],
                vec![3.0.into(), "c".into()],
            ],
        );
        let kept = ds.retain_rows(|i| i != 1);
        assert_eq!(kept.n_rows(), 2);
        assert_eq!(kept.column("y").unwrap()[1], Value::Text("c".into()));
    }
}
