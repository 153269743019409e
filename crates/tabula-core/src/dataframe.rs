//! In-memory tabular value used across the whole pipeline.
//!
//! A [`DataFrame`] is an ordered set of named columns over rows of string
//! cells. It deliberately stays untyped: the dataset travels to the sandbox
//! and back as CSV, so string cells give exact byte-for-byte round-trips and
//! cheap equality. Numeric interpretation happens only at profiling time.

use crate::error::{Result, TabulaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{Read, Write};

/// An immutable snapshot of tabular data (column names + rows of cells).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataFrame {
    /// Creates a dataframe from columns and rows.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if any row's width differs from the column count.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = columns.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(TabulaError::Validation(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows, in order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// (rows, columns) shape tuple.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    /// True when the table holds no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Column names as a set, for schema-delta computations.
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cell values of one column, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..self.rows.len().min(n)]
    }

    /// Parses a dataframe from CSV text with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Self::new(columns, rows)
    }

    /// Parses a dataframe from raw CSV bytes.
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_csv_reader(bytes)
    }

    /// Writes the dataframe as CSV with a header row.
    pub fn to_csv_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush().map_err(TabulaError::from)?;
        Ok(())
    }

    /// Renders the dataframe as a CSV string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.to_csv_writer(&mut buf)?;
        String::from_utf8(buf)
            .map_err(|e| TabulaError::internal(format!("CSV output was not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(
            vec!["col1".into(), "col2".into()],
            vec![
                vec!["1".into(), "a".into()],
                vec!["2".into(), "b".into()],
                vec!["3".into(), "c".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn rejects_ragged_rows() {
        let result = DataFrame::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into()]],
        );
        assert!(matches!(result, Err(TabulaError::Validation(_))));
    }

    #[test]
    fn csv_round_trip_preserves_content() {
        let df = sample();
        let csv = df.to_csv_string().unwrap();
        let back = DataFrame::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(df, back);
    }

    #[test]
    fn parses_csv_with_quoted_cells() {
        let csv = "name,notes\nalice,\"hello, world\"\n";
        let df = DataFrame::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(df.shape(), (1, 2));
        assert_eq!(df.rows()[0][1], "hello, world");
    }

    #[test]
    fn head_is_bounded_by_row_count() {
        let df = sample();
        assert_eq!(df.head(2).len(), 2);
        assert_eq!(df.head(10).len(), 3);
    }

    #[test]
    fn column_accessors() {
        let df = sample();
        assert_eq!(df.column_index("col2"), Some(1));
        assert_eq!(df.column_values("col1").unwrap(), vec!["1", "2", "3"]);
        assert!(df.column_values("missing").is_none());
        assert!(df.column_set().contains("col1"));
    }
}
