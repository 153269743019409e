//! Dataset profiling for oracle context.
//!
//! Produces a compact textual description of a table (shape, per-column types
//! and ranges, value distributions, head preview) that is handed to the code
//! oracle as schema context. Column types are inferred loosely from cell
//! content since the in-core table is untyped.

use crate::dataframe::DataFrame;
use std::collections::HashMap;

/// Loosely inferred column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Int,
    Float,
    Text,
}

impl ColumnType {
    fn label(self) -> &'static str {
        match self {
            Self::Int => "int64",
            Self::Float => "float64",
            Self::Text => "object",
        }
    }
}

/// Infers a column's type from its non-empty cells. A column with no
/// non-empty cells is text.
pub fn infer_column_type(values: &[&str]) -> ColumnType {
    let non_empty: Vec<&str> = values.iter().copied().filter(|v| !v.is_empty()).collect();
    if non_empty.is_empty() {
        return ColumnType::Text;
    }
    if non_empty.iter().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnType::Int;
    }
    if non_empty.iter().all(|v| v.parse::<f64>().is_ok()) {
        return ColumnType::Float;
    }
    ColumnType::Text
}

const MAX_VALUE_DISPLAY: usize = 30;
const LOW_CARDINALITY: usize = 10;
const MODERATE_CARDINALITY: usize = 50;
const PREVIEW_ROWS: usize = 3;

/// Generates the dataset context string fed to the oracle.
pub fn dataset_profile(df: &DataFrame, dataset_name: &str) -> String {
    let (rows, cols) = df.shape();
    let mut out = Vec::new();

    out.push(format!("Dataset: {}", dataset_name));
    out.push(format!("Shape: {} rows x {} columns", rows, cols));
    out.push("\nColumns and Data Types:".to_string());

    for column in df.columns() {
        let values = df
            .column_values(column)
            .unwrap_or_default();
        out.push(describe_column(column, &values));
    }

    out.push(format!("\nFirst {} rows preview:", PREVIEW_ROWS));
    out.push(render_preview(df, PREVIEW_ROWS));

    out.join("\n")
}

fn describe_column(name: &str, values: &[&str]) -> String {
    let column_type = infer_column_type(values);
    let non_null = values.iter().filter(|v| !v.is_empty()).count();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().filter(|v| !v.is_empty()) {
        *counts.entry(value).or_insert(0) += 1;
    }
    let unique = counts.len();

    let mut line = format!(
        "  - {} ({}): {} non-null, {} unique",
        name,
        column_type.label(),
        non_null,
        unique
    );

    match column_type {
        ColumnType::Int | ColumnType::Float if non_null > 0 => {
            let numbers: Vec<f64> = values
                .iter()
                .filter_map(|v| v.parse::<f64>().ok())
                .collect();
            let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
            let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            line.push_str(&format!(", range: [{:.2}, {:.2}]", min, max));
        }
        _ if unique > 0 && unique <= MODERATE_CARDINALITY => {
            // Sorted by count descending, then value for determinism
            let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

            let (label, shown) = if unique <= LOW_CARDINALITY {
                ("values", ranked.len())
            } else {
                ("top 10", 10)
            };

            let rendered: Vec<String> = ranked
                .iter()
                .take(shown)
                .map(|(value, count)| format!("{}({})", truncate(value), count))
                .collect();
            line.push_str(&format!(", {}: {}", label, rendered.join(", ")));
        }
        _ => {}
    }

    line
}

fn truncate(value: &str) -> &str {
    match value.char_indices().nth(MAX_VALUE_DISPLAY) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}

fn render_preview(df: &DataFrame, n: usize) -> String {
    let mut widths: Vec<usize> = df.columns().iter().map(|c| c.len()).collect();
    let preview = df.head(n);
    for row in preview {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![render_row(df.columns().iter().map(String::as_str).collect())];
    for row in preview {
        lines.push(render_row(row.iter().map(String::as_str).collect()));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn df(columns: &[&str], rows: &[&[&str]]) -> DataFrame {
        DataFrame::new(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn infers_types_from_cells() {
        assert_eq!(infer_column_type(&["1", "2", "3"]), ColumnType::Int);
        assert_eq!(infer_column_type(&["1.5", "2"]), ColumnType::Float);
        assert_eq!(infer_column_type(&["a", "1"]), ColumnType::Text);
        assert_eq!(infer_column_type(&["", ""]), ColumnType::Text);
    }

    #[test]
    fn profile_includes_shape_and_ranges() {
        let table = df(
            &["age", "city"],
            &[&["30", "NYC"], &["40", "LA"], &["50", "NYC"]],
        );
        let profile = dataset_profile(&table, "people");

        assert!(profile.contains("Dataset: people"));
        assert!(profile.contains("Shape: 3 rows x 2 columns"));
        assert!(profile.contains("age (int64): 3 non-null, 3 unique"));
        assert!(profile.contains("range: [30.00, 50.00]"));
        assert!(profile.contains("NYC(2)"));
    }

    #[test]
    fn profile_preview_shows_first_rows() {
        let table = df(&["x"], &[&["1"], &["2"], &["3"], &["4"]]);
        let profile = dataset_profile(&table, "t");
        assert!(profile.contains("First 3 rows preview:"));
        assert!(profile.contains('3'));
        assert!(!profile.lines().any(|l| l.trim() == "4"));
    }

    #[test]
    fn counts_nulls_as_missing() {
        let table = df(&["v"], &[&["a"], &[""], &["a"]]);
        let profile = dataset_profile(&table, "t");
        assert!(profile.contains("2 non-null, 1 unique"));
    }
}
