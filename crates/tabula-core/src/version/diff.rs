//! Dataframe change detection and description.
//!
//! The equality policy is deliberately exact: two tables are equal only when
//! their column lists, row counts, and every cell match. This guarantees that
//! identical tables are never reported as changed (which would create a
//! spurious version) and that any schema or content change is always reported
//! (a silent unversioned edit would be a correctness bug).

use crate::dataframe::DataFrame;
use serde::{Deserialize, Serialize};

/// Exact equality over shape, column names, and cell content.
pub fn dataframes_equal(a: &DataFrame, b: &DataFrame) -> bool {
    a.shape() == b.shape() && a.columns() == b.columns() && a.rows() == b.rows()
}

/// Describes the delta between two tables, or `None` when they are identical.
///
/// The description is derived from the row-count delta and the column-set
/// delta; when neither changed but the content differs, it falls back to a
/// generic notice.
pub fn describe_changes(old: &DataFrame, new: &DataFrame) -> Option<String> {
    if dataframes_equal(old, new) {
        return None;
    }

    let mut changes = Vec::new();

    let (old_rows, new_rows) = (old.row_count() as i64, new.row_count() as i64);
    if old_rows != new_rows {
        let delta = new_rows - old_rows;
        if delta > 0 {
            changes.push(format!("Added {} rows", delta));
        } else {
            changes.push(format!("Removed {} rows", -delta));
        }
    }

    let old_cols = old.column_set();
    let new_cols = new.column_set();

    let added: Vec<&str> = new_cols.difference(&old_cols).copied().collect();
    let removed: Vec<&str> = old_cols.difference(&new_cols).copied().collect();

    if !added.is_empty() {
        changes.push(format!("Added columns: {}", added.join(", ")));
    }
    if !removed.is_empty() {
        changes.push(format!("Removed columns: {}", removed.join(", ")));
    }

    if changes.is_empty() {
        changes.push("Modified data values".to_string());
    }

    Some(changes.join("; "))
}

/// Structured before/after summary attached to a `modification` turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationSummary {
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub new_columns: Vec<String>,
    pub removed_columns: Vec<String>,
    /// Column names of the preview rows (the new table's schema)
    pub preview_columns: Vec<String>,
    /// First rows of the new table
    pub preview_rows: Vec<Vec<String>>,
}

impl ModificationSummary {
    /// Builds a summary of `new` relative to `old`, previewing the first
    /// `preview_rows` rows of the new table.
    pub fn between(old: &DataFrame, new: &DataFrame, preview_rows: usize) -> Self {
        let old_cols = old.column_set();
        let new_cols = new.column_set();

        Self {
            rows_before: old.row_count(),
            rows_after: new.row_count(),
            columns_before: old.column_count(),
            columns_after: new.column_count(),
            new_columns: new_cols
                .difference(&old_cols)
                .map(|c| c.to_string())
                .collect(),
            removed_columns: old_cols
                .difference(&new_cols)
                .map(|c| c.to_string())
                .collect(),
            preview_columns: new.columns().to_vec(),
            preview_rows: new.head(preview_rows).to_vec(),
        }
    }
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
    fn identical_tables_report_no_changes() {
        let a = df(&["x"], &[&["1"], &["2"]]);
        let b = a.clone();
        assert!(dataframes_equal(&a, &b));
        assert_eq!(describe_changes(&a, &b), None);
    }

    #[test]
    fn row_delta_is_described() {
        let old = df(&["x"], &[&["1"]]);
        let new = df(&["x"], &[&["1"], &["2"], &["3"]]);
        assert_eq!(describe_changes(&old, &new).unwrap(), "Added 2 rows");

        assert_eq!(describe_changes(&new, &old).unwrap(), "Removed 2 rows");
    }

    #[test]
    fn column_delta_is_described() {
        let old = df(&["a", "b"], &[&["1", "2"]]);
        let new = df(&["a", "c"], &[&["1", "3"]]);
        let desc = describe_changes(&old, &new).unwrap();
        assert!(desc.contains("Added columns: c"), "{}", desc);
        assert!(desc.contains("Removed columns: b"), "{}", desc);
    }

    #[test]
    fn value_only_change_falls_back_to_generic_notice() {
        let old = df(&["x"], &[&["1"]]);
        let new = df(&["x"], &[&["2"]]);
        assert_eq!(
            describe_changes(&old, &new).unwrap(),
            "Modified data values"
        );
    }

    #[test]
    fn summary_captures_deltas_and_preview() {
        let old = df(&["col1"], &[&["1"], &["2"], &["3"]]);
        let new = df(
            &["col1", "double"],
            &[&["1", "2"], &["2", "4"], &["3", "6"]],
        );
        let summary = ModificationSummary::between(&old, &new, 2);
        assert_eq!(summary.rows_before, 3);
        assert_eq!(summary.rows_after, 3);
        assert_eq!(summary.columns_before, 1);
        assert_eq!(summary.columns_after, 2);
        assert_eq!(summary.new_columns, vec!["double"]);
        assert!(summary.removed_columns.is_empty());
        assert_eq!(summary.preview_rows.len(), 2);
        assert_eq!(summary.preview_columns, vec!["col1", "double"]);
    }
}
