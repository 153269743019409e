//! CSV snapshot I/O.
//!
//! Tables are written with the same tmp-then-rename discipline as JSON
//! records so the "current" snapshot can be repointed atomically: a
//! concurrent reader sees either the old or the new table, never a partial
//! file.

use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tabula_core::{DataFrame, Result, TabulaError};

/// Reads a CSV snapshot into a dataframe.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    let bytes = fs::read(path)?;
    DataFrame::from_csv_bytes(&bytes)
}

/// Writes a dataframe as a CSV snapshot, atomically.
pub fn write_table(path: &Path, table: &DataFrame) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| TabulaError::internal("table path has no parent directory"))?;
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| TabulaError::internal("table path has no file name"))?;
    let tmp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

    let mut tmp_file = fs::File::create(&tmp_path)?;
    table.to_csv_writer(&mut tmp_file)?;
    tmp_file.flush()?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Size of a file in bytes; 0 when it does not exist.
pub fn file_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> DataFrame {
        DataFrame::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "x".into()], vec!["2".into(), "y".into()]],
        )
        .unwrap()
    }

    #[test]
    fn round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("t.csv");

        write_table(&path, &sample()).unwrap();
        let back = read_table(&path).unwrap();
        assert_eq!(back, sample());
        assert!(file_size(&path) > 0);
    }

    #[test]
    fn write_creates_parent_dirs_and_leaves_no_temp() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/t.csv");

        write_table(&path, &sample()).unwrap();
        assert!(path.exists());
        assert!(!tmp.path().join("nested/dir/.t.csv.tmp").exists());
    }

    #[test]
    fn missing_file_size_is_zero() {
        assert_eq!(file_size(Path::new("/nonexistent/t.csv")), 0);
    }
}
