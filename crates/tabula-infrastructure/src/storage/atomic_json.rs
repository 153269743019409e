//! Atomic JSON file operations with ACID guarantees.
//!
//! Provides a thin layer for safe access to JSON record files:
//!
//! - **Atomicity**: updates are all-or-nothing via tmp file + atomic rename
//! - **Consistency**: serde schema validation on load/save
//! - **Isolation**: an advisory file lock serializes read-modify-write cycles
//! - **Durability**: explicit fsync before rename

use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tabula_core::{Result, TabulaError};

/// A handle to an atomically written JSON record file.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the record.
    ///
    /// Missing and empty files yield `Ok(None)`; a present-but-corrupt file
    /// is an error (callers choose whether to degrade or propagate).
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = serde_json::from_str(&content)?;
        Ok(Some(data))
    }

    /// Non-strict read: any failure degrades to the supplied default.
    /// The failure is logged, not raised.
    pub fn load_or(&self, default: T) -> T {
        match self.load() {
            Ok(Some(data)) => data,
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable record, using default");
                default
            }
        }
    }

    /// Strict read for required records: a missing or corrupt file raises
    /// `StorageCorruption`.
    pub fn load_strict(&self) -> Result<T> {
        match self.load() {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(TabulaError::corruption(
                self.path.display().to_string(),
                "required record is missing or empty",
            )),
            Err(e) => Err(TabulaError::corruption(
                self.path.display().to_string(),
                e.to_string(),
            )),
        }
    }

    /// Saves the record atomically: serialize, write a temporary sibling,
    /// fsync, then rename over the destination. Readers never observe a
    /// partially written file.
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under an exclusive file lock. The update closure
    /// receives the current data (or `default` when the file does not exist)
    /// and the result is written back atomically.
    pub fn update<F>(&self, default: T, f: F) -> Result<()>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default);
        f(&mut data)?;
        self.save(&data)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| TabulaError::internal("record path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| TabulaError::internal("record path has no file name"))?;
        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Advisory file lock guard, released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                TabulaError::internal(format!("failed to acquire file lock: {}", e))
            })?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the handle drops; removing the lock file
        // is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestRecord {
        name: String,
        count: u32,
    }

    fn record() -> TestRecord {
        TestRecord {
            name: "test".to_string(),
            count: 42,
        }
    }

    #[test]
    fn save_and_load() {
        let tmp = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestRecord>::new(tmp.path().join("r.json"));

        file.save(&record()).unwrap();
        let loaded = file.load().unwrap().unwrap();
        assert_eq!(loaded, record());
    }

    #[test]
    fn load_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestRecord>::new(tmp.path().join("missing.json"));
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn load_or_degrades_on_corruption() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();

        let file = AtomicJsonFile::<TestRecord>::new(path);
        let loaded = file.load_or(record());
        assert_eq!(loaded, record());
    }

    #[test]
    fn load_strict_raises_on_missing_and_corrupt() {
        let tmp = TempDir::new().unwrap();

        let missing = AtomicJsonFile::<TestRecord>::new(tmp.path().join("missing.json"));
        assert!(matches!(
            missing.load_strict(),
            Err(TabulaError::StorageCorruption { .. })
        ));

        let path = tmp.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        let corrupt = AtomicJsonFile::<TestRecord>::new(path);
        assert!(matches!(
            corrupt.load_strict(),
            Err(TabulaError::StorageCorruption { .. })
        ));
    }

    #[test]
    fn update_applies_in_place() {
        let tmp = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestRecord>::new(tmp.path().join("r.json"));

        let default = TestRecord {
            name: "default".to_string(),
            count: 0,
        };

        file.update(default.clone(), |r| {
            r.count += 10;
            Ok(())
        })
        .unwrap();
        file.update(default, |r| {
            r.count += 5;
            Ok(())
        })
        .unwrap();

        assert_eq!(file.load().unwrap().unwrap().count, 15);
    }

    #[test]
    fn no_temp_file_left_behind() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("r.json");
        let file = AtomicJsonFile::<TestRecord>::new(path.clone());

        file.save(&record()).unwrap();

        assert!(!tmp.path().join(".r.json.tmp").exists());
        assert!(path.exists());
    }
}
