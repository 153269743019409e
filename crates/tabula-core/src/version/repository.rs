//! Version storage trait.
//!
//! Defines how immutable snapshots, the append-only version log, and the
//! "current" pointer are persisted. Version numbering, change detection, and
//! revert semantics live in the application-layer version engine; this trait
//! is pure storage.

use super::model::Version;
use crate::dataframe::DataFrame;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract store for per-project version history.
///
/// # Implementation Notes
///
/// Implementations must guarantee:
/// - the snapshot and log entry of a committed version are never rewritten;
/// - the log append and the "current" repoint are atomic (write-temp-then-
///   rename), so readers observe either the old or the new state, never a
///   partial one.
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Persists a snapshot, repoints "current" to it, and appends the log
    /// entry. Returns the version with its final snapshot path and byte size
    /// filled in.
    async fn append_version(&self, version: Version, table: &DataFrame) -> Result<Version>;

    /// All logged versions for a project, ordered by version number.
    /// A project with no log yet yields an empty list.
    async fn list_versions(&self, project_id: &str) -> Result<Vec<Version>>;

    /// Loads the snapshot committed as `version_number`.
    ///
    /// # Errors
    ///
    /// `VersionNotFound` when the number was never committed.
    async fn load_snapshot(&self, project_id: &str, version_number: u32) -> Result<DataFrame>;

    /// Loads the current snapshot (the one "current" points at).
    async fn load_current(&self, project_id: &str) -> Result<DataFrame>;

    /// Absolute path of a version's snapshot file, for downloads.
    ///
    /// # Errors
    ///
    /// `VersionNotFound` when the number was never committed.
    async fn snapshot_download_path(
        &self,
        project_id: &str,
        version_number: u32,
    ) -> Result<std::path::PathBuf>;
}
