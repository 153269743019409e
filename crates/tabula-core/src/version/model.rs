//! Version domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataframe::DataFrame;

/// One immutable entry in a project's version history.
///
/// Versions form a contiguous increasing sequence starting at 1. The entry
/// itself is never edited after being logged; "current" is a pointer that
/// moves to whichever snapshot was committed last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    /// Monotonic per-project version number, starting at 1
    pub version_number: u32,
    /// Owning project ID
    pub project_id: String,
    /// When this version was committed
    pub created_at: DateTime<Utc>,
    /// Chat that produced this version (None for the initial upload)
    pub created_by_chat_id: Option<String>,
    /// Message that produced this version (None for the initial upload)
    pub created_by_message_id: Option<String>,
    /// Snapshot path relative to the project directory, e.g. `versions/v3_20260829_120000.csv`
    pub file_path: String,
    /// Snapshot size in bytes
    pub file_size_bytes: u64,
    /// Human-readable description of what changed
    pub change_description: String,
    pub row_count: usize,
    pub column_count: usize,
}

impl Version {
    /// A version entry ready to hand to the store. The snapshot path and
    /// byte size are filled in by the store on append.
    pub fn new(
        version_number: u32,
        project_id: impl Into<String>,
        change_description: impl Into<String>,
        table: &DataFrame,
        provenance: Option<VersionProvenance>,
    ) -> Self {
        let provenance = provenance.unwrap_or_default();
        Self {
            version_number,
            project_id: project_id.into(),
            created_at: Utc::now(),
            created_by_chat_id: provenance.chat_id,
            created_by_message_id: provenance.message_id,
            file_path: String::new(),
            file_size_bytes: 0,
            change_description: change_description.into(),
            row_count: table.row_count(),
            column_count: table.column_count(),
        }
    }
}

/// Provenance of a version commit: which chat turn produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionProvenance {
    pub chat_id: Option<String>,
    pub message_id: Option<String>,
}

impl VersionProvenance {
    pub fn from_message(chat_id: impl Into<String>, message_id: impl Into<String>) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            message_id: Some(message_id.into()),
        }
    }
}

/// Aggregate statistics over a project's version history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionStats {
    pub version_count: usize,
    pub total_size_bytes: u64,
    pub earliest_version: Option<u32>,
    pub latest_version: Option<u32>,
    pub earliest_created: Option<DateTime<Utc>>,
    pub latest_created: Option<DateTime<Utc>>,
}

impl VersionStats {
    /// Summarizes an ordered version history.
    pub fn from_versions(versions: &[Version]) -> Self {
        Self {
            version_count: versions.len(),
            total_size_bytes: versions.iter().map(|v| v.file_size_bytes).sum(),
            earliest_version: versions.first().map(|v| v.version_number),
            latest_version: versions.last().map(|v| v.version_number),
            earliest_created: versions.first().map(|v| v.created_at),
            latest_created: versions.last().map(|v| v.created_at),
        }
    }
}
