//! Project domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A CSV dataset under analysis, with its version lineage and chats.
///
/// A project exclusively owns its versions and chats; deleting it cascades
/// through both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project identifier (UUID format)
    pub id: String,
    /// Display name (sanitized filename stem by default)
    pub name: String,
    /// Filename of the uploaded CSV
    pub original_filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Version number the "current" snapshot points at
    pub current_version: u32,
    pub total_rows: usize,
    pub total_columns: usize,
    /// Size of the current snapshot in bytes
    pub file_size_bytes: u64,
    /// Most recently used chat, if any
    pub active_chat_id: Option<String>,
    #[serde(default)]
    pub chat_ids: Vec<String>,
}

impl Project {
    /// Creates a fresh project record for an uploaded dataset.
    pub fn create_new(
        name: impl Into<String>,
        original_filename: impl Into<String>,
        rows: usize,
        columns: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            original_filename: original_filename.into(),
            created_at: now,
            updated_at: now,
            current_version: 1,
            total_rows: rows,
            total_columns: columns,
            file_size_bytes: 0,
            active_chat_id: None,
            chat_ids: Vec::new(),
        }
    }

    /// Records a newly committed version on the metadata.
    pub fn record_version(&mut self, version_number: u32, rows: usize, columns: usize, size: u64) {
        self.current_version = version_number;
        self.total_rows = rows;
        self.total_columns = columns;
        self.file_size_bytes = size;
        self.updated_at = Utc::now();
    }
}

/// Strips characters that are unsafe in filenames and collapses whitespace.
/// An empty result becomes "unnamed".
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        "unnamed".to_string()
    } else {
        collapsed
    }
}
