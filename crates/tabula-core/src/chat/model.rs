//! Chat and message domain models.

use crate::version::ModificationSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// One conversation against a project's current dataset.
///
/// Independent chats on the same project share the current dataframe view but
/// keep separate message histories and oracle context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique chat identifier (UUID format)
    pub id: String,
    /// Owning project ID
    pub project_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
    /// Opaque conversational context owned by the external oracle. The core
    /// stores and replays it but never interprets it.
    #[serde(default)]
    pub oracle_context: serde_json::Value,
}

impl Chat {
    pub fn create_new(project_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            project_id: project_id.into(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            message_count: 0,
            oracle_context: serde_json::Value::Null,
        }
    }

    /// Resets conversational state as if the chat were freshly created.
    /// Identity, name, and creation time are preserved.
    pub fn reset_conversation(&mut self) {
        self.message_count = 0;
        self.oracle_context = serde_json::Value::Null;
        self.updated_at = Utc::now();
    }
}

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// What kind of result a sandbox run produced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputKind {
    /// Textual answer captured from stdout
    Exploratory,
    /// A chart artifact was produced
    Visualization,
    /// The dataset itself was transformed
    Modification,
}

/// One append-only turn in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,

    // Assistant-turn fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_kind: Option<OutputKind>,
    /// Captured stdout of the sandbox run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Reference to a persisted chart artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_path: Option<String>,
    /// Reference to the modified-table download artifact
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_table_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_summary: Option<ModificationSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Error marker for failed turns; the turn carries no result payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Message {
    pub fn user(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            code: None,
            output_kind: None,
            output: None,
            plot_path: None,
            modified_table_path: None,
            modification_summary: None,
            explanation: None,
            error: None,
        }
    }

    pub fn assistant(chat_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            ..Self::user(chat_id, content)
        }
    }

    /// An assistant turn that records a failure instead of a result payload.
    pub fn assistant_error(
        chat_id: impl Into<String>,
        explanation: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        let mut message = Self::assistant(chat_id, explanation);
        message.error = Some(error.into());
        message
    }
}
