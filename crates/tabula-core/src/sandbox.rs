//! Execution sandbox trait and outcome types.
//!
//! The sandbox runs an AI-authored snippet against an isolated copy of the
//! current dataset and classifies what happened. Artifacts come back
//! in-memory; nothing is persisted until the orchestrator decides to keep it,
//! so a failed run can never leak a partial chart or table.

use crate::chat::OutputKind;
use crate::dataframe::DataFrame;
use crate::error::Result;
use async_trait::async_trait;

/// Classified outcome of a sandbox run.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutput {
    /// The snippet only printed; the captured stdout is the answer.
    Exploratory { stdout: String },
    /// The snippet saved a chart. The PNG bytes are returned, not a path:
    /// persistence is the caller's decision.
    Visualization { png: Vec<u8>, stdout: String },
    /// The snippet bound `result` to a table whose content differs from the
    /// input copy.
    Modification { table: DataFrame, stdout: String },
}

impl ExecutionOutput {
    pub fn kind(&self) -> OutputKind {
        match self {
            Self::Exploratory { .. } => OutputKind::Exploratory,
            Self::Visualization { .. } => OutputKind::Visualization,
            Self::Modification { .. } => OutputKind::Modification,
        }
    }

    pub fn stdout(&self) -> &str {
        match self {
            Self::Exploratory { stdout }
            | Self::Visualization { stdout, .. }
            | Self::Modification { stdout, .. } => stdout,
        }
    }
}

/// Runs one snippet against one table.
///
/// # Errors
///
/// - `TabulaError::Execution` when the snippet raises; the original
///   exception text is carried verbatim.
/// - `TabulaError::ExecutionTimeout` when the wall-clock budget is exceeded.
#[async_trait]
pub trait SnippetRunner: Send + Sync {
    async fn run(&self, code: &str, table: &DataFrame) -> Result<ExecutionOutput>;
}
