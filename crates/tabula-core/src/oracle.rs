//! AI code oracle trait.
//!
//! The oracle is an external collaborator that turns a natural-language query
//! into a Python snippet. The core never validates the generated code beyond
//! sandbox execution, and never interprets the conversational context blob.

use crate::chat::OutputKind;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything the oracle needs for one turn.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// The user's natural-language query
    pub query: String,
    /// Schema/summary context of the current dataset
    pub dataset_context: String,
    /// Opaque conversational context from the previous turn
    /// (`Value::Null` for a fresh chat)
    pub prior_context: serde_json::Value,
}

/// The snippet the oracle generated for a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// The kind the oracle *claims* the snippet produces. Advisory only: the
    /// sandbox's post-hoc classification always wins.
    pub declared_kind: OutputKind,
    pub code: String,
    pub explanation: String,
}

/// One oracle turn: the generated snippet plus the context blob to store for
/// the next turn.
#[derive(Debug, Clone)]
pub struct OracleReply {
    pub generated: GeneratedCode,
    pub updated_context: serde_json::Value,
}

/// External code-generating oracle.
///
/// A malformed or failed generation surfaces as `TabulaError::Oracle`; retry
/// policy belongs to the caller, never to the core.
#[async_trait]
pub trait CodeOracle: Send + Sync {
    async fn generate(&self, request: OracleRequest) -> Result<OracleReply>;
}
