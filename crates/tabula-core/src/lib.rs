//! Core domain layer for Tabula.
//!
//! Holds the domain models (projects, chats, versions, tables), the error
//! taxonomy, and the traits that decouple the application from storage, the
//! code oracle, and the execution sandbox. This crate performs no I/O.

pub mod chat;
pub mod dataframe;
pub mod error;
pub mod oracle;
pub mod profile;
pub mod project;
pub mod sandbox;
pub mod version;

pub use chat::{Chat, ChatRepository, Message, MessageRole, OutputKind};
pub use dataframe::DataFrame;
pub use error::{Result, TabulaError};
pub use oracle::{CodeOracle, GeneratedCode, OracleReply, OracleRequest};
pub use profile::dataset_profile;
pub use project::{Project, ProjectRepository};
pub use sandbox::{ExecutionOutput, SnippetRunner};
pub use version::{
    dataframes_equal, describe_changes, ModificationSummary, Version, VersionProvenance,
    VersionStats, VersionStore,
};
