//! Infrastructure layer for Tabula: the file-based Storage Layer.
//!
//! Atomic JSON records, CSV snapshot I/O, the on-disk layout, and the
//! repository implementations over the core traits.

pub mod artifact_store;
pub mod config;
pub mod json_chat_repository;
pub mod json_project_repository;
pub mod json_version_store;
pub mod paths;
pub mod storage;

pub use artifact_store::ArtifactStore;
pub use config::{AppConfig, OracleConfig};
pub use json_chat_repository::JsonChatRepository;
pub use json_project_repository::JsonProjectRepository;
pub use json_version_store::JsonVersionStore;
pub use paths::{version_filename, DataPaths};
