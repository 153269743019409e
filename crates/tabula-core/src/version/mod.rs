//! Version history domain: model, change detection, storage trait.

pub mod diff;
pub mod model;
pub mod repository;

pub use diff::{dataframes_equal, describe_changes, ModificationSummary};
pub use model::{Version, VersionProvenance, VersionStats};
pub use repository::VersionStore;
