//! Project domain: model and repository trait.

pub mod model;
pub mod repository;

pub use model::{sanitize_name, Project};
pub use repository::ProjectRepository;
