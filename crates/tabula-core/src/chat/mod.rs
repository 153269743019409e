//! Chat domain: models and repository trait.

pub mod model;
pub mod repository;

pub use model::{Chat, Message, MessageRole, OutputKind};
pub use repository::ChatRepository;
