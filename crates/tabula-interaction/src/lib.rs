//! Interaction layer: the external AI code oracle.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiOracle;
pub use prompt::{parse_generated, render_system_instruction};
