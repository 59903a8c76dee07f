//! Response templates: models and the substitution engine.

pub mod engine;
pub mod model;

pub use engine::{placeholders, resolve, unresolved, KNOWN_PLACEHOLDERS};
pub use model::{MessageTemplate, TemplateContext};
