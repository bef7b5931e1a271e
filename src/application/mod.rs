//! Application layer: mutation session and editor use cases
//!
//! This layer owns the canonical form structure and publishes edits made
//! by the domain verbs.

pub mod editor;
pub mod error;
pub mod ids;
pub mod session;
pub mod templates;

pub use editor::FormEditor;
pub use error::{ApplicationError, ApplicationResult};
pub use ids::UuidIdGenerator;
pub use session::{with_mutation, FormStructure};
pub use templates::Templates;
