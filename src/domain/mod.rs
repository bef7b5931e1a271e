//! Domain layer: the form-structure tree and its mutation verbs
//!
//! This layer is independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod error;
pub mod guard;
pub mod ids;
pub mod operations;
pub mod order;
pub mod question;
pub mod record;
pub mod tree_traits;

pub use arena::{FormNode, FormTree};
pub use error::{ChainError, DomainError, DomainResult, RelocationConflict};
pub use ids::{IdGenerator, SequentialIdGenerator};
pub use operations::Direction;
pub use order::{derive_preceding_chain, sort_by_preceding_chain, ChainLink};
pub use question::{CalendarKind, Label, Question, QuestionId, QuestionKind, DEFAULT_QUESTION_TYPE};
pub use record::QuestionRecord;
pub use tree_traits::TreeNodeConvert;
