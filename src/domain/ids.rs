//! Id generation seam for newly created questions.

use crate::domain::question::QuestionId;

/// Supplies fresh question ids. Uniqueness within a tree is checked on
/// insertion, not here.
pub trait IdGenerator {
    fn next_id(&mut self) -> QuestionId;
}

/// Deterministic ids: `<prefix>1`, `<prefix>2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    counter: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> QuestionId {
        self.counter += 1;
        QuestionId::new(format!("{}{}", self.prefix, self.counter))
    }
}
