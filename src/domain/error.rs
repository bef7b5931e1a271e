//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

use crate::domain::question::QuestionId;

/// Why a relocation was refused by the cycle guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationConflict {
    /// Target and moving question are the same node
    SameNode,
    /// Target lies inside the moving question's subtree
    IntoOwnSubtree,
}

impl fmt::Display for RelocationConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationConflict::SameNode => f.write_str("target is the moving question itself"),
            RelocationConflict::IntoOwnSubtree => {
                f.write_str("target is inside the moving question's subtree")
            }
        }
    }
}

/// Ways a preceding-question chain can fail to form a single sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("no question without a preceding question")]
    NoHead,

    #[error("several questions without a preceding question: {}", join_ids(.0))]
    MultipleHeads(Vec<QuestionId>),

    #[error("{id} refers to unknown preceding question {preceding}")]
    UnresolvedReference { id: QuestionId, preceding: QuestionId },

    #[error("several questions follow {preceding}: {}", join_ids(.followers))]
    Fork {
        preceding: QuestionId,
        followers: Vec<QuestionId>,
    },

    #[error("chain covers {linked} of {total} questions (cycle)")]
    Cycle { linked: usize, total: usize },
}

fn join_ids(ids: &[QuestionId]) -> String {
    itertools::join(ids, ", ")
}

/// Domain errors represent structural violations of the question tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate question id: {0}")]
    DuplicateId(QuestionId),

    #[error("question not found: {0}")]
    NodeNotFound(QuestionId),

    #[error("invalid parent: {0}")]
    InvalidParent(QuestionId),

    #[error("question has no parent: {0}")]
    DetachedNode(QuestionId),

    #[error("cannot move {moving} under {target}: {reason}")]
    IllegalRelocation {
        moving: QuestionId,
        target: QuestionId,
        reason: RelocationConflict,
    },

    #[error("broken order chain under {parent}: {source}")]
    BrokenOrderChain {
        parent: QuestionId,
        #[source]
        source: ChainError,
    },
}

impl DomainError {
    /// Rejections that are part of normal drag-and-drop use.
    pub fn is_expected_rejection(&self) -> bool {
        matches!(self, DomainError::IllegalRelocation { .. })
    }
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
