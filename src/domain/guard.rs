//! Cycle guard for relocations.

use tracing::{debug, instrument};

use crate::domain::arena::FormTree;
use crate::domain::error::{DomainError, DomainResult, RelocationConflict};
use crate::domain::question::QuestionId;

impl FormTree {
    /// True if `ancestor` lies on the parent chain of `node`.
    ///
    /// A node is not its own descendant. Unknown ids are never related.
    pub fn is_descendant(&self, ancestor: &QuestionId, node: &QuestionId) -> bool {
        self.ancestors(node).any(|candidate| candidate.id() == ancestor)
    }

    /// Check that `moving` may be placed under `target`.
    ///
    /// Both ids must resolve; the target must be neither the moving question
    /// nor anything inside its subtree.
    #[instrument(level = "debug", skip(self))]
    pub fn check_relocation(&self, moving: &QuestionId, target: &QuestionId) -> DomainResult<()> {
        if !self.contains(moving) {
            return Err(DomainError::NodeNotFound(moving.clone()));
        }
        if !self.contains(target) {
            return Err(DomainError::InvalidParent(target.clone()));
        }

        let conflict = if moving == target {
            Some(RelocationConflict::SameNode)
        } else if self.is_descendant(moving, target) {
            Some(RelocationConflict::IntoOwnSubtree)
        } else {
            None
        };

        match conflict {
            Some(reason) => {
                debug!(%moving, %target, %reason, "Relocation rejected");
                Err(DomainError::IllegalRelocation {
                    moving: moving.clone(),
                    target: target.clone(),
                    reason,
                })
            }
            None => Ok(()),
        }
    }

    /// Read-only drop check for drag feedback.
    pub fn can_relocate(&self, moving: &QuestionId, target: &QuestionId) -> bool {
        self.check_relocation(moving, target).is_ok()
    }
}
