//! Mutation verbs on a form tree.
//!
//! These run against a private clone handed out by the mutation session;
//! a failing verb may leave that clone half-edited, which is fine because
//! the session throws it away.

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::FormTree;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::IdGenerator;
use crate::domain::question::{Question, QuestionId};
use crate::domain::record::QuestionRecord;

/// Direction of a single-step page move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FormTree {
    /// Insert a new question under `parent` at `position` (clamped to the
    /// number of children). Returns the parent's resulting child order.
    ///
    /// An intact chain whose array order lags behind it is re-sorted first,
    /// so `position` counts in chain order.
    #[instrument(level = "debug", skip(self, question), fields(id = %question.id))]
    pub fn insert(
        &mut self,
        question: Question,
        parent: &QuestionId,
        position: usize,
    ) -> DomainResult<Vec<QuestionId>> {
        let parent_idx = self
            .index_of(parent)
            .ok_or_else(|| DomainError::InvalidParent(parent.clone()))?;
        let chained = self.is_chain_ordered(parent_idx);
        self.settle_children_at(parent_idx);
        let idx = self.add_node(question)?;
        self.attach(idx, parent_idx, position, chained)
    }

    /// Allocate an id for `template` and insert it. Returns the new id.
    pub fn create_and_insert<G: IdGenerator + ?Sized>(
        &mut self,
        template: Question,
        parent: &QuestionId,
        position: usize,
        ids: &mut G,
    ) -> DomainResult<QuestionId> {
        let mut question = template;
        question.id = ids.next_id();
        let id = question.id.clone();
        self.insert(question, parent, position)?;
        Ok(id)
    }

    /// Remove a question and its whole subtree. Returns the removed
    /// subtree as a record.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: &QuestionId) -> DomainResult<QuestionRecord> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.clone()))?;
        self.detach(idx)?;
        let record = self.subtree_record(id).unwrap_or_else(|| QuestionRecord::new(id.clone()));
        self.unregister_subtree(idx);
        Ok(record)
    }

    /// Move `moving` under `new_parent` at `position`.
    ///
    /// `position` is a gap index among `new_parent`'s children as they are
    /// before the move: 0 drops in front of the first child, `len` after
    /// the last. Within the same parent a downward move lands one slot
    /// earlier once the node has been taken out, so the node always ends
    /// up in front of the child that occupied gap `position`.
    #[instrument(level = "debug", skip(self))]
    pub fn relocate(
        &mut self,
        moving: &QuestionId,
        new_parent: &QuestionId,
        position: usize,
    ) -> DomainResult<Vec<QuestionId>> {
        self.check_relocation(moving, new_parent)?;
        let idx = self
            .index_of(moving)
            .ok_or_else(|| DomainError::NodeNotFound(moving.clone()))?;
        let target = self
            .index_of(new_parent)
            .ok_or_else(|| DomainError::InvalidParent(new_parent.clone()))?;

        let chained = self.is_chain_ordered(target);
        self.settle_children_at(target);
        let (source, removed_index) = self.detach(idx)?;

        let mut position = position;
        if source == target && removed_index < position {
            position -= 1;
        }
        self.attach(idx, target, position, chained)
    }

    /// Move `moving` to the end of `target`'s children (drop onto a page).
    pub fn append_under(
        &mut self,
        moving: &QuestionId,
        target: &QuestionId,
    ) -> DomainResult<Vec<QuestionId>> {
        let end = self
            .get_node(target)
            .map(|node| node.child_count())
            .ok_or_else(|| DomainError::InvalidParent(target.clone()))?;
        self.relocate(moving, target, end)
    }

    /// Swap a question with its neighbour.
    ///
    /// For chain-ordered siblings only the two or three preceding
    /// references around the swap are rewritten. Moving the first question
    /// up or the last one down changes nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn move_page(&mut self, id: &QuestionId, direction: Direction) -> DomainResult<Vec<QuestionId>> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.clone()))?;
        let parent = self
            .node_at(idx)
            .parent
            .ok_or_else(|| DomainError::DetachedNode(id.clone()))?;

        let chained = self.is_chain_ordered(parent);
        if chained {
            self.reorder_children_by_chain(parent)?;
        }

        let mut order = self.node_at(parent).children.clone();
        let Some(from) = order.iter().position(|&c| c == idx) else {
            return Err(DomainError::DetachedNode(id.clone()));
        };
        let to = match direction {
            Direction::Up if from > 0 => from - 1,
            Direction::Down if from + 1 < order.len() => from + 1,
            _ => return Ok(self.child_ids_at(parent)),
        };
        order.swap(from, to);

        if chained {
            let first = from.min(to);
            let last = (from.max(to) + 1).min(order.len() - 1);
            for k in first..=last {
                let preceding = k
                    .checked_sub(1)
                    .map(|p| self.node_at(order[p]).id().clone());
                self.node_at_mut(order[k]).question.preceding = preceding;
            }
        }
        self.node_at_mut(parent).children = order;

        if chained {
            self.reorder_children_by_chain(parent)?;
        }
        debug!(%id, ?direction, "Moved page");
        Ok(self.child_ids_at(parent))
    }

    /// Point `id` at a new predecessor without touching array order.
    ///
    /// Follow up with [`FormTree::reorder_by_chain`] on the parent once all
    /// references of an edit are in place. A mutation session that skips
    /// this re-sorts intact chains itself before publishing.
    pub fn set_preceding(&mut self, id: &QuestionId, preceding: Option<QuestionId>) -> DomainResult<()> {
        let idx = self
            .index_of(id)
            .ok_or_else(|| DomainError::NodeNotFound(id.clone()))?;
        self.node_at_mut(idx).question.preceding = preceding;
        Ok(())
    }

    /// Replace the presentation payload of an existing question.
    ///
    /// The preceding reference stays owned by the tree.
    #[instrument(level = "debug", skip(self, question), fields(id = %question.id))]
    pub fn update_question(&mut self, question: Question) -> DomainResult<()> {
        let idx = self
            .index_of(&question.id)
            .ok_or_else(|| DomainError::NodeNotFound(question.id.clone()))?;
        let node = self.node_at_mut(idx);
        let preceding = node.question.preceding.take();
        node.question = Question {
            preceding,
            ..question
        };
        Ok(())
    }

    /// Take a node out of its parent's child list, splicing the chain.
    /// Returns the former parent and the index the node had there.
    fn detach(&mut self, idx: Index) -> DomainResult<(Index, usize)> {
        let node = self.node_at(idx);
        let id = node.id().clone();
        let parent = node.parent.ok_or_else(|| DomainError::DetachedNode(id.clone()))?;
        let position = self
            .node_at(parent)
            .children
            .iter()
            .position(|&c| c == idx)
            .ok_or(DomainError::DetachedNode(id))?;

        let chained = self.is_chain_ordered(parent);
        self.relink_after_removal(parent, idx);
        self.node_at_mut(parent).children.remove(position);

        let node = self.node_at_mut(idx);
        node.parent = None;
        node.question.preceding = None;

        if chained {
            self.reorder_children_by_chain(parent)?;
        }
        Ok((parent, position))
    }

    /// Put a detached node into `parent` at `position`.
    fn attach(
        &mut self,
        idx: Index,
        parent: Index,
        position: usize,
        chained: bool,
    ) -> DomainResult<Vec<QuestionId>> {
        let position = position.min(self.node_at(parent).child_count());
        if chained {
            self.relink_after_insertion(parent, idx, position);
        } else {
            self.node_at_mut(idx).question.preceding = None;
        }

        self.node_at_mut(parent).children.insert(position, idx);
        self.node_at_mut(idx).parent = Some(parent);

        if chained {
            self.reorder_children_by_chain(parent)?;
        }
        Ok(self.child_ids_at(parent))
    }
}
