//! Preceding-question chain ordering.
//!
//! Wizard pages (and any siblings that carry preceding-question references)
//! keep two order signals: their position in the parent's child list and a
//! singly linked chain in which each question names the sibling right
//! before it. The resolver rebuilds the array order from the chain; the
//! relink helpers keep the chain unbroken while siblings come and go.

use std::collections::HashSet;

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument, trace};

use crate::domain::arena::FormTree;
use crate::domain::error::{ChainError, DomainError, DomainResult};
use crate::domain::question::{Question, QuestionId, QuestionKind};
use crate::domain::record::QuestionRecord;

/// A sibling record that takes part in a preceding-question chain.
pub trait ChainLink {
    fn link_id(&self) -> &QuestionId;
    fn preceding(&self) -> Option<&QuestionId>;
}

impl ChainLink for Question {
    fn link_id(&self) -> &QuestionId {
        &self.id
    }

    fn preceding(&self) -> Option<&QuestionId> {
        self.preceding.as_ref()
    }
}

impl ChainLink for QuestionRecord {
    fn link_id(&self) -> &QuestionId {
        &self.id
    }

    fn preceding(&self) -> Option<&QuestionId> {
        self.preceding.as_ref()
    }
}

impl<T: ChainLink> ChainLink for &T {
    fn link_id(&self) -> &QuestionId {
        (*self).link_id()
    }

    fn preceding(&self) -> Option<&QuestionId> {
        (*self).preceding()
    }
}

/// Reconstruct the unique linear order described by the preceding chain.
///
/// The head is the only sibling without a preceding reference; every other
/// sibling must name another member of the same list, no two siblings may
/// name the same predecessor, and the walk from the head must reach every
/// sibling. An empty list is trivially ordered.
pub fn sort_by_preceding_chain<T: ChainLink + Clone>(children: &[T]) -> Result<Vec<T>, ChainError> {
    if children.is_empty() {
        return Ok(Vec::new());
    }

    let known: HashSet<&QuestionId> = children.iter().map(|c| c.link_id()).collect();
    for child in children {
        if let Some(preceding) = child.preceding() {
            if !known.contains(preceding) {
                return Err(ChainError::UnresolvedReference {
                    id: child.link_id().clone(),
                    preceding: preceding.clone(),
                });
            }
        }
    }

    let heads: Vec<&T> = children.iter().filter(|c| c.preceding().is_none()).collect();
    let head = match heads.as_slice() {
        [] => return Err(ChainError::NoHead),
        [head] => *head,
        _ => {
            return Err(ChainError::MultipleHeads(
                heads.iter().map(|h| h.link_id().clone()).collect(),
            ))
        }
    };

    let followers = children
        .iter()
        .filter_map(|c| c.preceding().map(|p| (p, c)))
        .into_group_map();
    if let Some((preceding, forked)) = followers.iter().find(|(_, f)| f.len() > 1) {
        return Err(ChainError::Fork {
            preceding: (*preceding).clone(),
            followers: forked.iter().map(|f| f.link_id().clone()).collect(),
        });
    }

    let mut ordered = Vec::with_capacity(children.len());
    let mut current = head;
    ordered.push(current.clone());
    while let Some(&next) = followers.get(current.link_id()).and_then(|f| f.first()) {
        if ordered.len() == children.len() {
            break;
        }
        ordered.push(next.clone());
        current = next;
    }

    if ordered.len() != children.len() {
        return Err(ChainError::Cycle {
            linked: ordered.len(),
            total: children.len(),
        });
    }
    Ok(ordered)
}

/// Preceding references implied by an array order: the first element has
/// none, every other element points at its predecessor.
pub fn derive_preceding_chain<T: ChainLink>(ordered: &[T]) -> Vec<(QuestionId, Option<QuestionId>)> {
    ordered
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let preceding = i.checked_sub(1).map(|p| ordered[p].link_id().clone());
            (item.link_id().clone(), preceding)
        })
        .collect()
}

/// Arena-side view of one child used while re-sorting.
#[derive(Clone)]
struct Link {
    idx: Index,
    id: QuestionId,
    preceding: Option<QuestionId>,
}

impl ChainLink for Link {
    fn link_id(&self) -> &QuestionId {
        &self.id
    }

    fn preceding(&self) -> Option<&QuestionId> {
        self.preceding.as_ref()
    }
}

impl FormTree {
    /// Whether the children of `parent` follow a preceding-question chain.
    ///
    /// True when any child carries a reference, or when `parent` is a form
    /// whose (at most one) child is a wizard page, so the next page starts
    /// the chain.
    pub(crate) fn is_chain_ordered(&self, parent: Index) -> bool {
        let node = self.node_at(parent);
        if self
            .children_at(parent)
            .any(|child| child.question.preceding.is_some())
        {
            return true;
        }
        node.kind() == QuestionKind::Form
            && node.child_count() <= 1
            && self
                .children_at(parent)
                .all(|child| child.kind().is_wizard_step())
    }

    /// Splice `removed` out of its siblings' chain: whoever pointed at it
    /// now points at its predecessor.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn relink_after_removal(&mut self, parent: Index, removed: Index) {
        let removed_node = self.node_at(removed);
        let removed_id = removed_node.id().clone();
        let removed_preceding = removed_node.question.preceding.clone();

        let siblings: Vec<Index> = self.node_at(parent).children.clone();
        for sibling in siblings.into_iter().filter(|&s| s != removed) {
            let question = &mut self.node_at_mut(sibling).question;
            if question.preceding.as_ref() == Some(&removed_id) {
                trace!(id = %question.id, preceding = ?removed_preceding, "Relinked after removal");
                question.preceding = removed_preceding.clone();
            }
        }
    }

    /// Splice `inserted` into the chain at `position` of the current
    /// children (which must not contain it yet).
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn relink_after_insertion(&mut self, parent: Index, inserted: Index, position: usize) {
        let children = self.node_at(parent).children.clone();
        let position = position.min(children.len());
        let inserted_id = self.node_at(inserted).id().clone();

        let preceding = position
            .checked_sub(1)
            .map(|p| self.node_at(children[p]).id().clone());
        self.node_at_mut(inserted).question.preceding = preceding;

        if let Some(&following) = children.get(position) {
            self.node_at_mut(following).question.preceding = Some(inserted_id);
        }
    }

    /// Check the chain of `parent`'s children without changing anything.
    pub(crate) fn chain_status_at(&self, parent: Index) -> Result<Vec<Index>, ChainError> {
        let links: Vec<Link> = self
            .node_at(parent)
            .children
            .iter()
            .map(|&idx| {
                let question = &self.node_at(idx).question;
                Link {
                    idx,
                    id: question.id.clone(),
                    preceding: question.preceding.clone(),
                }
            })
            .collect();
        let ordered = sort_by_preceding_chain(&links)?;
        Ok(ordered.into_iter().map(|link| link.idx).collect())
    }

    /// Persist the chain order as the array order of `parent`'s children.
    pub(crate) fn reorder_children_by_chain(&mut self, parent: Index) -> DomainResult<()> {
        let ordered = self
            .chain_status_at(parent)
            .map_err(|source| DomainError::BrokenOrderChain {
                parent: self.node_at(parent).id().clone(),
                source,
            })?;
        self.node_at_mut(parent).children = ordered;
        Ok(())
    }

    /// Re-sort `parent`'s children when their chain is intact but the array
    /// order disagrees with it. Broken chains are left alone. Returns
    /// whether the order changed.
    pub(crate) fn settle_children_at(&mut self, parent: Index) -> bool {
        if !self.is_chain_ordered(parent) {
            return false;
        }
        match self.chain_status_at(parent) {
            Ok(ordered) if ordered != self.node_at(parent).children => {
                self.node_at_mut(parent).children = ordered;
                true
            }
            _ => false,
        }
    }

    /// Bring the array order of every intact chain in line with the chain.
    ///
    /// Returns the parents whose children were reordered.
    #[instrument(level = "debug", skip(self))]
    pub fn settle_chain_order(&mut self) -> Vec<QuestionId> {
        let parents: Vec<Index> = self
            .iter()
            .filter(|node| node.has_children())
            .filter_map(|node| self.index_of(node.id()))
            .collect();

        let mut settled = Vec::new();
        for parent in parents {
            if self.settle_children_at(parent) {
                settled.push(self.node_at(parent).id().clone());
            }
        }
        settled
    }

    /// Re-derive the array order of `parent`'s children from their chain.
    ///
    /// Collaborators call this after rewriting preceding references
    /// directly. Returns the new child order.
    #[instrument(level = "debug", skip(self))]
    pub fn reorder_by_chain(&mut self, parent: &QuestionId) -> DomainResult<Vec<QuestionId>> {
        let idx = self
            .index_of(parent)
            .ok_or_else(|| DomainError::InvalidParent(parent.clone()))?;
        self.reorder_children_by_chain(idx)?;
        Ok(self.child_ids_at(idx))
    }

    /// Validate the chain of `parent`'s children.
    pub fn chain_status(&self, parent: &QuestionId) -> DomainResult<()> {
        let idx = self
            .index_of(parent)
            .ok_or_else(|| DomainError::InvalidParent(parent.clone()))?;
        if !self.is_chain_ordered(idx) {
            return Ok(());
        }
        self.chain_status_at(idx)
            .map(|_| ())
            .map_err(|source| DomainError::BrokenOrderChain {
                parent: parent.clone(),
                source,
            })
    }

    /// Every chain-ordered parent whose chain does not form one sequence.
    #[instrument(level = "debug", skip(self))]
    pub fn broken_chains(&self) -> Vec<(QuestionId, ChainError)> {
        let broken: Vec<_> = self
            .iter()
            .filter(|node| node.has_children())
            .filter_map(|node| {
                let idx = self.index_of(node.id())?;
                if !self.is_chain_ordered(idx) {
                    return None;
                }
                self.chain_status_at(idx)
                    .err()
                    .map(|err| (node.id().clone(), err))
            })
            .collect();
        if !broken.is_empty() {
            debug!(count = broken.len(), "Found broken order chains");
        }
        broken
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str, preceding: Option<&str>) -> Question {
        let question = Question::new(id, QuestionKind::Text);
        match preceding {
            Some(p) => question.with_preceding(p),
            None => question,
        }
    }

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn sorts_shuffled_chain() {
        let children = vec![q("c", Some("b")), q("a", None), q("b", Some("a"))];
        let ordered = sort_by_preceding_chain(&children).unwrap();
        assert_eq!(ids(&ordered), vec!["a", "b", "c"]);
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let children = vec![q("a", None), q("b", Some("b"))];
        assert_eq!(
            sort_by_preceding_chain(&children),
            Err(ChainError::Cycle { linked: 1, total: 2 })
        );
    }

    #[test]
    fn derive_chain_of_empty_list_is_empty() {
        let empty: Vec<Question> = Vec::new();
        assert!(derive_preceding_chain(&empty).is_empty());
    }
}
