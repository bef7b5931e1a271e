use std::collections::HashMap;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::question::{Question, QuestionId, QuestionKind};

/// Tree node in the arena-based form structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FormNode {
    /// Question payload of this node
    pub question: Question,
    /// Index of parent node in the arena, None for the root and detached nodes
    pub(crate) parent: Option<Index>,
    /// Indices of child nodes in the arena, in display order
    pub(crate) children: Vec<Index>,
}

impl FormNode {
    pub(crate) fn new(question: Question) -> Self {
        Self {
            question,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &QuestionId {
        &self.question.id
    }

    pub fn kind(&self) -> QuestionKind {
        self.question.kind
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// Arena-based form structure.
///
/// Nodes live in a generational arena and refer to each other by index, so
/// the parent links and child lists form a single representation of the
/// hierarchy. Ids resolve to arena indices in O(1).
///
/// `Clone` is a full deep copy: the clone owns its own arena, and indices
/// stay valid across the copy because they are positions, not pointers.
/// Every edit is applied to such a clone (see `application::session`).
#[derive(Debug, Clone)]
pub struct FormTree {
    arena: Arena<FormNode>,
    ids: HashMap<QuestionId, Index>,
    root: Index,
}

impl FormTree {
    /// Create a tree holding only the form question.
    pub fn new(root: Question) -> Self {
        let mut arena = Arena::new();
        let mut ids = HashMap::new();
        let id = root.id.clone();
        let root = arena.insert(FormNode::new(root));
        ids.insert(id, root);
        Self { arena, ids, root }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get_node(&self, id: &QuestionId) -> Option<&FormNode> {
        self.ids.get(id).and_then(|&idx| self.arena.get(idx))
    }

    pub fn get_question(&self, id: &QuestionId) -> Option<&Question> {
        self.get_node(id).map(|node| &node.question)
    }

    pub fn contains(&self, id: &QuestionId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn root(&self) -> &FormNode {
        &self.arena[self.root]
    }

    pub fn root_id(&self) -> &QuestionId {
        self.root().id()
    }

    /// Number of registered questions, root included.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Parent of `id`; None for the root or an unknown id.
    pub fn parent_of(&self, id: &QuestionId) -> Option<&FormNode> {
        let node = self.get_node(id)?;
        node.parent.and_then(|idx| self.arena.get(idx))
    }

    /// Children of `id` in display order; None for an unknown id.
    pub fn children_of(&self, id: &QuestionId) -> Option<Vec<&FormNode>> {
        let idx = self.index_of(id)?;
        Some(self.children_at(idx).collect())
    }

    pub fn child_ids(&self, id: &QuestionId) -> Option<Vec<QuestionId>> {
        let idx = self.index_of(id)?;
        Some(self.child_ids_at(idx))
    }

    /// Position of `id` among its siblings; None for the root or an unknown id.
    pub fn position_of(&self, id: &QuestionId) -> Option<usize> {
        let idx = self.index_of(id)?;
        let parent = self.arena.get(idx)?.parent?;
        self.arena[parent].children.iter().position(|&c| c == idx)
    }

    /// Walk from `id` up to the root, starting with the parent of `id`.
    pub fn ancestors<'a>(&'a self, id: &QuestionId) -> Ancestors<'a> {
        let next = self
            .index_of(id)
            .and_then(|idx| self.arena.get(idx))
            .and_then(|node| node.parent);
        Ancestors { tree: self, next }
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, self.root)
    }

    /// Pre-order walk over the subtree rooted at `id`.
    pub fn iter_subtree(&self, id: &QuestionId) -> Option<TreeIterator<'_>> {
        self.index_of(id).map(|idx| TreeIterator::new(self, idx))
    }

    #[instrument(level = "trace", skip(self))]
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, self.root)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.arena.get(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Ids of all questions without sub-questions, in document order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_ids(&self) -> Vec<QuestionId> {
        self.iter()
            .filter(|node| !node.has_children())
            .map(|node| node.id().clone())
            .collect()
    }

    /// The form is wizardless when its top-level questions are not all
    /// wizard pages. An empty form is laid out as a wizard.
    pub fn is_wizardless(&self) -> bool {
        let root = self.root();
        root.has_children()
            && !self
                .children_at(self.root)
                .all(|child| child.kind().is_wizard_step())
    }

    /// Structural equality of the subtree rooted at `id` in both trees:
    /// same payloads in the same shape. Missing on either side counts as
    /// a difference unless missing on both.
    pub fn subtree_eq(&self, other: &FormTree, id: &QuestionId) -> bool {
        match (self.iter_subtree(id), other.iter_subtree(id)) {
            (None, None) => true,
            (Some(ours), Some(theirs)) => {
                let ours: Vec<_> = ours
                    .map(|node| (&node.question, self.child_ids(node.id())))
                    .collect();
                let theirs: Vec<_> = theirs
                    .map(|node| (&node.question, other.child_ids(node.id())))
                    .collect();
                ours == theirs
            }
            _ => false,
        }
    }

    // ---- crate-internal arena access ----

    pub(crate) fn index_of(&self, id: &QuestionId) -> Option<Index> {
        self.ids.get(id).copied()
    }

    pub(crate) fn root_index(&self) -> Index {
        self.root
    }

    pub(crate) fn node_at(&self, idx: Index) -> &FormNode {
        &self.arena[idx]
    }

    pub(crate) fn node_at_mut(&mut self, idx: Index) -> &mut FormNode {
        &mut self.arena[idx]
    }

    pub(crate) fn children_at(&self, idx: Index) -> impl Iterator<Item = &FormNode> + '_ {
        self.arena[idx]
            .children
            .iter()
            .filter_map(|&child| self.arena.get(child))
    }

    pub(crate) fn child_ids_at(&self, idx: Index) -> Vec<QuestionId> {
        self.children_at(idx).map(|node| node.id().clone()).collect()
    }

    /// Register a detached node. The caller attaches it right away.
    #[instrument(level = "trace", skip(self, question), fields(id = %question.id))]
    pub(crate) fn add_node(&mut self, question: Question) -> DomainResult<Index> {
        if self.ids.contains_key(&question.id) {
            return Err(DomainError::DuplicateId(question.id));
        }
        let id = question.id.clone();
        let idx = self.arena.insert(FormNode::new(question));
        self.ids.insert(id, idx);
        Ok(idx)
    }

    /// Drop a detached subtree from the arena and the id map.
    pub(crate) fn unregister_subtree(&mut self, idx: Index) -> usize {
        let mut stack = vec![idx];
        let mut removed = 0;
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children.iter().copied());
                self.ids.remove(node.id());
                removed += 1;
            }
        }
        debug!(removed, "Unregistered subtree");
        removed
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    tree: &'a FormTree,
    next: Option<Index>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a FormNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.arena.get(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a FormTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a FormTree, start: Index) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = &'a FormNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some(node);
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    tree: &'a FormTree,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(tree: &'a FormTree, start: Index) -> Self {
        Self {
            tree,
            stack: vec![(start, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = &'a FormNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.tree.arena.get(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some(node);
                }
            }
        }
        None
    }
}
