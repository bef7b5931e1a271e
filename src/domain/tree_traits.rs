/*
Text rendering of a form structure for diagnostics and test output.

Questions render as `<id> [<kind>] <label>`, sub-questions indented below
their parent in display order.
 */
use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::FormTree;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for FormTree {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        fn build_tree(tree: &FormTree, node_idx: Index, parent_tree: &mut Tree<String>) {
            for &child_idx in &tree.node_at(node_idx).children {
                let child = tree.node_at(child_idx);
                let mut child_tree = Tree::new(child.question.to_string());
                build_tree(tree, child_idx, &mut child_tree);
                parent_tree.push(child_tree);
            }
        }

        let root_idx = self.root_index();
        let mut tree = Tree::new(self.node_at(root_idx).question.to_string());
        build_tree(self, root_idx, &mut tree);
        tree
    }
}
