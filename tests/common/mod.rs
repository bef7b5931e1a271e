#![allow(dead_code)]

use formtree::domain::{FormTree, Question, QuestionId, QuestionKind};
use formtree::util::testing::init_test_setup;
use rstest::fixture;

pub fn qid(id: &str) -> QuestionId {
    QuestionId::new(id)
}

pub fn form_root() -> Question {
    Question::new("form", QuestionKind::Form).with_label("Form")
}

/// ```text
/// form
/// ├── p1 [wizard-step]
/// │   ├── q1a
/// │   └── q1b
/// ├── p2 [wizard-step]  (preceding p1)
/// │   └── q2a
/// └── p3 [wizard-step]  (preceding p2)
/// ```
#[fixture]
pub fn wizard_form() -> FormTree {
    init_test_setup();
    let mut tree = FormTree::new(form_root());
    let root = qid("form");
    for (position, page) in ["p1", "p2", "p3"].into_iter().enumerate() {
        tree.insert(Question::new(page, QuestionKind::WizardStep), &root, position)
            .expect("insert page");
    }
    for (position, id) in ["q1a", "q1b"].into_iter().enumerate() {
        tree.insert(Question::new(id, QuestionKind::Text), &qid("p1"), position)
            .expect("insert question");
    }
    tree.insert(Question::new("q2a", QuestionKind::Text), &qid("p2"), 0)
        .expect("insert question");
    tree
}

/// Form without a wizard: four plain questions `c0..c3`, no chain.
#[fixture]
pub fn flat_form() -> FormTree {
    init_test_setup();
    let mut tree = FormTree::new(form_root());
    let root = qid("form");
    for position in 0..4 {
        tree.insert(
            Question::new(format!("c{position}"), QuestionKind::Text),
            &root,
            position,
        )
        .expect("insert question");
    }
    tree
}

pub fn child_ids(tree: &FormTree, parent: &str) -> Vec<String> {
    tree.child_ids(&qid(parent))
        .expect("parent exists")
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

pub fn preceding_of(tree: &FormTree, id: &str) -> Option<String> {
    tree.get_question(&qid(id))
        .expect("question exists")
        .preceding
        .as_ref()
        .map(|p| p.to_string())
}

/// Assert that every child of `parent` points at the child before it.
pub fn assert_chain_matches_order(tree: &FormTree, parent: &str) {
    let children = child_ids(tree, parent);
    for (i, child) in children.iter().enumerate() {
        let expected = i.checked_sub(1).map(|p| children[p].clone());
        assert_eq!(
            preceding_of(tree, child),
            expected,
            "preceding of {child} in {children:?}"
        );
    }
}
