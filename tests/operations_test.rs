//! Tests for the mutation verbs: insert, remove, relocate, move_page

mod common;

use common::{assert_chain_matches_order, child_ids, flat_form, preceding_of, qid, wizard_form};
use formtree::domain::{
    Direction, DomainError, FormTree, Question, QuestionKind, SequentialIdGenerator,
};
use rstest::rstest;

fn pages(n: usize) -> FormTree {
    let mut tree = FormTree::new(common::form_root());
    for position in 0..n {
        tree.insert(
            Question::new(format!("c{position}"), QuestionKind::WizardStep),
            &qid("form"),
            position,
        )
        .unwrap();
    }
    tree
}

/// Reference model: take the item out, then drop it in front of whatever
/// occupied gap `position` before the move.
fn expected_order(len: usize, from: usize, position: usize) -> Vec<String> {
    let mut order: Vec<String> = (0..len).map(|i| format!("c{i}")).collect();
    let moved = order.remove(from);
    let target = if from < position { position - 1 } else { position };
    order.insert(target.min(order.len()), moved);
    order
}

// ============================================================
// Insert
// ============================================================

#[test]
fn given_chained_children_when_inserting_at_front_then_becomes_new_head() {
    let mut tree = pages(2);

    let order = tree
        .insert(Question::new("new", QuestionKind::WizardStep), &qid("form"), 0)
        .unwrap();

    assert_eq!(order, vec![qid("new"), qid("c0"), qid("c1")]);
    assert_eq!(preceding_of(&tree, "new"), None);
    assert_eq!(preceding_of(&tree, "c0"), Some("new".to_string()));
    assert_eq!(preceding_of(&tree, "c1"), Some("c0".to_string()));
}

#[rstest]
fn given_position_past_end_when_inserting_then_appends(mut wizard_form: FormTree) {
    let order = wizard_form
        .insert(Question::new("late", QuestionKind::Text), &qid("p1"), 99)
        .unwrap();

    assert_eq!(order, vec![qid("q1a"), qid("q1b"), qid("late")]);
    assert_eq!(preceding_of(&wizard_form, "late"), None);
}

#[rstest]
fn given_chain_ahead_of_array_order_when_inserting_then_position_counts_in_chain_order(
    mut wizard_form: FormTree,
) {
    wizard_form.set_preceding(&qid("p3"), Some(qid("p1"))).unwrap();
    wizard_form.set_preceding(&qid("p2"), Some(qid("p3"))).unwrap();

    let order = wizard_form
        .insert(Question::new("p4", QuestionKind::WizardStep), &qid("form"), 1)
        .unwrap();

    assert_eq!(order, vec![qid("p1"), qid("p4"), qid("p3"), qid("p2")]);
    assert_chain_matches_order(&wizard_form, "form");
}

#[rstest]
fn given_chain_ahead_of_array_order_when_relocating_then_gap_counts_in_chain_order(
    mut wizard_form: FormTree,
) {
    wizard_form.set_preceding(&qid("p3"), Some(qid("p1"))).unwrap();
    wizard_form.set_preceding(&qid("p2"), Some(qid("p3"))).unwrap();

    let order = wizard_form.relocate(&qid("p1"), &qid("form"), 2).unwrap();

    assert_eq!(order, vec![qid("p3"), qid("p1"), qid("p2")]);
    assert_chain_matches_order(&wizard_form, "form");
}

#[rstest]
fn given_unknown_parent_when_inserting_then_invalid_parent(mut wizard_form: FormTree) {
    let result = wizard_form.insert(Question::new("orphan", QuestionKind::Text), &qid("ghost"), 0);

    assert_eq!(result, Err(DomainError::InvalidParent(qid("ghost"))));
    assert!(!wizard_form.contains(&qid("orphan")));
}

#[rstest]
fn given_generator_when_creating_then_inserts_with_generated_id(mut wizard_form: FormTree) {
    let mut ids = SequentialIdGenerator::new("q-");
    let template = Question::new("", QuestionKind::Text).with_label("New question");

    let first = wizard_form
        .create_and_insert(template.clone(), &qid("p3"), 0, &mut ids)
        .unwrap();
    let second = wizard_form
        .create_and_insert(template, &qid("p3"), 1, &mut ids)
        .unwrap();

    assert_eq!((first.as_str(), second.as_str()), ("q-1", "q-2"));
    assert_eq!(child_ids(&wizard_form, "p3"), vec!["q-1", "q-2"]);
    assert_eq!(
        wizard_form.get_question(&qid("q-2")).and_then(|q| q.label_text()),
        Some("New question")
    );
}

// ============================================================
// Remove
// ============================================================

#[rstest]
fn given_middle_page_when_removing_then_splices_chain(mut wizard_form: FormTree) {
    let removed = wizard_form.remove(&qid("p2")).unwrap();

    assert_eq!(removed.id, qid("p2"));
    assert_eq!(removed.subquestions.len(), 1);
    assert_eq!(removed.subquestions[0].id, qid("q2a"));
    assert_eq!(child_ids(&wizard_form, "form"), vec!["p1", "p3"]);
    assert_eq!(preceding_of(&wizard_form, "p3"), Some("p1".to_string()));
    assert!(!wizard_form.contains(&qid("p2")));
    assert!(!wizard_form.contains(&qid("q2a")));
    assert_eq!(wizard_form.len(), 5);
}

#[rstest]
fn given_head_page_when_removing_then_next_page_becomes_head(mut wizard_form: FormTree) {
    wizard_form.remove(&qid("p1")).unwrap();

    assert_eq!(child_ids(&wizard_form, "form"), vec!["p2", "p3"]);
    assert_chain_matches_order(&wizard_form, "form");
}

#[rstest]
fn given_root_when_removing_then_detached_node(mut wizard_form: FormTree) {
    assert_eq!(
        wizard_form.remove(&qid("form")),
        Err(DomainError::DetachedNode(qid("form")))
    );
    assert_eq!(wizard_form.len(), 7);
}

#[rstest]
fn given_unknown_id_when_removing_then_not_found(mut wizard_form: FormTree) {
    assert_eq!(
        wizard_form.remove(&qid("ghost")),
        Err(DomainError::NodeNotFound(qid("ghost")))
    );
}

// ============================================================
// Relocate
// ============================================================

#[rstest]
fn given_first_page_when_moving_to_end_then_chain_is_rewritten(mut wizard_form: FormTree) {
    let order = wizard_form.relocate(&qid("p1"), &qid("form"), 3).unwrap();

    assert_eq!(order, vec![qid("p2"), qid("p3"), qid("p1")]);
    assert_eq!(preceding_of(&wizard_form, "p2"), None);
    assert_eq!(preceding_of(&wizard_form, "p3"), Some("p2".to_string()));
    assert_eq!(preceding_of(&wizard_form, "p1"), Some("p3".to_string()));
}

#[rstest]
fn given_second_of_four_when_dropping_after_last_then_lands_at_end(flat_form: FormTree) {
    let mut tree = flat_form;

    let order = tree.relocate(&qid("c1"), &qid("form"), 4).unwrap();

    assert_eq!(order, vec![qid("c0"), qid("c2"), qid("c3"), qid("c1")]);
}

#[rstest]
fn given_second_of_four_when_dropping_before_last_then_lands_before_last(flat_form: FormTree) {
    let mut tree = flat_form;

    let order = tree.relocate(&qid("c1"), &qid("form"), 3).unwrap();

    assert_eq!(order, vec![qid("c0"), qid("c2"), qid("c1"), qid("c3")]);
}

/// Downward moves inside one parent must account for the slot freed by the
/// removal, for every source and drop gap.
#[rstest]
fn given_every_index_pair_when_relocating_within_parent_then_matches_model(flat_form: FormTree) {
    for from in 0..4 {
        for position in 0..=4 {
            let mut tree = flat_form.clone();

            tree.relocate(&qid(&format!("c{from}")), &qid("form"), position)
                .unwrap();

            assert_eq!(
                child_ids(&tree, "form"),
                expected_order(4, from, position),
                "from {from} to gap {position}"
            );
            assert!(tree
                .children_of(&qid("form"))
                .unwrap()
                .iter()
                .all(|child| child.question.preceding.is_none()));
        }
    }
}

#[test]
fn given_every_index_pair_when_relocating_chained_pages_then_chain_follows_order() {
    let original = pages(4);
    for from in 0..4 {
        for position in 0..=4 {
            let mut tree = original.clone();

            tree.relocate(&qid(&format!("c{from}")), &qid("form"), position)
                .unwrap();

            assert_eq!(
                child_ids(&tree, "form"),
                expected_order(4, from, position),
                "from {from} to gap {position}"
            );
            assert_chain_matches_order(&tree, "form");
        }
    }
}

#[rstest]
fn given_question_when_moving_between_pages_then_keeps_subquestion_order(mut wizard_form: FormTree) {
    let order = wizard_form.relocate(&qid("q1b"), &qid("p2"), 0).unwrap();

    assert_eq!(order, vec![qid("q1b"), qid("q2a")]);
    assert_eq!(child_ids(&wizard_form, "p1"), vec!["q1a"]);
    assert_eq!(preceding_of(&wizard_form, "q1b"), None);
    assert_eq!(wizard_form.parent_of(&qid("q1b")).map(|n| n.id().clone()), Some(qid("p2")));
}

#[rstest]
fn given_question_when_moving_into_page_sequence_then_joins_chain(mut wizard_form: FormTree) {
    let order = wizard_form.relocate(&qid("q1a"), &qid("form"), 1).unwrap();

    assert_eq!(order, vec![qid("p1"), qid("q1a"), qid("p2"), qid("p3")]);
    assert_chain_matches_order(&wizard_form, "form");
}

#[rstest]
fn given_page_when_moving_out_of_sequence_then_drops_reference(mut wizard_form: FormTree) {
    wizard_form.relocate(&qid("p3"), &qid("p1"), 2).unwrap();

    assert_eq!(child_ids(&wizard_form, "p1"), vec!["q1a", "q1b", "p3"]);
    assert_eq!(preceding_of(&wizard_form, "p3"), None);
    assert_eq!(child_ids(&wizard_form, "form"), vec!["p1", "p2"]);
}

#[rstest]
fn given_page_target_when_appending_under_then_lands_last(mut wizard_form: FormTree) {
    let order = wizard_form.append_under(&qid("q2a"), &qid("p1")).unwrap();

    assert_eq!(order, vec![qid("q1a"), qid("q1b"), qid("q2a")]);
    assert_eq!(child_ids(&wizard_form, "p2"), Vec::<String>::new());
}

// ============================================================
// Page moves and payload updates
// ============================================================

#[rstest]
#[case::middle_up("p2", Direction::Up, &["p2", "p1", "p3"])]
#[case::middle_down("p2", Direction::Down, &["p1", "p3", "p2"])]
#[case::first_down("p1", Direction::Down, &["p2", "p1", "p3"])]
#[case::first_up_is_noop("p1", Direction::Up, &["p1", "p2", "p3"])]
#[case::last_down_is_noop("p3", Direction::Down, &["p1", "p2", "p3"])]
fn given_page_when_moving_one_step_then_swaps_with_neighbour(
    mut wizard_form: FormTree,
    #[case] page: &str,
    #[case] direction: Direction,
    #[case] expected: &[&str],
) {
    let order = wizard_form.move_page(&qid(page), direction).unwrap();

    let order: Vec<String> = order.into_iter().map(|id| id.to_string()).collect();
    assert_eq!(order, expected);
    assert_chain_matches_order(&wizard_form, "form");
}

#[rstest]
fn given_new_payload_when_updating_then_keeps_tree_owned_reference(mut wizard_form: FormTree) {
    let edited = Question::new("p2", QuestionKind::WizardStep).with_label("Second page");

    wizard_form.update_question(edited).unwrap();

    let stored = wizard_form.get_question(&qid("p2")).unwrap();
    assert_eq!(stored.label_text(), Some("Second page"));
    assert_eq!(stored.preceding, Some(qid("p1")));
    assert_eq!(child_ids(&wizard_form, "p2"), vec!["q2a"]);
}

#[rstest]
fn given_unknown_question_when_updating_then_not_found(mut wizard_form: FormTree) {
    let result = wizard_form.update_question(Question::new("ghost", QuestionKind::Text));
    assert_eq!(result, Err(DomainError::NodeNotFound(qid("ghost"))));
}
