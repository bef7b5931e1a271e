//! Tests for importing and exporting nested JSON-LD form records

mod common;

use common::{child_ids, qid};
use formtree::domain::record::{HAS_LAYOUT_CLASS, HAS_PRECEDING_QUESTION, HAS_SUBQUESTION};
use formtree::domain::{
    CalendarKind, ChainError, DomainError, FormTree, Label, QuestionKind, QuestionRecord,
    DEFAULT_QUESTION_TYPE,
};
use formtree::domain::record::RDFS_LABEL;
use rstest::{fixture, rstest};
use serde_json::{json, Value};

#[fixture]
fn intake_json() -> String {
    formtree::util::testing::init_test_setup();
    json!({
        "@id": "form",
        "@type": DEFAULT_QUESTION_TYPE,
        HAS_LAYOUT_CLASS: "form",
        "http://www.w3.org/2000/01/rdf-schema#label": { "@value": "Intake", "@language": "en" },
        HAS_SUBQUESTION: [
            {
                "@id": "p2",
                HAS_LAYOUT_CLASS: ["section", "wizard-step"],
                HAS_PRECEDING_QUESTION: { "@id": "p1" },
                HAS_SUBQUESTION: {
                    "@id": "visit-date",
                    HAS_LAYOUT_CLASS: "date",
                    "http://example.org/required": true
                }
            },
            {
                "@id": "p1",
                HAS_LAYOUT_CLASS: ["wizard-step", "section", "emphasised"],
                "http://www.w3.org/2000/01/rdf-schema#label": "Personal data",
                HAS_PRECEDING_QUESTION: ""
            }
        ]
    })
    .to_string()
}

#[rstest]
fn given_compacted_json_when_decoding_then_normalises_values(intake_json: String) {
    let record = QuestionRecord::from_json(&intake_json).unwrap();

    assert_eq!(record.kind(), QuestionKind::Form);
    assert_eq!(record.label.as_ref().and_then(Label::text), Some("Intake"));
    assert_eq!(record.record_type.as_deref(), Some(DEFAULT_QUESTION_TYPE));
    assert_eq!(record.subquestions.len(), 2);

    let p2 = &record.subquestions[0];
    assert_eq!(p2.record_type, None);
    assert_eq!(p2.preceding, Some(qid("p1")));
    assert_eq!(p2.subquestions.len(), 1);
    assert_eq!(
        p2.subquestions[0].extensions.get("http://example.org/required"),
        Some(&Value::Bool(true))
    );

    let p1 = &record.subquestions[1];
    assert_eq!(p1.preceding, None);
    assert_eq!(p1.label, Some(Label::from("Personal data")));
}

#[rstest]
fn given_record_when_building_tree_then_orders_pages_by_chain(intake_json: String) {
    let record = QuestionRecord::from_json(&intake_json).unwrap();

    let tree = FormTree::from_record(record).unwrap();

    assert_eq!(child_ids(&tree, "form"), vec!["p1", "p2"]);
    assert_eq!(tree.len(), 4);
    let date = tree.get_question(&qid("visit-date")).unwrap();
    assert_eq!(date.kind, QuestionKind::Calendar(CalendarKind::Date));
    let p1 = tree.get_question(&qid("p1")).unwrap();
    assert_eq!(p1.kind, QuestionKind::WizardStep);
    assert_eq!(p1.layout_classes, vec!["wizard-step", "section", "emphasised"]);
    assert!(tree.broken_chains().is_empty());
}

#[rstest]
fn given_tree_when_exporting_then_writes_nested_json_ld(intake_json: String) {
    let tree = FormTree::from_record(QuestionRecord::from_json(&intake_json).unwrap()).unwrap();

    let exported: Value = serde_json::from_str(&tree.to_record().to_json_pretty().unwrap()).unwrap();

    let pages = exported[HAS_SUBQUESTION].as_array().unwrap();
    assert_eq!(pages[0]["@id"], "p1");
    assert!(pages[0].get(HAS_PRECEDING_QUESTION).is_none());
    assert_eq!(pages[0][HAS_LAYOUT_CLASS], json!(["wizard-step", "section", "emphasised"]));
    assert!(pages[0].get("@type").is_none());
    assert_eq!(exported["@type"], DEFAULT_QUESTION_TYPE);
    assert_eq!(exported[RDFS_LABEL], json!({ "@value": "Intake", "@language": "en" }));
    assert_eq!(pages[1][HAS_PRECEDING_QUESTION], json!({ "@id": "p1" }));
    assert_eq!(pages[1][HAS_SUBQUESTION][0]["http://example.org/required"], true);
    assert_eq!(exported[HAS_LAYOUT_CLASS], json!(["form"]));
}

#[rstest]
fn given_exported_record_when_reimporting_then_structure_is_stable(intake_json: String) {
    let first = FormTree::from_record(QuestionRecord::from_json(&intake_json).unwrap())
        .unwrap()
        .to_record();

    let json = first.to_json_pretty().unwrap();
    let second = FormTree::from_record(QuestionRecord::from_json(&json).unwrap())
        .unwrap()
        .to_record();

    assert_eq!(first, second);
}

#[rstest]
#[case::tagged(json!({ "@value": "Jméno", "@language": "cs" }))]
#[case::multilingual(json!([
    { "@value": "Name", "@language": "en" },
    { "@value": "Jméno", "@language": "cs" }
]))]
#[case::plain(json!("Jméno"))]
fn given_label_when_round_tripping_then_written_back_unchanged(#[case] label: Value) {
    formtree::util::testing::init_test_setup();
    let input = json!({ "@id": "name", RDFS_LABEL: label.clone() });

    let tree = FormTree::from_record(serde_json::from_value(input).unwrap()).unwrap();
    let exported = serde_json::to_value(tree.to_record()).unwrap();

    assert_eq!(exported[RDFS_LABEL], label);
    assert!(exported.get("@type").is_none());
}

#[test]
fn given_multilingual_label_when_importing_then_display_text_is_first_entry() {
    let record: QuestionRecord = serde_json::from_value(json!({
        "@id": "name",
        RDFS_LABEL: [
            { "@value": "Name", "@language": "en" },
            { "@value": "Jméno", "@language": "cs" }
        ]
    }))
    .unwrap();

    let tree = FormTree::from_record(record).unwrap();
    let question = tree.get_question(&qid("name")).unwrap();

    assert_eq!(question.label_text(), Some("Name"));
    assert_eq!(question.label.as_ref().and_then(|l| l.text_in("cs")), Some("Jméno"));
    assert_eq!(question.to_string(), "name [text] Name");
}

#[test]
fn given_repeated_id_when_building_tree_then_duplicate_id() {
    let mut root = QuestionRecord::new("form");
    root.subquestions = vec![QuestionRecord::new("a"), QuestionRecord::new("a")];

    assert_eq!(
        FormTree::from_record(root).err(),
        Some(DomainError::DuplicateId(qid("a")))
    );
}

#[test]
fn given_broken_chain_when_building_tree_then_keeps_array_order_and_reports() {
    let mut root = QuestionRecord::new("form");
    root.layout_classes = vec!["form".into()];
    let mut second = QuestionRecord::new("b");
    second.preceding = Some(qid("missing"));
    root.subquestions = vec![QuestionRecord::new("a"), second];

    let tree = FormTree::from_record(root).unwrap();

    assert_eq!(child_ids(&tree, "form"), vec!["a", "b"]);
    assert_eq!(
        tree.broken_chains(),
        vec![(
            qid("form"),
            ChainError::UnresolvedReference {
                id: qid("b"),
                preceding: qid("missing"),
            }
        )]
    );
}
