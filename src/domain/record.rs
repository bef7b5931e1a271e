//! Nested question records as exchanged with import/export collaborators.
//!
//! A record embeds its sub-questions, mirroring the JSON-LD form documents.
//! Inside the tree the hierarchy lives in the arena instead; this module
//! converts between the two.

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::domain::arena::FormTree;
use crate::domain::error::DomainResult;
use crate::domain::question::{Label, Question, QuestionId, QuestionKind};

pub const HAS_LAYOUT_CLASS: &str = "http://onto.fel.cvut.cz/ontologies/form-layout/has-layout-class";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const HAS_SUBQUESTION: &str = "http://onto.fel.cvut.cz/ontologies/documentation/has_related_question";
pub const HAS_PRECEDING_QUESTION: &str = "http://onto.fel.cvut.cz/ontologies/form/has-preceding-question";

/// A question together with its embedded sub-questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "@id")]
    pub id: QuestionId,

    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,

    #[serde(
        rename = "http://onto.fel.cvut.cz/ontologies/form-layout/has-layout-class",
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub layout_classes: Vec<String>,

    #[serde(
        rename = "http://www.w3.org/2000/01/rdf-schema#label",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub label: Option<Label>,

    #[serde(
        rename = "http://onto.fel.cvut.cz/ontologies/documentation/has_related_question",
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "one_or_many"
    )]
    pub subquestions: Vec<QuestionRecord>,

    #[serde(
        rename = "http://onto.fel.cvut.cz/ontologies/form/has-preceding-question",
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_preceding",
        deserialize_with = "deserialize_preceding"
    )]
    pub preceding: Option<QuestionId>,

    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// JSON-LD compaction writes single-element lists as a bare value.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(items) => items,
        OneOrMany::One(item) => vec![item],
    })
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PrecedingRef {
    Node {
        #[serde(rename = "@id")]
        id: String,
    },
    Plain(String),
}

fn deserialize_preceding<'de, D>(deserializer: D) -> Result<Option<QuestionId>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Option::<PrecedingRef>::deserialize(deserializer)? {
        Some(PrecedingRef::Node { id }) | Some(PrecedingRef::Plain(id)) => id,
        None => return Ok(None),
    };
    Ok((!id.is_empty()).then(|| QuestionId::new(id)))
}

fn serialize_preceding<S>(preceding: &Option<QuestionId>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match preceding {
        Some(id) => PrecedingRef::Node {
            id: id.as_str().to_string(),
        }
        .serialize(serializer),
        None => serializer.serialize_none(),
    }
}

impl QuestionRecord {
    pub fn new(id: impl Into<QuestionId>) -> Self {
        Self {
            id: id.into(),
            record_type: None,
            layout_classes: Vec::new(),
            label: None,
            subquestions: Vec::new(),
            preceding: None,
            extensions: Map::new(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn kind(&self) -> QuestionKind {
        QuestionKind::classify(&self.layout_classes).0
    }

    /// Split into the node payload and the embedded sub-questions.
    pub fn into_parts(self) -> (Question, Vec<QuestionRecord>) {
        let kind = self.kind();
        let question = Question {
            id: self.id,
            kind,
            record_type: self.record_type,
            label: self.label,
            layout_classes: self.layout_classes,
            preceding: self.preceding,
            extensions: self.extensions,
        };
        (question, self.subquestions)
    }

    /// Rebuild a record from a payload and already converted sub-questions.
    pub fn from_parts(question: &Question, subquestions: Vec<QuestionRecord>) -> Self {
        Self {
            id: question.id.clone(),
            record_type: question.record_type.clone(),
            layout_classes: question.all_layout_classes(),
            label: question.label.clone(),
            subquestions,
            preceding: question.preceding.clone(),
            extensions: question.extensions.clone(),
        }
    }
}

impl From<&Question> for QuestionRecord {
    fn from(question: &Question) -> Self {
        Self::from_parts(question, Vec::new())
    }
}

impl FormTree {
    /// Build a tree from a nested form record.
    ///
    /// Children whose preceding chain is intact are put in chain order;
    /// broken chains keep their array order and show up in
    /// [`FormTree::broken_chains`].
    #[instrument(level = "debug", skip(root), fields(root = %root.id))]
    pub fn from_record(root: QuestionRecord) -> DomainResult<Self> {
        let (root_question, subquestions) = root.into_parts();
        let mut tree = FormTree::new(root_question);
        let root_idx = tree.root_index();

        let mut stack = vec![(root_idx, subquestions)];
        let mut parents = Vec::new();
        while let Some((parent_idx, records)) = stack.pop() {
            for record in records {
                let (question, children) = record.into_parts();
                let idx = tree.add_node(question)?;
                tree.node_at_mut(idx).parent = Some(parent_idx);
                tree.node_at_mut(parent_idx).children.push(idx);
                if !children.is_empty() {
                    stack.push((idx, children));
                }
            }
            parents.push(parent_idx);
        }

        for parent_idx in parents {
            if !tree.is_chain_ordered(parent_idx) {
                continue;
            }
            if let Err(err) = tree.reorder_children_by_chain(parent_idx) {
                warn!(error = %err, "Keeping array order for broken chain");
            }
        }

        debug!(questions = tree.len(), "Built form tree");
        Ok(tree)
    }

    /// Derive the nested record view of the whole form.
    #[instrument(level = "debug", skip(self))]
    pub fn to_record(&self) -> QuestionRecord {
        self.record_at(self.root_index())
    }

    /// Derive the nested record view of the subtree rooted at `id`.
    pub fn subtree_record(&self, id: &QuestionId) -> Option<QuestionRecord> {
        self.index_of(id).map(|idx| self.record_at(idx))
    }

    fn record_at(&self, idx: generational_arena::Index) -> QuestionRecord {
        let node = self.node_at(idx);
        let subquestions = node
            .children
            .iter()
            .map(|&child| self.record_at(child))
            .collect();
        QuestionRecord::from_parts(&node.question, subquestions)
    }
}
