//! Question payloads carried by tree nodes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default `@type` of questions created by the editor.
pub const DEFAULT_QUESTION_TYPE: &str = "http://onto.fel.cvut.cz/ontologies/documentation/question";

/// Opaque, unique identifier of a question (`@id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for QuestionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for QuestionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Calendar flavour of a date/time question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalendarKind {
    Date,
    Time,
    DateTime,
}

/// Closed set of question kinds the editor knows about.
///
/// The kind is derived from the record's layout classes on import and
/// contributes its own classes back on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    /// The form itself (tree root)
    Form,
    /// A section rendered as one page of the wizard
    WizardStep,
    Section,
    Typeahead,
    Calendar(CalendarKind),
    Checkbox,
    MaskedInput,
    Textarea,
    /// Plain text input, the fallback for anything unrecognised
    Text,
}

impl QuestionKind {
    /// Layout classes that define this kind.
    pub fn layout_classes(&self) -> &'static [&'static str] {
        match self {
            QuestionKind::Form => &["form"],
            QuestionKind::WizardStep => &["section", "wizard-step"],
            QuestionKind::Section => &["section"],
            QuestionKind::Typeahead => &["type-ahead"],
            QuestionKind::Calendar(CalendarKind::Date) => &["date"],
            QuestionKind::Calendar(CalendarKind::Time) => &["time"],
            QuestionKind::Calendar(CalendarKind::DateTime) => &["datetime"],
            QuestionKind::Checkbox => &["checkbox"],
            QuestionKind::MaskedInput => &["masked-input"],
            QuestionKind::Textarea => &["textarea"],
            QuestionKind::Text => &[],
        }
    }

    /// Classify a layout class list, returning the kind and the classes
    /// that are not part of the kind's definition (order preserved).
    pub fn classify(layout_classes: &[String]) -> (Self, Vec<String>) {
        let has = |class: &str| layout_classes.iter().any(|c| c == class);

        let kind = if has("form") {
            QuestionKind::Form
        } else if has("wizard-step") {
            QuestionKind::WizardStep
        } else if has("section") {
            QuestionKind::Section
        } else if has("type-ahead") {
            QuestionKind::Typeahead
        } else if has("datetime") {
            QuestionKind::Calendar(CalendarKind::DateTime)
        } else if has("date") {
            QuestionKind::Calendar(CalendarKind::Date)
        } else if has("time") {
            QuestionKind::Calendar(CalendarKind::Time)
        } else if has("checkbox") {
            QuestionKind::Checkbox
        } else if has("masked-input") {
            QuestionKind::MaskedInput
        } else if has("textarea") {
            QuestionKind::Textarea
        } else {
            QuestionKind::Text
        };

        let own = kind.layout_classes();
        let rest = layout_classes
            .iter()
            .filter(|c| !own.contains(&c.as_str()))
            .cloned()
            .collect();
        (kind, rest)
    }

    pub fn is_wizard_step(&self) -> bool {
        matches!(self, QuestionKind::WizardStep)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestionKind::Form => "form",
            QuestionKind::WizardStep => "wizard-step",
            QuestionKind::Section => "section",
            QuestionKind::Typeahead => "type-ahead",
            QuestionKind::Calendar(CalendarKind::Date) => "date",
            QuestionKind::Calendar(CalendarKind::Time) => "time",
            QuestionKind::Calendar(CalendarKind::DateTime) => "datetime",
            QuestionKind::Checkbox => "checkbox",
            QuestionKind::MaskedInput => "masked-input",
            QuestionKind::Textarea => "textarea",
            QuestionKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// `rdfs:label` of a question, kept in the shape it was written.
///
/// Language tags and multilingual lists survive a round trip; the editor
/// only reads [`Label::text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Plain(String),
    Literal {
        #[serde(rename = "@value")]
        value: String,
        #[serde(rename = "@language", default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Many(Vec<Label>),
}

impl Label {
    /// Display text: the plain value, or the first entry of a list.
    pub fn text(&self) -> Option<&str> {
        match self {
            Label::Plain(value) | Label::Literal { value, .. } => Some(value.as_str()),
            Label::Many(labels) => labels.iter().find_map(Label::text),
        }
    }

    /// Text of the entry tagged with `language`, if any.
    pub fn text_in(&self, language: &str) -> Option<&str> {
        match self {
            Label::Literal {
                value,
                language: Some(tag),
                ..
            } if tag.eq_ignore_ascii_case(language) => Some(value.as_str()),
            Label::Many(labels) => labels.iter().find_map(|label| label.text_in(language)),
            _ => None,
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Plain(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Plain(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text().unwrap_or_default())
    }
}

/// Data payload of a tree node.
///
/// Child questions are not stored here; the tree owns the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub kind: QuestionKind,
    /// JSON-LD `@type`, absent when the record carried none
    pub record_type: Option<String>,
    pub label: Option<Label>,
    /// Layout classes in their original order, including the kind's own
    pub layout_classes: Vec<String>,
    /// Sibling that must come immediately before this question
    pub preceding: Option<QuestionId>,
    /// Attributes the editor does not interpret
    pub extensions: Map<String, Value>,
}

impl Question {
    pub fn new(id: impl Into<QuestionId>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            kind,
            record_type: None,
            label: None,
            layout_classes: Vec::new(),
            preceding: None,
            extensions: Map::new(),
        }
    }

    /// Build a question from a raw layout class list.
    pub fn with_layout(id: impl Into<QuestionId>, layout_classes: &[String]) -> Self {
        let (kind, _) = QuestionKind::classify(layout_classes);
        let mut question = Self::new(id, kind);
        question.layout_classes = layout_classes.to_vec();
        question
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_preceding(mut self, preceding: impl Into<QuestionId>) -> Self {
        self.preceding = Some(preceding.into());
        self
    }

    /// Display text of the label.
    pub fn label_text(&self) -> Option<&str> {
        self.label.as_ref().and_then(Label::text)
    }

    /// Layout classes to export.
    ///
    /// The stored list is returned as is while it still describes `kind`.
    /// After the kind was changed, the old kind's classes are replaced by
    /// the new kind's, which go first.
    pub fn all_layout_classes(&self) -> Vec<String> {
        let (stored_kind, rest) = QuestionKind::classify(&self.layout_classes);
        if stored_kind == self.kind {
            return self.layout_classes.clone();
        }
        let mut classes: Vec<String> = self
            .kind
            .layout_classes()
            .iter()
            .map(|c| c.to_string())
            .collect();
        for class in rest {
            if !classes.contains(&class) {
                classes.push(class);
            }
        }
        classes
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label_text() {
            Some(label) if label != self.id.as_str() => {
                write!(f, "{} [{}] {}", self.id, self.kind, label)
            }
            _ => write!(f, "{} [{}]", self.id, self.kind),
        }
    }
}
