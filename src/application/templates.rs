//! Blank questions handed to the editor before the user customises them.

use crate::config::Settings;
use crate::domain::{Question, QuestionId};

/// Placeholder id; `create_and_insert` replaces it with a generated one.
const TEMPLATE_ID: &str = "";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Templates {
    question_type: String,
    question_layout_classes: Vec<String>,
    page_layout_classes: Vec<String>,
}

impl Templates {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            question_type: settings.question_type.clone(),
            question_layout_classes: settings.templates.question_layout_classes.clone(),
            page_layout_classes: settings.templates.page_layout_classes.clone(),
        }
    }

    pub fn new_question(&self) -> Question {
        self.build(&self.question_layout_classes)
    }

    pub fn new_wizard_page(&self) -> Question {
        self.build(&self.page_layout_classes)
    }

    fn build(&self, layout_classes: &[String]) -> Question {
        let mut question = Question::with_layout(QuestionId::new(TEMPLATE_ID), layout_classes);
        question.record_type = Some(self.question_type.clone());
        question
    }
}

impl Default for Templates {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}
