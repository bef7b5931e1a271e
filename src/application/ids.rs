use uuid::Uuid;

use crate::config::Settings;
use crate::domain::{IdGenerator, QuestionId};

/// Random ids for questions created in the editor: `<prefix><uuid v4>`.
#[derive(Debug, Clone)]
pub struct UuidIdGenerator {
    prefix: String,
}

impl UuidIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.ids.prefix.clone())
    }
}

impl Default for UuidIdGenerator {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl IdGenerator for UuidIdGenerator {
    fn next_id(&mut self) -> QuestionId {
        QuestionId::new(format!("{}{}", self.prefix, Uuid::new_v4()))
    }
}
