//! Editor facade: the operations UI collaborators trigger.
//!
//! Every call goes through [`FormStructure::mutate`], so each edit is
//! either fully published or leaves the form untouched.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::ids::UuidIdGenerator;
use crate::application::session::FormStructure;
use crate::application::templates::Templates;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{Direction, FormTree, IdGenerator, Question, QuestionId, QuestionRecord};

pub struct FormEditor<G: IdGenerator = UuidIdGenerator> {
    structure: FormStructure,
    templates: Templates,
    ids: G,
}

impl FormEditor<UuidIdGenerator> {
    pub fn new(structure: FormStructure, settings: &Settings) -> Self {
        Self::with_id_generator(structure, settings, UuidIdGenerator::from_settings(settings))
    }
}

impl<G: IdGenerator> FormEditor<G> {
    pub fn with_id_generator(structure: FormStructure, settings: &Settings, ids: G) -> Self {
        Self {
            structure,
            templates: Templates::from_settings(settings),
            ids,
        }
    }

    pub fn structure(&self) -> &FormStructure {
        &self.structure
    }

    pub fn snapshot(&self) -> Arc<FormTree> {
        self.structure.snapshot()
    }

    pub fn into_structure(self) -> FormStructure {
        self.structure
    }

    /// Drag feedback: whether dropping `moving` onto `target` would be accepted.
    pub fn can_drop(&self, moving: &QuestionId, target: &QuestionId) -> bool {
        self.structure.tree().can_relocate(moving, target)
    }

    /// Drop `moving` into `target_parent` at gap `position`.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(
        &mut self,
        moving: &QuestionId,
        target_parent: &QuestionId,
        position: usize,
    ) -> ApplicationResult<Vec<QuestionId>> {
        self.structure
            .mutate(|tree| tree.relocate(moving, target_parent, position))
    }

    /// Drop `moving` onto `target`, appending it as the last sub-question.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node_under_node(
        &mut self,
        moving: &QuestionId,
        target: &QuestionId,
    ) -> ApplicationResult<Vec<QuestionId>> {
        self.structure.mutate(|tree| tree.append_under(moving, target))
    }

    /// Insert a blank question under `parent` at `position`.
    #[instrument(level = "debug", skip(self))]
    pub fn add_new_question(&mut self, parent: &QuestionId, position: usize) -> ApplicationResult<QuestionId> {
        let template = self.templates.new_question();
        let ids = &mut self.ids;
        let id = self
            .structure
            .mutate(|tree| tree.create_and_insert(template, parent, position, ids))?;
        info!(%id, %parent, "Added question");
        Ok(id)
    }

    /// Append a wizard page after the last top-level question.
    #[instrument(level = "debug", skip(self))]
    pub fn add_new_page(&mut self) -> ApplicationResult<QuestionId> {
        let page = self.page_from_template();
        let id = page.id.clone();
        self.structure.mutate(|tree| {
            let root = tree.root_id().clone();
            let end = tree.root().child_count();
            tree.insert(page, &root, end)
        })?;
        info!(%id, "Added page");
        Ok(id)
    }

    /// Add the first question of an empty form, or another top-level one:
    /// a wizard page unless the form is laid out without a wizard.
    #[instrument(level = "debug", skip(self))]
    pub fn add_top_level_question(&mut self) -> ApplicationResult<QuestionId> {
        if !self.structure.tree().is_wizardless() {
            return self.add_new_page();
        }
        let question = {
            let mut question = self.templates.new_question();
            question.id = self.ids.next_id();
            question
        };
        let id = question.id.clone();
        self.structure.mutate(|tree| {
            let root = tree.root_id().clone();
            let end = tree.root().child_count();
            tree.insert(question, &root, end)
        })?;
        info!(%id, "Added top-level question");
        Ok(id)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn move_page(&mut self, id: &QuestionId, direction: Direction) -> ApplicationResult<Vec<QuestionId>> {
        self.structure.mutate(|tree| tree.move_page(id, direction))
    }

    /// Save the customised payload of an existing question.
    pub fn update_question(&mut self, question: Question) -> ApplicationResult<()> {
        self.structure.mutate(|tree| tree.update_question(question))
    }

    #[instrument(level = "debug", skip(self))]
    pub fn remove_question(&mut self, id: &QuestionId) -> ApplicationResult<QuestionRecord> {
        let removed = self.structure.mutate(|tree| tree.remove(id))?;
        info!(%id, "Removed question");
        Ok(removed)
    }

    /// Nested record of the current form, ready for serialisation.
    pub fn export_record(&self) -> QuestionRecord {
        debug!(version = self.structure.version(), "Exporting form");
        self.structure.tree().to_record()
    }

    pub fn export_json(&self) -> ApplicationResult<String> {
        Ok(self.export_record().to_json_pretty()?)
    }

    fn page_from_template(&mut self) -> Question {
        let mut page = self.templates.new_wizard_page();
        page.id = self.ids.next_id();
        page.label = Some(page.id.to_string().into());
        page
    }
}
