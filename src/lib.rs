//! Form-structure core of a questionnaire editor.
//!
//! A form is a tree of questions held in an arena ([`domain::FormTree`]).
//! Edits run on a private copy and are published atomically by
//! [`application::FormStructure`]; wizard pages keep their order through a
//! preceding-question chain.

pub mod application;
pub mod config;
pub mod domain;
pub mod util;

pub use application::{with_mutation, ApplicationError, ApplicationResult, FormEditor, FormStructure};
pub use domain::{
    ChainError, Direction, DomainError, DomainResult, FormNode, FormTree, Label, Question, QuestionId,
    QuestionKind, QuestionRecord,
};
