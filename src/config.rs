//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/formtree/formtree.toml`
//! 3. Local config: `<dir>/.formtree.toml` (next to the edited form)
//! 4. Environment variables: `FORMTREE_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::DEFAULT_QUESTION_TYPE;

/// Id generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdSettings {
    /// Prepended to every generated question id
    pub prefix: String,
}

impl Default for IdSettings {
    fn default() -> Self {
        Self {
            prefix: "question-".into(),
        }
    }
}

/// Layout classes given to questions created by the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateSettings {
    /// Layout classes of a new question (e.g., ["new"])
    pub question_layout_classes: Vec<String>,
    /// Layout classes of a new wizard page (e.g., ["section", "wizard-step"])
    pub page_layout_classes: Vec<String>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            question_layout_classes: vec!["new".into()],
            page_layout_classes: vec!["section".into(), "wizard-step".into()],
        }
    }
}

/// Raw template config for intermediate parsing (arrays are Option to detect "not specified").
///
/// Used during layered config merging to distinguish between:
/// - `None` → field not specified, inherit from base
/// - `Some([])` → explicit empty array
/// - `Some([...])` → explicit values to merge
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTemplateSettings {
    pub question_layout_classes: Option<Vec<String>>,
    pub page_layout_classes: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawIdSettings {
    pub prefix: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub question_type: Option<String>,
    pub ids: RawIdSettings,
    pub templates: RawTemplateSettings,
}

impl TemplateSettings {
    /// Merge arrays with union semantics and negation support.
    ///
    /// - Items from overlay are appended to base
    /// - Items prefixed with `!` remove the corresponding item from the result
    /// - Duplicates are dropped, first occurrence wins
    ///
    /// Order is kept because layout classes are emitted in list order.
    ///
    /// # Examples
    /// ```ignore
    /// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
    /// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
    /// ```
    pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
        let removed: HashSet<&str> = overlay
            .iter()
            .filter_map(|pattern| pattern.strip_prefix('!'))
            .collect();

        let mut seen = HashSet::new();
        base.iter()
            .chain(overlay.iter().filter(|pattern| !pattern.starts_with('!')))
            .filter(|item| !removed.contains(item.as_str()))
            .filter(|item| seen.insert(item.as_str()))
            .cloned()
            .collect()
    }

    /// Merge overlay config onto self (base) with union semantics.
    pub fn merge(&self, overlay: &RawTemplateSettings) -> Self {
        Self {
            question_layout_classes: overlay
                .question_layout_classes
                .as_ref()
                .map(|o| Self::merge_array(&self.question_layout_classes, o))
                .unwrap_or_else(|| self.question_layout_classes.clone()),
            page_layout_classes: overlay
                .page_layout_classes
                .as_ref()
                .map(|o| Self::merge_array(&self.page_layout_classes, o))
                .unwrap_or_else(|| self.page_layout_classes.clone()),
        }
    }

    /// Apply global config onto defaults.
    ///
    /// Unlike `merge()`, arrays given in the global config REPLACE the
    /// defaults entirely.
    pub fn apply_global(&self, global: &RawTemplateSettings) -> Self {
        Self {
            question_layout_classes: global
                .question_layout_classes
                .clone()
                .unwrap_or_else(|| self.question_layout_classes.clone()),
            page_layout_classes: global
                .page_layout_classes
                .clone()
                .unwrap_or_else(|| self.page_layout_classes.clone()),
        }
    }
}

/// Unified configuration for formtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// `@type` of questions created by the editor
    pub question_type: String,
    /// Id generation settings
    pub ids: IdSettings,
    /// Templates for new questions and pages
    pub templates: TemplateSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            question_type: DEFAULT_QUESTION_TYPE.into(),
            ids: IdSettings::default(),
            templates: TemplateSettings::default(),
        }
    }
}

/// Get the XDG config directory for formtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "formtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("formtree.toml"))
}

/// Get the path to the local config file in a form directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".formtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Merge overlay config onto self (base) with union semantics for arrays.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            question_type: overlay
                .question_type
                .clone()
                .unwrap_or_else(|| self.question_type.clone()),
            ids: IdSettings {
                prefix: overlay
                    .ids
                    .prefix
                    .clone()
                    .unwrap_or_else(|| self.ids.prefix.clone()),
            },
            templates: self.templates.merge(&overlay.templates),
        }
    }

    /// Apply global config onto defaults with REPLACE semantics for arrays.
    fn apply_global(&self, global: &RawSettings) -> Self {
        Self {
            question_type: global
                .question_type
                .clone()
                .unwrap_or_else(|| self.question_type.clone()),
            ids: IdSettings {
                prefix: global
                    .ids
                    .prefix
                    .clone()
                    .unwrap_or_else(|| self.ids.prefix.clone()),
            },
            templates: self.templates.apply_global(&global.templates),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.formtree.toml`
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE (global defines the real baseline)
    /// - Global → Local: UNION with negation support
    /// - Any → Env vars: REPLACE (explicit user override)
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.apply_global(&raw);
            }
        }

        if let Some(dir) = local_dir {
            current = current.with_local(dir)?;
        }

        Self::apply_env_overrides(current)
    }

    /// Merge the local config of `dir` onto these settings, if present.
    pub fn with_local(self, dir: &Path) -> Result<Self, ApplicationError> {
        let local_path = local_config_path(dir);
        if !local_path.exists() {
            return Ok(self);
        }
        let raw = load_raw_settings(&local_path)?;
        Ok(self.merge_with(&raw))
    }

    /// Apply FORMTREE_* environment variables as explicit overrides.
    ///
    /// Env vars replace values (not merge) - they are explicit user overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("FORMTREE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("templates.question_layout_classes")
                .with_list_parse_key("templates.page_layout_classes"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("question_type") {
            settings.question_type = val;
        }
        if let Ok(val) = config.get_string("ids.prefix") {
            settings.ids.prefix = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("templates.question_layout_classes") {
            settings.templates.question_layout_classes = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("templates.page_layout_classes") {
            settings.templates.page_layout_classes = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# formtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/formtree/formtree.toml  (defines your baseline)
#   Local:  <dir>/.formtree.toml              (form-specific additions)
#   Env:    FORMTREE_* environment variables  (explicit overrides)
#
# Array merge: the global file replaces the defaults, a local file adds to
# them. Prefix an entry with "!" in a local file to remove it.

# @type given to new questions
# question_type = "http://onto.fel.cvut.cz/ontologies/documentation/question"

[ids]
# prefix = "question-"

[templates]
# question_layout_classes = ["new"]
# page_layout_classes = ["section", "wizard-step"]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
