use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::HashMap;

/// A manuscript chapter as handed over by the editing layer.
///
/// Only `id` and `content` are relied upon by the analyzers; `title` and
/// `order` are carried for display.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<u32>,
    /// Plain-text chapter body.
    #[serde(default)]
    pub content: String,
}

impl Chapter {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            order: None,
            content: content.into(),
        }
    }

    /// Title for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Psychological profile of a character.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Psychology {
    #[serde(default, alias = "personalityTraits")]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub flaws: Vec<String>,
}

/// A character as handed over by the editing layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Character {
    pub id: String,
    pub name: String,
    /// Free-form role, e.g. "protagonist", "antagonist", "supporting".
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub psychology: Psychology,
}

impl Character {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            psychology: Psychology::default(),
        }
    }

    /// Whether the character declares the given trait (case-insensitive).
    pub fn has_trait(&self, trait_name: &str) -> bool {
        self.psychology
            .personality_traits
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(trait_name))
    }
}

/// Optional existing-project context folded into generation prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default)]
    pub existing_characters: Vec<Character>,
    #[serde(default)]
    pub world_building: Option<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl ProjectContext {
    pub fn is_empty(&self) -> bool {
        self.existing_characters.is_empty()
            && self.world_building.as_deref().map_or(true, |w| w.trim().is_empty())
            && self.chapters.is_empty()
            && self.metadata.is_empty()
    }
}

/// A manuscript bundle: what the CLI and MCP surfaces load for analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manuscript {
    pub project_id: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub characters: Vec<Character>,
}
