use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{
    Chapter, Character, NarrativeStructure, PlotGenerationRequest, ProjectContext, Psychology,
};
use crate::PlotweaveError;

/// Maximum allowed limit for result counts (prevents unbounded responses).
pub const MAX_LIMIT: usize = 100;

/// A manuscript chapter.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ChapterInput {
    /// Stable chapter id (e.g., "ch-01")
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Plain-text chapter body
    #[serde(default)]
    pub content: String,
}

impl From<ChapterInput> for Chapter {
    fn from(input: ChapterInput) -> Self {
        Chapter {
            id: input.id,
            title: input.title,
            order: None,
            content: input.content,
        }
    }
}

/// A character as known to the editing layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CharacterInput {
    pub id: String,
    pub name: String,
    /// protagonist, antagonist, supporting, ...
    #[serde(default)]
    pub role: String,
    /// Declared personality traits (e.g., ["brave", "loyal"])
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub flaws: Vec<String>,
}

impl From<CharacterInput> for Character {
    fn from(input: CharacterInput) -> Self {
        Character {
            id: input.id,
            name: input.name,
            role: input.role,
            psychology: Psychology {
                personality_traits: input.personality_traits,
                flaws: input.flaws,
            },
        }
    }
}

/// Input for generate_plot tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratePlotInput {
    /// Project to store the plot under
    pub project_id: String,
    /// Story premise in one or two sentences
    pub premise: String,
    pub genre: String,
    /// Target length in chapters (default: 20)
    #[serde(default)]
    pub target_length: Option<u32>,
    /// three-act, five-act, heros-journey, kishotenketsu or custom
    #[serde(default)]
    pub structure: Option<String>,
    /// Character names the plot should feature
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub tone: Option<String>,
    /// Beats the outline must honor
    #[serde(default)]
    pub plot_points: Vec<String>,
    /// Existing world-building notes
    #[serde(default)]
    pub world_building: Option<String>,
    /// Chapters already written, used as context
    #[serde(default)]
    pub existing_chapters: Vec<ChapterInput>,
    /// Characters already defined, used as context
    #[serde(default)]
    pub existing_characters: Vec<CharacterInput>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl GeneratePlotInput {
    pub fn to_request(&self) -> Result<PlotGenerationRequest, PlotweaveError> {
        let structure = self
            .structure
            .as_deref()
            .map(str::parse::<NarrativeStructure>)
            .transpose()?;
        let request = PlotGenerationRequest {
            premise: self.premise.clone(),
            genre: self.genre.clone(),
            target_length: self.target_length,
            structure,
            characters: self.characters.clone(),
            themes: self.themes.clone(),
            tone: self.tone.clone(),
            plot_points: self.plot_points.clone(),
        };
        request.validate()?;
        Ok(request)
    }

    /// Project context, or `None` when nothing was supplied.
    pub fn to_context(&self) -> Option<ProjectContext> {
        let context = ProjectContext {
            existing_characters: self
                .existing_characters
                .iter()
                .cloned()
                .map(Character::from)
                .collect(),
            world_building: self.world_building.clone(),
            chapters: self
                .existing_chapters
                .iter()
                .cloned()
                .map(Chapter::from)
                .collect(),
            metadata: self.metadata.clone(),
        };
        (!context.is_empty()).then_some(context)
    }
}

/// Input for the manuscript analysis tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ManuscriptInput {
    pub project_id: String,
    /// Chapters in reading order
    pub chapters: Vec<ChapterInput>,
    #[serde(default)]
    pub characters: Vec<CharacterInput>,
}

impl ManuscriptInput {
    pub fn into_parts(self) -> (String, Vec<Chapter>, Vec<Character>) {
        (
            self.project_id,
            self.chapters.into_iter().map(Chapter::from).collect(),
            self.characters.into_iter().map(Character::from).collect(),
        )
    }
}

/// Input for build_character_graph tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CharacterGraphInput {
    #[serde(flatten)]
    pub manuscript: ManuscriptInput,
    /// Also return a Mermaid diagram of the graph
    #[serde(default)]
    pub include_mermaid: bool,
    /// Also rank characters by betweenness centrality
    #[serde(default)]
    pub include_bridges: bool,
}

/// Input for get_project tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProjectInput {
    pub project_id: String,
}

/// Response envelope for every tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ToolResponse {
    pub result: serde_json::Value,
    /// Helpful hints for the user
    #[serde(default)]
    pub hints: Vec<String>,
}
