//! Test data builders for manuscript construction.
//!
//! Provides fluent API for creating chapters and characters with sensible defaults.

use chrono::Utc;
use plotweave::models::{Act, Chapter, Character, Importance, PlotPoint, PlotStructure};

/// Shorthand for an untitled chapter.
pub fn chapter(id: &str, content: &str) -> Chapter {
    Chapter::new(id, content)
}

/// Builder for creating test chapters.
pub struct ChapterBuilder {
    id: String,
    title: Option<String>,
    paragraphs: Vec<String>,
}

impl ChapterBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            paragraphs: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append a paragraph of text.
    pub fn text(mut self, paragraph: impl Into<String>) -> Self {
        self.paragraphs.push(paragraph.into());
        self
    }

    pub fn build(self) -> Chapter {
        Chapter {
            id: self.id,
            title: self.title,
            order: None,
            content: self.paragraphs.join("\n\n"),
        }
    }
}

/// Builder for creating test characters.
pub struct CharacterBuilder {
    id: String,
    name: String,
    role: String,
    traits: Vec<String>,
}

impl CharacterBuilder {
    /// Create a character whose id is the lowercased name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.to_lowercase(),
            name,
            role: "supporting".to_string(),
            traits: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_trait(mut self, trait_name: impl Into<String>) -> Self {
        self.traits.push(trait_name.into());
        self
    }

    pub fn build(self) -> Character {
        let mut character = Character::new(self.id, self.name, self.role);
        character.psychology.personality_traits = self.traits;
        character
    }
}

/// A minimal one-act structure for persistence tests.
pub fn plot_structure(project_id: &str) -> PlotStructure {
    let now = Utc::now();
    let climax = PlotPoint {
        id: "pp-1".to_string(),
        point_type: "climax".to_string(),
        title: "Duel on the bridge".to_string(),
        description: "Kael faces Amara.".to_string(),
        chapter: None,
        characters: vec!["kael".to_string(), "amara".to_string()],
        importance: Importance::Major,
        position: Some(80),
    };
    PlotStructure {
        id: format!("plot-{}", project_id),
        project_id: project_id.to_string(),
        acts: vec![Act {
            id: "act-1".to_string(),
            act_number: 1,
            name: "Everything".to_string(),
            description: None,
            plot_points: vec![climax.clone()],
            chapters: Vec::new(),
            duration: 12,
        }],
        climax: Some(climax),
        resolution: None,
        created_at: now,
        updated_at: now,
    }
}
