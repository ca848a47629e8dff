use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// Relationship classification between two characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    Romantic,
    Enemy,
    Mentor,
    Family,
    Friend,
    Rival,
    Neutral,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Romantic => "romantic",
            RelationshipType::Enemy => "enemy",
            RelationshipType::Mentor => "mentor",
            RelationshipType::Family => "family",
            RelationshipType::Friend => "friend",
            RelationshipType::Rival => "rival",
            RelationshipType::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded type transition of a relationship.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelationshipSnapshot {
    pub chapter_id: String,
    /// Zero-based position of the chapter in the analyzed manuscript.
    pub chapter_index: usize,
    pub rel_type: RelationshipType,
    pub strength: u8,
    pub key_event: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterRelationship {
    pub id: String,
    pub project_id: String,
    pub character_a: String,
    pub character_b: String,
    pub rel_type: RelationshipType,
    /// 1-10.
    pub strength: u8,
    #[serde(default = "default_reciprocal")]
    pub is_reciprocal: bool,
    /// Type transitions in chapter order; never two consecutive entries of the same type.
    pub evolution: Vec<RelationshipSnapshot>,
}

fn default_reciprocal() -> bool {
    true
}

impl CharacterRelationship {
    pub fn involves(&self, character_id: &str) -> bool {
        self.character_a == character_id || self.character_b == character_id
    }

    /// The other side of the pair, if `character_id` is part of it.
    pub fn counterpart(&self, character_id: &str) -> Option<&str> {
        if self.character_a == character_id {
            Some(&self.character_b)
        } else if self.character_b == character_id {
            Some(&self.character_a)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterNode {
    pub id: String,
    pub name: String,
    pub role: String,
    /// connection_count plus role bonus, capped at 10.
    pub importance: u8,
    pub connection_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterGraph {
    pub project_id: String,
    pub nodes: Vec<CharacterNode>,
    pub relationships: Vec<CharacterRelationship>,
    pub analyzed_at: DateTime<Utc>,
}

impl CharacterGraph {
    pub fn node(&self, id: &str) -> Option<&CharacterNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn relationship_between(&self, a: &str, b: &str) -> Option<&CharacterRelationship> {
        self.relationships
            .iter()
            .find(|r| r.involves(a) && r.counterpart(a) == Some(b))
    }
}

/// Shape of a relationship's evolution over the manuscript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvolutionPattern {
    Improving,
    Deteriorating,
    Stable,
    Complex,
}

impl EvolutionPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvolutionPattern::Improving => "improving",
            EvolutionPattern::Deteriorating => "deteriorating",
            EvolutionPattern::Stable => "stable",
            EvolutionPattern::Complex => "complex",
        }
    }
}
