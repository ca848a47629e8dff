use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::PlotweaveError;

/// Chapter count used when a request does not specify one.
pub const DEFAULT_TARGET_LENGTH: u32 = 20;

/// Narrative structure hint for plot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeStructure {
    #[serde(alias = "three-act")]
    ThreeAct,
    #[serde(alias = "five-act")]
    FiveAct,
    #[serde(alias = "heros-journey", alias = "hero's-journey")]
    HerosJourney,
    Kishotenketsu,
    Custom,
}

impl NarrativeStructure {
    pub fn label(&self) -> &'static str {
        match self {
            NarrativeStructure::ThreeAct => "three-act structure",
            NarrativeStructure::FiveAct => "five-act structure",
            NarrativeStructure::HerosJourney => "the hero's journey",
            NarrativeStructure::Kishotenketsu => "kishōtenketsu",
            NarrativeStructure::Custom => "a custom structure",
        }
    }
}

impl std::str::FromStr for NarrativeStructure {
    type Err = PlotweaveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', ' ', '\''], "-").as_str() {
            "three-act" | "3-act" => Ok(NarrativeStructure::ThreeAct),
            "five-act" | "5-act" => Ok(NarrativeStructure::FiveAct),
            "heros-journey" | "hero-s-journey" | "hero-journey" => {
                Ok(NarrativeStructure::HerosJourney)
            }
            "kishotenketsu" | "kishōtenketsu" => Ok(NarrativeStructure::Kishotenketsu),
            "custom" => Ok(NarrativeStructure::Custom),
            other => Err(PlotweaveError::Validation(format!(
                "Invalid narrative structure '{}'. Valid: three-act, five-act, heros-journey, kishotenketsu, custom",
                other
            ))),
        }
    }
}

/// Input for plot generation. Immutable once built.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotGenerationRequest {
    pub premise: String,
    pub genre: String,
    #[serde(default, alias = "targetLength")]
    pub target_length: Option<u32>,
    #[serde(default)]
    pub structure: Option<NarrativeStructure>,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub tone: Option<String>,
    /// Existing plot-point hints the outline should honor.
    #[serde(default, alias = "plotPoints")]
    pub plot_points: Vec<String>,
}

impl PlotGenerationRequest {
    pub fn new(premise: impl Into<String>, genre: impl Into<String>) -> Self {
        Self {
            premise: premise.into(),
            genre: genre.into(),
            ..Default::default()
        }
    }

    /// Requested chapter count, or the default of 20.
    pub fn target_length_or_default(&self) -> u32 {
        self.target_length
            .filter(|len| *len > 0)
            .unwrap_or(DEFAULT_TARGET_LENGTH)
    }

    /// Reject requests missing required fields.
    pub fn validate(&self) -> Result<(), PlotweaveError> {
        if self.premise.trim().is_empty() {
            return Err(PlotweaveError::Validation("premise is required".into()));
        }
        if self.genre.trim().is_empty() {
            return Err(PlotweaveError::Validation("genre is required".into()));
        }
        Ok(())
    }
}

/// Major beats drive the outline; minor beats texture it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    #[default]
    Major,
    Minor,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlotPoint {
    pub id: String,
    /// Open-ended beat type: inciting_incident, rising_action, midpoint, climax, ...
    pub point_type: String,
    pub title: String,
    pub description: String,
    pub chapter: Option<String>,
    #[serde(default)]
    pub characters: Vec<String>,
    pub importance: Importance,
    /// Narrative position as a percentage (0-100).
    pub position: Option<u8>,
}

impl PlotPoint {
    pub fn is_type(&self, point_type: &str) -> bool {
        normalize_point_type(&self.point_type) == normalize_point_type(point_type)
    }
}

/// Normalize beat type spelling so "Inciting-Incident" and "inciting_incident" compare equal.
pub fn normalize_point_type(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Act {
    pub id: String,
    pub act_number: u32,
    pub name: String,
    pub description: Option<String>,
    pub plot_points: Vec<PlotPoint>,
    #[serde(default)]
    pub chapters: Vec<String>,
    /// Number of chapters this act spans.
    pub duration: u32,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotStructure {
    pub id: String,
    pub project_id: String,
    pub acts: Vec<Act>,
    pub climax: Option<PlotPoint>,
    pub resolution: Option<PlotPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PlotStructure {
    pub fn total_duration(&self) -> u32 {
        self.acts.iter().map(|a| a.duration).sum()
    }

    pub fn plot_point_count(&self) -> usize {
        self.acts.iter().map(|a| a.plot_points.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    #[serde(alias = "plot-twist")]
    PlotTwist,
    #[serde(alias = "character-arc")]
    CharacterArc,
    Subplot,
    #[serde(alias = "conflict-escalation")]
    ConflictEscalation,
    #[serde(alias = "resolution-path")]
    ResolutionPath,
    #[serde(alias = "theme-development")]
    ThemeDevelopment,
}

impl SuggestionType {
    pub fn parse_loose(raw: &str) -> Option<Self> {
        match normalize_point_type(raw).as_str() {
            "plot_twist" | "twist" => Some(SuggestionType::PlotTwist),
            "character_arc" | "character_development" => Some(SuggestionType::CharacterArc),
            "subplot" | "sub_plot" => Some(SuggestionType::Subplot),
            "conflict_escalation" | "conflict" => Some(SuggestionType::ConflictEscalation),
            "resolution_path" | "resolution" => Some(SuggestionType::ResolutionPath),
            "theme_development" | "theme" => Some(SuggestionType::ThemeDevelopment),
            _ => None,
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotSuggestion {
    pub id: String,
    pub suggestion_type: SuggestionType,
    pub title: String,
    pub description: String,
    /// Expected narrative impact, e.g. "high" or a short phrase.
    pub impact: Option<String>,
}

/// Where a generation result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    Provider,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotGenerationResult {
    pub structure: PlotStructure,
    pub suggestions: Vec<PlotSuggestion>,
    /// Alternative openings, in the same act shape as the structure.
    pub alternatives: Vec<Act>,
    pub confidence: f32,
    pub source: GenerationSource,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_from_str_variants() {
        assert_eq!(
            "three-act".parse::<NarrativeStructure>().unwrap(),
            NarrativeStructure::ThreeAct
        );
        assert_eq!(
            "Hero's Journey".parse::<NarrativeStructure>().unwrap(),
            NarrativeStructure::HerosJourney
        );
        assert_eq!(
            "kishotenketsu".parse::<NarrativeStructure>().unwrap(),
            NarrativeStructure::Kishotenketsu
        );
        assert!("seven-act".parse::<NarrativeStructure>().is_err());
    }

    #[test]
    fn test_target_length_default() {
        let mut req = PlotGenerationRequest::new("X", "fantasy");
        assert_eq!(req.target_length_or_default(), 20);
        req.target_length = Some(0);
        assert_eq!(req.target_length_or_default(), 20);
        req.target_length = Some(42);
        assert_eq!(req.target_length_or_default(), 42);
    }

    #[test]
    fn test_validate_requires_premise_and_genre() {
        assert!(PlotGenerationRequest::new("  ", "fantasy").validate().is_err());
        assert!(PlotGenerationRequest::new("X", "").validate().is_err());
        assert!(PlotGenerationRequest::new("X", "fantasy").validate().is_ok());
    }

    #[test]
    fn test_request_accepts_camel_case_aliases() {
        let req: PlotGenerationRequest = serde_json::from_str(
            r#"{"premise":"X","genre":"fantasy","targetLength":12,"structure":"five-act"}"#,
        )
        .unwrap();
        assert_eq!(req.target_length, Some(12));
        assert_eq!(req.structure, Some(NarrativeStructure::FiveAct));
    }

    #[test]
    fn test_suggestion_type_parse_loose() {
        assert_eq!(
            SuggestionType::parse_loose("plot-twist"),
            Some(SuggestionType::PlotTwist)
        );
        assert_eq!(
            SuggestionType::parse_loose("Theme Development"),
            Some(SuggestionType::ThemeDevelopment)
        );
        assert_eq!(SuggestionType::parse_loose("cameo"), None);
    }
}
