//! Request complexity scoring and model tier selection.

use serde::{Deserialize, Serialize};

use crate::config::ModelCatalog;
use crate::models::{NarrativeStructure, PlotGenerationRequest};

/// Model resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Fast,
    Standard,
    Advanced,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Standard => "standard",
            ModelTier::Advanced => "advanced",
        }
    }
}

/// Which of the three generation calls is being made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Structure,
    Suggestions,
    Alternatives,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Structure => "structure",
            TaskKind::Suggestions => "suggestions",
            TaskKind::Alternatives => "alternatives",
        }
    }
}

/// Raw complexity score of a structure request. Thresholds are cumulative.
pub fn structure_score(request: &PlotGenerationRequest) -> u32 {
    let mut score = 0;

    match request.structure {
        Some(NarrativeStructure::HerosJourney) | Some(NarrativeStructure::Custom) => score += 3,
        Some(NarrativeStructure::FiveAct) | Some(NarrativeStructure::Kishotenketsu) => score += 1,
        Some(NarrativeStructure::ThreeAct) | None => {}
    }

    let target = request.target_length_or_default();
    if target >= 40 {
        score += 2;
    } else if target >= 30 {
        score += 1;
    }

    let characters = request.characters.len();
    if characters >= 3 {
        score += 1;
    }
    if characters >= 5 {
        score += 2;
    }

    if request.plot_points.len() >= 5 {
        score += 1;
    }
    if request.themes.len() >= 2 {
        score += 1;
    }

    score
}

fn tier_for_score(score: u32) -> ModelTier {
    match score {
        s if s >= 3 => ModelTier::Advanced,
        s if s >= 1 => ModelTier::Standard,
        _ => ModelTier::Fast,
    }
}

/// Pick the model tier for one generation call.
pub fn classify(request: &PlotGenerationRequest, task: TaskKind) -> ModelTier {
    match task {
        TaskKind::Suggestions => ModelTier::Fast,
        TaskKind::Structure => tier_for_score(structure_score(request)),
        TaskKind::Alternatives => tier_for_score(structure_score(request)).max(ModelTier::Standard),
    }
}

/// Resolve the model id for a call through the configured catalog.
pub fn select_model<'a>(
    catalog: &'a ModelCatalog,
    request: &PlotGenerationRequest,
    task: TaskKind,
) -> (ModelTier, &'a str) {
    let tier = classify(request, task);
    (tier, catalog.model_for(tier))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlotGenerationRequest {
        PlotGenerationRequest::new("X", "fantasy")
    }

    #[test]
    fn test_bare_request_is_fast() {
        assert_eq!(structure_score(&request()), 0);
        assert_eq!(classify(&request(), TaskKind::Structure), ModelTier::Fast);
    }

    #[test]
    fn test_heros_journey_is_advanced() {
        let mut req = request();
        req.structure = Some(NarrativeStructure::HerosJourney);
        assert_eq!(classify(&req, TaskKind::Structure), ModelTier::Advanced);
    }

    #[test]
    fn test_character_thresholds_are_cumulative() {
        let mut req = request();
        req.characters = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(structure_score(&req), 1);
        req.characters.extend(["d".to_string(), "e".to_string()]);
        assert_eq!(structure_score(&req), 3);
        assert_eq!(classify(&req, TaskKind::Structure), ModelTier::Advanced);
    }

    #[test]
    fn test_length_thresholds() {
        let mut req = request();
        req.target_length = Some(30);
        assert_eq!(structure_score(&req), 1);
        req.target_length = Some(40);
        assert_eq!(structure_score(&req), 2);
        assert_eq!(classify(&req, TaskKind::Structure), ModelTier::Standard);
    }

    #[test]
    fn test_suggestions_always_fast() {
        let mut req = request();
        req.structure = Some(NarrativeStructure::Custom);
        assert_eq!(classify(&req, TaskKind::Suggestions), ModelTier::Fast);
    }

    #[test]
    fn test_alternatives_at_least_standard() {
        assert_eq!(classify(&request(), TaskKind::Alternatives), ModelTier::Standard);
        let mut req = request();
        req.structure = Some(NarrativeStructure::HerosJourney);
        assert_eq!(classify(&req, TaskKind::Alternatives), ModelTier::Advanced);
    }

    #[test]
    fn test_select_model_uses_catalog() {
        let catalog = ModelCatalog {
            fast: "small".into(),
            standard: "medium".into(),
            advanced: "large".into(),
        };
        let (tier, model) = select_model(&catalog, &request(), TaskKind::Alternatives);
        assert_eq!(tier, ModelTier::Standard);
        assert_eq!(model, "medium");
    }
}
