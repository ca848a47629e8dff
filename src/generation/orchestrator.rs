//! Plot generation: compose, call, parse, degrade.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{ModelCatalog, PlotweaveConfig};
use crate::generation::complexity::{select_model, TaskKind};
use crate::generation::parse::{parse_acts, parse_suggestions};
use crate::generation::prompts::{
    alternatives_prompt, structure_prompt, suggestions_prompt, system_prompt,
};
use crate::generation::provider::{GenerationProvider, ProviderRequest};
use crate::generation::retry::{CancelSignal, RetryExecutor, RetryPolicy};
use crate::generation::template::{apply_durations, template_structure};
use crate::models::{
    Act, GenerationSource, PlotGenerationRequest, PlotGenerationResult, PlotStructure,
    PlotSuggestion, ProjectContext,
};
use crate::PlotweaveError;

const PROVIDER_CONFIDENCE: f32 = 0.85;
const EMPTY_SECTION_PENALTY: f32 = 0.05;
const PROVIDER_CONFIDENCE_FLOOR: f32 = 0.7;
const TEMPLATE_CONFIDENCE: f32 = 0.4;

/// Drives the three provider calls for one plot and assembles the result.
///
/// Holds no per-call state; one instance can serve concurrent generations.
pub struct PlotGenerationOrchestrator {
    provider: Arc<dyn GenerationProvider>,
    executor: RetryExecutor,
    models: ModelCatalog,
    temperature: f32,
}

impl PlotGenerationOrchestrator {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: &PlotweaveConfig) -> Self {
        Self::with_parts(
            provider,
            config.models.clone(),
            config.retry.clone(),
            config.generation.temperature,
        )
    }

    pub fn with_parts(
        provider: Arc<dyn GenerationProvider>,
        models: ModelCatalog,
        retry: RetryPolicy,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            executor: RetryExecutor::new(retry),
            models,
            temperature,
        }
    }

    /// Generate a plot for `project_id`.
    ///
    /// Provider failures never surface here: the structure degrades to the
    /// template and suggestions/alternatives to empty lists. Only an invalid
    /// request is an error.
    pub async fn generate_plot(
        &self,
        project_id: &str,
        request: &PlotGenerationRequest,
        context: Option<&ProjectContext>,
    ) -> Result<PlotGenerationResult, PlotweaveError> {
        self.generate(project_id, request, context, None).await
    }

    /// Like [`generate_plot`](Self::generate_plot), aborting with
    /// [`PlotweaveError::Cancelled`] once `cancel` fires.
    pub async fn generate_plot_cancellable(
        &self,
        project_id: &str,
        request: &PlotGenerationRequest,
        context: Option<&ProjectContext>,
        cancel: &CancelSignal,
    ) -> Result<PlotGenerationResult, PlotweaveError> {
        self.generate(project_id, request, context, Some(cancel))
            .await
    }

    async fn generate(
        &self,
        project_id: &str,
        request: &PlotGenerationRequest,
        context: Option<&ProjectContext>,
        cancel: Option<&CancelSignal>,
    ) -> Result<PlotGenerationResult, PlotweaveError> {
        request.validate()?;
        if project_id.trim().is_empty() {
            return Err(PlotweaveError::Validation("project id is required".into()));
        }
        let target = request.target_length_or_default();

        info!(
            "Generating plot for project {} ({}, {} chapters)",
            project_id, request.genre, target
        );

        let prompt = structure_prompt(request, context);
        let structure_acts = match self
            .call(request, TaskKind::Structure, prompt, cancel)
            .await
            .and_then(|text| parse_acts(&text))
        {
            Ok(acts) if !acts.is_empty() => acts,
            Ok(_) => {
                warn!("Provider returned no acts; using template plot");
                return Ok(template_result(project_id, request));
            }
            Err(PlotweaveError::Cancelled) => return Err(PlotweaveError::Cancelled),
            Err(e) => {
                warn!("Structure generation failed: {}; using template plot", e);
                return Ok(template_result(project_id, request));
            }
        };
        let structure = assemble_structure(project_id, structure_acts, target);

        let prompt = suggestions_prompt(request, context);
        let suggestions: Vec<PlotSuggestion> = match self
            .call(request, TaskKind::Suggestions, prompt, cancel)
            .await
            .and_then(|text| parse_suggestions(&text))
        {
            Ok(suggestions) => suggestions,
            Err(PlotweaveError::Cancelled) => return Err(PlotweaveError::Cancelled),
            Err(e) => {
                warn!("Suggestion generation failed: {}", e);
                Vec::new()
            }
        };

        let prompt = alternatives_prompt(request, context);
        let alternatives: Vec<Act> = match self
            .call(request, TaskKind::Alternatives, prompt, cancel)
            .await
            .and_then(|text| parse_acts(&text))
        {
            Ok(acts) => acts,
            Err(PlotweaveError::Cancelled) => return Err(PlotweaveError::Cancelled),
            Err(e) => {
                warn!("Alternative generation failed: {}", e);
                Vec::new()
            }
        };

        let empty_sections = [suggestions.is_empty(), alternatives.is_empty()]
            .iter()
            .filter(|empty| **empty)
            .count();
        let confidence = (PROVIDER_CONFIDENCE - EMPTY_SECTION_PENALTY * empty_sections as f32)
            .max(PROVIDER_CONFIDENCE_FLOOR);

        info!(
            "Generated {} acts, {} suggestions, {} alternatives for project {}",
            structure.acts.len(),
            suggestions.len(),
            alternatives.len(),
            project_id
        );

        Ok(PlotGenerationResult {
            structure,
            suggestions,
            alternatives,
            confidence,
            source: GenerationSource::Provider,
            generated_at: Utc::now(),
        })
    }

    /// One provider call through the retry executor, returning the raw text.
    async fn call(
        &self,
        request: &PlotGenerationRequest,
        task: TaskKind,
        prompt: String,
        cancel: Option<&CancelSignal>,
    ) -> Result<String, PlotweaveError> {
        let (tier, model) = select_model(&self.models, request, task);
        info!("Requesting {} from {} ({} tier)", task.as_str(), model, tier.as_str());

        let provider_request = ProviderRequest {
            provider_id: self.provider.id().to_string(),
            model: model.to_string(),
            prompt,
            system: Some(system_prompt().to_string()),
            temperature: Some(self.temperature),
        };

        let op = || {
            let provider = Arc::clone(&self.provider);
            let req = provider_request.clone();
            async move {
                let envelope = provider.generate(req).await.map_err(|e| match e {
                    // A failed call (as opposed to a failure envelope) counts as transient.
                    PlotweaveError::Provider { message, .. } => PlotweaveError::transient(message),
                    other => other,
                })?;
                envelope.into_text()
            }
        };

        match cancel {
            Some(signal) => self.executor.run_cancellable(op, signal).await,
            None => self.executor.run(op).await,
        }
    }
}

fn assemble_structure(project_id: &str, mut acts: Vec<Act>, target: u32) -> PlotStructure {
    apply_durations(&mut acts, target);

    let all_points = || acts.iter().flat_map(|a| a.plot_points.iter());
    let climax = all_points().find(|p| p.is_type("climax")).cloned();
    let resolution = all_points().find(|p| p.is_type("resolution")).cloned();

    let now = Utc::now();
    PlotStructure {
        id: Uuid::new_v4().to_string(),
        project_id: project_id.to_string(),
        acts,
        climax,
        resolution,
        created_at: now,
        updated_at: now,
    }
}

fn template_result(project_id: &str, request: &PlotGenerationRequest) -> PlotGenerationResult {
    PlotGenerationResult {
        structure: template_structure(project_id, request),
        suggestions: Vec::new(),
        alternatives: Vec::new(),
        confidence: TEMPLATE_CONFIDENCE,
        source: GenerationSource::Template,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::provider::OfflineProvider;

    #[tokio::test]
    async fn test_offline_provider_yields_template() {
        let orchestrator =
            PlotGenerationOrchestrator::new(Arc::new(OfflineProvider), &PlotweaveConfig::default());
        let request = PlotGenerationRequest::new("X", "fantasy");
        let result = orchestrator.generate_plot("p1", &request, None).await.unwrap();

        assert_eq!(result.source, GenerationSource::Template);
        assert_eq!(result.structure.acts.len(), 3);
        assert!(result.suggestions.is_empty());
        assert!(result.alternatives.is_empty());
        assert!((result.confidence - 0.4).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_invalid_request_is_error() {
        let orchestrator =
            PlotGenerationOrchestrator::new(Arc::new(OfflineProvider), &PlotweaveConfig::default());
        let request = PlotGenerationRequest::new("", "fantasy");
        let err = orchestrator
            .generate_plot("p1", &request, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PlotweaveError::Validation(_)));
    }

    #[test]
    fn test_assemble_structure_picks_first_climax() {
        let text = r#"{"acts": [
            {"actNumber": 1, "plotPoints": [{"type": "climax", "title": "Early"}]},
            {"actNumber": 2, "plotPoints": [{"type": "climax", "title": "Late"},
                                            {"type": "resolution", "title": "End"}]}
        ]}"#;
        let acts = parse_acts(text).unwrap();
        let structure = assemble_structure("p1", acts, 11);
        assert_eq!(structure.climax.clone().map(|c| c.title), Some("Early".to_string()));
        assert_eq!(structure.resolution.clone().map(|r| r.title), Some("End".to_string()));
        assert_eq!(structure.total_duration(), 11);
    }
}
