//! Manuscript analysis with caching and persistence.
//!
//! Runs the plot-hole detector and the character graph builder over the same
//! input. Results are cached per (project, analysis type) and revalidated
//! against a hash of the input, so an edited manuscript is never served a
//! stale analysis.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnalysisSettings;
use crate::models::{Chapter, Character, CharacterGraph, PlotHoleAnalysis};
use crate::repository::PlotRepository;
use crate::services::character_graph::CharacterGraphBuilder;
use crate::services::plot_holes::PlotHoleDetector;
use crate::PlotweaveError;

/// Which analysis a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisType {
    PlotHoles,
    CharacterGraph,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 2] = [AnalysisType::PlotHoles, AnalysisType::CharacterGraph];
}

#[derive(Debug, Clone)]
enum AnalysisOutput {
    PlotHoles(PlotHoleAnalysis),
    CharacterGraph(CharacterGraph),
}

#[derive(Debug, Clone)]
struct CachedAnalysis {
    version: String,
    output: AnalysisOutput,
}

/// Combined result of a full project analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalysis {
    pub plot_holes: PlotHoleAnalysis,
    pub character_graph: CharacterGraph,
}

pub struct AnalysisService {
    detector: PlotHoleDetector,
    builder: CharacterGraphBuilder,
    repository: Arc<dyn PlotRepository>,
    cache: Cache<(String, AnalysisType), CachedAnalysis>,
}

impl AnalysisService {
    pub fn new(repository: Arc<dyn PlotRepository>, settings: &AnalysisSettings) -> Self {
        let cache = Cache::builder()
            .max_capacity(settings.cache_capacity)
            .time_to_live(Duration::from_secs(settings.cache_ttl_secs))
            .build();

        Self {
            detector: PlotHoleDetector::new(),
            builder: CharacterGraphBuilder::new(),
            repository,
            cache,
        }
    }

    pub fn with_defaults(repository: Arc<dyn PlotRepository>) -> Self {
        Self::new(repository, &AnalysisSettings::default())
    }

    pub fn repository(&self) -> &Arc<dyn PlotRepository> {
        &self.repository
    }

    /// Compute a version hash from the manuscript for cache validation.
    fn compute_version(chapters: &[Chapter], characters: &[Character]) -> String {
        let mut hasher = DefaultHasher::new();
        for chapter in chapters {
            chapter.id.hash(&mut hasher);
            chapter.title.hash(&mut hasher);
            chapter.content.hash(&mut hasher);
        }
        for character in characters {
            character.id.hash(&mut hasher);
            character.name.hash(&mut hasher);
            character.role.hash(&mut hasher);
            character.psychology.personality_traits.hash(&mut hasher);
        }
        format!("{:x}", hasher.finish())
    }

    async fn cached(
        &self,
        project_id: &str,
        analysis: AnalysisType,
        version: &str,
    ) -> Option<AnalysisOutput> {
        let entry = self
            .cache
            .get(&(project_id.to_string(), analysis))
            .await?;
        if entry.version == version {
            debug!("Cache hit for {:?} on {}", analysis, project_id);
            Some(entry.output)
        } else {
            debug!("Stale cache entry for {:?} on {}", analysis, project_id);
            None
        }
    }

    async fn remember(
        &self,
        project_id: &str,
        analysis: AnalysisType,
        version: String,
        output: AnalysisOutput,
    ) {
        self.cache
            .insert(
                (project_id.to_string(), analysis),
                CachedAnalysis { version, output },
            )
            .await;
    }

    /// Detect plot holes, replacing the project's stored holes.
    pub async fn detect_plot_holes(
        &self,
        project_id: &str,
        chapters: &[Chapter],
        characters: &[Character],
    ) -> Result<PlotHoleAnalysis, PlotweaveError> {
        let version = Self::compute_version(chapters, characters);
        if let Some(AnalysisOutput::PlotHoles(analysis)) = self
            .cached(project_id, AnalysisType::PlotHoles, &version)
            .await
        {
            return Ok(analysis);
        }

        let analysis = self
            .detector
            .detect_plot_holes(project_id, chapters, characters)?;
        self.repository
            .replace_plot_holes(project_id, analysis.holes.clone())
            .await?;
        info!(
            "Detected {} plot holes in {} (score {})",
            analysis.holes.len(),
            project_id,
            analysis.overall_score
        );

        self.remember(
            project_id,
            AnalysisType::PlotHoles,
            version,
            AnalysisOutput::PlotHoles(analysis.clone()),
        )
        .await;
        Ok(analysis)
    }

    /// Build the character graph, replacing the project's stored graph.
    pub async fn build_character_graph(
        &self,
        project_id: &str,
        chapters: &[Chapter],
        characters: &[Character],
    ) -> Result<CharacterGraph, PlotweaveError> {
        let version = Self::compute_version(chapters, characters);
        if let Some(AnalysisOutput::CharacterGraph(graph)) = self
            .cached(project_id, AnalysisType::CharacterGraph, &version)
            .await
        {
            return Ok(graph);
        }

        let graph = self
            .builder
            .build_character_graph(project_id, chapters, characters)?;
        self.repository.save_character_graph(&graph).await?;

        self.remember(
            project_id,
            AnalysisType::CharacterGraph,
            version,
            AnalysisOutput::CharacterGraph(graph.clone()),
        )
        .await;
        Ok(graph)
    }

    /// Run both analyses over the same manuscript.
    pub async fn analyze_project(
        &self,
        project_id: &str,
        chapters: &[Chapter],
        characters: &[Character],
    ) -> Result<ProjectAnalysis, PlotweaveError> {
        let plot_holes = self
            .detect_plot_holes(project_id, chapters, characters)
            .await?;
        let character_graph = self
            .build_character_graph(project_id, chapters, characters)
            .await?;
        Ok(ProjectAnalysis {
            plot_holes,
            character_graph,
        })
    }

    /// Drop every cached analysis for a project.
    pub async fn invalidate(&self, project_id: &str) {
        for analysis in AnalysisType::ALL {
            self.cache
                .invalidate(&(project_id.to_string(), analysis))
                .await;
        }
    }
}
