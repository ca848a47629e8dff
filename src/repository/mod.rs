//! Persistence for generated and analyzed project artifacts.
//!
//! One record per project id. Plot holes and suggestions are replaced
//! wholesale on every save; a project holds at most one plot structure and
//! one character graph.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{CharacterGraph, PlotHole, PlotStructure, PlotSuggestion};
use crate::PlotweaveError;

pub use file::FilePlotRepository;
pub use memory::InMemoryPlotRepository;

/// Everything stored for one project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: String,
    #[serde(default)]
    pub plot_structure: Option<PlotStructure>,
    #[serde(default)]
    pub plot_holes: Vec<PlotHole>,
    #[serde(default)]
    pub character_graph: Option<CharacterGraph>,
    #[serde(default)]
    pub suggestions: Vec<PlotSuggestion>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ProjectRecord {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            ..Default::default()
        }
    }
}

/// Repository trait for project artifacts.
#[async_trait]
pub trait PlotRepository: Send + Sync {
    async fn save_plot_structure(&self, structure: &PlotStructure) -> Result<(), PlotweaveError>;
    async fn get_plot_structure(
        &self,
        project_id: &str,
    ) -> Result<Option<PlotStructure>, PlotweaveError>;

    async fn replace_plot_holes(
        &self,
        project_id: &str,
        holes: Vec<PlotHole>,
    ) -> Result<(), PlotweaveError>;
    async fn get_plot_holes(&self, project_id: &str) -> Result<Vec<PlotHole>, PlotweaveError>;

    async fn save_character_graph(&self, graph: &CharacterGraph) -> Result<(), PlotweaveError>;
    async fn get_character_graph(
        &self,
        project_id: &str,
    ) -> Result<Option<CharacterGraph>, PlotweaveError>;

    async fn replace_suggestions(
        &self,
        project_id: &str,
        suggestions: Vec<PlotSuggestion>,
    ) -> Result<(), PlotweaveError>;
    async fn get_suggestions(&self, project_id: &str)
        -> Result<Vec<PlotSuggestion>, PlotweaveError>;

    /// Full record, or `None` if nothing was ever stored for the project.
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PlotweaveError>;

    /// Ids of all stored projects, sorted.
    async fn list_projects(&self) -> Result<Vec<String>, PlotweaveError>;
}

pub(crate) fn require_project_id(project_id: &str) -> Result<(), PlotweaveError> {
    if project_id.trim().is_empty() {
        return Err(PlotweaveError::Validation("project id is required".into()));
    }
    Ok(())
}
