use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{require_project_id, PlotRepository, ProjectRecord};
use crate::models::{CharacterGraph, PlotHole, PlotStructure, PlotSuggestion};
use crate::PlotweaveError;

/// Process-local repository. Owned by the caller; nothing is shared globally.
#[derive(Debug, Default)]
pub struct InMemoryPlotRepository {
    projects: RwLock<HashMap<String, ProjectRecord>>,
}

impl InMemoryPlotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, project_id: &str, f: F) -> Result<(), PlotweaveError>
    where
        F: FnOnce(&mut ProjectRecord) + Send,
    {
        require_project_id(project_id)?;
        let mut projects = self.projects.write().await;
        let record = projects
            .entry(project_id.to_string())
            .or_insert_with(|| ProjectRecord::new(project_id));
        f(record);
        record.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn read<T, F>(&self, project_id: &str, f: F) -> Option<T>
    where
        F: FnOnce(&ProjectRecord) -> T + Send,
    {
        let projects = self.projects.read().await;
        projects.get(project_id).map(f)
    }
}

#[async_trait]
impl PlotRepository for InMemoryPlotRepository {
    async fn save_plot_structure(&self, structure: &PlotStructure) -> Result<(), PlotweaveError> {
        let project_id = structure.project_id.clone();
        let structure = structure.clone();
        self.update(&project_id, move |r| r.plot_structure = Some(structure))
            .await
    }

    async fn get_plot_structure(
        &self,
        project_id: &str,
    ) -> Result<Option<PlotStructure>, PlotweaveError> {
        Ok(self
            .read(project_id, |r| r.plot_structure.clone())
            .await
            .flatten())
    }

    async fn replace_plot_holes(
        &self,
        project_id: &str,
        holes: Vec<PlotHole>,
    ) -> Result<(), PlotweaveError> {
        self.update(project_id, move |r| r.plot_holes = holes).await
    }

    async fn get_plot_holes(&self, project_id: &str) -> Result<Vec<PlotHole>, PlotweaveError> {
        Ok(self
            .read(project_id, |r| r.plot_holes.clone())
            .await
            .unwrap_or_default())
    }

    async fn save_character_graph(&self, graph: &CharacterGraph) -> Result<(), PlotweaveError> {
        let project_id = graph.project_id.clone();
        let graph = graph.clone();
        self.update(&project_id, move |r| r.character_graph = Some(graph))
            .await
    }

    async fn get_character_graph(
        &self,
        project_id: &str,
    ) -> Result<Option<CharacterGraph>, PlotweaveError> {
        Ok(self
            .read(project_id, |r| r.character_graph.clone())
            .await
            .flatten())
    }

    async fn replace_suggestions(
        &self,
        project_id: &str,
        suggestions: Vec<PlotSuggestion>,
    ) -> Result<(), PlotweaveError> {
        self.update(project_id, move |r| r.suggestions = suggestions)
            .await
    }

    async fn get_suggestions(
        &self,
        project_id: &str,
    ) -> Result<Vec<PlotSuggestion>, PlotweaveError> {
        Ok(self
            .read(project_id, |r| r.suggestions.clone())
            .await
            .unwrap_or_default())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PlotweaveError> {
        Ok(self.read(project_id, |r| r.clone()).await)
    }

    async fn list_projects(&self) -> Result<Vec<String>, PlotweaveError> {
        let mut ids: Vec<String> = self.projects.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_project_reads_empty() {
        let repo = InMemoryPlotRepository::new();
        assert!(repo.get_plot_structure("p").await.unwrap().is_none());
        assert!(repo.get_plot_holes("p").await.unwrap().is_empty());
        assert!(repo.get_project("p").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_project_id_rejected() {
        let repo = InMemoryPlotRepository::new();
        let err = repo.replace_plot_holes(" ", vec![]).await.unwrap_err();
        assert!(matches!(err, PlotweaveError::Validation(_)));
    }
}
