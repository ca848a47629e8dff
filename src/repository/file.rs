use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use super::{require_project_id, PlotRepository, ProjectRecord};
use crate::models::{CharacterGraph, PlotHole, PlotStructure, PlotSuggestion};
use crate::PlotweaveError;

/// Subdirectory of the data path holding one JSON file per project.
pub const PROJECTS_DIR: &str = "projects";

/// Repository persisting each project to `{data_path}/projects/{project_id}.json`.
pub struct FilePlotRepository {
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FilePlotRepository {
    pub fn new(data_path: &Path) -> Self {
        Self {
            dir: data_path.join(PROJECTS_DIR),
            write_lock: Mutex::new(()),
        }
    }

    fn project_path(&self, project_id: &str) -> Result<PathBuf, PlotweaveError> {
        require_project_id(project_id)?;
        let safe = project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !project_id.starts_with('.');
        if !safe {
            return Err(PlotweaveError::Validation(format!(
                "project id '{}' may only contain letters, digits, '-', '_' and '.'",
                project_id
            )));
        }
        Ok(self.dir.join(format!("{}.json", project_id)))
    }

    async fn load(&self, project_id: &str) -> Result<Option<ProjectRecord>, PlotweaveError> {
        let path = self.project_path(project_id)?;
        let json = match fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PlotweaveError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let record = serde_json::from_str(&json).map_err(|e| {
            PlotweaveError::Storage(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Ok(Some(record))
    }

    async fn store(&self, record: &ProjectRecord) -> Result<(), PlotweaveError> {
        let path = self.project_path(&record.project_id)?;
        let json = serde_json::to_string_pretty(record).map_err(|e| {
            PlotweaveError::Storage(format!("Failed to serialize project: {}", e))
        })?;

        fs::create_dir_all(&self.dir).await.map_err(|e| {
            PlotweaveError::Storage(format!("Failed to create projects directory: {}", e))
        })?;

        // Write-then-rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(|e| {
            PlotweaveError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &path).await.map_err(|e| {
            PlotweaveError::Storage(format!("Failed to write {}: {}", path.display(), e))
        })?;

        debug!("Saved project {} to {}", record.project_id, path.display());
        Ok(())
    }

    async fn update<F>(&self, project_id: &str, f: F) -> Result<(), PlotweaveError>
    where
        F: FnOnce(&mut ProjectRecord) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .load(project_id)
            .await?
            .unwrap_or_else(|| ProjectRecord::new(project_id));
        f(&mut record);
        record.updated_at = Some(Utc::now());
        self.store(&record).await
    }
}

#[async_trait]
impl PlotRepository for FilePlotRepository {
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
        Ok(self.load(project_id).await?.and_then(|r| r.plot_structure))
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
            .load(project_id)
            .await?
            .map(|r| r.plot_holes)
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
        Ok(self.load(project_id).await?.and_then(|r| r.character_graph))
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
            .load(project_id)
            .await?
            .map(|r| r.suggestions)
            .unwrap_or_default())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>, PlotweaveError> {
        self.load(project_id).await
    }

    async fn list_projects(&self) -> Result<Vec<String>, PlotweaveError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePlotRepository::new(dir.path());
        assert!(repo.project_path("../etc/passwd").is_err());
        assert!(repo.project_path(".hidden").is_err());
        assert!(repo.project_path("novel-1").is_ok());
    }

    #[tokio::test]
    async fn test_unreadable_project_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePlotRepository::new(dir.path());
        assert!(repo.get_project("novel").await.unwrap().is_none());

        // A directory where the project file belongs cannot be read as JSON.
        tokio::fs::create_dir_all(dir.path().join(PROJECTS_DIR).join("novel.json"))
            .await
            .unwrap();
        let err = repo.get_project("novel").await.unwrap_err();
        assert!(matches!(err, PlotweaveError::Storage(_)));
    }

    #[tokio::test]
    async fn test_list_skips_non_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePlotRepository::new(dir.path());
        repo.replace_suggestions("novel", Vec::new()).await.unwrap();
        tokio::fs::write(dir.path().join(PROJECTS_DIR).join("notes.txt"), "x")
            .await
            .unwrap();

        assert_eq!(repo.list_projects().await.unwrap(), vec!["novel"]);
    }

    #[tokio::test]
    async fn test_missing_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FilePlotRepository::new(&dir.path().join("nope"));
        assert!(repo.list_projects().await.unwrap().is_empty());
    }
}
