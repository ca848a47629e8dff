//! Shared initialization logic for MCP and CLI modes.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{load_config, PlotweaveConfig};
use crate::generation::{create_provider, PlotGenerationOrchestrator};
use crate::models::{PlotGenerationRequest, PlotGenerationResult, ProjectContext};
use crate::repository::{FilePlotRepository, PlotRepository};
use crate::services::AnalysisService;
use crate::PlotweaveError;

/// Env var overriding the data directory.
pub const DATA_PATH_ENV: &str = "PLOTWEAVE_DATA_PATH";

/// Application context holding all services and repositories.
///
/// Shared between MCP server and CLI commands.
pub struct AppContext {
    pub data_path: PathBuf,
    pub config: PlotweaveConfig,
    pub orchestrator: Arc<PlotGenerationOrchestrator>,
    pub repository: Arc<dyn PlotRepository>,
    pub analysis_service: Arc<AnalysisService>,
}

impl AppContext {
    /// Initialize application context.
    ///
    /// Data path priority: explicit path > PLOTWEAVE_DATA_PATH env > ./.plotweave (if exists) > ~/.plotweave
    pub async fn new(explicit_path: Option<PathBuf>) -> Result<Self> {
        let data_path = resolve_data_path(explicit_path);
        tracing::info!("Using data path: {}", data_path.display());

        let config = load_config(&data_path);

        let provider = create_provider(&config.provider)?;
        tracing::info!("Generation provider: {}", provider.id());

        let repository: Arc<dyn PlotRepository> = Arc::new(FilePlotRepository::new(&data_path));

        Ok(Self::from_parts(data_path, config, provider, repository))
    }

    /// Assemble a context from already-built parts.
    pub fn from_parts(
        data_path: PathBuf,
        config: PlotweaveConfig,
        provider: Arc<dyn crate::generation::GenerationProvider>,
        repository: Arc<dyn PlotRepository>,
    ) -> Self {
        let orchestrator = Arc::new(PlotGenerationOrchestrator::new(provider, &config));
        let analysis_service = Arc::new(AnalysisService::new(
            repository.clone(),
            &config.analysis,
        ));

        Self {
            data_path,
            config,
            orchestrator,
            repository,
            analysis_service,
        }
    }

    /// Generate a plot and store its structure and suggestions under the project.
    pub async fn generate_and_store(
        &self,
        project_id: &str,
        request: &PlotGenerationRequest,
        context: Option<&ProjectContext>,
    ) -> Result<PlotGenerationResult, PlotweaveError> {
        let result = self
            .orchestrator
            .generate_plot(project_id, request, context)
            .await?;
        self.repository.save_plot_structure(&result.structure).await?;
        self.repository
            .replace_suggestions(project_id, result.suggestions.clone())
            .await?;
        Ok(result)
    }
}

fn resolve_data_path(explicit_path: Option<PathBuf>) -> PathBuf {
    explicit_path
        .or_else(|| std::env::var(DATA_PATH_ENV).ok().map(PathBuf::from))
        .or_else(|| {
            let local_path = Path::new(".plotweave");
            if local_path.exists() && local_path.is_dir() {
                Some(local_path.to_path_buf())
            } else {
                None
            }
        })
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".plotweave"))
                .unwrap_or_else(|| PathBuf::from(".plotweave"))
        })
}
