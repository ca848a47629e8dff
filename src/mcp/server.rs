use rmcp::{
    handler::server::tool::ToolRouter,
    handler::server::wrapper::{Json, Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router, RoleServer, ServerHandler, ServiceExt,
};
use std::sync::Arc;
use tracing::instrument;

use crate::generation::{CancelSignal, PlotGenerationOrchestrator};
use crate::mcp::error::ToolError;
use crate::mcp::{
    CharacterGraphInput, GeneratePlotInput, ManuscriptInput, ProjectInput, ToolResponse,
    MAX_LIMIT,
};
use crate::models::{GenerationSource, PlotHoleAnalysis, Severity};
use crate::repository::PlotRepository;
use crate::services::{bridge_characters, to_mermaid, AnalysisService, MermaidOptions};
use crate::PlotweaveError;

/// MCP server exposing plot generation and manuscript analysis.
#[derive(Clone)]
pub struct PlotweaveServer {
    pub(crate) orchestrator: Arc<PlotGenerationOrchestrator>,
    pub(crate) analysis_service: Arc<AnalysisService>,
    pub(crate) repository: Arc<dyn PlotRepository>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl PlotweaveServer {
    pub fn new(
        orchestrator: Arc<PlotGenerationOrchestrator>,
        analysis_service: Arc<AnalysisService>,
        repository: Arc<dyn PlotRepository>,
    ) -> Self {
        Self {
            orchestrator,
            analysis_service,
            repository,
            tool_router: Self::tool_router(),
        }
    }

    pub fn from_context(ctx: &crate::init::AppContext) -> Self {
        Self::new(
            ctx.orchestrator.clone(),
            ctx.analysis_service.clone(),
            ctx.repository.clone(),
        )
    }

    // ==========================================================================
    // MCP TOOLS - All #[tool] methods must be in this impl block
    // ==========================================================================

    #[tool(
        description = "Generate a plot outline (acts with beats, climax, resolution) plus plot suggestions and alternative openings from a premise and genre. Stores the result under project_id."
    )]
    #[instrument(name = "mcp.generate_plot", skip_all)]
    pub async fn generate_plot(
        &self,
        request: Parameters<GeneratePlotInput>,
        context: RequestContext<RoleServer>,
    ) -> Result<Json<ToolResponse>, ToolError> {
        let Parameters(input) = request;

        let (handle, cancel) = CancelSignal::new();
        let ct = context.ct.clone();
        let watcher = tokio::spawn(async move {
            ct.cancelled().await;
            handle.cancel();
        });

        let result = self.handle_generate_plot(&input, &cancel).await;
        watcher.abort();
        result.map(Json).map_err(ToolError::from)
    }

    #[tool(
        description = "Scan chapters for plot holes: timeline jumps, characters acting against declared traits, long absences, unresolved promises and logic contradictions. Returns a 0-100 score."
    )]
    #[instrument(name = "mcp.detect_plot_holes", skip_all)]
    pub async fn detect_plot_holes(
        &self,
        request: Parameters<ManuscriptInput>,
    ) -> Result<Json<ToolResponse>, ToolError> {
        let Parameters(input) = request;
        let (project_id, chapters, characters) = input.into_parts();
        let analysis = self
            .analysis_service
            .detect_plot_holes(&project_id, &chapters, &characters)
            .await?;

        let hints = hole_hints(&analysis);
        Ok(Json(ToolResponse {
            result: serde_json::to_value(&analysis).map_err(PlotweaveError::from)?,
            hints,
        }))
    }

    #[tool(
        description = "Build the character relationship graph from chapter co-occurrence: typed, weighted relationships with per-chapter evolution. Optionally adds a Mermaid diagram and bridge-character ranking."
    )]
    #[instrument(name = "mcp.build_character_graph", skip_all)]
    pub async fn build_character_graph(
        &self,
        request: Parameters<CharacterGraphInput>,
    ) -> Result<Json<ToolResponse>, ToolError> {
        let Parameters(input) = request;
        let (project_id, chapters, characters) = input.manuscript.into_parts();
        let graph = self
            .analysis_service
            .build_character_graph(&project_id, &chapters, &characters)
            .await?;

        let mut result = serde_json::json!({ "graph": graph });
        if input.include_mermaid {
            result["mermaid"] = serde_json::Value::String(to_mermaid(
                &graph,
                &MermaidOptions::default(),
            ));
        }
        if input.include_bridges {
            let bridges = bridge_characters(&graph, MAX_LIMIT)?;
            result["bridges"] = serde_json::to_value(bridges).map_err(PlotweaveError::from)?;
        }

        let mut hints = Vec::new();
        if graph.relationships.is_empty() && graph.nodes.len() > 1 {
            hints.push(
                "No two characters appear in the same chapter, so no relationships were found."
                    .to_string(),
            );
        }
        Ok(Json(ToolResponse { result, hints }))
    }

    #[tool(
        description = "Run plot-hole detection and character graph building over the same manuscript in one call."
    )]
    #[instrument(name = "mcp.analyze_project", skip_all)]
    pub async fn analyze_project(
        &self,
        request: Parameters<ManuscriptInput>,
    ) -> Result<Json<ToolResponse>, ToolError> {
        let Parameters(input) = request;
        let (project_id, chapters, characters) = input.into_parts();
        let analysis = self
            .analysis_service
            .analyze_project(&project_id, &chapters, &characters)
            .await?;

        let hints = hole_hints(&analysis.plot_holes);
        Ok(Json(ToolResponse {
            result: serde_json::to_value(&analysis).map_err(PlotweaveError::from)?,
            hints,
        }))
    }

    #[tool(
        description = "Get everything stored for a project: plot structure, suggestions, plot holes and character graph."
    )]
    #[instrument(name = "mcp.get_project", skip_all)]
    pub async fn get_project(
        &self,
        request: Parameters<ProjectInput>,
    ) -> Result<Json<ToolResponse>, ToolError> {
        let Parameters(input) = request;
        let record = self
            .repository
            .get_project(&input.project_id)
            .await?
            .ok_or_else(|| PlotweaveError::NotFound {
                entity_type: "project".to_string(),
                id: input.project_id.clone(),
            })?;

        Ok(Json(ToolResponse {
            result: serde_json::to_value(&record).map_err(PlotweaveError::from)?,
            hints: Vec::new(),
        }))
    }
}

impl PlotweaveServer {
    async fn handle_generate_plot(
        &self,
        input: &GeneratePlotInput,
        cancel: &CancelSignal,
    ) -> Result<ToolResponse, PlotweaveError> {
        let request = input.to_request()?;
        let context = input.to_context();

        let result = self
            .orchestrator
            .generate_plot_cancellable(&input.project_id, &request, context.as_ref(), cancel)
            .await?;

        self.repository.save_plot_structure(&result.structure).await?;
        self.repository
            .replace_suggestions(&input.project_id, result.suggestions.clone())
            .await?;

        let mut hints = Vec::new();
        if result.source == GenerationSource::Template {
            hints.push(
                "The provider was unavailable; this is the template outline. Suggestions and alternatives are empty."
                    .to_string(),
            );
        } else if result.suggestions.is_empty() {
            hints.push("The provider returned no usable suggestions.".to_string());
        }

        Ok(ToolResponse {
            result: serde_json::to_value(&result)?,
            hints,
        })
    }
}

fn hole_hints(analysis: &PlotHoleAnalysis) -> Vec<String> {
    let mut hints = Vec::new();
    let serious = analysis.count_by_severity(Severity::Critical)
        + analysis.count_by_severity(Severity::Major);
    if serious > 0 {
        hints.push(format!(
            "{} major or critical issue(s); address these before revising prose.",
            serious
        ));
    }
    if analysis.holes.iter().any(|h| h.suggested_fix.is_some()) {
        hints.push("Each hole carries a suggested_fix where one is known.".to_string());
    }
    hints
}

#[tool_handler]
impl ServerHandler for PlotweaveServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "plotweave".to_string(),
                title: Some("Plotweave Plot Engine".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                r#"# Plotweave Plot Engine

- generate_plot: Plot outline, suggestions and alternative openings from a premise
- detect_plot_holes: Scored plot-hole report for a set of chapters
- build_character_graph: Relationship graph from chapter co-occurrence
- analyze_project: Both analyses in one call
- get_project: Stored results for a project

Generation never fails on provider outages: it degrades to a template outline.
Pass chapters in reading order; analyses depend on it."#
                    .to_string(),
            ),
        }
    }
}

/// Run the MCP server over stdio until the client disconnects.
pub async fn run_mcp_server(ctx: crate::init::AppContext) -> anyhow::Result<()> {
    let server = PlotweaveServer::from_context(&ctx);

    tracing::info!("Starting Plotweave MCP server v{}", env!("CARGO_PKG_VERSION"));

    // Stdio transport
    let transport = (tokio::io::stdin(), tokio::io::stdout());
    let service = server.serve(transport).await?;
    tracing::info!("MCP server listening on stdio (5 tools)");

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
    });

    service.waiting().await?;

    tracing::info!("MCP server shutting down");
    Ok(())
}
