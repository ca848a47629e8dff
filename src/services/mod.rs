pub mod analysis;
pub mod character_graph;
pub mod graph_analytics;
pub mod graph_export;
pub mod plot_holes;

pub use analysis::{AnalysisService, AnalysisType, ProjectAnalysis};
pub use character_graph::{
    classify_evolution, find_node, relationships_for, strongest_relationships,
    CharacterGraphBuilder,
};
pub use graph_analytics::{bridge_characters, CentralityResult};
pub use graph_export::{to_mermaid, MermaidOptions};
pub use plot_holes::{generate_suggested_fix, PlotHoleAnalyzer, PlotHoleDetector};

use crate::models::{Chapter, Character};
use crate::PlotweaveError;

/// Reject manuscripts the analyzers cannot attribute findings to.
pub(crate) fn validate_manuscript(
    project_id: &str,
    chapters: &[Chapter],
    characters: &[Character],
) -> Result<(), PlotweaveError> {
    if project_id.trim().is_empty() {
        return Err(PlotweaveError::Validation("project id is required".into()));
    }
    if let Some(pos) = chapters.iter().position(|c| c.id.trim().is_empty()) {
        return Err(PlotweaveError::Validation(format!(
            "chapter at position {} has no id",
            pos + 1
        )));
    }
    if let Some(c) = characters.iter().find(|c| c.name.trim().is_empty()) {
        return Err(PlotweaveError::Validation(format!(
            "character '{}' has no name",
            c.id
        )));
    }
    Ok(())
}
