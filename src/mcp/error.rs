use crate::PlotweaveError;
use rmcp::model::{Content, IntoContents};
use serde::Serialize;

/// Structured error response for MCP tool calls.
/// Provides error_code + suggestion so LLMs can auto-fix.
#[derive(Debug, Serialize)]
pub struct ToolError {
    pub error_code: String,
    pub message: String,
    pub suggestion: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

impl IntoContents for ToolError {
    fn into_contents(self) -> Vec<Content> {
        let json = serde_json::to_string(&self).unwrap_or_else(|_| self.message.clone());
        vec![Content::text(json)]
    }
}

impl From<PlotweaveError> for ToolError {
    fn from(err: PlotweaveError) -> Self {
        let message = err.to_string();
        match err {
            PlotweaveError::Validation(_) => ToolError {
                error_code: "VALIDATION_ERROR".into(),
                message,
                suggestion: "Check required fields (project_id, premise, genre) and that every chapter has an id and every character a name.".into(),
                example: Some(serde_json::json!({
                    "project_id": "novel",
                    "premise": "A thief steals the crown she was hired to guard",
                    "genre": "fantasy"
                })),
            },
            PlotweaveError::NotFound { .. } => ToolError {
                error_code: "NOT_FOUND".into(),
                message,
                suggestion: "Run generate_plot or analyze_project for this project first.".into(),
                example: None,
            },
            PlotweaveError::Cancelled => ToolError {
                error_code: "CANCELLED".into(),
                message,
                suggestion: "The request was cancelled before it finished.".into(),
                example: None,
            },
            PlotweaveError::Provider { retryable, .. } => ToolError {
                error_code: "PROVIDER_ERROR".into(),
                message,
                suggestion: if retryable {
                    "The generation provider is temporarily unavailable. Retry later.".into()
                } else {
                    "Check the provider configuration in plotweave.toml.".into()
                },
                example: None,
            },
            _ => ToolError {
                error_code: "INTERNAL_ERROR".into(),
                message,
                suggestion: "Retry the operation or simplify the request.".into(),
                example: None,
            },
        }
    }
}
