//! Plot generation pipeline.
//!
//! `orchestrator` drives the pipeline; the other modules are its leaves:
//! complexity scoring, prompt text, provider calls with retry, lenient
//! response parsing and the deterministic template fallback.

pub mod complexity;
pub mod orchestrator;
pub mod parse;
pub mod prompts;
pub mod provider;
pub mod retry;
pub mod template;

pub use complexity::{classify, ModelTier, TaskKind};
pub use orchestrator::PlotGenerationOrchestrator;
pub use provider::{
    create_provider, GenerationProvider, OfflineProvider, OpenAiCompatibleProvider,
    ProviderEnvelope, ProviderRequest,
};
pub use retry::{CancelHandle, CancelSignal, RetryExecutor, RetryPolicy};
