//! Scripted generation provider for orchestrator tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use plotweave::generation::{GenerationProvider, ProviderEnvelope, ProviderRequest};
use plotweave::PlotweaveError;

/// Replays queued responses in order, then fails every further call.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ProviderEnvelope, PlotweaveError>>>,
    fallback: Box<dyn Fn() -> Result<ProviderEnvelope, PlotweaveError> + Send + Sync>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(Instant, ProviderRequest)>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Box::new(|| Ok(ProviderEnvelope::failure("script exhausted", None))),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Provider whose every call fails with a transient network error.
    pub fn always_failing() -> Self {
        Self {
            fallback: Box::new(|| Err(PlotweaveError::provider("network unreachable"))),
            ..Self::new()
        }
    }

    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.push(Ok(ProviderEnvelope::ok(text)))
    }

    pub fn then_failure(self, error: &str) -> Self {
        self.push(Ok(ProviderEnvelope::failure(error, None)))
    }

    pub fn then_error(self, err: PlotweaveError) -> Self {
        self.push(Err(err))
    }

    fn push(self, response: Result<ProviderEnvelope, PlotweaveError>) -> Self {
        self.responses
            .lock()
            .expect("responses lock")
            .push_back(response);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, with the (paused) clock time of each.
    pub fn requests(&self) -> Vec<(Instant, ProviderRequest)> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl GenerationProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: ProviderRequest) -> Result<ProviderEnvelope, PlotweaveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push((Instant::now(), request));

        let next = self.responses.lock().expect("responses lock").pop_front();
        match next {
            Some(response) => response,
            None => (self.fallback)(),
        }
    }
}

/// A valid three-act structure response.
pub const THREE_ACT_JSON: &str = r#"Here is the outline:
```json
{"acts": [
  {"actNumber": 1, "name": "The Heist", "plotPoints": [
    {"type": "inciting_incident", "title": "The crown is stolen", "position": 10}
  ]},
  {"actNumber": 2, "name": "The Chase", "plotPoints": [
    {"type": "midpoint", "title": "Kael learns the truth"},
    {"type": "climax", "title": "Duel on the bridge", "position": 80}
  ]},
  {"actNumber": 3, "name": "The Return", "plotPoints": [
    {"type": "resolution", "title": "The crown returns", "position": 95}
  ]}
]}
```"#;

pub const SUGGESTIONS_JSON: &str = r#"[
  {"type": "plot_twist", "title": "The queen ordered the theft", "description": "...", "impact": "high"},
  {"type": "character_arc", "title": "Kael learns to trust", "description": "..."}
]"#;

pub const ALTERNATIVES_JSON: &str = r#"{"acts": [
  {"actNumber": 1, "name": "In medias res", "plotPoints": [{"type": "hook", "title": "Rooftop escape"}]}
]}"#;
