//! Runtime configuration.
//!
//! Loaded from `{data_path}/plotweave.toml`, then the `PLOTWEAVE_CONFIG` env var
//! (JSON), then defaults. The configuration is passed explicitly to the
//! classifier and orchestrator; nothing reads it from a global.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::generation::complexity::ModelTier;
use crate::generation::retry::RetryPolicy;

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "plotweave.toml";

/// Env var holding a JSON-encoded config.
pub const CONFIG_ENV: &str = "PLOTWEAVE_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlotweaveConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub models: ModelCatalog,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Which text-generation backend to call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// No provider: every call fails and generation uses the template plot.
    #[default]
    Offline,
    /// Any `/chat/completions` compatible endpoint.
    OpenaiCompatible {
        #[serde(default = "default_provider_id")]
        id: String,
        #[serde(default = "default_base_url")]
        base_url: String,
        /// Name of the env var holding the API key.
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_request_timeout_secs")]
        timeout_secs: u64,
        #[serde(default = "default_max_tokens")]
        max_tokens: u32,
    },
}

fn default_provider_id() -> String {
    "openai".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "PLOTWEAVE_API_KEY".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_max_tokens() -> u32 {
    4096
}

impl ProviderConfig {
    pub fn id(&self) -> &str {
        match self {
            ProviderConfig::Offline => "offline",
            ProviderConfig::OpenaiCompatible { id, .. } => id,
        }
    }
}

/// Model identifier per complexity tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default = "default_fast_model")]
    pub fast: String,
    #[serde(default = "default_standard_model")]
    pub standard: String,
    #[serde(default = "default_advanced_model")]
    pub advanced: String,
}

fn default_fast_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_standard_model() -> String {
    "gpt-4o".to_string()
}

fn default_advanced_model() -> String {
    "o3".to_string()
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self {
            fast: default_fast_model(),
            standard: default_standard_model(),
            advanced: default_advanced_model(),
        }
    }
}

impl ModelCatalog {
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Standard => &self.standard,
            ModelTier::Advanced => &self.advanced,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    /// Sampling temperature sent with every prompt.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.8
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Analysis cache TTL in seconds (default: 300 = 5 minutes).
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    1_000
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Load configuration with priority:
/// 1. `{data_path}/plotweave.toml`
/// 2. `PLOTWEAVE_CONFIG` env var (JSON)
/// 3. Defaults (offline provider)
///
/// Unreadable or malformed sources are logged and skipped.
pub fn load_config(data_path: &Path) -> PlotweaveConfig {
    let config_path = data_path.join(CONFIG_FILE);
    if config_path.exists() {
        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str::<PlotweaveConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    return config;
                }
                Err(e) => {
                    warn!(
                        "Failed to parse {}: {}. Using default.",
                        config_path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                warn!(
                    "Failed to read {}: {}. Using default.",
                    config_path.display(),
                    e
                );
            }
        }
    }

    if let Ok(json) = std::env::var(CONFIG_ENV) {
        match serde_json::from_str::<PlotweaveConfig>(&json) {
            Ok(config) => {
                info!("Loaded config from {} env", CONFIG_ENV);
                return config;
            }
            Err(e) => {
                warn!("Failed to parse {}: {}. Using default.", CONFIG_ENV, e);
            }
        }
    }

    PlotweaveConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_offline() {
        let config = PlotweaveConfig::default();
        assert!(matches!(config.provider, ProviderConfig::Offline));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.analysis.cache_ttl_secs, 300);
    }

    #[test]
    fn test_toml_partial_config_fills_defaults() {
        let config: PlotweaveConfig = toml::from_str(
            r#"
[provider]
kind = "openai_compatible"
base_url = "http://localhost:11434/v1"

[models]
advanced = "big-model"

[retry]
max_attempts = 5
"#,
        )
        .unwrap();

        match &config.provider {
            ProviderConfig::OpenaiCompatible {
                base_url,
                api_key_env,
                ..
            } => {
                assert_eq!(base_url, "http://localhost:11434/v1");
                assert_eq!(api_key_env, "PLOTWEAVE_API_KEY");
            }
            other => panic!("unexpected provider: {:?}", other),
        }
        assert_eq!(config.models.model_for(ModelTier::Advanced), "big-model");
        assert_eq!(config.models.model_for(ModelTier::Fast), "gpt-4o-mini");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay_ms, 100);
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[generation]\ntemperature = 0.2\n",
        )
        .unwrap();
        let config = load_config(dir.path());
        assert!((config.generation.temperature - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_config_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "not = [valid").unwrap();
        let config = load_config(dir.path());
        assert!((config.generation.temperature - 0.8).abs() < f32::EPSILON);
    }
}
