use std::env;
use std::time::Duration;

use compute::{ClusterOptions, Normalization};
use layers::RunId;
use narrative::OpenAiConfig;

pub const DEFAULT_GEOJSON: &str = "data/healthcare_tracts.geojson";

/// Session settings, read from `SITESEL_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// URL or filesystem path of the tract FeatureCollection.
    pub geojson: String,
    pub cluster_count: usize,
    pub slice_size: usize,
    pub fetch_timeout: Duration,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout: Duration,
    pub normalization: Normalization,
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geojson: DEFAULT_GEOJSON.to_string(),
            cluster_count: 5,
            slice_size: compute::CLUSTERING_SIZE,
            fetch_timeout: Duration::from_millis(10_000),
            llm_base_url: "https://api.openai.com/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            llm_api_key: None,
            llm_timeout: narrative::enrich::DEFAULT_TIMEOUT,
            normalization: Normalization::None,
            seed: 42,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            geojson: env_var_string("SITESEL_GEOJSON", &defaults.geojson),
            cluster_count: env_var_usize("SITESEL_CLUSTER_COUNT", defaults.cluster_count),
            slice_size: env_var_usize("SITESEL_SLICE_SIZE", defaults.slice_size),
            fetch_timeout: env_var_millis("SITESEL_FETCH_TIMEOUT_MS", defaults.fetch_timeout),
            llm_base_url: env_var_string("SITESEL_LLM_BASE_URL", &defaults.llm_base_url),
            llm_model: env_var_string("SITESEL_LLM_MODEL", &defaults.llm_model),
            llm_api_key: env::var("SITESEL_LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            llm_timeout: env_var_millis("SITESEL_LLM_TIMEOUT_MS", defaults.llm_timeout),
            normalization: env_var_parse("SITESEL_NORMALIZATION", defaults.normalization),
            seed: env_var_parse("SITESEL_SEED", defaults.seed),
        }
    }

    pub fn cluster_options(&self, run: RunId) -> ClusterOptions {
        ClusterOptions {
            normalization: self.normalization,
            seed: self.seed,
            run,
        }
    }

    /// `None` without an API key: narratives are unavailable.
    pub fn openai(&self) -> Option<OpenAiConfig> {
        Some(OpenAiConfig {
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone(),
            api_key: self.llm_api_key.clone()?,
        })
    }
}

fn env_var_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env_var_parse(key, default)
}

fn env_var_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
