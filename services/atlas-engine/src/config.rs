//! Service configuration
//!
//! Defaults overridden by `ATLAS_*` environment variables (an optional `.env`
//! file is loaded first). `PORT` is honoured for the listen port.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Where confidence weights are read from
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightBackend {
    #[default]
    Memory,
    Redis,
    Http,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    /// Upper bound for one weight lookup
    #[serde(default = "default_weight_timeout_ms")]
    pub weight_timeout_ms: u64,
    #[serde(default)]
    pub weight_backend: WeightBackend,
    /// JSON object of `scenario_id -> weight` used to seed the memory backend
    #[serde(default)]
    pub weights_path: Option<String>,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default)]
    pub weight_service_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            catalog_path: default_catalog_path(),
            default_top_k: default_top_k(),
            weight_timeout_ms: default_weight_timeout_ms(),
            weight_backend: WeightBackend::default(),
            weights_path: None,
            redis_url: None,
            weight_service_url: None,
        }
    }
}

fn default_port() -> u16 { 8080 }
fn default_catalog_path() -> String { "data/scenarios.json".to_string() }
fn default_top_k() -> usize { crate::DEFAULT_TOP_K }
fn default_weight_timeout_ms() -> u64 { 250 }

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env loaded: {}", e);
        }
        let port = std::env::var("PORT").ok();
        Self::build(::config::Environment::with_prefix("ATLAS").try_parsing(true), port)
    }

    /// Load from an explicit variable map (same names as the environment)
    pub fn from_vars(vars: HashMap<String, String>) -> anyhow::Result<Self> {
        let port = vars.get("PORT").cloned();
        let env = ::config::Environment::with_prefix("ATLAS")
            .try_parsing(true)
            .source(Some(vars));
        Self::build(env, port)
    }

    fn build(env: ::config::Environment, port: Option<String>) -> anyhow::Result<Self> {
        let mut builder = ::config::Config::builder().add_source(env);
        if let Some(port) = port {
            builder = builder
                .set_override("port", port)
                .context("Invalid PORT")?;
        }

        let cfg: AppConfig = builder
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.default_top_k == 0 {
            anyhow::bail!("ATLAS_DEFAULT_TOP_K must be at least 1");
        }
        if self.weight_timeout_ms == 0 {
            anyhow::bail!("ATLAS_WEIGHT_TIMEOUT_MS must be positive");
        }
        match self.weight_backend {
            WeightBackend::Redis if self.redis_url.is_none() => {
                anyhow::bail!("ATLAS_REDIS_URL is required for the redis weight backend")
            }
            WeightBackend::Http if self.weight_service_url.is_none() => {
                anyhow::bail!("ATLAS_WEIGHT_SERVICE_URL is required for the http weight backend")
            }
            _ => Ok(()),
        }
    }

    pub fn weight_timeout(&self) -> Duration {
        Duration::from_millis(self.weight_timeout_ms)
    }
}
