//! Confidence weight stores
//!
//! The learning store that maintains per-scenario confidence lives outside
//! this service; these adapters only read from it.

pub mod http;
pub mod memory;
pub mod redis_store;

pub use http::HttpWeightStore;
pub use memory::InMemoryWeightStore;
pub use redis_store::RedisWeightStore;

use std::time::Duration;
use tracing::warn;

use crate::types::{AtlasError, Result};

/// Weight reported for a scenario the store has never seen
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Weight substituted when a lookup fails or times out
pub const FALLBACK_WEIGHT: f64 = 0.0;

/// Read contract for a confidence weight store
#[async_trait::async_trait]
pub trait WeightStore: Send + Sync {
    /// Confidence weight for a scenario. The range is owned by the store.
    async fn weight_for(&self, scenario_id: &str) -> Result<f64>;

    /// Store name
    fn name(&self) -> &str;
}

/// Weight attached to a ranked match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceWeight {
    pub value: f64,
    pub fallback: bool,
}

/// Fetch one weight, bounded by `timeout`; failures degrade to `FALLBACK_WEIGHT`
pub async fn fetch_weight(
    store: &dyn WeightStore,
    scenario_id: &str,
    timeout: Duration,
) -> ConfidenceWeight {
    let result = match tokio::time::timeout(timeout, store.weight_for(scenario_id)).await {
        Ok(result) => result,
        Err(_) => Err(AtlasError::WeightStore {
            scenario_id: scenario_id.to_string(),
            reason: format!("timed out after {}ms", timeout.as_millis()),
        }),
    };

    match result {
        Ok(value) => ConfidenceWeight { value, fallback: false },
        Err(e) => {
            warn!(store = store.name(), "Using fallback weight: {}", e);
            ConfidenceWeight {
                value: FALLBACK_WEIGHT,
                fallback: true,
            }
        }
    }
}
