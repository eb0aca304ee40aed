// Redis-backed weight store
use redis::AsyncCommands;

use super::{WeightStore, DEFAULT_WEIGHT};
use crate::types::{AtlasError, Result};

pub struct RedisWeightStore {
    client: redis::aio::MultiplexedConnection,
}

impl RedisWeightStore {
    pub async fn new(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_multiplexed_async_connection().await?;

        Ok(Self { client: conn })
    }

    pub fn key(scenario_id: &str) -> String {
        format!("weight:{}", scenario_id)
    }

    fn error(scenario_id: &str, reason: impl ToString) -> AtlasError {
        AtlasError::WeightStore {
            scenario_id: scenario_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl WeightStore for RedisWeightStore {
    async fn weight_for(&self, scenario_id: &str) -> Result<f64> {
        let value: Option<String> = self
            .client
            .clone()
            .get(Self::key(scenario_id))
            .await
            .map_err(|e| Self::error(scenario_id, e))?;

        match value {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| Self::error(scenario_id, format!("bad weight {:?}: {}", raw, e))),
            None => Ok(DEFAULT_WEIGHT),
        }
    }

    fn name(&self) -> &str {
        "redis"
    }
}
