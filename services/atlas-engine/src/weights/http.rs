use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::{WeightStore, DEFAULT_WEIGHT};
use crate::types::{AtlasError, Result};

/// Learning service response for one scenario
#[derive(Debug, Deserialize)]
pub struct WeightResponse {
    pub scenario_id: String,
    pub weight: f64,
}

/// Reads confidence weights from a remote learning service
/// (`GET {base}/weights/{scenario_id}`)
pub struct HttpWeightStore {
    client: Client,
    base_url: Url,
}

impl HttpWeightStore {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid weight service URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Weight service URL cannot be a base: {}", base_url);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    pub fn weight_url(&self, scenario_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("weights").push(scenario_id);
        }
        url
    }

    fn error(scenario_id: &str, reason: impl ToString) -> AtlasError {
        AtlasError::WeightStore {
            scenario_id: scenario_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl WeightStore for HttpWeightStore {
    async fn weight_for(&self, scenario_id: &str) -> Result<f64> {
        let url = self.weight_url(scenario_id);
        debug!("Fetching weight for {} from {}", scenario_id, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Self::error(scenario_id, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(DEFAULT_WEIGHT),
            status if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(Self::error(
                    scenario_id,
                    format!("weight service error: {} - {}", status, text),
                ));
            }
            _ => {}
        }

        let body: WeightResponse = response
            .json()
            .await
            .map_err(|e| Self::error(scenario_id, format!("invalid response: {}", e)))?;

        if body.scenario_id != scenario_id {
            return Err(Self::error(
                scenario_id,
                format!("response was for {}", body.scenario_id),
            ));
        }

        Ok(body.weight)
    }

    fn name(&self) -> &str {
        "http"
    }
}
