use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{WeightStore, DEFAULT_WEIGHT};
use crate::types::Result;

/// Process-local weight table, seeded at start-up
#[derive(Debug, Default)]
pub struct InMemoryWeightStore {
    weights: RwLock<HashMap<String, f64>>,
}

impl InMemoryWeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a scenario's weight (seeding, tests)
    pub async fn set_weight(&self, scenario_id: &str, weight: f64) {
        self.weights
            .write()
            .await
            .insert(scenario_id.to_string(), weight);
    }

    pub async fn len(&self) -> usize {
        self.weights.read().await.len()
    }
}

impl FromIterator<(String, f64)> for InMemoryWeightStore {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            weights: RwLock::new(iter.into_iter().collect()),
        }
    }
}

#[async_trait::async_trait]
impl WeightStore for InMemoryWeightStore {
    async fn weight_for(&self, scenario_id: &str) -> Result<f64> {
        let weights = self.weights.read().await;
        Ok(weights.get(scenario_id).copied().unwrap_or(DEFAULT_WEIGHT))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_ok, block_on};

    #[test]
    fn test_unknown_scenario_gets_default() {
        let store = InMemoryWeightStore::new();
        let weight = assert_ok!(block_on(store.weight_for("nope")));
        assert_eq!(weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn test_from_iter_seeds_store() {
        let store: InMemoryWeightStore =
            [("v-01".to_string(), 0.82), ("l-02".to_string(), 0.1)]
                .into_iter()
                .collect();
        assert_eq!(block_on(store.len()), 2);
        assert_eq!(assert_ok!(block_on(store.weight_for("l-02"))), 0.1);
    }

    #[tokio::test]
    async fn test_set_weight() {
        let store = InMemoryWeightStore::new();
        store.set_weight("w-02", 0.35).await;
        store.set_weight("w-02", 0.4).await;
        assert_eq!(store.len().await, 1);
        assert_eq!(store.weight_for("w-02").await.unwrap(), 0.4);
    }
}
