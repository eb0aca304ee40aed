//! Match selector - scores the whole catalog, orders by distance, keeps the top K

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::catalog::ScenarioCatalog;
use crate::ranker::{DistanceRanker, Score};
use crate::types::{FeatureVector, RankedMatch, Scenario};
use crate::weights::{fetch_weight, WeightStore};

/// Default upper bound for a single weight lookup
pub const DEFAULT_WEIGHT_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct MatchSelector {
    ranker: DistanceRanker,
    weight_timeout: Duration,
}

impl MatchSelector {
    pub fn new(ranker: DistanceRanker, weight_timeout: Duration) -> Self {
        Self {
            ranker,
            weight_timeout,
        }
    }

    pub fn ranker(&self) -> &DistanceRanker {
        &self.ranker
    }

    /// Rank every catalog entry against `query` and keep the closest `top_k`.
    ///
    /// Ordering is ascending by distance; equal distances keep catalog order.
    /// Returns exactly `min(top_k, catalog.len())` matches.
    ///
    /// Weights do not affect ordering, so the store is read once per
    /// *returned* scenario, not once per catalog entry: a store sees
    /// `min(top_k, catalog.len())` reads per call. The reads run concurrently
    /// and a failed one falls back instead of dropping the entry.
    pub async fn rank(
        &self,
        catalog: &dyn ScenarioCatalog,
        weights: &dyn WeightStore,
        query: &FeatureVector,
        top_k: usize,
    ) -> Vec<RankedMatch> {
        let mut scored: Vec<(&Arc<Scenario>, Score)> = catalog
            .all_scenarios()
            .iter()
            .map(|scenario| (scenario, self.ranker.score(query, &scenario.features)))
            .collect();

        // stable: ties stay in catalog order
        scored.sort_by(|a, b| a.1.distance.total_cmp(&b.1.distance));
        scored.truncate(top_k);

        let fetches = scored
            .iter()
            .map(|(scenario, _)| fetch_weight(weights, &scenario.id, self.weight_timeout));
        let confidence = futures::future::join_all(fetches).await;

        let matches: Vec<RankedMatch> = scored
            .into_iter()
            .zip(confidence)
            .map(|((scenario, score), weight)| RankedMatch {
                scenario: Arc::clone(scenario),
                distance: score.distance,
                similarity: score.similarity(),
                match_type: score.match_type,
                confidence_weight: weight.value,
                weight_fallback: weight.fallback,
            })
            .collect();

        debug!(
            "Ranked {} scenarios, returning {}",
            catalog.len(),
            matches.len()
        );

        matches
    }

    /// Closest match, or `None` for an empty catalog
    pub async fn best(
        &self,
        catalog: &dyn ScenarioCatalog,
        weights: &dyn WeightStore,
        query: &FeatureVector,
    ) -> Option<RankedMatch> {
        self.rank(catalog, weights, query, 1).await.into_iter().next()
    }
}

impl Default for MatchSelector {
    fn default() -> Self {
        Self::new(DistanceRanker::default(), DEFAULT_WEIGHT_TIMEOUT)
    }
}
