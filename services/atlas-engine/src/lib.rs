pub mod catalog;
pub mod config;
pub mod encoder;
pub mod handlers;
pub mod ranker;
pub mod selector;
pub mod types;
pub mod weights;

pub use catalog::{catalog_stats, CatalogStats, ScenarioCatalog, StaticCatalog};
pub use config::{AppConfig, WeightBackend};
pub use encoder::{
    choice_tables, encode_input, C1Behavior, C1Context, CandleAction, CandleClose, UserInput,
};
pub use ranker::{DistanceRanker, FeatureTable};
pub use selector::MatchSelector;
pub use types::*;
pub use weights::{HttpWeightStore, InMemoryWeightStore, RedisWeightStore, WeightStore};

use std::sync::Arc;
use tracing::debug;

/// Number of matches returned when the caller does not ask for a count
pub const DEFAULT_TOP_K: usize = 3;

/// Matching API over a loaded catalog and a confidence weight store
#[derive(Clone)]
pub struct ScenarioMatcher {
    catalog: Arc<dyn ScenarioCatalog>,
    weights: Arc<dyn WeightStore>,
    selector: MatchSelector,
}

impl ScenarioMatcher {
    pub fn new(catalog: Arc<dyn ScenarioCatalog>, weights: Arc<dyn WeightStore>) -> Self {
        Self {
            catalog,
            weights,
            selector: MatchSelector::default(),
        }
    }

    pub fn with_selector(mut self, selector: MatchSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Encode an observation into its feature vector
    pub fn encode_input(&self, input: &UserInput) -> FeatureVector {
        encode_input(input)
    }

    /// Closest `top_k` scenarios, ascending by distance
    pub async fn find_matches(&self, features: &FeatureVector, top_k: usize) -> Vec<RankedMatch> {
        debug!(?features, top_k, "Finding matches");
        self.selector
            .rank(self.catalog.as_ref(), self.weights.as_ref(), features, top_k)
            .await
    }

    /// Single best match, `None` when the catalog is empty
    pub async fn find_best_match(&self, features: &FeatureVector) -> Option<MatchResult> {
        self.selector
            .best(self.catalog.as_ref(), self.weights.as_ref(), features)
            .await
            .map(MatchResult::from)
    }

    /// Encode and match in one step
    pub async fn match_input(&self, input: &UserInput, top_k: usize) -> Vec<RankedMatch> {
        let features = self.encode_input(input);
        self.find_matches(&features, top_k).await
    }

    pub fn scenario_by_id(&self, id: &str) -> Option<Arc<Scenario>> {
        self.catalog.scenario_by_id(id)
    }

    pub fn all_scenarios(&self) -> &[Arc<Scenario>] {
        self.catalog.all_scenarios()
    }

    pub fn catalog_stats(&self) -> CatalogStats {
        catalog_stats(self.catalog.as_ref())
    }

    pub fn category_label(category: Category) -> &'static str {
        category.label()
    }

    pub fn weight_store_name(&self) -> &str {
        self.weights.name()
    }
}
