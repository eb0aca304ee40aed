//! Scenario catalog - load-once, read-only collection of named scenarios

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use crate::types::{AtlasError, Category, Result, Scenario};

/// Read contract the matcher needs from a catalog
pub trait ScenarioCatalog: Send + Sync {
    /// Every scenario, in a stable order
    fn all_scenarios(&self) -> &[Arc<Scenario>];

    fn scenario_by_id(&self, id: &str) -> Option<Arc<Scenario>>;

    fn len(&self) -> usize {
        self.all_scenarios().len()
    }

    fn is_empty(&self) -> bool {
        self.all_scenarios().is_empty()
    }
}

/// In-process catalog built once from validated records
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    scenarios: Vec<Arc<Scenario>>,
    by_id: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl StaticCatalog {
    /// Build a catalog, keeping the given order. Ids must be unique.
    ///
    /// Feature vectors are already domain-checked by `FeatureVector`'s
    /// constructors, so only identity is validated here.
    pub fn from_scenarios(scenarios: Vec<Scenario>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(scenarios.len());

        for (idx, scenario) in scenarios.iter().enumerate() {
            if scenario.id.trim().is_empty() {
                return Err(AtlasError::Catalog(format!(
                    "scenario at position {} has an empty id",
                    idx
                )));
            }
            if by_id.insert(scenario.id.clone(), idx).is_some() {
                return Err(AtlasError::Catalog(format!(
                    "duplicate scenario id: {}",
                    scenario.id
                )));
            }
        }

        Ok(Self {
            scenarios: scenarios.into_iter().map(Arc::new).collect(),
            by_id,
            loaded_at: Utc::now(),
        })
    }

    pub fn empty() -> Self {
        Self {
            scenarios: Vec::new(),
            by_id: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Parse a JSON array of scenario records
    pub fn from_json_str(json: &str) -> Result<Self> {
        let scenarios: Vec<Scenario> = serde_json::from_str(json)
            .map_err(|e| AtlasError::Catalog(format!("invalid catalog document: {}", e)))?;
        debug!("Parsed {} scenario records", scenarios.len());
        Self::from_scenarios(scenarios)
    }

    /// Load a catalog document from disk
    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await.map_err(|e| {
            AtlasError::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json_str(&json)?;
        info!(
            "Loaded {} scenarios from {}",
            catalog.scenarios.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl ScenarioCatalog for StaticCatalog {
    fn all_scenarios(&self) -> &[Arc<Scenario>] {
        &self.scenarios
    }

    fn scenario_by_id(&self, id: &str) -> Option<Arc<Scenario>> {
        self.by_id.get(id).map(|&idx| Arc::clone(&self.scenarios[idx]))
    }
}

/// Scenario counts per category and per bias
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogStats {
    pub total: usize,
    pub by_category: Vec<CategoryCount>,
    pub by_bias: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: Category,
    pub label: &'static str,
    pub count: usize,
}

/// Summarize a catalog for dashboards. Every category is listed, even when empty.
pub fn catalog_stats(catalog: &dyn ScenarioCatalog) -> CatalogStats {
    let scenarios = catalog.all_scenarios();

    let by_category = Category::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            label: category.label(),
            count: scenarios.iter().filter(|s| s.category == category).count(),
        })
        .collect();

    let mut by_bias: BTreeMap<&'static str, usize> = BTreeMap::new();
    for scenario in scenarios {
        *by_bias.entry(scenario.bias.as_str()).or_insert(0) += 1;
    }

    CatalogStats {
        total: scenarios.len(),
        by_category,
        by_bias,
    }
}
