use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One of the eight encoded sub-observations of a four-candle pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    C1Context,
    C1Behavior,
    C2Action,
    C2Close,
    C3Action,
    C3Close,
    C4Action,
    C4Close,
}

impl Feature {
    pub const COUNT: usize = 8;

    /// All features in vector order
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::C1Context,
        Feature::C1Behavior,
        Feature::C2Action,
        Feature::C2Close,
        Feature::C3Action,
        Feature::C3Close,
        Feature::C4Action,
        Feature::C4Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::C1Context => "c1_context",
            Feature::C1Behavior => "c1_behavior",
            Feature::C2Action => "c2_action",
            Feature::C2Close => "c2_close",
            Feature::C3Action => "c3_action",
            Feature::C3Close => "c3_close",
            Feature::C4Action => "c4_action",
            Feature::C4Close => "c4_close",
        }
    }

    /// Position of this feature inside a `FeatureVector`
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Number of distinct encoded values (taken from the encoder's choice tables)
    pub fn domain_size(&self) -> u8 {
        use crate::encoder::{C1Behavior, C1Context, CandleAction, CandleClose};
        match self {
            Feature::C1Context => C1Context::ALL.len() as u8,
            Feature::C1Behavior => C1Behavior::ALL.len() as u8,
            Feature::C2Action | Feature::C3Action | Feature::C4Action => {
                CandleAction::ALL.len() as u8
            }
            Feature::C2Close | Feature::C3Close | Feature::C4Close => {
                CandleClose::ALL.len() as u8
            }
        }
    }

    /// Largest possible absolute difference between two encoded values
    pub fn max_diff(&self) -> u8 {
        self.domain_size() - 1
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named integer fields as they appear on the wire and in catalog documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureValues {
    pub c1_context: u8,
    pub c1_behavior: u8,
    pub c2_action: u8,
    pub c2_close: u8,
    pub c3_action: u8,
    pub c3_close: u8,
    pub c4_action: u8,
    pub c4_close: u8,
}

/// Fixed-length numeric encoding of a four-candle observation.
///
/// Every value is guaranteed to lie inside its feature's domain; the only
/// ways to obtain one are `FeatureVector::new` (validated) and the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FeatureValues", into = "FeatureValues")]
pub struct FeatureVector {
    values: [u8; Feature::COUNT],
}

impl FeatureVector {
    /// Build a vector from raw values, rejecting anything outside a feature's domain
    pub fn new(values: FeatureValues) -> Result<Self> {
        let raw = [
            values.c1_context,
            values.c1_behavior,
            values.c2_action,
            values.c2_close,
            values.c3_action,
            values.c3_close,
            values.c4_action,
            values.c4_close,
        ];

        for feature in Feature::ALL {
            let value = raw[feature.index()];
            let domain = feature.domain_size();
            if value >= domain {
                return Err(AtlasError::OutOfDomain { feature, value, domain });
            }
        }

        Ok(Self { values: raw })
    }

    /// Values produced by the encoder are in-domain by construction
    pub(crate) fn from_encoded(values: [u8; Feature::COUNT]) -> Self {
        debug_assert!(Feature::ALL
            .iter()
            .all(|f| values[f.index()] < f.domain_size()));
        Self { values }
    }

    pub fn get(&self, feature: Feature) -> u8 {
        self.values[feature.index()]
    }

    pub fn values(&self) -> FeatureValues {
        FeatureValues::from(*self)
    }
}

impl TryFrom<FeatureValues> for FeatureVector {
    type Error = AtlasError;

    fn try_from(values: FeatureValues) -> Result<Self> {
        FeatureVector::new(values)
    }
}

impl From<FeatureVector> for FeatureValues {
    fn from(v: FeatureVector) -> Self {
        FeatureValues {
            c1_context: v.get(Feature::C1Context),
            c1_behavior: v.get(Feature::C1Behavior),
            c2_action: v.get(Feature::C2Action),
            c2_close: v.get(Feature::C2Close),
            c3_action: v.get(Feature::C3Action),
            c3_close: v.get(Feature::C3Close),
            c4_action: v.get(Feature::C4Action),
            c4_close: v.get(Feature::C4Close),
        }
    }
}

/// Scenario family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vetted,
    InsidePdr,
    Whipsaw,
    PdhBreak,
    PdlBreak,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Vetted,
        Category::InsidePdr,
        Category::Whipsaw,
        Category::PdhBreak,
        Category::PdlBreak,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vetted => "vetted",
            Category::InsidePdr => "inside_pdr",
            Category::Whipsaw => "whipsaw",
            Category::PdhBreak => "pdh_break",
            Category::PdlBreak => "pdl_break",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Category::Vetted => "Vetted",
            Category::InsidePdr => "Inside PDR",
            Category::Whipsaw => "Whipsaw",
            Category::PdhBreak => "PDH Break",
            Category::PdlBreak => "PDL Break",
        }
    }
}

/// Directional bias of a scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    #[serde(rename = "Heavily Bullish")]
    HeavilyBullish,
    #[serde(rename = "Heavily Bearish")]
    HeavilyBearish,
    Mixed,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::Bullish => "Bullish",
            Bias::Bearish => "Bearish",
            Bias::HeavilyBullish => "Heavily Bullish",
            Bias::HeavilyBearish => "Heavily Bearish",
            Bias::Mixed => "Mixed",
        }
    }
}

/// Per-candle condition descriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    pub c1: String,
    pub c2: String,
    pub c3: String,
    pub c4: String,
}

/// Named trading scenario from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub category: Category,
    /// Short human-readable id, e.g. "V-01"
    pub label: String,
    pub conditions: Conditions,
    pub entry: String,
    pub bias: Bias,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub features: FeatureVector,
}

/// Whether a candidate was identical to the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Inferred,
}

/// One scored catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct RankedMatch {
    pub scenario: Arc<Scenario>,
    /// Weighted normalized distance in [0, 1]
    pub distance: f64,
    /// `1 - distance`, rounded to 4 decimal places
    pub similarity: f64,
    pub match_type: MatchType,
    pub confidence_weight: f64,
    /// Set when the weight store failed and the fallback weight was used
    pub weight_fallback: bool,
}

/// Best match with the raw distance dropped
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub scenario: Arc<Scenario>,
    pub match_type: MatchType,
    pub similarity: f64,
    pub confidence_weight: f64,
}

impl From<RankedMatch> for MatchResult {
    fn from(m: RankedMatch) -> Self {
        Self {
            scenario: m.scenario,
            match_type: m.match_type,
            similarity: m.similarity,
            confidence_weight: m.confidence_weight,
        }
    }
}

/// Error types for the matching engine
#[derive(Debug, thiserror::Error)]
pub enum AtlasError {
    #[error("Invalid choice for {field}: {value}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("Value {value} out of domain for {feature} (expected 0..{domain})")]
    OutOfDomain { feature: Feature, value: u8, domain: u8 },

    #[error("Invalid feature weights: {0}")]
    InvalidWeights(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Weight store error for {scenario_id}: {reason}")]
    WeightStore { scenario_id: String, reason: String },
}

/// Result type for matching engine operations
pub type Result<T> = std::result::Result<T, AtlasError>;
