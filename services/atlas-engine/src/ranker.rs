//! Distance ranker - importance-weighted, normalized distance between feature vectors
//!
//! Per feature the absolute difference is divided by the feature's largest
//! possible difference, multiplied by its importance, and the result is the
//! weighted mean over all features: 0 = identical, 1 = maximally different.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::types::{AtlasError, Feature, FeatureVector, MatchType, Result};

/// Decimal places kept when reporting similarity
pub const SIMILARITY_DECIMALS: u32 = 4;

/// Importance of each feature to scenario identity.
/// First-candle context and the candle 2/3 breaks carry the most signal.
pub const DEFAULT_IMPORTANCE: [(Feature, f64); Feature::COUNT] = [
    (Feature::C1Context, 2.5),
    (Feature::C1Behavior, 1.5),
    (Feature::C2Action, 2.0),
    (Feature::C2Close, 1.5),
    (Feature::C3Action, 2.0),
    (Feature::C3Close, 1.5),
    (Feature::C4Action, 1.5),
    (Feature::C4Close, 1.0),
];

/// Per-feature importance weights
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    importance: [f64; Feature::COUNT],
    total: f64,
}

impl FeatureTable {
    /// Build a table from `(feature, importance)` pairs.
    ///
    /// Every feature must appear exactly once with a finite, non-negative
    /// importance, and the importances must not sum to zero.
    pub fn from_pairs(pairs: &[(Feature, f64)]) -> Result<Self> {
        let mut importance = [None; Feature::COUNT];

        for &(feature, weight) in pairs {
            if !weight.is_finite() || weight < 0.0 {
                return Err(AtlasError::InvalidWeights(format!(
                    "{} has importance {}",
                    feature, weight
                )));
            }
            let slot = &mut importance[feature.index()];
            if slot.is_some() {
                return Err(AtlasError::InvalidWeights(format!(
                    "{} listed more than once",
                    feature
                )));
            }
            *slot = Some(weight);
        }

        let mut resolved = [0.0; Feature::COUNT];
        for feature in Feature::ALL {
            resolved[feature.index()] = importance[feature.index()].ok_or_else(|| {
                AtlasError::InvalidWeights(format!("{} has no importance", feature))
            })?;
        }

        let total: f64 = resolved.iter().sum();
        if total <= 0.0 {
            return Err(AtlasError::InvalidWeights(
                "importances sum to zero".to_string(),
            ));
        }

        Ok(Self { importance: resolved, total })
    }

    pub fn importance(&self, feature: Feature) -> f64 {
        self.importance[feature.index()]
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }
}

impl Default for FeatureTable {
    fn default() -> Self {
        let importance = DEFAULT_IMPORTANCE.map(|(_, w)| w);
        Self {
            importance,
            total: importance.iter().sum(),
        }
    }
}

/// Distance and classification of one candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub distance: f64,
    pub match_type: MatchType,
}

impl Score {
    pub fn similarity(&self) -> f64 {
        similarity(self.distance)
    }
}

/// Scores candidates against a query with a fixed importance table
#[derive(Debug, Clone, Default)]
pub struct DistanceRanker {
    table: FeatureTable,
}

impl DistanceRanker {
    pub fn new(table: FeatureTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    /// Weighted mean of the normalized per-feature differences
    pub fn distance(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        let mut total_dist = 0.0;
        let mut total_weight = 0.0;

        for feature in Feature::ALL {
            let diff = a.get(feature).abs_diff(b.get(feature));
            let normalized = f64::from(diff) / f64::from(feature.max_diff());
            let w = self.table.importance(feature);
            total_dist += normalized * w;
            total_weight += w;
        }

        total_dist / total_weight
    }

    /// Exact only when every feature is equal; a zero-importance feature
    /// that differs still makes the match inferred.
    pub fn score(&self, query: &FeatureVector, candidate: &FeatureVector) -> Score {
        let distance = self.distance(query, candidate);
        let match_type = if query == candidate {
            MatchType::Exact
        } else {
            MatchType::Inferred
        };
        Score { distance, match_type }
    }
}

/// `1 - distance`, rounded half away from zero to `SIMILARITY_DECIMALS` places
pub fn similarity(distance: f64) -> f64 {
    let raw = 1.0 - distance;
    Decimal::try_from(raw)
        .ok()
        .map(|d| d.round_dp_with_strategy(SIMILARITY_DECIMALS, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeatureValues;

    fn fv(v: [u8; 8]) -> FeatureVector {
        FeatureVector::new(FeatureValues {
            c1_context: v[0],
            c1_behavior: v[1],
            c2_action: v[2],
            c2_close: v[3],
            c3_action: v[4],
            c3_close: v[5],
            c4_action: v[6],
            c4_close: v[7],
        })
        .unwrap()
    }

    /// Small deterministic sweep over in-domain vectors
    fn sample_vectors() -> Vec<FeatureVector> {
        let mut out = Vec::new();
        for seed in 0u32..40 {
            let mut v = [0u8; 8];
            for feature in Feature::ALL {
                let i = feature.index() as u32;
                v[feature.index()] =
                    ((seed * 7 + i * 13 + seed * i) % u32::from(feature.domain_size())) as u8;
            }
            out.push(fv(v));
        }
        out
    }

    #[test]
    fn test_default_table() {
        let table = FeatureTable::default();
        assert_eq!(table.importance(Feature::C1Context), 2.5);
        assert_eq!(table.importance(Feature::C4Close), 1.0);
        assert!((table.total_weight() - 13.5).abs() < 1e-12);
        assert_eq!(FeatureTable::from_pairs(&DEFAULT_IMPORTANCE).unwrap(), table);
    }

    #[test]
    fn test_table_validation() {
        let missing = &DEFAULT_IMPORTANCE[..7];
        assert!(matches!(
            FeatureTable::from_pairs(missing),
            Err(AtlasError::InvalidWeights(_))
        ));

        let mut dup = DEFAULT_IMPORTANCE.to_vec();
        dup[7] = (Feature::C1Context, 1.0);
        assert!(FeatureTable::from_pairs(&dup).is_err());

        let zeros = DEFAULT_IMPORTANCE.map(|(f, _)| (f, 0.0));
        assert!(FeatureTable::from_pairs(&zeros).is_err());

        let mut negative = DEFAULT_IMPORTANCE;
        negative[2].1 = -1.0;
        assert!(FeatureTable::from_pairs(&negative).is_err());
    }

    #[test]
    fn test_identity_is_exact() {
        let ranker = DistanceRanker::default();
        for v in sample_vectors() {
            let score = ranker.score(&v, &v);
            assert_eq!(score.distance, 0.0);
            assert_eq!(score.match_type, MatchType::Exact);
            assert_eq!(score.similarity(), 1.0);
        }
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let ranker = DistanceRanker::default();
        let vectors = sample_vectors();
        for a in &vectors {
            for b in &vectors {
                let ab = ranker.distance(a, b);
                let ba = ranker.distance(b, a);
                assert_eq!(ab, ba);
                assert!((0.0..=1.0).contains(&ab), "distance {} out of bounds", ab);
                if a != b {
                    assert_eq!(ranker.score(a, b).match_type, MatchType::Inferred);
                }
            }
        }
    }

    #[test]
    fn test_maximal_distance() {
        let ranker = DistanceRanker::default();
        let low = fv([0; 8]);
        let high = fv([2, 2, 3, 2, 3, 2, 3, 2]);
        assert!((ranker.distance(&low, &high) - 1.0).abs() < 1e-12);
        assert_eq!(ranker.score(&low, &high).similarity(), 0.0);
    }

    #[test]
    fn test_single_feature_difference() {
        let ranker = DistanceRanker::default();
        let base = fv([0, 0, 2, 0, 1, 0, 0, 0]);
        let query = fv([2, 0, 2, 0, 1, 0, 0, 0]);

        // c1_context fully different: 2.5 of 13.5 total importance
        let score = ranker.score(&query, &base);
        assert!((score.distance - 2.5 / 13.5).abs() < 1e-12);
        assert!((score.similarity() - 0.8148).abs() < 1e-9);
        assert_eq!(score.match_type, MatchType::Inferred);

        // one step on a 4-valued action: (1/3) * 2.0 / 13.5
        let query = fv([0, 0, 1, 0, 1, 0, 0, 0]);
        let d = ranker.distance(&query, &base);
        assert!((d - (2.0 / 3.0) / 13.5).abs() < 1e-12);
    }

    #[test]
    fn test_custom_table_changes_ranking_weight() {
        let mut pairs = DEFAULT_IMPORTANCE;
        pairs[0].1 = 0.0;
        let ranker = DistanceRanker::new(FeatureTable::from_pairs(&pairs).unwrap());

        // c1_context no longer counts
        let a = fv([0, 0, 0, 0, 0, 0, 0, 0]);
        let b = fv([2, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ranker.distance(&a, &b), 0.0);

        let score = ranker.score(&a, &b);
        assert_eq!(score.match_type, MatchType::Inferred);
        assert_eq!(score.similarity(), 1.0);
        assert_eq!(ranker.score(&a, &a).match_type, MatchType::Exact);
    }

    #[test]
    fn test_similarity_rounding() {
        assert_eq!(similarity(0.0), 1.0);
        assert!((similarity(0.123449) - 0.8766).abs() < 1e-9);
        assert!((similarity(0.5) - 0.5).abs() < 1e-9);
        assert!((similarity(1.0 / 3.0) - 0.6667).abs() < 1e-9);

        // not representable as a Decimal: passed through unrounded
        assert!(similarity(f64::NAN).is_nan());
    }
}
