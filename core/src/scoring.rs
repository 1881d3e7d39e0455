//! Weighted multi-factor scoring.
//!
//! One scorer is shared by every role: task quality at completion and the
//! service rate a worker advances its queue at are both weighted means of
//! unit-interval factors. Activities with tunable continuous parameters
//! (a drink's strength and sweetness, a dish's seasoning) additionally pass
//! a preference profile whose distance from the ideal is blended in.
//!
//! Contract: the result is always in [floor, 1] and never decreases when a
//! single factor value increases.

use crate::config::ScoringConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Factor {
    pub weight: f64,
    pub value:  f64,
}

impl Factor {
    /// Negative weights are treated as zero; values are clamped to [0, 1].
    pub fn new(weight: f64, value: f64) -> Self {
        Self {
            weight: if weight.is_finite() { weight.max(0.0) } else { 0.0 },
            value:  if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) },
        }
    }
}

/// Actual vs. ideal parameter vectors, one entry per tunable dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    pub actual:  Vec<f64>,
    pub optimal: Vec<f64>,
}

impl PreferenceProfile {
    pub fn new(actual: Vec<f64>, optimal: Vec<f64>) -> Self {
        Self { actual, optimal }
    }

    /// Mean of `1 - |actual - optimal|` over paired dimensions.
    /// Unpaired trailing dimensions are ignored; no dimensions scores 1.0.
    pub fn closeness(&self) -> f64 {
        let pairs: Vec<f64> = self
            .actual
            .iter()
            .zip(self.optimal.iter())
            .map(|(a, o)| 1.0 - (a.clamp(0.0, 1.0) - o.clamp(0.0, 1.0)).abs())
            .collect();
        if pairs.is_empty() {
            return 1.0;
        }
        pairs.iter().sum::<f64>() / pairs.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct ScoringModel {
    floor: f64,
    preference_weight: f64,
}

impl ScoringModel {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            floor: config.floor.clamp(f64::EPSILON, 1.0),
            preference_weight: config.preference_weight.clamp(0.0, 1.0),
        }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    pub fn score(&self, factors: &[Factor], preference: Option<&PreferenceProfile>) -> f64 {
        let total_weight: f64 = factors.iter().map(|f| f.weight).sum();
        let base = if total_weight > 0.0 {
            factors.iter().map(|f| f.weight * f.value).sum::<f64>() / total_weight
        } else {
            0.0
        };

        let blended = match preference {
            Some(profile) => {
                let pw = self.preference_weight;
                base * (1.0 - pw) + profile.closeness() * pw
            }
            None => base,
        };

        blended.clamp(self.floor, 1.0)
    }
}
