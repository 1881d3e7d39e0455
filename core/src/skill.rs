//! Per-worker skill profile: named skill values clamped to [0, 1].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const COOKING:    &str = "cooking";
pub const SERVICE:    &str = "service";
pub const MIXOLOGY:   &str = "mixology";
pub const CLEANING:   &str = "cleaning";
pub const SECURITY:   &str = "security";
pub const MANAGEMENT: &str = "management";
pub const SPEED:      &str = "speed";
pub const CHARISMA:   &str = "charisma";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillProfile {
    values: BTreeMap<String, f64>,
}

impl SkillProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw values; every entry is clamped.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut profile = Self::new();
        for (name, value) in values {
            profile.set(name, value);
        }
        profile
    }

    /// Value of `name`, or 0.0 for a skill the worker has never had.
    pub fn get(&self, name: &str) -> f64 {
        self.values.get(name).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), clamp_unit(value));
    }

    /// Add `delta` and clamp. Returns the delta actually applied, which
    /// callers need to revert a temporary modifier exactly.
    pub fn adjust(&mut self, name: &str, delta: f64) -> f64 {
        let before = self.get(name);
        let after = clamp_unit(before + delta);
        self.values.insert(name.to_string(), after);
        after - before
    }

    /// Move a skill a fraction of the remaining distance toward 1.0.
    pub fn train(&mut self, name: &str, rate: f64) -> f64 {
        let before = self.get(name);
        let gain = (1.0 - before) * rate.clamp(0.0, 1.0);
        self.adjust(name, gain)
    }

    /// Sum of every skill value; the weight used for tip splitting.
    pub fn aggregate(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
