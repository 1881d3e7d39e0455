//! Timed stat modifiers.
//!
//! A temporary boost is an entry `(field, applied delta, expiry)`. The
//! delta stored is the one actually applied after clamping, so expiring
//! the entry reverts exactly what it added.

use crate::types::SimSeconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "name", rename_all = "snake_case")]
pub enum StatField {
    Skill(String),
    Mood,
    Energy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedModifier {
    pub field:      StatField,
    pub delta:      f64,
    pub expires_at: SimSeconds,
    pub source:     String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifierSet {
    entries: Vec<TimedModifier>,
}

impl ModifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, modifier: TimedModifier) {
        self.entries.push(modifier);
    }

    /// Remove and return every entry whose expiry is at or before `now`,
    /// in insertion order.
    pub fn take_expired(&mut self, now: SimSeconds) -> Vec<TimedModifier> {
        let (expired, live): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|m| m.expires_at <= now);
        self.entries = live;
        expired
    }

    /// Sum of live deltas on one field.
    pub fn total_for(&self, field: &StatField) -> f64 {
        self.entries
            .iter()
            .filter(|m| &m.field == field)
            .map(|m| m.delta)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimedModifier> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
