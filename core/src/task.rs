//! Task model and the required-duration formula.

use crate::{
    config::{QueueConfig, TaskKindConfig},
    role::TaskKind,
    types::{SimSeconds, TaskId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Urgent,
    Normal,
}

impl Priority {
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::Urgent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Active,
    Interrupted,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id:       TaskId,
    pub kind:     TaskKind,
    /// Customer id, table number, or other requester-defined reference.
    pub target:   Option<String>,
    pub priority: Priority,
    pub required: SimSeconds,
    pub elapsed:  SimSeconds,
    pub status:   TaskStatus,
    /// Ideal parameter vector the requester wants, for preference scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<Vec<f64>>,
}

impl Task {
    pub fn new(id: TaskId, kind: TaskKind, priority: Priority, required: SimSeconds) -> Self {
        Self {
            id,
            kind,
            target: None,
            priority,
            required: required.max(0.0),
            elapsed: 0.0,
            status: TaskStatus::Pending,
            preference: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_preference(mut self, optimal: Vec<f64>) -> Self {
        self.preference = Some(optimal);
        self
    }

    pub fn is_urgent(&self) -> bool {
        self.priority.is_urgent()
    }

    pub fn remaining(&self) -> SimSeconds {
        (self.required - self.elapsed).max(0.0)
    }

    pub fn progress(&self) -> f64 {
        if self.required <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.required).clamp(0.0, 1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Inputs to the duration formula, captured once at enqueue time.
#[derive(Debug, Clone, Copy)]
pub struct DurationInputs {
    pub relevant_skill: f64,
    pub speed_skill:    f64,
    pub energy:         f64,
    pub mood:           f64,
}

/// `base * type_mult * condition_mult * (1 - (relevant + speed)/4)`,
/// floored at `floor_fraction * base`.
pub fn required_duration(
    kind: &TaskKindConfig,
    queue: &QueueConfig,
    inputs: DurationInputs,
) -> SimSeconds {
    let base = kind.base_duration_secs.max(0.0);
    let condition = ((inputs.energy + inputs.mood) / 2.0).clamp(0.0, 1.0);
    let condition_mult = 1.0 + (1.0 - condition) * queue.fatigue_duration_penalty.max(0.0);
    let skill_mult = 1.0
        - (inputs.relevant_skill.clamp(0.0, 1.0) + inputs.speed_skill.clamp(0.0, 1.0)) / 4.0;
    let raw = base * kind.type_multiplier * condition_mult * skill_mult;
    raw.max(base * queue.duration_floor_fraction.clamp(0.0, 1.0))
}
