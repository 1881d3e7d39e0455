//! The Worker aggregate: one role, one queue, one state machine, one risk
//! engine. Role-specific behaviour comes from the `RoleConfig` row the
//! orchestrator passes in; there are no per-role worker types.

use crate::{
    activity::{ActivityState, ActivityStateMachine, Transition},
    config::{RoleConfig, RiskConfig, ScoringConfig, StaffConfig, TaskKindConfig},
    loyalty::{LoyaltyRiskEngine, Stat},
    modifier::{ModifierSet, StatField, TimedModifier},
    role::Role,
    scoring::{Factor, PreferenceProfile, ScoringModel},
    skill::{self, SkillProfile},
    task::{DurationInputs, Task},
    task_queue::TaskQueue,
    types::{Day, SimSeconds, WorkerId},
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Worker {
    pub id:          WorkerId,
    pub name:        String,
    pub role:        Role,
    pub skills:      SkillProfile,
    pub traits:      Vec<String>,
    pub activity:    ActivityStateMachine,
    pub queue:       TaskQueue,
    pub risk:        LoyaltyRiskEngine,
    pub modifiers:   ModifierSet,
    pub hired_day:   Day,
    pub tenure_days: u64,
    pub level:       u32,
    pub experience:  f64,
    /// Daily base salary; raises move this.
    pub base_salary: f64,
    /// Salary computed at the last payroll run.
    pub last_salary: f64,
    pub tips_earned: f64,
    /// Salary satisfaction from the last payroll run; negative after a missed payment.
    pub salary_factor: f64,
    /// Tip-policy satisfaction from the last tip distribution.
    pub tip_factor: f64,
    /// Skill name -> tasks completed today that exercised it.
    pub completed_today: BTreeMap<String, u32>,
    pub mishaps_today: u32,
}

impl Worker {
    /// Energy/mood condition in [0, 1].
    pub fn condition(&self) -> f64 {
        ((self.risk.energy + self.risk.mood) / 2.0).clamp(0.0, 1.0)
    }

    pub fn state(&self) -> ActivityState {
        self.activity.state()
    }

    pub fn duration_inputs(&self, kind: &TaskKindConfig) -> DurationInputs {
        DurationInputs {
            relevant_skill: self.skills.get(&kind.relevant_skill),
            speed_skill:    self.skills.get(skill::SPEED),
            energy:         self.risk.energy,
            mood:           self.risk.mood,
        }
    }

    /// Condition-derived multiplier on queue progress.
    pub fn service_rate(&self, model: &ScoringModel, config: &ScoringConfig) -> f64 {
        let performance = model.score(
            &[
                Factor::new(config.energy_weight, self.risk.energy),
                Factor::new(config.mood_weight, self.risk.mood),
            ],
            None,
        );
        config.service_rate_base + config.service_rate_span * performance
    }

    /// Quality of a finished task: role-weighted skills, the condition
    /// factor and, for tunable orders, closeness to the requested profile.
    pub fn task_quality(
        &self,
        model: &ScoringModel,
        role: &RoleConfig,
        scoring: &ScoringConfig,
        kind: &TaskKindConfig,
        preference: Option<&PreferenceProfile>,
    ) -> f64 {
        let mut factors: Vec<Factor> = role
            .scoring_weights
            .iter()
            .map(|(name, weight)| Factor::new(*weight, self.skills.get(name)))
            .collect();
        if !role.scoring_weights.contains_key(&kind.relevant_skill) {
            factors.push(Factor::new(0.2, self.skills.get(&kind.relevant_skill)));
        }
        factors.push(Factor::new(scoring.condition_weight, self.condition()));
        model.score(&factors, preference)
    }

    /// Apply a temporary change and remember exactly what was applied.
    pub fn apply_modifier(
        &mut self,
        risk_config: &RiskConfig,
        field: StatField,
        delta: f64,
        expires_at: SimSeconds,
        source: &str,
    ) -> f64 {
        let applied = match &field {
            StatField::Skill(name) => self.skills.adjust(name, delta),
            StatField::Mood => self.risk.adjust(risk_config, Stat::Mood, delta, source),
            StatField::Energy => self.risk.adjust(risk_config, Stat::Energy, delta, source),
        };
        self.modifiers.push(TimedModifier {
            field,
            delta: applied,
            expires_at,
            source: source.to_string(),
        });
        applied
    }

    /// Revert every modifier that has expired at `now`.
    pub fn expire_modifiers(&mut self, risk_config: &RiskConfig, now: SimSeconds) -> Vec<TimedModifier> {
        let expired = self.modifiers.take_expired(now);
        for m in &expired {
            let reason = format!("{} expired", m.source);
            match &m.field {
                StatField::Skill(name) => {
                    self.skills.adjust(name, -m.delta);
                }
                StatField::Mood => {
                    self.risk.adjust(risk_config, Stat::Mood, -m.delta, &reason);
                }
                StatField::Energy => {
                    self.risk.adjust(risk_config, Stat::Energy, -m.delta, &reason);
                }
            }
        }
        expired
    }

    /// Clear the whole queue and return to Idle.
    pub fn cancel_all(&mut self) -> (Vec<Task>, Option<Transition>) {
        let cancelled = self.queue.cancel();
        let transition = self.activity.reset_idle();
        (cancelled, transition)
    }

    pub fn record_completion(&mut self, skill_name: &str) {
        *self.completed_today.entry(skill_name.to_string()).or_insert(0) += 1;
    }

    pub fn tasks_completed_today(&self) -> u32 {
        self.completed_today.values().sum()
    }

    /// `base × skill × tenure × level × trait` modifiers.
    pub fn compute_salary(&self, config: &StaffConfig) -> f64 {
        let p = &config.payroll;
        let skill_mod = p.skill_modifier_base + p.skill_modifier_span * self.skills.get(self.role.primary_skill());
        let tenure_mod = 1.0 + (self.tenure_days as f64 * p.tenure_step).min(p.tenure_cap);
        let level_mod = 1.0 + p.level_step * self.level.saturating_sub(1) as f64;
        let trait_mod: f64 = self
            .traits
            .iter()
            .filter_map(|t| config.traits.get(t))
            .map(|t| t.salary_multiplier)
            .product();
        self.base_salary * skill_mod * tenure_mod * level_mod * trait_mod
    }

    /// Extra per-task mishap chance contributed by traits.
    pub fn trait_mishap_chance(&self, config: &StaffConfig) -> f64 {
        self.traits
            .iter()
            .filter_map(|t| config.traits.get(t))
            .map(|t| t.mishap_chance)
            .sum()
    }

    /// Every current stat as a flat key/value map for display.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        out.insert("id".into(), json!(self.id));
        out.insert("name".into(), json!(self.name));
        out.insert("role".into(), json!(self.role.name()));
        out.insert("state".into(), json!(self.state().name()));
        out.insert("level".into(), json!(self.level));
        out.insert("experience".into(), json!(self.experience));
        out.insert("tenure_days".into(), json!(self.tenure_days));
        out.insert("base_salary".into(), json!(self.base_salary));
        out.insert("last_salary".into(), json!(self.last_salary));
        out.insert("tips_earned".into(), json!(self.tips_earned));
        out.insert("traits".into(), json!(self.traits));
        for stat in Stat::ALL {
            out.insert(stat.name().into(), json!(self.risk.get(stat)));
        }
        for (name, value) in self.skills.iter() {
            out.insert(format!("skill.{name}"), json!(value));
        }
        out.insert("queue_length".into(), json!(self.queue.len()));
        out.insert("queue_capacity".into(), json!(self.queue.max_concurrent()));
        if let Some(task) = self.queue.peek_active() {
            out.insert("active_task".into(), json!(task.kind.name()));
            out.insert("active_progress".into(), json!(task.progress()));
        }
        out.insert("active_modifiers".into(), json!(self.modifiers.len()));
        out.insert("tasks_completed_today".into(), json!(self.tasks_completed_today()));
        out
    }
}
