//! Roster serialization: the structured records the save layer stores.
//!
//! A record carries everything needed to resume a worker exactly where it
//! left off: identity, role, stats, skills, traits, tenure, live modifiers,
//! activity timers and every in-flight task with its elapsed/required
//! durations, in dequeue order.

use crate::{
    activity::{ActivityState, ActivityStateMachine},
    error::SimResult,
    loyalty::LoyaltyRiskEngine,
    modifier::ModifierSet,
    role::Role,
    skill::SkillProfile,
    task::Task,
    task_queue::TaskQueue,
    types::{Day, SimSeconds, WorkerId},
    worker::Worker,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id:     WorkerId,
    pub name:   String,
    pub role:   Role,
    pub skills: SkillProfile,
    pub traits: Vec<String>,
    pub stats:  LoyaltyRiskEngine,

    pub activity_state: ActivityState,
    #[serde(default)]
    pub special_until: Option<SimSeconds>,
    #[serde(default)]
    pub unavailable_remaining: Option<SimSeconds>,
    #[serde(default)]
    pub modifiers: ModifierSet,

    pub queue_capacity: usize,
    /// Active task first, then urgent, then normal.
    pub tasks: Vec<Task>,

    pub hired_day:   Day,
    pub tenure_days: u64,
    pub level:       u32,
    pub experience:  f64,
    pub base_salary: f64,
    pub last_salary: f64,
    pub tips_earned: f64,
    #[serde(default)]
    pub salary_factor: f64,
    #[serde(default)]
    pub tip_factor: f64,
    #[serde(default)]
    pub completed_today: BTreeMap<String, u32>,
    #[serde(default)]
    pub mishaps_today: u32,
}

impl WorkerRecord {
    pub fn from_worker(worker: &Worker) -> Self {
        Self {
            id:     worker.id.clone(),
            name:   worker.name.clone(),
            role:   worker.role,
            skills: worker.skills.clone(),
            traits: worker.traits.clone(),
            stats:  worker.risk.clone(),

            activity_state:        worker.activity.state(),
            special_until:         worker.activity.special_until(),
            unavailable_remaining: worker.activity.unavailable_remaining(),
            modifiers:             worker.modifiers.clone(),

            queue_capacity: worker.queue.max_concurrent(),
            tasks:          worker.queue.iter().cloned().collect(),

            hired_day:       worker.hired_day,
            tenure_days:     worker.tenure_days,
            level:           worker.level,
            experience:      worker.experience,
            base_salary:     worker.base_salary,
            last_salary:     worker.last_salary,
            tips_earned:     worker.tips_earned,
            salary_factor:   worker.salary_factor,
            tip_factor:      worker.tip_factor,
            completed_today: worker.completed_today.clone(),
            mishaps_today:   worker.mishaps_today,
        }
    }

    pub fn into_worker(self) -> Worker {
        let occupied = self.tasks.iter().any(|t| !t.is_finished());
        let mut activity = ActivityStateMachine::restore(
            self.activity_state,
            self.special_until,
            self.unavailable_remaining,
        );
        activity.sync_with_queue(occupied);

        Worker {
            id:     self.id,
            name:   self.name,
            role:   self.role,
            skills: self.skills,
            traits: self.traits,
            activity,
            queue:  TaskQueue::restore(self.queue_capacity, self.tasks),
            risk:   self.stats,
            modifiers: self.modifiers,
            hired_day:   self.hired_day,
            tenure_days: self.tenure_days,
            level:       self.level,
            experience:  self.experience,
            base_salary: self.base_salary,
            last_salary: self.last_salary,
            tips_earned: self.tips_earned,
            salary_factor: self.salary_factor,
            tip_factor:    self.tip_factor,
            completed_today: self.completed_today,
            mishaps_today:   self.mishaps_today,
        }
    }
}

pub fn serialize_roster(roster: &[Worker]) -> Vec<WorkerRecord> {
    roster.iter().map(WorkerRecord::from_worker).collect()
}

pub fn deserialize_roster(records: Vec<WorkerRecord>) -> Vec<Worker> {
    records.into_iter().map(WorkerRecord::into_worker).collect()
}

pub fn roster_to_json(roster: &[Worker]) -> SimResult<String> {
    Ok(serde_json::to_string(&serialize_roster(roster))?)
}

pub fn roster_from_json(json: &str) -> SimResult<Vec<Worker>> {
    let records: Vec<WorkerRecord> = serde_json::from_str(json)?;
    Ok(deserialize_roster(records))
}
