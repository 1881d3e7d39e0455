//! The staff event log.
//!
//! Every observable consequence of a tick is recorded here: the
//! presentation layer renders from it, the runner persists it, and the
//! determinism tests compare it byte for byte.
//! Variants are appended over time, never removed or reordered.

use crate::{
    activity::ActivityState,
    loyalty::RiskEventKind,
    role::{Role, TaskKind},
    types::{Day, RunId, TaskId, WorkerId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StaffEvent {
    // ── Roster ─────────────────────────────────────
    WorkerHired {
        day: Day,
        worker_id: WorkerId,
        role: Role,
        traits: Vec<String>,
        cost: f64,
    },
    HireRejected {
        day: Day,
        role: Role,
        reason: String,
    },
    WorkerDeparted {
        day: Day,
        worker_id: WorkerId,
        role: Role,
        reason: String,
        severance: f64,
    },
    WorkerLeveledUp {
        day: Day,
        worker_id: WorkerId,
        level: u32,
    },

    // ── Tasks ──────────────────────────────────────
    TaskAssigned {
        day: Day,
        worker_id: WorkerId,
        task_id: TaskId,
        kind: TaskKind,
        urgent: bool,
        required: f64,
    },
    TaskRejected {
        day: Day,
        worker_id: WorkerId,
        kind: TaskKind,
        reason: String,
    },
    TaskCompleted {
        day: Day,
        worker_id: WorkerId,
        task_id: TaskId,
        kind: TaskKind,
        target: Option<String>,
        quality: f64,
    },
    TaskFailed {
        day: Day,
        worker_id: WorkerId,
        task_id: TaskId,
        kind: TaskKind,
        target: Option<String>,
        cause: String,
    },
    TaskInterrupted {
        day: Day,
        worker_id: WorkerId,
        task_id: TaskId,
        progress: f64,
        requeued: bool,
    },

    // ── Activity ───────────────────────────────────
    StateChanged {
        day: Day,
        worker_id: WorkerId,
        from: ActivityState,
        to: ActivityState,
    },
    WorkerInjured {
        day: Day,
        worker_id: WorkerId,
        duration: f64,
    },

    // ── Risk ───────────────────────────────────────
    RiskEventRaised {
        day: Day,
        worker_id: WorkerId,
        kind: RiskEventKind,
        magnitude: f64,
        cause: String,
    },

    // ── Money ──────────────────────────────────────
    SalariesPaid {
        day: Day,
        total: f64,
        headcount: usize,
    },
    SalaryPaymentFailed {
        day: Day,
        total: f64,
        headcount: usize,
    },
    TipsDistributed {
        day: Day,
        total: f64,
        house_share: f64,
        recipients: usize,
    },
}

impl StaffEvent {
    /// Stable name used for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            StaffEvent::WorkerHired { .. }         => "worker_hired",
            StaffEvent::HireRejected { .. }        => "hire_rejected",
            StaffEvent::WorkerDeparted { .. }      => "worker_departed",
            StaffEvent::WorkerLeveledUp { .. }     => "worker_leveled_up",
            StaffEvent::TaskAssigned { .. }        => "task_assigned",
            StaffEvent::TaskRejected { .. }        => "task_rejected",
            StaffEvent::TaskCompleted { .. }       => "task_completed",
            StaffEvent::TaskFailed { .. }          => "task_failed",
            StaffEvent::TaskInterrupted { .. }     => "task_interrupted",
            StaffEvent::StateChanged { .. }        => "state_changed",
            StaffEvent::WorkerInjured { .. }       => "worker_injured",
            StaffEvent::RiskEventRaised { .. }     => "risk_event_raised",
            StaffEvent::SalariesPaid { .. }        => "salaries_paid",
            StaffEvent::SalaryPaymentFailed { .. } => "salary_payment_failed",
            StaffEvent::TipsDistributed { .. }     => "tips_distributed",
        }
    }

    pub fn day(&self) -> Day {
        match self {
            StaffEvent::WorkerHired { day, .. }
            | StaffEvent::HireRejected { day, .. }
            | StaffEvent::WorkerDeparted { day, .. }
            | StaffEvent::WorkerLeveledUp { day, .. }
            | StaffEvent::TaskAssigned { day, .. }
            | StaffEvent::TaskRejected { day, .. }
            | StaffEvent::TaskCompleted { day, .. }
            | StaffEvent::TaskFailed { day, .. }
            | StaffEvent::TaskInterrupted { day, .. }
            | StaffEvent::StateChanged { day, .. }
            | StaffEvent::WorkerInjured { day, .. }
            | StaffEvent::RiskEventRaised { day, .. }
            | StaffEvent::SalariesPaid { day, .. }
            | StaffEvent::SalaryPaymentFailed { day, .. }
            | StaffEvent::TipsDistributed { day, .. } => *day,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub day:        Day,
    pub event_type: String,
    pub payload:    String, // JSON-serialized StaffEvent
}

impl EventLogEntry {
    pub fn from_event(run_id: &str, event: &StaffEvent) -> serde_json::Result<Self> {
        Ok(Self {
            id:         None,
            run_id:     run_id.to_string(),
            day:        event.day(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        })
    }
}
