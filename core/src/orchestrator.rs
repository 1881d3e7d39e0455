//! The staff orchestrator — owns the roster and drives every tick.
//!
//! EXECUTION ORDER within `tick(dt)` (fixed, never reordered):
//!   1. Clock advances and reports crossed hour/day boundaries.
//!   2. For each worker, in roster order:
//!        a. expire timed modifiers
//!        b. advance the task queue at the worker's service rate
//!        c. score or fail any completed task
//!        d. reconcile the activity state machine with the queue
//!   3. One hourly pass per crossed hour boundary.
//!
//! Day boundaries are reported to the host, which then calls
//! `daily_tick`, `pay_salaries` and `distribute_tips` on its own schedule.
//!
//! RULES:
//!   - The orchestrator is the only writer of the roster.
//!   - Collaborators are injected at construction; nothing is looked up.
//!   - All randomness flows through per-day RngBank streams.
//!   - Every observable consequence is pushed to the event log.

use crate::{
    activity::{ActivityStateMachine, Transition},
    clock::{ClockBoundary, SimClock},
    collaborator::{Customer, Economy, Ledger, Reputation, ReputationBoard},
    config::StaffConfig,
    error::{SimError, SimResult},
    event::StaffEvent,
    loyalty::{LoyaltyRiskEngine, RiskEvent, RiskEventKind, Stat},
    modifier::{ModifierSet, StatField},
    name_generator::NameGenerator,
    persistence::{self, WorkerRecord},
    rng::{RngBank, RngSlot, SubsystemRng},
    role::{Role, TaskKind},
    scoring::{PreferenceProfile, ScoringModel},
    skill::{self, SkillProfile},
    task::{required_duration, Priority, Task, TaskStatus},
    task_queue::{EnqueueOutcome, TaskQueue},
    types::{Day, SimSeconds, TaskId, WorkerId},
    worker::Worker,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HireOutcome {
    Hired(WorkerId),
    RejectedCapacityFull,
    RejectedInsufficientFunds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureReason {
    Dismissed,
    Resigned,
}

impl DepartureReason {
    pub fn name(&self) -> &'static str {
        match self {
            DepartureReason::Dismissed => "dismissed",
            DepartureReason::Resigned  => "resigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireReport {
    pub worker_id: WorkerId,
    pub severance: f64,
    /// Remaining workers whose loyalty took the contagion hit.
    pub contagion_hits: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOutcome {
    Accepted(TaskId),
    RejectedCapacityFull,
    RejectedUnavailable,
    RejectedRoleMismatch,
    /// The interaction target had nothing to ask for.
    Ignored,
}

/// What a requester wants done.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskRequest {
    pub kind:       TaskKind,
    pub priority:   Priority,
    pub target:     Option<String>,
    pub preference: Option<Vec<f64>>,
}

impl TaskRequest {
    pub fn normal(kind: TaskKind) -> Self {
        Self { kind, priority: Priority::Normal, target: None, preference: None }
    }

    pub fn urgent(kind: TaskKind) -> Self {
        Self { kind, priority: Priority::Urgent, target: None, preference: None }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_preference(mut self, optimal: Vec<f64>) -> Self {
        self.preference = Some(optimal);
        self
    }
}

/// A task that left a queue this tick, scored or failed.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutcome {
    pub worker_id: WorkerId,
    pub task:      Task,
    /// Present for completed tasks.
    pub quality:   Option<f64>,
    /// Present for failed tasks.
    pub cause:     Option<String>,
}

impl TaskOutcome {
    pub fn failed(&self) -> bool {
        self.task.status == TaskStatus::Failed
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub scaled_dt:    SimSeconds,
    pub outcomes:     Vec<TaskOutcome>,
    pub transitions:  Vec<(WorkerId, Transition)>,
    pub hours_passed: u32,
    /// Days that began during this tick; the host runs `daily_tick` for each.
    pub days_started: Vec<Day>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyReport {
    pub day:        Day,
    pub events:     Vec<RiskEvent>,
    pub departures: Vec<WorkerId>,
    pub level_ups:  Vec<(WorkerId, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayrollOutcome {
    Paid {
        total: f64,
    },
    Failed {
        total:     f64,
        /// Loyalty of every worker after the penalty, in roster order.
        penalized: Vec<(WorkerId, f64)>,
        /// Immediate resignations and disloyal acts triggered by the failure.
        events:    Vec<RiskEvent>,
    },
}

impl PayrollOutcome {
    pub fn is_paid(&self) -> bool {
        matches!(self, PayrollOutcome::Paid { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TipReport {
    pub house_share: f64,
    pub payouts:     Vec<(WorkerId, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversation {
    Praise,
    Reprimand,
    /// Permanent raise, in percent of base salary.
    Raise(f64),
}

// ── RNG streams ──────────────────────────────────────────────────────────────

/// One live stream per (slot, day). A stream is built on first use and kept
/// until its day is retired, so revisiting a day never replays its draws.
struct RngStreams {
    bank:    RngBank,
    streams: BTreeMap<(RngSlot, Day), SubsystemRng>,
}

impl RngStreams {
    fn new(bank: RngBank) -> Self {
        Self { bank, streams: BTreeMap::new() }
    }

    fn get(&mut self, slot: RngSlot, day: Day) -> &mut SubsystemRng {
        let bank = &self.bank;
        self.streams
            .entry((slot, day))
            .or_insert_with(|| bank.for_slot_at_day(slot, day))
    }

    /// Drop every stream for days before `day`.
    fn retire_before(&mut self, day: Day) {
        self.streams.retain(|(_, d), _| *d >= day);
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

pub struct StaffOrchestrator<E: Economy, R: Reputation> {
    config:       StaffConfig,
    scoring:      ScoringModel,
    clock:        SimClock,
    streams:      RngStreams,
    roster:       Vec<Worker>,
    economy:      E,
    reputation:   R,
    next_task_id: TaskId,
    events:       Vec<StaffEvent>,
}

impl<E: Economy, R: Reputation> StaffOrchestrator<E, R> {
    pub fn new(config: StaffConfig, seed: u64, economy: E, reputation: R) -> Self {
        Self {
            scoring:      ScoringModel::new(&config.scoring),
            clock:        SimClock::new(&config.clock),
            streams:      RngStreams::new(RngBank::new(seed)),
            roster:       Vec::new(),
            economy,
            reputation,
            next_task_id: 1,
            events:       Vec::new(),
            config,
        }
    }

    // ── Accessors ────────────────────────────────────────────

    pub fn config(&self) -> &StaffConfig {
        &self.config
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimClock {
        &mut self.clock
    }

    pub fn day(&self) -> Day {
        self.clock.current_day()
    }

    pub fn roster(&self) -> &[Worker] {
        &self.roster
    }

    pub fn worker(&self, id: &str) -> Option<&Worker> {
        self.roster.iter().find(|w| w.id == id)
    }

    pub fn worker_mut(&mut self, id: &str) -> Option<&mut Worker> {
        self.roster.iter_mut().find(|w| w.id == id)
    }

    pub fn headcount(&self, role: Role) -> usize {
        self.roster.iter().filter(|w| w.role == role).count()
    }

    pub fn economy(&self) -> &E {
        &self.economy
    }

    pub fn economy_mut(&mut self) -> &mut E {
        &mut self.economy
    }

    pub fn reputation(&self) -> &R {
        &self.reputation
    }

    pub fn events(&self) -> &[StaffEvent] {
        &self.events
    }

    /// Hand the accumulated event log to the host.
    pub fn drain_events(&mut self) -> Vec<StaffEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self, id: &str) -> SimResult<BTreeMap<String, Value>> {
        self.worker(id)
            .map(Worker::snapshot)
            .ok_or_else(|| SimError::UnknownWorker { id: id.to_string() })
    }

    fn index_of(&self, id: &str) -> SimResult<usize> {
        self.roster
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| SimError::UnknownWorker { id: id.to_string() })
    }

    // ── Hiring and firing ────────────────────────────────────

    pub fn hire(&mut self, role: Role, traits: &[&str]) -> SimResult<HireOutcome> {
        let day = self.day();
        let role_cfg = self
            .config
            .role(role)
            .ok_or_else(|| SimError::UnknownRole { role: role.to_string() })?
            .clone();

        let mut trait_cfgs = Vec::with_capacity(traits.len());
        for name in traits {
            let t = self
                .config
                .traits
                .get(*name)
                .ok_or_else(|| SimError::UnknownTrait { name: name.to_string() })?;
            trait_cfgs.push(t.clone());
        }

        if self.headcount(role) >= role_cfg.max_headcount {
            log::info!("day={day} hire {role} rejected: headcount {} reached", role_cfg.max_headcount);
            self.events.push(StaffEvent::HireRejected {
                day,
                role,
                reason: "capacity_full".into(),
            });
            return Ok(HireOutcome::RejectedCapacityFull);
        }

        let cost = role_cfg.hire_cost * trait_cfgs.iter().map(|t| t.hire_cost_multiplier).product::<f64>();
        if !self.economy.withdraw(cost, "hiring") {
            log::info!("day={day} hire {role} rejected: cannot afford {cost:.2}");
            self.events.push(StaffEvent::HireRejected {
                day,
                role,
                reason: "insufficient_funds".into(),
            });
            return Ok(HireOutcome::RejectedInsufficientFunds);
        }

        let hiring_rng = self.streams.get(RngSlot::Hiring, day);
        let id = format!("w-{}", uuid::Builder::from_random_bytes(hiring_rng.bytes16()).into_uuid());

        let mut skills = SkillProfile::new();
        for (name, base) in &role_cfg.base_skills {
            skills.set(name.clone(), base + hiring_rng.range(-0.05, 0.05));
        }
        for t in &trait_cfgs {
            for (name, delta) in &t.skill_deltas {
                skills.adjust(name, *delta);
            }
        }
        let loyalty_bias: f64 = trait_cfgs.iter().map(|t| t.loyalty_bias).sum();

        let taken: Vec<&str> = self.roster.iter().map(|w| w.name.as_str()).collect();
        let name = NameGenerator::generate_unique_name(self.streams.get(RngSlot::Names, day), &taken);

        let mut worker = Worker {
            id: id.clone(),
            name,
            role,
            skills,
            traits: traits.iter().map(|t| t.to_string()).collect(),
            activity: ActivityStateMachine::new(),
            queue: TaskQueue::new(role_cfg.max_concurrent_tasks),
            risk: LoyaltyRiskEngine::new(&self.config.risk, loyalty_bias),
            modifiers: ModifierSet::new(),
            hired_day: day,
            tenure_days: 0,
            level: 1,
            experience: 0.0,
            base_salary: role_cfg.base_salary,
            last_salary: 0.0,
            tips_earned: 0.0,
            salary_factor: 0.0,
            tip_factor: 0.0,
            completed_today: BTreeMap::new(),
            mishaps_today: 0,
        };
        worker.last_salary = worker.compute_salary(&self.config);

        log::info!("day={day} hired {} ({role}) as {id} for {cost:.2}", worker.name);
        self.events.push(StaffEvent::WorkerHired {
            day,
            worker_id: id.clone(),
            role,
            traits: worker.traits.clone(),
            cost,
        });
        self.roster.push(worker);
        Ok(HireOutcome::Hired(id))
    }

    pub fn fire(&mut self, id: &str, reason: DepartureReason) -> SimResult<FireReport> {
        let day = self.day();
        let idx = self.index_of(id)?;
        let mut worker = self.roster.remove(idx);

        let (cancelled, _) = worker.cancel_all();
        for task in cancelled {
            self.events.push(StaffEvent::TaskFailed {
                day,
                worker_id: worker.id.clone(),
                task_id: task.id,
                kind: task.kind,
                target: task.target.clone(),
                cause: "worker departed".into(),
            });
        }

        let mut severance = 0.0;
        if reason == DepartureReason::Dismissed {
            let owed = worker.compute_salary(&self.config) * self.config.payroll.severance_days;
            if self.economy.withdraw(owed, "severance") {
                severance = owed;
            } else {
                log::warn!("day={day} severance {owed:.2} for {} could not be paid", worker.id);
            }
        }

        let mut contagion_hits = 0;
        let payroll = &self.config.payroll;
        let morale_rng = self.streams.get(RngSlot::Morale, day);
        for other in &mut self.roster {
            if morale_rng.chance(payroll.contagion_chance) {
                other.risk.adjust(&self.config.risk, Stat::Loyalty, -payroll.contagion_penalty, "colleague left");
                contagion_hits += 1;
            }
        }

        log::info!(
            "day={day} {} ({}) left: {} severance={severance:.2} contagion={contagion_hits}",
            worker.name, worker.role, reason.name()
        );
        self.events.push(StaffEvent::WorkerDeparted {
            day,
            worker_id: worker.id.clone(),
            role: worker.role,
            reason: reason.name().into(),
            severance,
        });

        Ok(FireReport { worker_id: worker.id, severance, contagion_hits })
    }

    // ── Task intake ──────────────────────────────────────────

    /// Queue a task for one worker. Urgent requests to a role that
    /// preempts interrupt the active normal task.
    pub fn assign(&mut self, id: &str, request: TaskRequest) -> SimResult<AssignOutcome> {
        let idx = self.index_of(id)?;
        let preempts = self
            .config
            .role(self.roster[idx].role)
            .is_some_and(|r| r.preempts_on_urgent);
        let preempt = preempts && request.priority.is_urgent();
        self.enqueue_for(idx, request, preempt)
    }

    /// Queue an urgent task and interrupt whatever is active, regardless of role policy.
    pub fn preempt(&mut self, id: &str, kind: TaskKind) -> SimResult<AssignOutcome> {
        let idx = self.index_of(id)?;
        self.enqueue_for(idx, TaskRequest::urgent(kind), true)
    }

    /// One interaction with a customer: the worker is Talking for the
    /// duration of the call and the request is queued.
    pub fn serve_customer(&mut self, id: &str, customer: &mut dyn Customer) -> SimResult<AssignOutcome> {
        let day = self.day();
        if !customer.has_request() {
            log::warn!("day={day} customer '{}' has no request; ignoring", customer.id());
            return Ok(AssignOutcome::Ignored);
        }
        let idx = self.index_of(id)?;
        if !self.roster[idx].activity.is_available() {
            return self.enqueue_for(idx, TaskRequest::normal(customer.request_kind()), false);
        }

        let begin = self.roster[idx].activity.begin_talking();
        self.note_transition(day, idx, begin, None);

        let mut request = if customer.is_high_priority() {
            TaskRequest::urgent(customer.request_kind())
        } else {
            TaskRequest::normal(customer.request_kind())
        };
        request.target = Some(customer.id().to_string());
        request.preference = customer.preference();

        let outcome = self.assign(id, request)?;
        if outcome == AssignOutcome::RejectedCapacityFull {
            customer.adjust_satisfaction(-0.05, "kept waiting");
        }

        let now = self.clock.now();
        let worker = &mut self.roster[idx];
        let occupied = !worker.queue.is_empty();
        let end = worker.activity.end_talking(now, occupied);
        self.note_transition(day, idx, end, None);

        Ok(outcome)
    }

    fn enqueue_for(&mut self, idx: usize, request: TaskRequest, preempt: bool) -> SimResult<AssignOutcome> {
        let day = self.day();
        let worker_id = self.roster[idx].id.clone();

        let reject = |events: &mut Vec<StaffEvent>, reason: &str| {
            events.push(StaffEvent::TaskRejected {
                day,
                worker_id: worker_id.clone(),
                kind: request.kind,
                reason: reason.into(),
            });
        };

        if !self.roster[idx].activity.is_available() {
            reject(&mut self.events, "unavailable");
            return Ok(AssignOutcome::RejectedUnavailable);
        }
        let handles = self
            .config
            .role(self.roster[idx].role)
            .is_some_and(|r| r.handles(request.kind));
        if !handles {
            reject(&mut self.events, "role_mismatch");
            return Ok(AssignOutcome::RejectedRoleMismatch);
        }
        let kind_cfg = self
            .config
            .task(request.kind)
            .ok_or_else(|| SimError::InvalidReference { what: format!("task kind {}", request.kind) })?;

        let worker = &mut self.roster[idx];
        let required = required_duration(kind_cfg, &self.config.queue, worker.duration_inputs(kind_cfg));
        let mut task = Task::new(self.next_task_id, request.kind, request.priority, required);
        task.target = request.target.clone();
        task.preference = request.preference.clone();

        match worker.queue.enqueue(task) {
            EnqueueOutcome::RejectedCapacityFull => {
                log::debug!("day={day} {worker_id} queue full; {} rejected", request.kind);
                reject(&mut self.events, "capacity_full");
                return Ok(AssignOutcome::RejectedCapacityFull);
            }
            EnqueueOutcome::Accepted => {}
        }

        let task_id = self.next_task_id;
        self.next_task_id += 1;
        self.events.push(StaffEvent::TaskAssigned {
            day,
            worker_id: worker_id.clone(),
            task_id,
            kind: request.kind,
            urgent: request.priority.is_urgent(),
            required,
        });

        let active_is_other_normal = worker
            .queue
            .peek_active()
            .is_some_and(|t| t.id != task_id && !t.is_urgent());
        if preempt && active_is_other_normal {
            if let Some(interrupted) = worker.queue.interrupt() {
                self.events.push(StaffEvent::TaskInterrupted {
                    day,
                    worker_id: worker_id.clone(),
                    task_id: interrupted.task.id,
                    progress: interrupted.task.progress(),
                    requeued: interrupted.requeued,
                });
            }
        }

        let worker = &mut self.roster[idx];
        let occupied = !worker.queue.is_empty();
        let t = worker.activity.sync_with_queue(occupied);
        self.note_transition(day, idx, t, None);

        Ok(AssignOutcome::Accepted(task_id))
    }

    /// Drop every queued task for one worker and return them to Idle.
    pub fn cancel_tasks(&mut self, id: &str) -> SimResult<Vec<Task>> {
        let day = self.day();
        let idx = self.index_of(id)?;
        let (cancelled, t) = self.roster[idx].cancel_all();
        self.push_failed(day, idx, &cancelled, "cancelled");
        self.note_transition(day, idx, t, None);
        Ok(cancelled)
    }

    // ── Explicit state triggers ──────────────────────────────

    /// Start the role's special behaviour. Returns false when refused.
    pub fn trigger_special(&mut self, id: &str) -> SimResult<bool> {
        let day = self.day();
        let now = self.clock.now();
        let idx = self.index_of(id)?;
        let special = match self.config.role(self.roster[idx].role) {
            Some(r) => r.special.clone(),
            None => return Ok(false),
        };

        let worker = &mut self.roster[idx];
        let t = worker.activity.trigger_special(now, special.duration_secs);
        if t.is_none() {
            return Ok(false);
        }
        worker.apply_modifier(
            &self.config.risk,
            StatField::Skill(special.skill.clone()),
            special.delta,
            now + special.duration_secs,
            &special.label,
        );
        worker.risk.adjust(&self.config.risk, Stat::Energy, -special.energy_cost, &special.label);
        log::debug!("day={day} {id} started '{}' for {:.0}s", special.label, special.duration_secs);
        self.note_transition(day, idx, t, None);
        Ok(true)
    }

    /// Take a worker out of service: their queue is cleared and they are
    /// Unavailable for `duration` seconds.
    pub fn incapacitate(&mut self, id: &str, duration: SimSeconds) -> SimResult<()> {
        let day = self.day();
        let idx = self.index_of(id)?;
        self.injure(day, idx, duration, "incapacitated");
        Ok(())
    }

    pub fn recover(&mut self, id: &str) -> SimResult<bool> {
        let day = self.day();
        let idx = self.index_of(id)?;
        let t = self.roster[idx].activity.recover();
        let recovered = t.is_some();
        self.note_transition(day, idx, t, None);
        Ok(recovered)
    }

    pub fn converse(&mut self, id: &str, conversation: Conversation) -> SimResult<()> {
        let day = self.day();
        let now = self.clock.now();
        let idx = self.index_of(id)?;
        let risk_cfg = &self.config.risk;
        let talk = &self.config.conversation;
        let worker = &mut self.roster[idx];

        let begin = worker.activity.begin_talking();
        match conversation {
            Conversation::Praise => {
                worker.risk.adjust(risk_cfg, Stat::Mood, talk.praise_mood, "praised");
                worker.risk.adjust(risk_cfg, Stat::Loyalty, talk.praise_loyalty, "praised");
            }
            Conversation::Reprimand => {
                worker.risk.adjust(risk_cfg, Stat::Mood, talk.reprimand_mood, "reprimanded");
                worker.risk.adjust(risk_cfg, Stat::Loyalty, talk.reprimand_loyalty, "reprimanded");
                worker.risk.adjust(risk_cfg, Stat::Energy, talk.reprimand_energy, "reprimanded");
            }
            Conversation::Raise(pct) => {
                let pct = pct.max(0.0);
                worker.base_salary *= 1.0 + pct / 100.0;
                worker.risk.adjust(risk_cfg, Stat::Loyalty, pct * talk.raise_loyalty_per_pct, "raise");
                worker.risk.adjust(risk_cfg, Stat::Satisfaction, pct * talk.raise_loyalty_per_pct, "raise");
            }
        }
        let occupied = !worker.queue.is_empty();
        let end = worker.activity.end_talking(now, occupied);

        self.note_transition(day, idx, begin, None);
        self.note_transition(day, idx, end, None);
        Ok(())
    }

    // ── Continuous tick ──────────────────────────────────────

    pub fn tick(&mut self, dt: SimSeconds) -> TickReport {
        let step = self.clock.advance(dt);
        let now = self.clock.now();
        let day = self.clock.current_day();
        let mut report = TickReport { scaled_dt: step.scaled_dt, ..TickReport::default() };

        for idx in 0..self.roster.len() {
            let worker = &mut self.roster[idx];
            worker.expire_modifiers(&self.config.risk, now);

            let rate = worker.service_rate(&self.scoring, &self.config.scoring);
            if let Some(done) = worker.queue.advance(step.scaled_dt, rate) {
                let rng = self.streams.get(RngSlot::Tasks, day);
                let outcome = finish_task(&self.config, &self.scoring, worker, rng, done);
                self.events.push(outcome_event(day, &outcome));
                report.outcomes.push(outcome);
            }

            let worker = &mut self.roster[idx];
            let occupied = !worker.queue.is_empty();
            let t = worker.activity.advance(now, step.scaled_dt, occupied);
            self.note_transition(day, idx, t, Some(&mut report));
        }

        for boundary in step.boundaries {
            match boundary {
                ClockBoundary::Hour { day, .. } => {
                    self.hourly_pass(day, &mut report);
                    report.hours_passed += 1;
                }
                ClockBoundary::Day { day } => report.days_started.push(day),
            }
        }

        report
    }

    /// Energy drain and recovery, rest transitions, coupling, injuries.
    pub fn hourly_tick(&mut self) -> TickReport {
        let mut report = TickReport::default();
        let day = self.day();
        self.hourly_pass(day, &mut report);
        report.hours_passed = 1;
        report
    }

    fn hourly_pass(&mut self, day: Day, report: &mut TickReport) {
        use crate::activity::ActivityState as S;

        for idx in 0..self.roster.len() {
            let energy_cfg = &self.config.energy;
            let risk_cfg = &self.config.risk;
            let worker = &mut self.roster[idx];

            let mut transition = None;
            match worker.state() {
                S::Working | S::Special => {
                    worker.risk.adjust(risk_cfg, Stat::Energy, -energy_cfg.work_drain_per_hour, "worked an hour");
                }
                S::Resting => {
                    worker.risk.adjust(risk_cfg, Stat::Energy, energy_cfg.rest_recovery_per_hour, "rested");
                    if worker.risk.energy >= energy_cfg.rested_threshold {
                        transition = worker.activity.end_rest();
                    }
                }
                S::Idle => {
                    worker.risk.adjust(risk_cfg, Stat::Energy, energy_cfg.idle_recovery_per_hour, "idle");
                    if worker.risk.energy < energy_cfg.rest_threshold && worker.queue.is_empty() {
                        transition = worker.activity.start_rest();
                    }
                }
                S::Talking | S::Unavailable => {}
            }
            worker.risk.apply_coupling(risk_cfg);

            let working = worker.state() == S::Working;
            let injury_p = energy_cfg.injury_chance_per_hour * (1.0 - worker.risk.energy);
            let duration = energy_cfg.injury_duration_secs;
            self.note_transition(day, idx, transition, Some(&mut *report));

            if working && self.streams.get(RngSlot::Hourly, day).chance(injury_p) {
                self.injure(day, idx, duration, "injured on shift");
            }
        }
    }

    fn injure(&mut self, day: Day, idx: usize, duration: SimSeconds, cause: &str) {
        let (cancelled, reset) = self.roster[idx].cancel_all();
        self.push_failed(day, idx, &cancelled, cause);
        self.note_transition(day, idx, reset, None);

        let t = self.roster[idx].activity.incapacitate(duration);
        self.note_transition(day, idx, t, None);

        let worker_id = self.roster[idx].id.clone();
        log::info!("day={day} {worker_id} unavailable for {duration:.0}s ({cause})");
        self.events.push(StaffEvent::WorkerInjured { day, worker_id, duration });
    }

    // ── Daily tick ───────────────────────────────────────────

    pub fn daily_tick(&mut self) -> DailyReport {
        let day = self.day();
        let mut report = DailyReport { day, ..DailyReport::default() };
        self.streams.retire_before(day);

        for idx in 0..self.roster.len() {
            let cfg = &self.config;
            let worker = &mut self.roster[idx];

            let mut tasks_done = 0;
            for (skill_name, count) in std::mem::take(&mut worker.completed_today) {
                let counted = count.min(cfg.training.max_tasks_counted);
                worker.skills.train(&skill_name, cfg.training.rate_per_task * counted as f64);
                tasks_done += count;
            }
            if tasks_done > 0 {
                worker.skills.train(skill::SPEED, cfg.training.speed_rate_per_day);
            }
            worker.mishaps_today = 0;
            worker.tenure_days += 1;

            while worker.level < cfg.payroll.max_level
                && worker.experience >= worker.level as f64 * cfg.training.experience_per_level
            {
                worker.level += 1;
                report.level_ups.push((worker.id.clone(), worker.level));
                self.events.push(StaffEvent::WorkerLeveledUp {
                    day,
                    worker_id: worker.id.clone(),
                    level: worker.level,
                });
            }

            worker.risk.adjust(&cfg.risk, Stat::Energy, cfg.energy.overnight_recovery, "overnight");
            let recompute = worker.risk.daily_recompute(&cfg.risk, worker.salary_factor, worker.tip_factor);
            worker.tip_factor = 0.0;
            log::debug!(
                "day={day} {} loyalty={:.3} disloyalty={:.3} report={:.3}",
                worker.id, recompute.loyalty, recompute.disloyalty_risk, recompute.report_risk
            );

            let rng = self.streams.get(RngSlot::Risk, day);
            if let Some(event) = worker.risk.sample_risk_event(&cfg.risk, rng, &worker.id) {
                report.events.push(event);
            }
        }

        for event in report.events.clone() {
            if self.route_risk_event(day, &event) {
                report.departures.push(event.worker_id.clone());
            }
        }
        report
    }

    /// Forward a risk event to its collaborator. Returns true when the
    /// worker left the roster as a result.
    fn route_risk_event(&mut self, day: Day, event: &RiskEvent) -> bool {
        log::warn!(
            "day={day} risk event {} from {} magnitude={:.2} ({})",
            event.kind.name(), event.worker_id, event.magnitude, event.cause
        );
        self.events.push(StaffEvent::RiskEventRaised {
            day,
            worker_id: event.worker_id.clone(),
            kind: event.kind,
            magnitude: event.magnitude,
            cause: event.cause.clone(),
        });

        match event.kind {
            RiskEventKind::Theft => {
                if !self.economy.withdraw(event.magnitude, "theft") {
                    log::debug!("day={day} theft by {} found the till short", event.worker_id);
                }
                false
            }
            RiskEventKind::Gossip => {
                self.reputation.adjust(-event.magnitude, &format!("gossip from {}", event.worker_id));
                false
            }
            RiskEventKind::AuthorityReport => {
                self.reputation
                    .trigger_authority_event(&format!("report filed by {}", event.worker_id));
                false
            }
            RiskEventKind::PoorPerformance => {
                if let Some(worker) = self.roster.iter_mut().find(|w| w.id == event.worker_id) {
                    worker.risk.adjust(&self.config.risk, Stat::Mood, -event.magnitude, "poor shift");
                }
                false
            }
            RiskEventKind::Resignation => self.fire(&event.worker_id, DepartureReason::Resigned).is_ok(),
        }
    }

    // ── Money ────────────────────────────────────────────────

    pub fn pay_salaries(&mut self) -> PayrollOutcome {
        let day = self.day();
        let mut total = 0.0;
        for worker in &mut self.roster {
            worker.last_salary = worker.compute_salary(&self.config);
            total += worker.last_salary;
        }
        let headcount = self.roster.len();

        if headcount == 0 || self.economy.withdraw(total, "salaries") {
            let p = &self.config.payroll;
            for worker in &mut self.roster {
                worker.risk.adjust(&self.config.risk, Stat::Loyalty, p.success_loyalty_bonus, "paid on time");
                worker.salary_factor = p.paid_salary_factor;
            }
            log::info!("day={day} paid {total:.2} to {headcount} workers");
            self.events.push(StaffEvent::SalariesPaid { day, total, headcount });
            return PayrollOutcome::Paid { total };
        }

        log::warn!("day={day} payroll of {total:.2} failed; {headcount} workers unpaid");
        self.events.push(StaffEvent::SalaryPaymentFailed { day, total, headcount });

        let p = self.config.payroll.clone();
        let risk_cfg = &self.config.risk;
        let mut penalized = Vec::with_capacity(headcount);
        for worker in &mut self.roster {
            worker.risk.adjust(risk_cfg, Stat::Loyalty, -p.failure_loyalty_penalty, "missed salary");
            worker.risk.adjust(risk_cfg, Stat::Mood, -p.failure_mood_penalty, "missed salary");
            worker.salary_factor = p.missed_salary_factor;
            worker.risk.refresh_risk(risk_cfg, worker.salary_factor);
            penalized.push((worker.id.clone(), worker.risk.loyalty));
        }

        let mut events = Vec::new();
        let rng = self.streams.get(RngSlot::Payroll, day);
        for worker in &self.roster {
            if worker.risk.loyalty >= risk_cfg.resignation_threshold {
                continue;
            }
            if !rng.chance(p.unpaid_departure_chance) {
                continue;
            }
            let kind = if rng.chance(p.unpaid_resign_share) {
                RiskEventKind::Resignation
            } else if rng.chance(0.5) {
                RiskEventKind::Theft
            } else {
                RiskEventKind::Gossip
            };
            events.push(worker.risk.build_event(risk_cfg, rng, &worker.id, kind));
        }

        for event in &events {
            self.route_risk_event(day, event);
        }

        PayrollOutcome::Failed { total, penalized, events }
    }

    /// Split a tip pool: house share first, then across present roles by
    /// weight, then within each role by aggregate skill.
    pub fn distribute_tips(&mut self, total: f64) -> TipReport {
        let day = self.day();
        if !(total.is_finite() && total > 0.0) || self.roster.is_empty() {
            return TipReport::default();
        }
        let p = &self.config.payroll;
        let house_share = total * p.house_tip_share.clamp(0.0, 1.0);
        if house_share > 0.0 {
            self.economy.deposit(house_share, "tips_house_share");
        }
        let pool = total - house_share;

        let present: BTreeSet<Role> = self.roster.iter().map(|w| w.role).collect();
        let weights: Vec<(Role, f64)> = present
            .iter()
            .map(|r| (*r, self.config.role(*r).map(|c| c.tip_weight.max(0.0)).unwrap_or(0.0)))
            .collect();
        let weight_sum: f64 = weights.iter().map(|(_, w)| w).sum();

        let mut shares: BTreeMap<WorkerId, f64> = BTreeMap::new();
        for (role, weight) in &weights {
            let role_pool = if weight_sum > 0.0 {
                pool * weight / weight_sum
            } else {
                pool / weights.len() as f64
            };
            let members: Vec<&Worker> = self.roster.iter().filter(|w| w.role == *role).collect();
            let skill_sum: f64 = members.iter().map(|w| w.skills.aggregate()).sum();
            for member in &members {
                let share = if skill_sum > 0.0 {
                    role_pool * member.skills.aggregate() / skill_sum
                } else {
                    role_pool / members.len() as f64
                };
                shares.insert(member.id.clone(), share);
            }
        }

        let tip_factor = 0.01 - 0.04 * p.house_tip_share.clamp(0.0, 1.0);
        let cap = p.tip_satisfaction_cap;
        let risk_cfg = &self.config.risk;
        let mut payouts = Vec::with_capacity(self.roster.len());
        for worker in &mut self.roster {
            let share = shares.get(&worker.id).copied().unwrap_or(0.0);
            worker.tips_earned += share;
            worker.tip_factor = tip_factor;
            if worker.base_salary > 0.0 && share > 0.0 {
                let lift = (share / worker.base_salary * 0.1).min(cap);
                worker.risk.adjust(risk_cfg, Stat::Satisfaction, lift, "tips");
            }
            payouts.push((worker.id.clone(), share));
        }

        log::debug!("day={day} tips {total:.2}: house {house_share:.2}, {} recipients", payouts.len());
        self.events.push(StaffEvent::TipsDistributed {
            day,
            total,
            house_share,
            recipients: payouts.len(),
        });
        TipReport { house_share, payouts }
    }

    // ── Persistence ──────────────────────────────────────────

    pub fn serialize_roster(&self) -> Vec<WorkerRecord> {
        persistence::serialize_roster(&self.roster)
    }

    /// Replace the roster with persisted records. Task ids keep
    /// increasing past anything restored.
    pub fn restore_roster(&mut self, records: Vec<WorkerRecord>) {
        self.roster = persistence::deserialize_roster(records);
        let max_id = self
            .roster
            .iter()
            .flat_map(|w| w.queue.iter().map(|t| t.id))
            .max()
            .unwrap_or(0);
        self.next_task_id = self.next_task_id.max(max_id + 1);
    }

    // ── Helpers ──────────────────────────────────────────────

    fn push_failed(&mut self, day: Day, idx: usize, tasks: &[Task], cause: &str) {
        let worker_id = &self.roster[idx].id;
        for task in tasks {
            self.events.push(StaffEvent::TaskFailed {
                day,
                worker_id: worker_id.clone(),
                task_id: task.id,
                kind: task.kind,
                target: task.target.clone(),
                cause: cause.into(),
            });
        }
    }

    fn note_transition(
        &mut self,
        day: Day,
        idx: usize,
        transition: Option<Transition>,
        report: Option<&mut TickReport>,
    ) {
        let Some(t) = transition else { return };
        let worker_id = self.roster[idx].id.clone();
        log::debug!("day={day} {worker_id} {} -> {}", t.from.name(), t.to.name());
        self.events.push(StaffEvent::StateChanged {
            day,
            worker_id: worker_id.clone(),
            from: t.from,
            to: t.to,
        });
        if let Some(report) = report {
            report.transitions.push((worker_id, t));
        }
    }
}

// ── Test construction ────────────────────────────────────────────────────────

impl StaffOrchestrator<Ledger, ReputationBoard> {
    /// Default tuning, an in-memory ledger and a fresh reputation board.
    pub fn build_test(seed: u64, balance: f64) -> Self {
        Self::new(
            StaffConfig::default_test(),
            seed,
            Ledger::with_balance(balance),
            ReputationBoard::default(),
        )
    }
}

/// Score a completed task or turn it into a mishap.
fn finish_task(
    config: &StaffConfig,
    scoring: &ScoringModel,
    worker: &mut Worker,
    rng: &mut SubsystemRng,
    mut task: Task,
) -> TaskOutcome {
    let mishap_p = config.queue.base_mishap_chance * (2.0 - worker.condition())
        + worker.trait_mishap_chance(config);
    if rng.chance(mishap_p) {
        task.status = TaskStatus::Failed;
        worker.mishaps_today += 1;
        worker.risk.adjust(&config.risk, Stat::Mood, -0.02, "mishap");
        return TaskOutcome {
            worker_id: worker.id.clone(),
            cause: Some(format!("mishap during {}", task.kind)),
            quality: None,
            task,
        };
    }

    let (Some(role_cfg), Some(kind_cfg)) = (config.role(worker.role), config.task(task.kind)) else {
        return TaskOutcome { worker_id: worker.id.clone(), task, quality: None, cause: None };
    };

    let preference = task.preference.as_ref().map(|optimal| {
        let spread = (1.0 - worker.skills.get(&kind_cfg.relevant_skill)) * 0.5;
        let actual = optimal
            .iter()
            .map(|o| (o + rng.range(-spread, spread)).clamp(0.0, 1.0))
            .collect();
        PreferenceProfile::new(actual, optimal.clone())
    });
    let quality = worker.task_quality(scoring, role_cfg, &config.scoring, kind_cfg, preference.as_ref());

    worker.record_completion(&kind_cfg.relevant_skill);
    worker.experience += config.training.experience_per_task;
    worker.risk.adjust(&config.risk, Stat::Satisfaction, 0.01 * (quality - 0.5), "finished a task");

    TaskOutcome { worker_id: worker.id.clone(), task, quality: Some(quality), cause: None }
}

fn outcome_event(day: Day, outcome: &TaskOutcome) -> StaffEvent {
    match outcome.quality {
        Some(quality) => StaffEvent::TaskCompleted {
            day,
            worker_id: outcome.worker_id.clone(),
            task_id: outcome.task.id,
            kind: outcome.task.kind,
            target: outcome.task.target.clone(),
            quality,
        },
        None => StaffEvent::TaskFailed {
            day,
            worker_id: outcome.worker_id.clone(),
            task_id: outcome.task.id,
            kind: outcome.task.kind,
            target: outcome.task.target.clone(),
            cause: outcome.cause.clone().unwrap_or_else(|| "unscored".into()),
        },
    }
}

/// Feed a finished task back to the customer it was for.
pub fn settle_customer(customer: &mut dyn Customer, outcome: &TaskOutcome) {
    match outcome.quality {
        Some(q) => customer.adjust_satisfaction((q - 0.5) * 0.4, "order delivered"),
        None => customer.adjust_satisfaction(-0.2, "order failed"),
    }
}
