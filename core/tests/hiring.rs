//! Hiring and departure tests.

use staffsim_core::{
    collaborator::{Ledger, ReputationBoard},
    config::StaffConfig,
    error::SimError,
    event::StaffEvent,
    orchestrator::{AssignOutcome, DepartureReason, HireOutcome, StaffOrchestrator, TaskRequest},
    role::{Role, TaskKind},
    skill,
};

type Orchestrator = StaffOrchestrator<Ledger, ReputationBoard>;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn build(balance: f64) -> Orchestrator {
    StaffOrchestrator::build_test(42, balance)
}

fn hire(orch: &mut Orchestrator, role: Role, traits: &[&str]) -> String {
    match orch.hire(role, traits).unwrap() {
        HireOutcome::Hired(id) => id,
        other => panic!("expected a hire, got {other:?}"),
    }
}

// ── Hiring ───────────────────────────────────────────────────────────────────

#[test]
fn hire_deducts_cost_and_adds_worker() {
    let mut orch = build(10_000.0);
    let id = hire(&mut orch, Role::Cook, &[]);

    assert!(id.starts_with("w-"));
    assert!((orch.economy().balance - 9_700.0).abs() < 1e-9);
    assert!((orch.economy().total_for("hiring") + 300.0).abs() < 1e-9);

    let w = orch.worker(&id).unwrap();
    assert_eq!(w.role, Role::Cook);
    assert_eq!(w.level, 1);
    assert_eq!(w.queue.max_concurrent(), 3);
    assert!(w.activity.is_available());
    let cooking = w.skills.get(skill::COOKING);
    assert!((0.45..=0.55).contains(&cooking), "cooking={cooking}");
    assert!(w.last_salary > 0.0);

    assert!(matches!(orch.events()[0], StaffEvent::WorkerHired { .. }));
}

#[test]
fn trait_multipliers_apply_to_cost_and_skills() {
    let mut orch = build(10_000.0);
    let id = hire(&mut orch, Role::Waiter, &["charming", "fast"]);

    let cost = 200.0 * 1.15 * 1.1;
    assert!((orch.economy().balance - (10_000.0 - cost)).abs() < 1e-9);

    let w = orch.worker(&id).unwrap();
    assert!(w.skills.get(skill::CHARISMA) >= 0.55 - 1e-9);
    assert!(w.skills.get(skill::SPEED) >= 0.6 - 1e-9);
    assert_eq!(w.traits, vec!["charming".to_string(), "fast".to_string()]);
}

#[test]
fn loyal_trait_raises_starting_loyalty() {
    let mut orch = build(10_000.0);
    let id = hire(&mut orch, Role::Bartender, &["loyal"]);
    assert!((orch.worker(&id).unwrap().risk.loyalty - 0.75).abs() < 1e-9);
}

#[test]
fn headcount_cap_rejects_without_charging() {
    let mut orch = build(10_000.0);
    hire(&mut orch, Role::Manager, &[]);
    let balance = orch.economy().balance;

    assert_eq!(orch.hire(Role::Manager, &[]).unwrap(), HireOutcome::RejectedCapacityFull);
    assert_eq!(orch.economy().balance, balance);
    assert_eq!(orch.headcount(Role::Manager), 1);
    assert!(orch
        .events()
        .iter()
        .any(|e| matches!(e, StaffEvent::HireRejected { reason, .. } if reason == "capacity_full")));
}

#[test]
fn insufficient_funds_rejects_hire() {
    let mut orch = build(100.0);
    assert_eq!(orch.hire(Role::Cook, &[]).unwrap(), HireOutcome::RejectedInsufficientFunds);
    assert!(orch.roster().is_empty());
    assert_eq!(orch.economy().balance, 100.0);
    assert_eq!(orch.economy().refused.len(), 1);
}

#[test]
fn unknown_trait_is_an_error() {
    let mut orch = build(10_000.0);
    let err = orch.hire(Role::Cook, &["telepathic"]).unwrap_err();
    assert!(matches!(err, SimError::UnknownTrait { ref name } if name == "telepathic"));
    assert_eq!(orch.economy().balance, 10_000.0);
}

#[test]
fn hired_names_are_unique() {
    let mut orch = build(100_000.0);
    for role in Role::ALL {
        let cap = orch.config().role(role).unwrap().max_headcount;
        for _ in 0..cap {
            hire(&mut orch, role, &[]);
        }
    }
    let mut names: Vec<&str> = orch.roster().iter().map(|w| w.name.as_str()).collect();
    let total = names.len();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), total);
}

// ── Departures ───────────────────────────────────────────────────────────────

#[test]
fn dismissal_pays_severance() {
    let mut orch = build(10_000.0);
    let id = hire(&mut orch, Role::Cook, &[]);
    let salary = orch.worker(&id).unwrap().compute_salary(orch.config());
    let balance = orch.economy().balance;

    let report = orch.fire(&id, DepartureReason::Dismissed).unwrap();
    assert!((report.severance - salary * 5.0).abs() < 1e-9);
    assert!((orch.economy().balance - (balance - report.severance)).abs() < 1e-9);
    assert!(orch.worker(&id).is_none());
}

#[test]
fn resignation_pays_no_severance() {
    let mut orch = build(10_000.0);
    let id = hire(&mut orch, Role::Cook, &[]);
    let balance = orch.economy().balance;

    let report = orch.fire(&id, DepartureReason::Resigned).unwrap();
    assert_eq!(report.severance, 0.0);
    assert_eq!(orch.economy().balance, balance);
    assert!(orch.events().iter().any(|e| matches!(
        e,
        StaffEvent::WorkerDeparted { reason, .. } if reason == "resigned"
    )));
}

#[test]
fn firing_unknown_worker_is_an_error() {
    let mut orch = build(10_000.0);
    let err = orch.fire("w-nobody", DepartureReason::Dismissed).unwrap_err();
    assert!(matches!(err, SimError::UnknownWorker { .. }));
}

#[test]
fn departure_fails_queued_tasks() {
    let mut orch = build(10_000.0);
    let id = hire(&mut orch, Role::Cook, &[]);
    let outcome = orch.assign(&id, TaskRequest::normal(TaskKind::CookOrder)).unwrap();
    assert!(matches!(outcome, AssignOutcome::Accepted(_)));

    orch.fire(&id, DepartureReason::Dismissed).unwrap();
    assert!(orch.events().iter().any(|e| matches!(
        e,
        StaffEvent::TaskFailed { cause, .. } if cause == "worker departed"
    )));
}

#[test]
fn departure_hurts_remaining_loyalty() {
    let mut config = StaffConfig::default_test();
    config.payroll.contagion_chance = 1.0;
    let mut orch = StaffOrchestrator::new(
        config,
        7,
        Ledger::with_balance(10_000.0),
        ReputationBoard::default(),
    );
    let leaver = hire(&mut orch, Role::Cook, &[]);
    let a = hire(&mut orch, Role::Waiter, &[]);
    let b = hire(&mut orch, Role::Waiter, &[]);

    let report = orch.fire(&leaver, DepartureReason::Resigned).unwrap();
    assert_eq!(report.contagion_hits, 2);
    for id in [&a, &b] {
        assert!((orch.worker(id).unwrap().risk.loyalty - 0.57).abs() < 1e-9);
    }
}
