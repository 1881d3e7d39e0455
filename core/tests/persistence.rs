//! Roster save/load: records, JSON and the SQLite store.

use staffsim_core::{
    activity::ActivityState,
    collaborator::{Ledger, ReputationBoard},
    config::StaffConfig,
    event::{EventLogEntry, StaffEvent},
    orchestrator::{AssignOutcome, HireOutcome, StaffOrchestrator, TaskRequest},
    persistence::{roster_from_json, roster_to_json},
    role::{Role, TaskKind},
    store::StaffStore,
    task::TaskStatus,
};

type Orchestrator = StaffOrchestrator<Ledger, ReputationBoard>;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn calm(seed: u64) -> Orchestrator {
    let mut config = StaffConfig::default_test();
    config.queue.base_mishap_chance = 0.0;
    config.energy.injury_chance_per_hour = 0.0;
    StaffOrchestrator::new(config, seed, Ledger::with_balance(20_000.0), ReputationBoard::default())
}

fn hire(orch: &mut Orchestrator, role: Role, traits: &[&str]) -> String {
    match orch.hire(role, traits).unwrap() {
        HireOutcome::Hired(id) => id,
        other => panic!("expected a hire, got {other:?}"),
    }
}

/// A roster mid-shift: a cleaner partway through a table with a spill
/// queued, a cook in a special, a bouncer laid up.
fn busy_roster() -> (Orchestrator, [String; 3]) {
    let mut orch = calm(77);
    let cleaner = hire(&mut orch, Role::Cleaner, &["diligent"]);
    let cook = hire(&mut orch, Role::Cook, &["fast", "greedy"]);
    let bouncer = hire(&mut orch, Role::Bouncer, &[]);

    orch.assign(&cleaner, TaskRequest::normal(TaskKind::CleanTable)).unwrap();
    orch.assign(&cleaner, TaskRequest::normal(TaskKind::CleanTable)).unwrap();
    orch.assign(&cook, TaskRequest::normal(TaskKind::CookOrder)).unwrap();
    orch.tick(10.0);
    orch.assign(&cleaner, TaskRequest::urgent(TaskKind::CleanSpill)).unwrap();
    orch.trigger_special(&cook).unwrap();
    orch.incapacitate(&bouncer, 500.0).unwrap();
    orch.tick(5.0);

    (orch, [cleaner, cook, bouncer])
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn roster_round_trips_through_records() {
    let (orch, _) = busy_roster();
    let records = orch.serialize_roster();

    let mut restored = calm(77);
    restored.restore_roster(records);
    assert_eq!(restored.roster(), orch.roster());
}

#[test]
fn roster_round_trips_through_json() {
    let (orch, _) = busy_roster();
    let json = roster_to_json(orch.roster()).unwrap();
    let workers = roster_from_json(&json).unwrap();
    assert_eq!(workers.as_slice(), orch.roster());
}

#[test]
fn restored_queue_keeps_progress_and_order() {
    let (orch, [cleaner, cook, bouncer]) = busy_roster();
    let mut restored = calm(1);
    restored.restore_roster(orch.serialize_roster());

    let c = restored.worker(&cleaner).unwrap();
    let kinds: Vec<TaskKind> = c.queue.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TaskKind::CleanSpill, TaskKind::CleanTable, TaskKind::CleanTable]);
    let parked = c.queue.iter().find(|t| t.status == TaskStatus::Interrupted).unwrap();
    assert!(parked.elapsed > 0.0);

    assert_eq!(restored.worker(&cook).unwrap().state(), ActivityState::Special);
    let b = restored.worker(&bouncer).unwrap();
    assert_eq!(b.state(), ActivityState::Unavailable);
    assert!((b.activity.unavailable_remaining().unwrap() - 495.0).abs() < 1e-9);
}

#[test]
fn restored_task_ids_do_not_collide() {
    let (orch, [cleaner, ..]) = busy_roster();
    let max_id = orch.roster().iter().flat_map(|w| w.queue.iter().map(|t| t.id)).max().unwrap();

    let mut restored = calm(5);
    restored.restore_roster(orch.serialize_roster());
    restored.cancel_tasks(&cleaner).unwrap();
    match restored.assign(&cleaner, TaskRequest::normal(TaskKind::CleanTable)).unwrap() {
        AssignOutcome::Accepted(id) => assert!(id > max_id),
        other => panic!("expected Accepted, got {other:?}"),
    }
}

#[test]
fn restored_work_finishes() {
    let (orch, [cleaner, ..]) = busy_roster();
    let mut restored = calm(77);
    restored.restore_roster(orch.serialize_roster());

    let mut finished = 0;
    for _ in 0..1_000 {
        finished += restored
            .tick(1.0)
            .outcomes
            .iter()
            .filter(|o| o.worker_id == cleaner)
            .count();
    }
    assert_eq!(finished, 3);
}

#[test]
fn store_keeps_runs_events_and_rosters() {
    let store = StaffStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run("run-1", 77, "0.1.0-test", 0).unwrap();

    let (mut orch, _) = busy_roster();
    for event in orch.drain_events() {
        store.append_event(&EventLogEntry::from_event("run-1", &event).unwrap()).unwrap();
    }
    assert_eq!(store.event_count("run-1", "worker_hired").unwrap(), 3);
    let day0 = store.events_for_day("run-1", 0).unwrap();
    assert!(!day0.is_empty());
    let first: StaffEvent = serde_json::from_str(&day0[0].payload).unwrap();
    assert_eq!(first.type_name(), "worker_hired");

    store.save_roster("run-1", 0, &orch.serialize_roster()).unwrap();
    let (day, records) = store.latest_roster("run-1", 3).unwrap().unwrap();
    assert_eq!(day, 0);
    assert_eq!(records, orch.serialize_roster());
    assert!(store.latest_roster("run-2", 3).unwrap().is_none());
}

#[test]
fn later_snapshot_replaces_earlier_day() {
    let store = StaffStore::in_memory().unwrap();
    store.migrate().unwrap();
    store.insert_run("run-1", 1, "0.1.0-test", 0).unwrap();

    let (orch, _) = busy_roster();
    let records = orch.serialize_roster();
    store.save_roster("run-1", 1, &records[..1]).unwrap();
    store.save_roster("run-1", 2, &records).unwrap();

    assert_eq!(store.latest_roster("run-1", 1).unwrap().unwrap().1.len(), 1);
    assert_eq!(store.latest_roster("run-1", 9).unwrap().unwrap().1.len(), 3);
}
