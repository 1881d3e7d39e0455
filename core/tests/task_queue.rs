//! Task queue ordering, capacity and interruption tests.

use staffsim_core::{
    config::{QueueConfig, StaffConfig},
    role::TaskKind,
    task::{required_duration, DurationInputs, Priority, Task, TaskStatus},
    task_queue::{EnqueueOutcome, TaskQueue},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn normal(id: u64, required: f64) -> Task {
    Task::new(id, TaskKind::CleanTable, Priority::Normal, required)
}

fn urgent(id: u64, required: f64) -> Task {
    Task::new(id, TaskKind::CleanSpill, Priority::Urgent, required)
}

fn ids(queue: &TaskQueue) -> Vec<u64> {
    queue.iter().map(|t| t.id).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn first_enqueue_becomes_active() {
    let mut q = TaskQueue::new(3);
    assert_eq!(q.enqueue(normal(1, 10.0)), EnqueueOutcome::Accepted);

    let active = q.peek_active().unwrap();
    assert_eq!(active.id, 1);
    assert_eq!(active.status, TaskStatus::Active);
    assert_eq!(q.len(), 1);
}

#[test]
fn urgent_tasks_dequeue_before_normal_regardless_of_arrival() {
    let mut q = TaskQueue::new(10);
    q.enqueue(normal(1, 10.0));
    q.enqueue(normal(2, 10.0));
    q.enqueue(urgent(3, 10.0));
    q.enqueue(normal(4, 10.0));
    q.enqueue(urgent(5, 10.0));

    // Active is never displaced by an enqueue.
    assert_eq!(ids(&q), vec![1, 3, 5, 2, 4]);

    let mut order = Vec::new();
    while let Some(done) = q.advance(10.0, 1.0) {
        order.push(done.id);
    }
    assert_eq!(order, vec![1, 3, 5, 2, 4]);
    assert!(q.is_empty());
}

#[test]
fn normal_task_rejected_at_capacity_urgent_bypasses() {
    let mut q = TaskQueue::new(2);
    q.enqueue(normal(1, 10.0));
    q.enqueue(normal(2, 10.0));
    assert!(q.is_full());

    assert_eq!(q.enqueue(normal(3, 10.0)), EnqueueOutcome::RejectedCapacityFull);
    assert_eq!(q.len(), 2, "rejected task must not be stored");

    assert_eq!(q.enqueue(urgent(4, 10.0)), EnqueueOutcome::Accepted);
    assert_eq!(q.len(), 3);
}

#[test]
fn zero_capacity_is_raised_to_one() {
    let q = TaskQueue::new(0);
    assert_eq!(q.max_concurrent(), 1);
}

#[test]
fn advance_scales_by_service_rate() {
    let mut q = TaskQueue::new(1);
    q.enqueue(normal(1, 100.0));

    assert!(q.advance(10.0, 0.5).is_none());
    assert!((q.peek_active().unwrap().elapsed - 5.0).abs() < 1e-9);
    assert!((q.peek_active().unwrap().progress() - 0.05).abs() < 1e-9);
}

#[test]
fn completion_pins_elapsed_to_required() {
    let mut q = TaskQueue::new(2);
    q.enqueue(normal(1, 10.0));
    q.enqueue(normal(2, 10.0));

    let done = q.advance(25.0, 1.0).unwrap();
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.elapsed, done.required);

    // Surplus time is not carried over.
    let next = q.peek_active().unwrap();
    assert_eq!(next.id, 2);
    assert_eq!(next.elapsed, 0.0);
}

#[test]
fn advance_on_empty_queue_is_noop() {
    let mut q = TaskQueue::new(2);
    assert!(q.advance(10.0, 1.0).is_none());
    assert!(q.is_empty());
}

/// Regular task at 40% interrupted by an emergency: the emergency runs
/// first, then the regular task resumes with its progress intact and
/// completes after exactly the remaining 60%.
#[test]
fn interrupted_task_resumes_with_progress() {
    let mut q = TaskQueue::new(3);
    q.enqueue(normal(1, 100.0));
    q.advance(40.0, 1.0);

    q.enqueue(urgent(2, 20.0));
    let interrupted = q.interrupt().unwrap();
    assert_eq!(interrupted.task.id, 1);
    assert!(interrupted.requeued);
    assert!((interrupted.task.progress() - 0.4).abs() < 1e-9);

    assert_eq!(q.peek_active().unwrap().id, 2);
    let emergency = q.advance(20.0, 1.0).unwrap();
    assert_eq!(emergency.id, 2);

    let resumed = q.peek_active().unwrap();
    assert_eq!(resumed.id, 1);
    assert!((resumed.elapsed - 40.0).abs() < 1e-9);

    assert!(q.advance(59.0, 1.0).is_none());
    let done = q.advance(1.0, 1.0).unwrap();
    assert_eq!(done.id, 1);
    assert_eq!(done.status, TaskStatus::Completed);
}

#[test]
fn interrupted_normal_task_goes_to_the_back_of_the_normal_partition() {
    let mut q = TaskQueue::new(5);
    q.enqueue(normal(1, 100.0));
    q.enqueue(normal(2, 100.0));
    q.advance(10.0, 1.0);

    q.enqueue(urgent(3, 10.0));
    q.interrupt();
    assert_eq!(ids(&q), vec![3, 2, 1]);
}

#[test]
fn interrupted_urgent_task_is_dropped() {
    let mut q = TaskQueue::new(3);
    q.enqueue(urgent(1, 10.0));
    q.enqueue(normal(2, 10.0));

    let interrupted = q.interrupt().unwrap();
    assert!(!interrupted.requeued);
    assert_eq!(ids(&q), vec![2]);
}

#[test]
fn failing_the_active_task_promotes_the_next() {
    let mut q = TaskQueue::new(3);
    q.enqueue(normal(1, 10.0));
    q.enqueue(normal(2, 10.0));
    q.advance(4.0, 1.0);

    let failed = q.fail_active().unwrap();
    assert_eq!(failed.id, 1);
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.elapsed, 4.0);

    let next = q.peek_active().unwrap();
    assert_eq!(next.id, 2);
    assert_eq!(next.status, TaskStatus::Active);
    assert_eq!(q.len(), 1);

    q.fail_active();
    assert!(q.fail_active().is_none());
}

#[test]
fn cancel_returns_everything_failed_in_dequeue_order() {
    let mut q = TaskQueue::new(5);
    q.enqueue(normal(1, 10.0));
    q.enqueue(normal(2, 10.0));
    q.enqueue(urgent(3, 10.0));

    let cancelled = q.cancel();
    assert_eq!(cancelled.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 2]);
    assert!(cancelled.iter().all(|t| t.status == TaskStatus::Failed));
    assert!(q.is_empty());
    assert!(q.peek_active().is_none());
}

#[test]
fn remove_by_id_from_any_position() {
    let mut q = TaskQueue::new(5);
    q.enqueue(normal(1, 10.0));
    q.enqueue(normal(2, 10.0));
    q.enqueue(normal(3, 10.0));

    assert_eq!(q.remove(2).unwrap().id, 2);
    assert_eq!(q.remove(1).unwrap().id, 1);
    assert_eq!(q.peek_active().unwrap().id, 3);
    assert!(q.remove(99).is_none());
}

#[test]
fn restore_keeps_active_slot_and_order() {
    let mut q = TaskQueue::new(2);
    q.enqueue(normal(1, 100.0));
    q.enqueue(normal(2, 100.0));
    q.enqueue(urgent(3, 100.0));
    q.advance(30.0, 1.0);

    let tasks: Vec<Task> = q.iter().cloned().collect();
    let restored = TaskQueue::restore(2, tasks);

    assert_eq!(restored, q);
    assert!((restored.peek_active().unwrap().elapsed - 30.0).abs() < 1e-9);
}

#[test]
fn skilled_cook_duration_matches_formula() {
    let config = StaffConfig::default_test();
    let cook = config.task(TaskKind::CookOrder).unwrap();
    let d = required_duration(
        cook,
        &QueueConfig::default(),
        DurationInputs { relevant_skill: 0.8, speed_skill: 0.6, energy: 1.0, mood: 1.0 },
    );
    assert!((d - 78.0).abs() < 1e-9, "expected 78s, got {d}");
}

#[test]
fn duration_never_drops_below_floor() {
    let config = StaffConfig::default_test();
    let cook = config.task(TaskKind::CookOrder).unwrap();
    let queue = QueueConfig { duration_floor_fraction: 0.9, ..QueueConfig::default() };
    let d = required_duration(
        cook,
        &queue,
        DurationInputs { relevant_skill: 1.0, speed_skill: 1.0, energy: 1.0, mood: 1.0 },
    );
    assert!((d - 108.0).abs() < 1e-9);
}

#[test]
fn tired_worker_takes_longer() {
    let config = StaffConfig::default_test();
    let cook = config.task(TaskKind::CookOrder).unwrap();
    let fresh = required_duration(
        cook,
        &QueueConfig::default(),
        DurationInputs { relevant_skill: 0.5, speed_skill: 0.5, energy: 1.0, mood: 1.0 },
    );
    let tired = required_duration(
        cook,
        &QueueConfig::default(),
        DurationInputs { relevant_skill: 0.5, speed_skill: 0.5, energy: 0.2, mood: 0.4 },
    );
    assert!(tired > fresh);
}
