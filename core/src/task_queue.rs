//! Per-worker two-tier task queue.
//!
//! Layout: one Active slot, then the urgent partition, then the normal
//! partition. Both partitions are FIFO. Urgent tasks always dequeue before
//! normal tasks regardless of enqueue time; the Active task is never
//! displaced by an enqueue, only by an explicit `interrupt`.
//!
//! Capacity counts the Active task plus everything queued. A normal task
//! arriving at capacity is rejected; urgent tasks bypass the check.

use crate::{
    task::{Task, TaskStatus},
    types::{SimSeconds, TaskId},
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueOutcome {
    Accepted,
    RejectedCapacityFull,
}

/// The task removed by `interrupt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupted {
    pub task: Task,
    /// False when the task was urgent and therefore dropped.
    pub requeued: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskQueue {
    max_concurrent: usize,
    active: Option<Task>,
    urgent: VecDeque<Task>,
    normal: VecDeque<Task>,
}

impl TaskQueue {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            active: None,
            urgent: VecDeque::new(),
            normal: VecDeque::new(),
        }
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Active task plus everything waiting.
    pub fn len(&self) -> usize {
        usize::from(self.active.is_some()) + self.urgent.len() + self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.max_concurrent
    }

    pub fn enqueue(&mut self, mut task: Task) -> EnqueueOutcome {
        if !task.is_urgent() && self.is_full() {
            return EnqueueOutcome::RejectedCapacityFull;
        }

        task.status = if task.elapsed > 0.0 {
            TaskStatus::Interrupted
        } else {
            TaskStatus::Pending
        };

        if task.is_urgent() {
            self.urgent.push_back(task);
        } else {
            self.normal.push_back(task);
        }

        if self.active.is_none() {
            self.promote_next();
        }
        EnqueueOutcome::Accepted
    }

    pub fn peek_active(&self) -> Option<&Task> {
        self.active.as_ref()
    }

    /// Add `dt * service_rate` to the Active task. Returns the task if it
    /// completed, after promoting the next one. Surplus time is not carried
    /// over to the promoted task.
    pub fn advance(&mut self, dt: SimSeconds, service_rate: f64) -> Option<Task> {
        let active = self.active.as_mut()?;

        let step = dt * service_rate;
        if step.is_finite() && step > 0.0 {
            active.elapsed += step;
        }

        if active.elapsed >= active.required {
            let mut done = self.active.take()?;
            done.elapsed = done.required;
            done.status = TaskStatus::Completed;
            self.promote_next();
            return Some(done);
        }
        None
    }

    /// Remove the Active task, keeping its progress. A normal task goes to
    /// the tail of the normal partition; an urgent one is dropped.
    pub fn interrupt(&mut self) -> Option<Interrupted> {
        let mut task = self.active.take()?;
        task.status = TaskStatus::Interrupted;

        let requeued = !task.is_urgent();
        if requeued {
            self.normal.push_back(task.clone());
        }
        self.promote_next();

        Some(Interrupted { task, requeued })
    }

    /// Mark the Active task Failed and promote the next one.
    pub fn fail_active(&mut self) -> Option<Task> {
        let mut task = self.active.take()?;
        task.status = TaskStatus::Failed;
        self.promote_next();
        Some(task)
    }

    /// Clear everything. Returned tasks are marked Failed, in dequeue order.
    pub fn cancel(&mut self) -> Vec<Task> {
        let mut out: Vec<Task> = self.active.take().into_iter().collect();
        out.extend(self.urgent.drain(..));
        out.extend(self.normal.drain(..));
        for task in &mut out {
            task.status = TaskStatus::Failed;
        }
        out
    }

    /// Remove one task by id wherever it sits.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        if self.active.as_ref().is_some_and(|t| t.id == id) {
            let task = self.active.take();
            self.promote_next();
            return task;
        }
        for partition in [&mut self.urgent, &mut self.normal] {
            if let Some(pos) = partition.iter().position(|t| t.id == id) {
                return partition.remove(pos);
            }
        }
        None
    }

    /// Every task in dequeue order: Active first, then urgent, then normal.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.active
            .iter()
            .chain(self.urgent.iter())
            .chain(self.normal.iter())
    }

    /// Rebuild from persisted tasks. The task recorded as Active resumes in
    /// the Active slot; the rest keep their relative order per partition.
    /// Capacity is not enforced so a reload never loses work.
    pub fn restore(max_concurrent: usize, tasks: Vec<Task>) -> Self {
        let mut queue = Self::new(max_concurrent);
        for task in tasks {
            match task.status {
                TaskStatus::Completed | TaskStatus::Failed => {}
                TaskStatus::Active if queue.active.is_none() => queue.active = Some(task),
                _ => {
                    let mut task = task;
                    if task.status == TaskStatus::Active {
                        task.status = TaskStatus::Interrupted;
                    }
                    if task.is_urgent() {
                        queue.urgent.push_back(task);
                    } else {
                        queue.normal.push_back(task);
                    }
                }
            }
        }
        if queue.active.is_none() {
            queue.promote_next();
        }
        queue
    }

    fn promote_next(&mut self) {
        debug_assert!(self.active.is_none());
        let next = self.urgent.pop_front().or_else(|| self.normal.pop_front());
        self.active = next.map(|mut t| {
            t.status = TaskStatus::Active;
            t
        });
    }
}
