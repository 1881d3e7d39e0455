//! Worker activity state machine.
//!
//!   Idle <-> Working        by queue occupancy
//!   Idle  -> Resting        explicit, when tired and the queue is empty
//!   Resting -> Working/Idle queue fills, or energy recovered
//!   Working/Idle -> Special explicit trigger, reverts after its bound
//!   any   -> Unavailable    explicit incapacitation with a countdown
//!   Unavailable -> Idle     countdown elapsed, or explicit recovery
//!   Talking                 transient, wraps a single interaction call
//!
//! Every method that changes state returns the `Transition` it made so the
//! orchestrator can log it in the same tick.

use crate::types::SimSeconds;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    Idle,
    Working,
    Resting,
    Talking,
    Special,
    Unavailable,
}

impl ActivityState {
    pub fn name(&self) -> &'static str {
        match self {
            ActivityState::Idle        => "idle",
            ActivityState::Working     => "working",
            ActivityState::Resting     => "resting",
            ActivityState::Talking     => "talking",
            ActivityState::Special     => "special",
            ActivityState::Unavailable => "unavailable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: ActivityState,
    pub to:   ActivityState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityStateMachine {
    state: ActivityState,
    /// Absolute sim time at which Special ends.
    special_until: Option<SimSeconds>,
    /// Seconds left before an Unavailable worker recovers.
    unavailable_remaining: Option<SimSeconds>,
    /// State to return to when a conversation ends.
    talking_from: Option<ActivityState>,
}

impl Default for ActivityStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityStateMachine {
    pub fn new() -> Self {
        Self {
            state: ActivityState::Idle,
            special_until: None,
            unavailable_remaining: None,
            talking_from: None,
        }
    }

    pub fn state(&self) -> ActivityState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state != ActivityState::Unavailable
    }

    pub fn special_until(&self) -> Option<SimSeconds> {
        self.special_until
    }

    pub fn unavailable_remaining(&self) -> Option<SimSeconds> {
        self.unavailable_remaining
    }

    /// Reconcile with queue occupancy. Only Idle, Working and Resting follow
    /// the queue; the explicitly triggered states keep control.
    pub fn sync_with_queue(&mut self, occupied: bool) -> Option<Transition> {
        let next = match self.state {
            ActivityState::Idle | ActivityState::Resting if occupied => ActivityState::Working,
            ActivityState::Working if !occupied => ActivityState::Idle,
            _ => return None,
        };
        self.set(next)
    }

    /// Advance timers by `dt` at absolute time `now`, then reconcile with the queue.
    pub fn advance(&mut self, now: SimSeconds, dt: SimSeconds, occupied: bool) -> Option<Transition> {
        match self.state {
            ActivityState::Special => {
                if self.special_until.is_some_and(|until| now >= until) {
                    self.special_until = None;
                    return self.set(queue_implied(occupied));
                }
                None
            }
            ActivityState::Unavailable => {
                let remaining = self.unavailable_remaining.unwrap_or(0.0) - dt.max(0.0);
                if remaining <= 0.0 {
                    self.recover()
                } else {
                    self.unavailable_remaining = Some(remaining);
                    None
                }
            }
            _ => self.sync_with_queue(occupied),
        }
    }

    /// Enter Special until `now + duration`. Only an on-shift worker (Idle
    /// or Working) can enter it.
    pub fn trigger_special(&mut self, now: SimSeconds, duration: SimSeconds) -> Option<Transition> {
        if !matches!(self.state, ActivityState::Idle | ActivityState::Working) {
            return None;
        }
        self.special_until = Some(now + duration.max(0.0));
        self.set(ActivityState::Special)
    }

    pub fn incapacitate(&mut self, duration: SimSeconds) -> Option<Transition> {
        self.special_until = None;
        self.talking_from = None;
        self.unavailable_remaining = Some(duration.max(0.0));
        self.set(ActivityState::Unavailable)
    }

    /// Explicit recovery; returns to Idle.
    pub fn recover(&mut self) -> Option<Transition> {
        if self.state != ActivityState::Unavailable {
            return None;
        }
        self.unavailable_remaining = None;
        self.set(ActivityState::Idle)
    }

    pub fn start_rest(&mut self) -> Option<Transition> {
        if self.state != ActivityState::Idle {
            return None;
        }
        self.set(ActivityState::Resting)
    }

    pub fn end_rest(&mut self) -> Option<Transition> {
        if self.state != ActivityState::Resting {
            return None;
        }
        self.set(ActivityState::Idle)
    }

    pub fn begin_talking(&mut self) -> Option<Transition> {
        if matches!(self.state, ActivityState::Unavailable | ActivityState::Talking) {
            return None;
        }
        self.talking_from = Some(self.state);
        self.set(ActivityState::Talking)
    }

    /// Leave Talking. Special resumes if its bound has not expired;
    /// otherwise the queue decides.
    pub fn end_talking(&mut self, now: SimSeconds, occupied: bool) -> Option<Transition> {
        if self.state != ActivityState::Talking {
            return None;
        }
        let prior = self.talking_from.take();
        let next = match prior {
            Some(ActivityState::Special) if self.special_until.is_some_and(|u| now < u) => {
                ActivityState::Special
            }
            Some(ActivityState::Resting) if !occupied => ActivityState::Resting,
            _ => {
                if prior == Some(ActivityState::Special) {
                    self.special_until = None;
                }
                queue_implied(occupied)
            }
        };
        self.set(next)
    }

    /// Force Idle, as a cancel does.
    pub fn reset_idle(&mut self) -> Option<Transition> {
        if self.state == ActivityState::Unavailable {
            return None;
        }
        self.special_until = None;
        self.talking_from = None;
        self.set(ActivityState::Idle)
    }

    /// Rebuild a persisted machine. Talking never persists, so it loads as Idle.
    pub fn restore(
        state: ActivityState,
        special_until: Option<SimSeconds>,
        unavailable_remaining: Option<SimSeconds>,
    ) -> Self {
        let state = if state == ActivityState::Talking { ActivityState::Idle } else { state };
        Self {
            state,
            special_until: special_until.filter(|_| state == ActivityState::Special),
            unavailable_remaining: unavailable_remaining.filter(|_| state == ActivityState::Unavailable),
            talking_from: None,
        }
    }

    fn set(&mut self, to: ActivityState) -> Option<Transition> {
        if self.state == to {
            return None;
        }
        let from = self.state;
        self.state = to;
        Some(Transition { from, to })
    }
}

fn queue_implied(occupied: bool) -> ActivityState {
    if occupied {
        ActivityState::Working
    } else {
        ActivityState::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_occupancy_drives_idle_and_working() {
        let mut m = ActivityStateMachine::new();
        assert_eq!(
            m.sync_with_queue(true),
            Some(Transition { from: ActivityState::Idle, to: ActivityState::Working })
        );
        assert_eq!(m.sync_with_queue(true), None);
        assert_eq!(m.sync_with_queue(false).map(|t| t.to), Some(ActivityState::Idle));
    }

    #[test]
    fn special_only_starts_from_idle_or_working() {
        let mut idle = ActivityStateMachine::new();
        assert_eq!(idle.trigger_special(0.0, 30.0).map(|t| t.from), Some(ActivityState::Idle));
        assert_eq!(idle.advance(30.0, 30.0, false).map(|t| t.to), Some(ActivityState::Idle));

        let mut working = ActivityStateMachine::new();
        working.sync_with_queue(true);
        assert_eq!(working.trigger_special(0.0, 30.0).map(|t| t.from), Some(ActivityState::Working));
        assert_eq!(working.trigger_special(1.0, 30.0), None);

        let mut resting = ActivityStateMachine::new();
        resting.start_rest();
        assert_eq!(resting.state(), ActivityState::Resting);
        assert_eq!(resting.trigger_special(0.0, 30.0), None);

        let mut talking = ActivityStateMachine::new();
        talking.begin_talking();
        assert_eq!(talking.trigger_special(0.0, 30.0), None);

        let mut hurt = ActivityStateMachine::new();
        hurt.incapacitate(100.0);
        assert_eq!(hurt.trigger_special(0.0, 30.0), None);
    }

    #[test]
    fn special_reverts_to_queue_implied_state_after_bound() {
        let mut m = ActivityStateMachine::new();
        m.sync_with_queue(true);
        m.trigger_special(10.0, 60.0);
        assert_eq!(m.state(), ActivityState::Special);

        assert_eq!(m.advance(69.0, 59.0, false), None);
        assert_eq!(m.state(), ActivityState::Special);

        let t = m.advance(70.0, 1.0, false).unwrap();
        assert_eq!(t.to, ActivityState::Idle);
        assert_eq!(m.special_until(), None);
    }

    #[test]
    fn unavailable_counts_down_then_recovers_to_idle() {
        let mut m = ActivityStateMachine::new();
        m.sync_with_queue(true);
        m.incapacitate(100.0);
        assert!(!m.is_available());
        // Queue occupancy does not pull an injured worker back to work.
        assert_eq!(m.sync_with_queue(true), None);
        assert_eq!(m.advance(50.0, 50.0, true), None);
        assert_eq!(m.unavailable_remaining(), Some(50.0));
        assert_eq!(m.advance(100.0, 50.0, true).map(|t| t.to), Some(ActivityState::Idle));
    }

    #[test]
    fn talking_is_transient_and_restores_queue_state() {
        let mut m = ActivityStateMachine::new();
        m.sync_with_queue(true);
        m.begin_talking();
        assert_eq!(m.state(), ActivityState::Talking);
        m.end_talking(0.0, true);
        assert_eq!(m.state(), ActivityState::Working);
    }

    #[test]
    fn special_refused_while_unavailable() {
        let mut m = ActivityStateMachine::new();
        m.incapacitate(10.0);
        assert_eq!(m.trigger_special(0.0, 30.0), None);
        assert_eq!(m.state(), ActivityState::Unavailable);
    }

    #[test]
    fn resting_worker_goes_back_to_work_when_queue_fills() {
        let mut m = ActivityStateMachine::new();
        m.start_rest();
        assert_eq!(m.state(), ActivityState::Resting);
        assert_eq!(m.sync_with_queue(false), None);
        assert_eq!(m.sync_with_queue(true).map(|t| t.to), Some(ActivityState::Working));
    }

    #[test]
    fn restore_never_yields_talking() {
        let m = ActivityStateMachine::restore(ActivityState::Talking, None, None);
        assert_eq!(m.state(), ActivityState::Idle);
    }
}
