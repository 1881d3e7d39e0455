//! Simulation clock: converts continuous frame deltas into simulated
//! time and reports the hour/day boundaries each step crosses.

use crate::{
    config::ClockConfig,
    types::{Day, SimSeconds},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    /// Total simulated seconds since the run started.
    pub elapsed:          SimSeconds,
    pub seconds_per_hour: SimSeconds,
    pub hours_per_day:    u32,
    pub speed:            SimSpeed,
    pub paused:           bool,
}

/// A boundary crossed during one `advance` call, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "boundary", rename_all = "snake_case")]
pub enum ClockBoundary {
    /// An hour ended. `hour` is the index within the day of the hour that just began.
    Hour { day: Day, hour: u32 },
    /// A day ended. `day` is the index of the day that just began.
    Day { day: Day },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClockStep {
    /// Real delta after speed scaling; zero while paused.
    pub scaled_dt:  SimSeconds,
    pub boundaries: Vec<ClockBoundary>,
}

impl SimClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            elapsed:          0.0,
            seconds_per_hour: config.seconds_per_hour.max(1.0),
            hours_per_day:    config.hours_per_day.max(1),
            speed:            SimSpeed::Normal,
            paused:           false,
        }
    }

    pub fn seconds_per_day(&self) -> SimSeconds {
        self.seconds_per_hour * self.hours_per_day as f64
    }

    pub fn now(&self) -> SimSeconds {
        self.elapsed
    }

    pub fn current_hour_index(&self) -> u64 {
        (self.elapsed / self.seconds_per_hour).floor() as u64
    }

    pub fn current_day(&self) -> Day {
        self.current_hour_index() / self.hours_per_day as u64
    }

    pub fn hour_of_day(&self) -> u32 {
        (self.current_hour_index() % self.hours_per_day as u64) as u32
    }

    /// Advance by a frame delta. Negative or non-finite deltas are ignored.
    pub fn advance(&mut self, dt: SimSeconds) -> ClockStep {
        if self.paused || !dt.is_finite() || dt <= 0.0 {
            return ClockStep { scaled_dt: 0.0, boundaries: Vec::new() };
        }

        let scaled_dt = dt * self.speed.multiplier();
        let hour_before = self.current_hour_index();
        self.elapsed += scaled_dt;
        let hour_after = self.current_hour_index();

        let hpd = self.hours_per_day as u64;
        let mut boundaries = Vec::new();
        for h in (hour_before + 1)..=hour_after {
            let day = h / hpd;
            let hour = (h % hpd) as u32;
            boundaries.push(ClockBoundary::Hour { day, hour });
            if hour == 0 {
                boundaries.push(ClockBoundary::Day { day });
            }
        }

        ClockStep { scaled_dt, boundaries }
    }

    pub fn pause(&mut self)  { self.paused = true;  }
    pub fn resume(&mut self) { self.paused = false; }

    pub fn set_speed(&mut self, speed: SimSpeed) {
        self.speed = speed;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimSpeed {
    Normal,       // 1x
    Accelerated,  // 3x
    FastForward,  // 10x
}

impl SimSpeed {
    pub fn multiplier(&self) -> f64 {
        match self {
            SimSpeed::Normal      => 1.0,
            SimSpeed::Accelerated => 3.0,
            SimSpeed::FastForward => 10.0,
        }
    }
}
