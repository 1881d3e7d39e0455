//! Shared primitive types used across the entire simulation.

/// A simulation day counter. Day 0 is the opening day.
pub type Day = u64;

/// Seconds of simulated time. Continuous per-frame deltas are expressed in this unit.
pub type SimSeconds = f64;

/// Stable identifier for a worker on the roster (`w-<uuid>`).
pub type WorkerId = String;

/// Monotonic task identifier, unique within one orchestrator.
pub type TaskId = u64;

/// The canonical run identifier.
pub type RunId = String;
