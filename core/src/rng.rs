//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SubsystemRng instances derived
//! from the single master seed handed to the orchestrator.
//!
//! Each concern (hiring, task mishaps, risk draws, ...) gets its own
//! stream, seeded from (master_seed, slot, day). This means:
//!   - Adding a new slot never changes existing streams.
//!   - A day's draws are reproducible without replaying earlier days.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

const SLOT_MIX: u64 = 0x9e37_79b9_7f4a_7c15;
const DAY_MIX:  u64 = 0xc2b2_ae3d_27d4_eb4f;

/// A named, deterministic RNG for a single concern.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a stream from a raw seed. Tests use this directly.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Uniform float in [lo, hi).
    pub fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Sixteen random bytes, used to mint deterministic uuids.
    pub fn bytes16(&mut self) -> [u8; 16] {
        let mut out = [0u8; 16];
        self.inner.fill_bytes(&mut out);
        out
    }
}

/// Stream factory for a single run.
#[derive(Debug, Clone)]
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// The stream for `slot` on `day`. Calling twice with the same
    /// arguments yields identical sequences; callers keep the stream
    /// alive for the duration of the day's work.
    pub fn for_slot_at_day(&self, slot: RngSlot, day: u64) -> SubsystemRng {
        let derived = self.master_seed
            ^ (slot as u64 + 1).wrapping_mul(SLOT_MIX)
            ^ day.wrapping_add(1).wrapping_mul(DAY_MIX);
        SubsystemRng::from_seed(derived).with_name(slot.name())
    }
}

/// Stable slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u64)]
pub enum RngSlot {
    Hiring   = 0,
    Tasks    = 1,
    Hourly   = 2,
    Risk     = 3,
    Morale   = 4,
    Payroll  = 5,
    Names    = 6,
    Customers = 7,
}

impl RngSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hiring    => "hiring",
            Self::Tasks     => "tasks",
            Self::Hourly    => "hourly",
            Self::Risk      => "risk",
            Self::Morale    => "morale",
            Self::Payroll   => "payroll",
            Self::Names     => "names",
            Self::Customers => "customers",
        }
    }

    pub const ALL: [RngSlot; 8] = [
        Self::Hiring,
        Self::Tasks,
        Self::Hourly,
        Self::Risk,
        Self::Morale,
        Self::Payroll,
        Self::Names,
        Self::Customers,
    ];
}
