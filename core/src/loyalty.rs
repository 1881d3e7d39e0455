//! Loyalty and risk engine: one per worker.
//!
//! State vector, every entry in [0, 1]:
//!   loyalty, energy, mood, satisfaction   primary, adjusted by events
//!   disloyalty_risk, report_risk          derived, recomputed daily
//!
//! Coupling rules run after every adjustment and on every hourly tick:
//!   mood < mood_low                → loyalty decays
//!   satisfaction < satisfaction_low  → loyalty decays
//!   satisfaction > satisfaction_high → loyalty grows
//!   energy < low_energy_threshold  → one-time mood penalty, re-armed on recovery
//!
//! Risk draws take the caller's RNG stream; the engine owns no randomness.

use crate::{
    config::RiskConfig,
    rng::SubsystemRng,
    types::WorkerId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Loyalty,
    Energy,
    Mood,
    Satisfaction,
    DisloyaltyRisk,
    ReportRisk,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Loyalty,
        Stat::Energy,
        Stat::Mood,
        Stat::Satisfaction,
        Stat::DisloyaltyRisk,
        Stat::ReportRisk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stat::Loyalty        => "loyalty",
            Stat::Energy         => "energy",
            Stat::Mood           => "mood",
            Stat::Satisfaction   => "satisfaction",
            Stat::DisloyaltyRisk => "disloyalty_risk",
            Stat::ReportRisk     => "report_risk",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskEventKind {
    Resignation,
    Gossip,
    Theft,
    AuthorityReport,
    /// The no-op slot of the distribution: a bad shift, no outside effect.
    PoorPerformance,
}

impl RiskEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            RiskEventKind::Resignation     => "resignation",
            RiskEventKind::Gossip          => "gossip",
            RiskEventKind::Theft           => "theft",
            RiskEventKind::AuthorityReport => "authority_report",
            RiskEventKind::PoorPerformance => "poor_performance",
        }
    }
}

/// A discrete stochastic outcome. Consumed immediately by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEvent {
    pub kind:      RiskEventKind,
    /// Currency for theft, reputation points for gossip, severity otherwise.
    pub magnitude: f64,
    pub worker_id: WorkerId,
    pub cause:     String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyRiskEngine {
    pub loyalty:         f64,
    pub energy:          f64,
    pub mood:            f64,
    pub satisfaction:    f64,
    pub disloyalty_risk: f64,
    pub report_risk:     f64,
    /// Set once the low-energy mood penalty has fired; cleared on recovery.
    #[serde(default)]
    low_energy_penalised: bool,
}

/// Terms of one daily recomputation, kept for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRecompute {
    pub salary_term:     f64,
    pub tip_term:        f64,
    pub mood_term:       f64,
    pub loyalty:         f64,
    pub disloyalty_risk: f64,
    pub report_risk:     f64,
}

impl LoyaltyRiskEngine {
    pub fn new(config: &RiskConfig, loyalty_bias: f64) -> Self {
        let init = &config.initial;
        let mut engine = Self {
            loyalty:         unit(init.loyalty + loyalty_bias),
            energy:          unit(init.energy),
            mood:            unit(init.mood),
            satisfaction:    unit(init.satisfaction),
            disloyalty_risk: 0.0,
            report_risk:     0.0,
            low_energy_penalised: false,
        };
        engine.refresh_risk(config, 0.0);
        engine
    }

    pub fn get(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Loyalty        => self.loyalty,
            Stat::Energy         => self.energy,
            Stat::Mood           => self.mood,
            Stat::Satisfaction   => self.satisfaction,
            Stat::DisloyaltyRisk => self.disloyalty_risk,
            Stat::ReportRisk     => self.report_risk,
        }
    }

    fn slot(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::Loyalty        => &mut self.loyalty,
            Stat::Energy         => &mut self.energy,
            Stat::Mood           => &mut self.mood,
            Stat::Satisfaction   => &mut self.satisfaction,
            Stat::DisloyaltyRisk => &mut self.disloyalty_risk,
            Stat::ReportRisk     => &mut self.report_risk,
        }
    }

    /// Clamp-add `delta` to `stat`, then run the coupling rules.
    /// Returns the delta actually applied to `stat` itself.
    pub fn adjust(&mut self, config: &RiskConfig, stat: Stat, delta: f64, reason: &str) -> f64 {
        let slot = self.slot(stat);
        let before = *slot;
        *slot = unit(before + if delta.is_finite() { delta } else { 0.0 });
        let applied = *slot - before;

        log::trace!("adjust {}: {before:.3} {applied:+.3} ({reason})", stat.name());

        self.apply_coupling(config);
        applied
    }

    /// The cross-coupling rules. Called after each adjustment and hourly.
    pub fn apply_coupling(&mut self, config: &RiskConfig) {
        if self.mood < config.mood_low {
            self.loyalty = unit(self.loyalty - config.mood_loyalty_decay);
        }
        if self.satisfaction < config.satisfaction_low {
            self.loyalty = unit(self.loyalty - config.satisfaction_loyalty_decay);
        } else if self.satisfaction > config.satisfaction_high {
            self.loyalty = unit(self.loyalty + config.satisfaction_loyalty_growth);
        }
        if self.energy < config.low_energy_threshold {
            if !self.low_energy_penalised {
                self.mood = unit(self.mood - config.low_energy_mood_penalty);
                self.low_energy_penalised = true;
            }
        } else {
            self.low_energy_penalised = false;
        }
    }

    /// Daily loyalty update followed by the risk recomputation.
    pub fn daily_recompute(
        &mut self,
        config: &RiskConfig,
        salary_factor: f64,
        tip_factor: f64,
    ) -> DailyRecompute {
        let bound = config.max_daily_term.abs();
        let salary_term = salary_factor.clamp(-bound, bound);
        let tip_term = tip_factor.clamp(-bound, bound);
        let mood_term = ((self.mood - 0.5) * config.mood_factor_scale).clamp(-bound, bound);

        self.loyalty = unit(self.loyalty + salary_term + tip_term + mood_term);
        self.refresh_risk(config, salary_factor);

        DailyRecompute {
            salary_term,
            tip_term,
            mood_term,
            loyalty: self.loyalty,
            disloyalty_risk: self.disloyalty_risk,
            report_risk: self.report_risk,
        }
    }

    /// Recompute only the derived risks from the current state.
    /// `salary_factor` is unclamped: a missed payment counts in full.
    pub fn refresh_risk(&mut self, config: &RiskConfig, salary_factor: f64) {
        let disloyalty = (0.5 - self.loyalty).max(0.0)
            + (-salary_factor).max(0.0) * 2.0
            + (0.5 - self.mood).max(0.0);
        self.disloyalty_risk = unit(disloyalty);
        self.report_risk = unit(self.disloyalty_risk * config.report_fraction);
    }

    /// Probability that the next `sample_risk_event` call fires at all.
    pub fn event_probability(&self, config: &RiskConfig) -> f64 {
        (self.disloyalty_risk - config.event_threshold).max(0.0)
    }

    /// Probability that the next draw is a resignation.
    pub fn resignation_probability(&self, config: &RiskConfig) -> f64 {
        if self.loyalty >= config.resignation_threshold {
            return 0.0;
        }
        let w = &config.kind_weights;
        let total = w.poor_performance + w.theft + w.gossip + w.authority_report;
        if total <= 0.0 {
            return 0.0;
        }
        self.event_probability(config) * (w.poor_performance / total)
    }

    pub fn sample_risk_event(
        &self,
        config: &RiskConfig,
        rng: &mut SubsystemRng,
        worker_id: &str,
    ) -> Option<RiskEvent> {
        let p = self.event_probability(config);
        if p <= 0.0 || !rng.chance(p) {
            return None;
        }

        let w = &config.kind_weights;
        let total = w.poor_performance + w.theft + w.gossip + w.authority_report;
        let roll = rng.next_f64() * total;

        let mut kind = if roll < w.poor_performance {
            RiskEventKind::PoorPerformance
        } else if roll < w.poor_performance + w.theft {
            RiskEventKind::Theft
        } else if roll < w.poor_performance + w.theft + w.gossip {
            RiskEventKind::Gossip
        } else {
            RiskEventKind::AuthorityReport
        };

        if kind == RiskEventKind::PoorPerformance && self.loyalty < config.resignation_threshold {
            kind = RiskEventKind::Resignation;
        }
        if kind == RiskEventKind::AuthorityReport && !rng.chance(self.report_risk) {
            kind = RiskEventKind::Gossip;
        }

        Some(self.build_event(config, rng, worker_id, kind))
    }

    /// Materialise an event of a known kind, drawing its magnitude.
    pub fn build_event(
        &self,
        config: &RiskConfig,
        rng: &mut SubsystemRng,
        worker_id: &str,
        kind: RiskEventKind,
    ) -> RiskEvent {
        let magnitude = match kind {
            RiskEventKind::Theft => {
                config.theft_base_amount * (1.0 + self.disloyalty_risk) * rng.range(0.5, 1.5)
            }
            RiskEventKind::Gossip => config.gossip_base_impact * (1.0 + self.disloyalty_risk),
            RiskEventKind::AuthorityReport => self.report_risk,
            RiskEventKind::PoorPerformance => config.poor_performance_mood_dip,
            RiskEventKind::Resignation => 1.0,
        };
        RiskEvent {
            kind,
            magnitude,
            worker_id: worker_id.to_string(),
            cause: format!(
                "loyalty={:.2} mood={:.2} disloyalty={:.2} report={:.2}",
                self.loyalty, self.mood, self.disloyalty_risk, self.report_risk
            ),
        }
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
