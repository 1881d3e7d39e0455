//! Loyalty/risk engine: coupling, daily recomputation and event sampling.

use staffsim_core::{
    config::RiskConfig,
    loyalty::{LoyaltyRiskEngine, RiskEventKind, Stat},
    rng::{RngBank, RngSlot, SubsystemRng},
};

fn engine() -> (RiskConfig, LoyaltyRiskEngine) {
    let cfg = RiskConfig::default();
    let engine = LoyaltyRiskEngine::new(&cfg, 0.0);
    (cfg, engine)
}

fn assert_unit(engine: &LoyaltyRiskEngine) {
    for stat in Stat::ALL {
        let v = engine.get(stat);
        assert!((0.0..=1.0).contains(&v), "{} out of range: {v}", stat.name());
    }
}

// ── Bounds ───────────────────────────────────────────────────────────────────

#[test]
fn initial_state_matches_config() {
    let (cfg, e) = engine();
    assert!((e.loyalty - cfg.initial.loyalty).abs() < 1e-12);
    assert!((e.energy - 1.0).abs() < 1e-12);
    assert_eq!(e.disloyalty_risk, 0.0);
    assert_eq!(e.report_risk, 0.0);
}

#[test]
fn loyalty_bias_shifts_the_start() {
    let cfg = RiskConfig::default();
    let loyal = LoyaltyRiskEngine::new(&cfg, 0.15);
    assert!((loyal.loyalty - 0.75).abs() < 1e-12);
}

#[test]
fn adjust_clamps_and_reports_applied_delta() {
    let (cfg, mut e) = engine();
    let applied = e.adjust(&cfg, Stat::Energy, 0.5, "test");
    assert_eq!(applied, 0.0, "energy already full");

    let applied = e.adjust(&cfg, Stat::Loyalty, -5.0, "test");
    assert!((applied + 0.6).abs() < 1e-12);
    assert_eq!(e.loyalty, 0.0);
    assert_unit(&e);
}

#[test]
fn non_finite_delta_is_ignored() {
    let (cfg, mut e) = engine();
    e.adjust(&cfg, Stat::Mood, f64::NAN, "test");
    assert!((e.mood - 0.7).abs() < 1e-12);
}

#[test]
fn stats_stay_bounded_under_repeated_extremes() {
    let (cfg, mut e) = engine();
    let mut rng = SubsystemRng::from_seed(11);
    for _ in 0..2_000 {
        let stat = Stat::ALL[rng.next_u64_below(4) as usize];
        e.adjust(&cfg, stat, rng.range(-3.0, 3.0), "fuzz");
        e.daily_recompute(&cfg, rng.range(-1.0, 1.0), rng.range(-1.0, 1.0));
        assert_unit(&e);
    }
}

// ── Coupling ─────────────────────────────────────────────────────────────────

#[test]
fn low_mood_erodes_loyalty() {
    let (cfg, mut e) = engine();
    e.adjust(&cfg, Stat::Mood, -0.6, "bad day");
    let before = e.loyalty;
    e.apply_coupling(&cfg);
    assert!(e.loyalty < before);
}

#[test]
fn high_satisfaction_builds_loyalty() {
    let (cfg, mut e) = engine();
    e.adjust(&cfg, Stat::Satisfaction, 0.3, "great shift");
    let before = e.loyalty;
    e.apply_coupling(&cfg);
    assert!(e.loyalty > before);
}

#[test]
fn low_energy_mood_penalty_fires_once_until_recovery() {
    let (cfg, mut e) = engine();
    e.adjust(&cfg, Stat::Energy, -0.9, "double shift");
    let after_first = e.mood;
    assert!((after_first - (0.7 - cfg.low_energy_mood_penalty)).abs() < 1e-12);

    e.apply_coupling(&cfg);
    e.apply_coupling(&cfg);
    assert_eq!(e.mood, after_first, "penalty must not repeat while still tired");

    e.adjust(&cfg, Stat::Energy, 0.5, "rest");
    e.adjust(&cfg, Stat::Energy, -0.6, "another double");
    assert!(e.mood < after_first, "penalty re-arms after recovery");
}

// ── Daily recompute ──────────────────────────────────────────────────────────

#[test]
fn daily_terms_are_clamped() {
    let (cfg, mut e) = engine();
    let r = e.daily_recompute(&cfg, 10.0, -10.0);
    assert_eq!(r.salary_term, cfg.max_daily_term);
    assert_eq!(r.tip_term, -cfg.max_daily_term);
}

#[test]
fn missed_salary_raises_disloyalty_in_full() {
    let (cfg, mut e) = engine();
    let baseline = e.daily_recompute(&cfg, 0.0, 0.0).disloyalty_risk;
    let missed = e.daily_recompute(&cfg, -0.15, 0.0).disloyalty_risk;
    assert!(missed >= baseline + 0.29, "baseline={baseline} missed={missed}");
}

#[test]
fn disloyalty_is_monotone_in_loyalty() {
    let cfg = RiskConfig::default();
    let mut previous = f64::INFINITY;
    for step in 0..=10 {
        let mut e = LoyaltyRiskEngine::new(&cfg, 0.0);
        e.loyalty = step as f64 / 10.0;
        e.refresh_risk(&cfg, -0.15);
        assert!(e.disloyalty_risk <= previous, "disloyalty rose as loyalty rose");
        assert!((e.report_risk - e.disloyalty_risk * cfg.report_fraction).abs() < 1e-12);
        previous = e.disloyalty_risk;
    }
}

// ── Sampling ─────────────────────────────────────────────────────────────────

#[test]
fn content_worker_never_raises_events() {
    let (cfg, e) = engine();
    let bank = RngBank::new(5);
    for day in 0..500 {
        let mut rng = bank.for_slot_at_day(RngSlot::Risk, day);
        assert!(e.sample_risk_event(&cfg, &mut rng, "w-1").is_none());
    }
}

#[test]
fn unhappy_worker_raises_every_kind() {
    let (cfg, mut e) = engine();
    e.loyalty = 0.0;
    e.mood = 0.0;
    e.refresh_risk(&cfg, -0.5);
    assert_eq!(e.disloyalty_risk, 1.0);

    let mut rng = SubsystemRng::from_seed(99);
    let mut seen = std::collections::BTreeSet::new();
    for _ in 0..5_000 {
        if let Some(ev) = e.sample_risk_event(&cfg, &mut rng, "w-1") {
            assert_eq!(ev.worker_id, "w-1");
            assert!(ev.magnitude >= 0.0);
            seen.insert(ev.kind.name());
        }
    }
    // Loyalty below the threshold turns poor performance into resignation.
    assert!(seen.contains("resignation"));
    assert!(!seen.contains("poor_performance"));
    assert!(seen.contains("theft"));
    assert!(seen.contains("gossip"));
    assert!(seen.contains("authority_report"));
}

#[test]
fn poor_performance_stays_when_loyalty_holds() {
    let (cfg, mut e) = engine();
    e.loyalty = 0.5;
    e.mood = 0.0;
    e.refresh_risk(&cfg, -0.5);

    let mut rng = SubsystemRng::from_seed(7);
    let kinds: Vec<RiskEventKind> = (0..2_000)
        .filter_map(|_| e.sample_risk_event(&cfg, &mut rng, "w-1"))
        .map(|ev| ev.kind)
        .collect();
    assert!(kinds.contains(&RiskEventKind::PoorPerformance));
    assert!(!kinds.contains(&RiskEventKind::Resignation));
}

#[test]
fn resignation_probability_requires_low_loyalty() {
    let (cfg, mut e) = engine();
    e.refresh_risk(&cfg, -0.15);
    assert_eq!(e.resignation_probability(&cfg), 0.0, "loyalty 0.6 is above threshold");

    e.loyalty = 0.3;
    e.mood = 0.45;
    e.refresh_risk(&cfg, -0.15);
    assert!((e.disloyalty_risk - 0.55).abs() < 1e-9);
    assert!((e.event_probability(&cfg) - 0.05).abs() < 1e-9);
    assert!(e.resignation_probability(&cfg) > 0.0);
}

#[test]
fn theft_magnitude_scales_with_disloyalty() {
    let (cfg, mut e) = engine();
    e.disloyalty_risk = 1.0;
    let mut rng = SubsystemRng::from_seed(1);
    for _ in 0..100 {
        let ev = e.build_event(&cfg, &mut rng, "w-1", RiskEventKind::Theft);
        // base * 2 * [0.5, 1.5)
        assert!(ev.magnitude >= cfg.theft_base_amount && ev.magnitude < cfg.theft_base_amount * 3.0);
    }
}
