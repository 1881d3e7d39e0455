use crate::{
    role::{Role, TaskKind},
    skill,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Roles ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    pub role: Role,
    pub label: String,
    /// Roster cap for this role.
    pub max_headcount: usize,
    /// Daily base salary before modifiers.
    pub base_salary: f64,
    /// One-off hiring cost before trait multipliers.
    pub hire_cost: f64,
    /// Queue capacity for normal-priority tasks (active + queued).
    pub max_concurrent_tasks: usize,
    pub base_skills: BTreeMap<String, f64>,
    pub task_kinds: Vec<TaskKind>,
    /// Skill name -> weight used when scoring task quality.
    pub scoring_weights: BTreeMap<String, f64>,
    /// Share of the tip pool this role receives, before renormalisation.
    pub tip_weight: f64,
    /// Whether an urgent assignment interrupts the active normal task.
    #[serde(default)]
    pub preempts_on_urgent: bool,
    pub special: SpecialBehaviorConfig,
}

impl RoleConfig {
    pub fn handles(&self, kind: TaskKind) -> bool {
        self.task_kinds.contains(&kind)
    }
}

/// A time-bounded boost a worker can be asked to perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialBehaviorConfig {
    pub label: String,
    pub skill: String,
    pub delta: f64,
    pub duration_secs: f64,
    pub energy_cost: f64,
}

#[derive(Debug, Clone, Deserialize)]
struct RolesFile {
    roles: Vec<RoleConfig>,
}

// ── Traits ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitConfig {
    pub name: String,
    #[serde(default)]
    pub skill_deltas: BTreeMap<String, f64>,
    #[serde(default = "one")]
    pub hire_cost_multiplier: f64,
    #[serde(default = "one")]
    pub salary_multiplier: f64,
    /// Added to starting loyalty.
    #[serde(default)]
    pub loyalty_bias: f64,
    /// Extra per-task chance of a mishap (spill, breakage).
    #[serde(default)]
    pub mishap_chance: f64,
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
struct TraitsFile {
    traits: Vec<TraitConfig>,
}

// ── Tasks ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskKindConfig {
    pub kind: TaskKind,
    pub base_duration_secs: f64,
    pub type_multiplier: f64,
    pub relevant_skill: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Required duration never drops below this fraction of the base.
    pub duration_floor_fraction: f64,
    /// How much a tired, unhappy worker stretches a task (0.5 = up to +50%).
    pub fatigue_duration_penalty: f64,
    /// Per-task mishap chance before traits and condition.
    pub base_mishap_chance: f64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            duration_floor_fraction: 0.4,
            fatigue_duration_penalty: 0.5,
            base_mishap_chance: 0.01,
        }
    }
}

// ── Scoring ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Smallest score ever returned; never exactly zero.
    pub floor: f64,
    /// Blend weight of the preference-distance sub-score.
    pub preference_weight: f64,
    /// Weight of the condition factor in quality scoring.
    pub condition_weight: f64,
    pub energy_weight: f64,
    pub mood_weight: f64,
    pub service_rate_base: f64,
    pub service_rate_span: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            floor: 0.05,
            preference_weight: 0.3,
            condition_weight: 0.3,
            energy_weight: 0.6,
            mood_weight: 0.4,
            service_rate_base: 0.5,
            service_rate_span: 0.75,
        }
    }
}

// ── Loyalty and risk ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub event_threshold: f64,
    pub report_fraction: f64,
    pub resignation_threshold: f64,
    pub mood_low: f64,
    pub mood_loyalty_decay: f64,
    pub satisfaction_low: f64,
    pub satisfaction_high: f64,
    pub satisfaction_loyalty_decay: f64,
    pub satisfaction_loyalty_growth: f64,
    pub low_energy_threshold: f64,
    pub low_energy_mood_penalty: f64,
    /// Bound on each term of the daily loyalty update.
    pub max_daily_term: f64,
    pub mood_factor_scale: f64,
    pub kind_weights: RiskKindWeights,
    pub theft_base_amount: f64,
    pub gossip_base_impact: f64,
    pub poor_performance_mood_dip: f64,
    pub initial: InitialStats,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            event_threshold: 0.5,
            report_fraction: 0.2,
            resignation_threshold: 0.35,
            mood_low: 0.3,
            mood_loyalty_decay: 0.005,
            satisfaction_low: 0.3,
            satisfaction_high: 0.7,
            satisfaction_loyalty_decay: 0.01,
            satisfaction_loyalty_growth: 0.005,
            low_energy_threshold: 0.2,
            low_energy_mood_penalty: 0.1,
            max_daily_term: 0.05,
            mood_factor_scale: 0.04,
            kind_weights: RiskKindWeights::default(),
            theft_base_amount: 60.0,
            gossip_base_impact: 2.0,
            poor_performance_mood_dip: 0.05,
            initial: InitialStats::default(),
        }
    }
}

/// Distribution of the second draw once a risk event fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskKindWeights {
    pub poor_performance: f64,
    pub theft: f64,
    pub gossip: f64,
    pub authority_report: f64,
}

impl Default for RiskKindWeights {
    fn default() -> Self {
        Self {
            poor_performance: 0.5,
            theft: 0.2,
            gossip: 0.2,
            authority_report: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitialStats {
    pub loyalty: f64,
    pub energy: f64,
    pub mood: f64,
    pub satisfaction: f64,
}

impl Default for InitialStats {
    fn default() -> Self {
        Self { loyalty: 0.6, energy: 1.0, mood: 0.7, satisfaction: 0.6 }
    }
}

// ── Payroll, tips, severance ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    pub success_loyalty_bonus: f64,
    pub failure_loyalty_penalty: f64,
    pub failure_mood_penalty: f64,
    /// Salary factor fed into the daily loyalty update after a paid period.
    pub paid_salary_factor: f64,
    /// Salary factor after a missed payment; negative.
    pub missed_salary_factor: f64,
    /// Chance a worker below the resignation threshold acts immediately.
    pub unpaid_departure_chance: f64,
    /// Of those who act, the share that resign rather than steal or gossip.
    pub unpaid_resign_share: f64,
    pub severance_days: f64,
    pub contagion_chance: f64,
    pub contagion_penalty: f64,
    pub skill_modifier_base: f64,
    pub skill_modifier_span: f64,
    pub tenure_step: f64,
    pub tenure_cap: f64,
    pub level_step: f64,
    pub max_level: u32,
    /// Days between paydays (used by the host loop).
    pub pay_period_days: u64,
    /// Fraction of each tip pool the house keeps.
    pub house_tip_share: f64,
    pub tip_satisfaction_cap: f64,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            success_loyalty_bonus: 0.02,
            failure_loyalty_penalty: 0.3,
            failure_mood_penalty: 0.25,
            paid_salary_factor: 0.01,
            missed_salary_factor: -0.15,
            unpaid_departure_chance: 0.3,
            unpaid_resign_share: 0.5,
            severance_days: 5.0,
            contagion_chance: 0.5,
            contagion_penalty: 0.03,
            skill_modifier_base: 0.8,
            skill_modifier_span: 0.4,
            tenure_step: 0.002,
            tenure_cap: 0.2,
            level_step: 0.1,
            max_level: 5,
            pay_period_days: 7,
            house_tip_share: 0.0,
            tip_satisfaction_cap: 0.05,
        }
    }
}

// ── Clock, energy, training, conversation ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub seconds_per_hour: f64,
    /// Opening hours per business day.
    pub hours_per_day: u32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { seconds_per_hour: 60.0, hours_per_day: 12 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub work_drain_per_hour: f64,
    pub idle_recovery_per_hour: f64,
    pub rest_recovery_per_hour: f64,
    /// Idle workers below this energy go to rest.
    pub rest_threshold: f64,
    /// Resting workers at or above this energy return to idle.
    pub rested_threshold: f64,
    /// Hourly injury chance for a working worker at zero energy.
    pub injury_chance_per_hour: f64,
    pub injury_duration_secs: f64,
    /// Overnight energy restored at the daily tick.
    pub overnight_recovery: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            work_drain_per_hour: 0.05,
            idle_recovery_per_hour: 0.02,
            rest_recovery_per_hour: 0.15,
            rest_threshold: 0.25,
            rested_threshold: 0.8,
            injury_chance_per_hour: 0.02,
            injury_duration_secs: 1800.0,
            overnight_recovery: 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of the remaining gap closed per completed task.
    pub rate_per_task: f64,
    pub max_tasks_counted: u32,
    pub speed_rate_per_day: f64,
    pub experience_per_task: f64,
    pub experience_per_level: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            rate_per_task: 0.005,
            max_tasks_counted: 20,
            speed_rate_per_day: 0.002,
            experience_per_task: 1.0,
            experience_per_level: 25.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub praise_mood: f64,
    pub praise_loyalty: f64,
    pub reprimand_mood: f64,
    pub reprimand_loyalty: f64,
    pub reprimand_energy: f64,
    /// Loyalty gained per percentage point of raise.
    pub raise_loyalty_per_pct: f64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            praise_mood: 0.1,
            praise_loyalty: 0.02,
            reprimand_mood: -0.1,
            reprimand_loyalty: -0.02,
            reprimand_energy: 0.1,
            raise_loyalty_per_pct: 0.01,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TuningFile {
    tasks: Vec<TaskKindConfig>,
    #[serde(default)]
    queue: QueueConfig,
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    risk: RiskConfig,
    #[serde(default)]
    payroll: PayrollConfig,
    #[serde(default)]
    clock: ClockConfig,
    #[serde(default)]
    energy: EnergyConfig,
    #[serde(default)]
    training: TrainingConfig,
    #[serde(default)]
    conversation: ConversationConfig,
}

// ── Top level ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StaffConfig {
    pub roles: BTreeMap<Role, RoleConfig>,
    pub traits: BTreeMap<String, TraitConfig>,
    pub tasks: BTreeMap<TaskKind, TaskKindConfig>,
    pub queue: QueueConfig,
    pub scoring: ScoringConfig,
    pub risk: RiskConfig,
    pub payroll: PayrollConfig,
    pub clock: ClockConfig,
    pub energy: EnergyConfig,
    pub training: TrainingConfig,
    pub conversation: ConversationConfig,
}

impl StaffConfig {
    /// Load from the data/ directory.
    /// In tests, use StaffConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let roles_path = format!("{data_dir}/staff/roles.json");
        let roles_content = std::fs::read_to_string(&roles_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {roles_path}: {e}"))?;
        let roles_file: RolesFile = serde_json::from_str(&roles_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {roles_path}: {e}"))?;
        let roles = roles_file
            .roles
            .into_iter()
            .map(|r| (r.role, r))
            .collect();

        let traits_path = format!("{data_dir}/staff/traits.json");
        let traits_content = std::fs::read_to_string(&traits_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {traits_path}: {e}"))?;
        let traits_file: TraitsFile = serde_json::from_str(&traits_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {traits_path}: {e}"))?;
        let traits = traits_file
            .traits
            .into_iter()
            .map(|t| (t.name.clone(), t))
            .collect();

        let tuning_path = format!("{data_dir}/staff/tuning.json");
        let tuning_content = std::fs::read_to_string(&tuning_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {tuning_path}: {e}"))?;
        let tuning: TuningFile = serde_json::from_str(&tuning_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {tuning_path}: {e}"))?;
        let tasks = tuning
            .tasks
            .into_iter()
            .map(|t| (t.kind, t))
            .collect();

        let config = Self {
            roles,
            traits,
            tasks,
            queue: tuning.queue,
            scoring: tuning.scoring,
            risk: tuning.risk,
            payroll: tuning.payroll,
            clock: tuning.clock,
            energy: tuning.energy,
            training: tuning.training,
            conversation: tuning.conversation,
        };
        config.validate()?;
        Ok(config)
    }

    /// Every role and task kind must be configured; the orchestrator
    /// relies on lookups never missing after load.
    pub fn validate(&self) -> anyhow::Result<()> {
        for role in Role::ALL {
            let cfg = self
                .roles
                .get(&role)
                .ok_or_else(|| anyhow::anyhow!("role '{role}' missing from roles.json"))?;
            if cfg.max_concurrent_tasks == 0 {
                anyhow::bail!("role '{role}' has max_concurrent_tasks = 0");
            }
        }
        for kind in TaskKind::ALL {
            if !self.tasks.contains_key(&kind) {
                anyhow::bail!("task kind '{kind}' missing from tuning.json");
            }
        }
        let w = &self.risk.kind_weights;
        let total = w.poor_performance + w.theft + w.gossip + w.authority_report;
        if total <= 0.0 {
            anyhow::bail!("risk.kind_weights must not all be zero");
        }
        Ok(())
    }

    pub fn role(&self, role: Role) -> Option<&RoleConfig> {
        self.roles.get(&role)
    }

    pub fn task(&self, kind: TaskKind) -> Option<&TaskKindConfig> {
        self.tasks.get(&kind)
    }

    pub fn default_test() -> Self {
        let roles = vec![
            role_row(
                Role::Cook, "Cook", 3, 120.0, 300.0, 3,
                &[(skill::COOKING, 0.5), (skill::SPEED, 0.4), (skill::CHARISMA, 0.2)],
                &[(skill::COOKING, 0.6), (skill::SPEED, 0.2)],
                0.2, false,
                special("rush", skill::SPEED, 0.2, 60.0, 0.1),
            ),
            role_row(
                Role::Waiter, "Waiter", 4, 90.0, 200.0, 3,
                &[(skill::SERVICE, 0.5), (skill::SPEED, 0.5), (skill::CHARISMA, 0.4)],
                &[(skill::SERVICE, 0.5), (skill::CHARISMA, 0.3)],
                0.4, false,
                special("charm offensive", skill::CHARISMA, 0.2, 60.0, 0.05),
            ),
            role_row(
                Role::Bartender, "Bartender", 2, 100.0, 250.0, 3,
                &[(skill::MIXOLOGY, 0.5), (skill::SPEED, 0.4), (skill::CHARISMA, 0.4)],
                &[(skill::MIXOLOGY, 0.6), (skill::CHARISMA, 0.2)],
                0.3, false,
                special("show pour", skill::MIXOLOGY, 0.15, 45.0, 0.05),
            ),
            role_row(
                Role::Cleaner, "Cleaner", 2, 70.0, 150.0, 4,
                &[(skill::CLEANING, 0.5), (skill::SPEED, 0.5)],
                &[(skill::CLEANING, 0.7), (skill::SPEED, 0.1)],
                0.05, true,
                special("deep clean", skill::CLEANING, 0.2, 90.0, 0.1),
            ),
            role_row(
                Role::Bouncer, "Bouncer", 2, 95.0, 220.0, 2,
                &[(skill::SECURITY, 0.6), (skill::SPEED, 0.3), (skill::CHARISMA, 0.2)],
                &[(skill::SECURITY, 0.7)],
                0.05, true,
                special("stare down", skill::SECURITY, 0.2, 60.0, 0.05),
            ),
            role_row(
                Role::Manager, "Manager", 1, 160.0, 500.0, 2,
                &[(skill::MANAGEMENT, 0.6), (skill::SERVICE, 0.4), (skill::CHARISMA, 0.5)],
                &[(skill::MANAGEMENT, 0.6), (skill::CHARISMA, 0.2)],
                0.0, false,
                special("pep talk", skill::MANAGEMENT, 0.1, 120.0, 0.1),
            ),
        ];

        let traits = vec![
            trait_row("fast", &[(skill::SPEED, 0.15)], 1.1, 1.05, 0.0, 0.0),
            trait_row("clumsy", &[(skill::SPEED, -0.05)], 0.8, 0.9, 0.0, 0.08),
            trait_row("charming", &[(skill::CHARISMA, 0.2)], 1.15, 1.05, 0.0, 0.0),
            trait_row(
                "diligent",
                &[(skill::COOKING, 0.05), (skill::SERVICE, 0.05), (skill::MIXOLOGY, 0.05), (skill::CLEANING, 0.05)],
                1.1, 1.0, 0.05, 0.0,
            ),
            trait_row("greedy", &[], 1.0, 1.2, -0.1, 0.0),
            trait_row("loyal", &[], 1.1, 1.0, 0.15, 0.0),
            trait_row("lazy", &[(skill::SPEED, -0.1)], 0.7, 0.9, 0.0, 0.02),
            trait_row(
                "veteran",
                &[(skill::COOKING, 0.1), (skill::SERVICE, 0.1), (skill::MIXOLOGY, 0.1),
                  (skill::CLEANING, 0.1), (skill::SECURITY, 0.1), (skill::MANAGEMENT, 0.1)],
                1.5, 1.25, 0.0, 0.0,
            ),
        ];

        let tasks = vec![
            task_row(TaskKind::CookOrder, 120.0, 1.0, skill::COOKING),
            task_row(TaskKind::TakeOrder, 30.0, 1.0, skill::SERVICE),
            task_row(TaskKind::ServeOrder, 45.0, 1.0, skill::SERVICE),
            task_row(TaskKind::MixDrink, 60.0, 1.0, skill::MIXOLOGY),
            task_row(TaskKind::CleanTable, 60.0, 1.0, skill::CLEANING),
            task_row(TaskKind::CleanSpill, 40.0, 1.2, skill::CLEANING),
            task_row(TaskKind::Restock, 90.0, 1.0, skill::SPEED),
            task_row(TaskKind::Patrol, 300.0, 1.0, skill::SECURITY),
            task_row(TaskKind::RemoveTroublemaker, 90.0, 1.5, skill::SECURITY),
            task_row(TaskKind::Supervise, 600.0, 1.0, skill::MANAGEMENT),
        ];

        Self {
            roles: roles.into_iter().map(|r| (r.role, r)).collect(),
            traits: traits.into_iter().map(|t| (t.name.clone(), t)).collect(),
            tasks: tasks.into_iter().map(|t| (t.kind, t)).collect(),
            queue: QueueConfig::default(),
            scoring: ScoringConfig::default(),
            risk: RiskConfig::default(),
            payroll: PayrollConfig::default(),
            clock: ClockConfig::default(),
            energy: EnergyConfig::default(),
            training: TrainingConfig::default(),
            conversation: ConversationConfig::default(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn role_row(
    role: Role,
    label: &str,
    max_headcount: usize,
    base_salary: f64,
    hire_cost: f64,
    max_concurrent_tasks: usize,
    base_skills: &[(&str, f64)],
    scoring_weights: &[(&str, f64)],
    tip_weight: f64,
    preempts_on_urgent: bool,
    special: SpecialBehaviorConfig,
) -> RoleConfig {
    RoleConfig {
        role,
        label: label.into(),
        max_headcount,
        base_salary,
        hire_cost,
        max_concurrent_tasks,
        base_skills: base_skills.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        task_kinds: role.default_task_kinds().to_vec(),
        scoring_weights: scoring_weights.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        tip_weight,
        preempts_on_urgent,
        special,
    }
}

fn special(label: &str, skill: &str, delta: f64, duration_secs: f64, energy_cost: f64) -> SpecialBehaviorConfig {
    SpecialBehaviorConfig {
        label: label.into(),
        skill: skill.into(),
        delta,
        duration_secs,
        energy_cost,
    }
}

fn trait_row(
    name: &str,
    skill_deltas: &[(&str, f64)],
    hire_cost_multiplier: f64,
    salary_multiplier: f64,
    loyalty_bias: f64,
    mishap_chance: f64,
) -> TraitConfig {
    TraitConfig {
        name: name.into(),
        skill_deltas: skill_deltas.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        hire_cost_multiplier,
        salary_multiplier,
        loyalty_bias,
        mishap_chance,
    }
}

fn task_row(kind: TaskKind, base_duration_secs: f64, type_multiplier: f64, relevant_skill: &str) -> TaskKindConfig {
    TaskKindConfig {
        kind,
        base_duration_secs,
        type_multiplier,
        relevant_skill: relevant_skill.into(),
    }
}
