//! staff-runner: headless runner for the staff simulation.
//!
//! Usage:
//!   staff-runner --seed 12345 --days 14 --db run.db
//!   staff-runner --seed 12345 --ipc-mode

use anyhow::Result;
use staffsim_core::{
    collaborator::{Customer, Economy, Ledger, ReputationBoard, WalkInCustomer},
    config::StaffConfig,
    event::EventLogEntry,
    orchestrator::{
        settle_customer, AssignOutcome, Conversation, DepartureReason, PayrollOutcome,
        StaffOrchestrator, TaskRequest,
    },
    rng::{RngBank, RngSlot},
    role::{Role, TaskKind},
    store::StaffStore,
    types::Day,
};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::io::{self, BufRead, Write};

type Orchestrator = StaffOrchestrator<Ledger, ReputationBoard>;

const OPENING_BALANCE: f64 = 8_000.0;
const STEP_SECS: f64 = 5.0;
const ARRIVAL_CHANCE: f64 = 0.12;
const TIP_PER_QUALITY: f64 = 6.0;

const OPENING_ROSTER: [(Role, &[&str]); 8] = [
    (Role::Manager, &["veteran"]),
    (Role::Cook, &[]),
    (Role::Cook, &["fast"]),
    (Role::Waiter, &["charming"]),
    (Role::Waiter, &[]),
    (Role::Bartender, &[]),
    (Role::Cleaner, &[]),
    (Role::Bouncer, &[]),
];

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Tick {
        seconds: f64,
    },
    Command {
        cmd: String,
        payload: serde_json::Value,
    },
    Quit,
}

#[derive(serde::Serialize)]
struct UiState {
    day: Day,
    hour: u32,
    paused: bool,
    balance: f64,
    reputation: f64,
    roster: Vec<BTreeMap<String, serde_json::Value>>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let days = parse_arg(&args, "--days", 14u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("Staff sim: staff-runner");
        println!("  seed:      {seed}");
        println!("  days:      {days}");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = match StaffConfig::load(data_dir) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; falling back to built-in tuning");
            StaffConfig::default_test()
        }
    };

    let store = StaffStore::open(db)?;
    store.migrate()?;

    let now = chrono::Utc::now();
    let run_id = format!("run-{seed}-{}", now.format("%Y%m%d%H%M%S"));
    store.insert_run(&run_id, seed, env!("CARGO_PKG_VERSION"), now.timestamp())?;

    let mut orch = StaffOrchestrator::new(
        config,
        seed,
        Ledger::with_balance(OPENING_BALANCE),
        ReputationBoard::default(),
    );
    for (role, traits) in OPENING_ROSTER {
        orch.hire(role, traits)?;
    }
    persist(&store, &run_id, &mut orch)?;

    if ipc_mode {
        run_ipc_loop(&store, &run_id, &mut orch)?;
    } else {
        run_days(&store, &run_id, &mut orch, seed, days)?;
        print_summary(&store, &run_id, &orch, days)?;
    }

    Ok(())
}

// ── Headless loop ────────────────────────────────────────────────────────────

fn run_days(store: &StaffStore, run_id: &str, orch: &mut Orchestrator, seed: u64, days: u64) -> Result<()> {
    let bank = RngBank::new(seed);
    let steps_per_day = (orch.clock().seconds_per_day() / STEP_SECS).round() as u64;
    let mut waiting: HashMap<String, WalkInCustomer> = HashMap::new();
    let mut next_customer = 0u64;

    for day in 0..days {
        let mut rng = bank.for_slot_at_day(RngSlot::Customers, day);
        let mut tip_pool = 0.0;

        for _ in 0..steps_per_day {
            if rng.chance(ARRIVAL_CHANCE) {
                let facing: Vec<TaskKind> = TaskKind::ALL.into_iter().filter(|k| k.is_customer_facing()).collect();
                let kind = facing[rng.next_u64_below(facing.len() as u64) as usize];
                next_customer += 1;
                let mut customer = WalkInCustomer::new(format!("c-{next_customer}"), kind);
                if rng.chance(0.1) {
                    customer = customer.urgent();
                }
                if kind == TaskKind::MixDrink {
                    customer = customer.with_preference(vec![rng.next_f64(), rng.next_f64()]);
                }

                match least_busy(orch, kind) {
                    Some(worker_id) => {
                        if let AssignOutcome::Accepted(_) = orch.serve_customer(&worker_id, &mut customer)? {
                            waiting.insert(customer.id().to_string(), customer);
                        }
                    }
                    None => customer.adjust_satisfaction(-0.1, "nobody to serve"),
                }
            }

            let report = orch.tick(STEP_SECS);
            for outcome in &report.outcomes {
                let Some(target) = &outcome.task.target else { continue };
                if let Some(mut customer) = waiting.remove(target) {
                    settle_customer(&mut customer, outcome);
                    if let Some(q) = outcome.quality {
                        tip_pool += q * TIP_PER_QUALITY;
                        orch.economy_mut().deposit(q * 4.0 * TIP_PER_QUALITY, "sales");
                    }
                }
            }
            for _ in report.days_started {
                close_day(store, run_id, orch, tip_pool)?;
                tip_pool = 0.0;
            }
        }
    }
    Ok(())
}

fn close_day(store: &StaffStore, run_id: &str, orch: &mut Orchestrator, tip_pool: f64) -> Result<()> {
    orch.distribute_tips(tip_pool);
    let daily = orch.daily_tick();
    for id in &daily.departures {
        log::info!("day={} {id} walked out", daily.day);
    }
    if orch.day() % orch.config().payroll.pay_period_days.max(1) == 0 {
        if let PayrollOutcome::Failed { total, .. } = orch.pay_salaries() {
            log::warn!("day={} could not cover payroll of {total:.2}", orch.day());
        }
    }
    persist(store, run_id, orch)
}

/// The available worker with the shortest queue whose role handles `kind`.
fn least_busy(orch: &Orchestrator, kind: TaskKind) -> Option<String> {
    orch.roster()
        .iter()
        .filter(|w| w.activity.is_available() && !w.queue.is_full())
        .filter(|w| orch.config().role(w.role).is_some_and(|r| r.handles(kind)))
        .min_by_key(|w| w.queue.len())
        .map(|w| w.id.clone())
}

fn persist(store: &StaffStore, run_id: &str, orch: &mut Orchestrator) -> Result<()> {
    for event in orch.drain_events() {
        store.append_event(&EventLogEntry::from_event(run_id, &event)?)?;
    }
    store.save_roster(run_id, orch.day(), &orch.serialize_roster())?;
    Ok(())
}

// ── IPC loop ─────────────────────────────────────────────────────────────────

fn run_ipc_loop(store: &StaffStore, run_id: &str, orch: &mut Orchestrator) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Tick { seconds } => {
                let report = orch.tick(seconds);
                for _ in report.days_started {
                    close_day(store, run_id, orch, 0.0)?;
                }
                persist(store, run_id, orch)?;
            }
            IpcCommand::GetState => {}
            IpcCommand::Command { cmd, payload } => {
                if let Err(e) = handle_command(orch, &cmd, &payload) {
                    log::warn!("command '{cmd}' failed: {e}");
                }
                persist(store, run_id, orch)?;
            }
        }
        writeln!(stdout, "{}", serde_json::to_string(&build_ui_state(orch))?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(orch: &mut Orchestrator, cmd: &str, payload: &serde_json::Value) -> Result<()> {
    let worker_id = payload["worker_id"].as_str().unwrap_or_default();
    match cmd {
        "hire" => {
            let role: Role = serde_json::from_value(payload["role"].clone())?;
            let traits: Vec<String> = serde_json::from_value(payload["traits"].clone()).unwrap_or_default();
            let traits: Vec<&str> = traits.iter().map(String::as_str).collect();
            orch.hire(role, &traits)?;
        }
        "fire" => {
            orch.fire(worker_id, DepartureReason::Dismissed)?;
        }
        "assign" => {
            let kind: TaskKind = serde_json::from_value(payload["kind"].clone())?;
            let request = if payload["urgent"].as_bool().unwrap_or(false) {
                TaskRequest::urgent(kind)
            } else {
                TaskRequest::normal(kind)
            };
            orch.assign(worker_id, request)?;
        }
        "special" => {
            orch.trigger_special(worker_id)?;
        }
        "praise" => orch.converse(worker_id, Conversation::Praise)?,
        "reprimand" => orch.converse(worker_id, Conversation::Reprimand)?,
        "raise" => {
            let pct = payload["pct"].as_f64().unwrap_or(5.0);
            orch.converse(worker_id, Conversation::Raise(pct))?;
        }
        "pay_salaries" => {
            orch.pay_salaries();
        }
        "pause" => orch.clock_mut().pause(),
        "resume" => orch.clock_mut().resume(),
        _ => log::warn!("Unknown command: {}", cmd),
    }
    Ok(())
}

fn build_ui_state(orch: &Orchestrator) -> UiState {
    UiState {
        day: orch.day(),
        hour: orch.clock().hour_of_day(),
        paused: orch.clock().paused,
        balance: orch.economy().balance,
        reputation: orch.reputation().score,
        roster: orch.roster().iter().map(|w| w.snapshot()).collect(),
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

fn print_summary(store: &StaffStore, run_id: &str, orch: &Orchestrator, days: u64) -> Result<()> {
    let completed = store.event_count(run_id, "task_completed")?;
    let failed = store.event_count(run_id, "task_failed")?;
    let departures = store.event_count(run_id, "worker_departed")?;
    let risk_events = store.event_count(run_id, "risk_event_raised")?;
    let missed_payrolls = store.event_count(run_id, "salary_payment_failed")?;

    println!("=== RUN SUMMARY ===");
    println!("  run_id:          {run_id}");
    println!("  days run:        {days}");
    println!("  final day:       {}", orch.day());
    println!("  balance:         {:.2}", orch.economy().balance);
    println!("  reputation:      {:.1}", orch.reputation().score);
    println!("  tasks completed: {completed}");
    println!("  tasks failed:    {failed}");
    println!("  risk events:     {risk_events}");
    println!("  departures:      {departures}");
    println!("  missed payrolls: {missed_payrolls}");

    println!();
    println!("=== ROSTER ===");
    if orch.roster().is_empty() {
        println!("  (everyone has left)");
    }
    for w in orch.roster() {
        println!(
            "  {:<22} {:<10} L{} | loyalty {:.2} | mood {:.2} | energy {:.2} | tips {:.0}",
            w.name, w.role, w.level, w.risk.loyalty, w.risk.mood, w.risk.energy, w.tips_earned
        );
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
