use arcade_maze::autopilot::Autopilot;
use arcade_maze::constants::{MAP_SIZE, POWER_DURATION_TICKS, STEPS_PER_CELL};
use arcade_maze::engine::GameEngine;
use arcade_maze::logging::{emit_log, now_ms, LogLevel, LogScope};
use arcade_maze::types::{AdversaryMode, GameMode, RuntimeEvent, Snapshot};
use arcade_maze::world::Grid;
use clap::Parser;
use serde::Serialize;
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=50))]
    scenarios: u32,
    #[arg(long, default_value_t = 20_000)]
    max_ticks: u64,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
    /// Leave the player without input so it only follows its spawn heading.
    #[arg(long)]
    idle: bool,
}

#[derive(Clone, Debug)]
struct Scenario {
    name: String,
    seed: u64,
    max_ticks: u64,
    idle: bool,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u64,
    outcome: GameMode,
    ticks: u64,
    score: i32,
    #[serde(rename = "coinsEaten")]
    coins_eaten: i32,
    #[serde(rename = "powerPelletsEaten")]
    power_pellets_eaten: i32,
    #[serde(rename = "adversariesEliminated")]
    adversaries_eliminated: i32,
    #[serde(rename = "remainingCollectibles")]
    remaining_collectibles: i32,
    #[serde(rename = "powerExpirations")]
    power_expirations: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct ScenarioRunResult {
    result: ScenarioResultLine,
    anomaly_records: Vec<AnomalyRecord>,
    finished_tick: u64,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTicks")]
    average_ticks: u64,
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Debug, Default)]
struct AnomalyLog {
    messages: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    /// Every occurrence is recorded, but each message is listed once.
    fn push(&mut self, tick: u64, message: String) {
        self.records.push(AnomalyRecord {
            tick,
            message: message.clone(),
        });
        if self.seen.insert(message.clone()) {
            self.messages.push(message);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_ticks = 0u64;
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        let scope = LogScope {
            run_id: Some(run_id.as_str()),
            scenario: Some(scenario.name.as_str()),
            seed: Some(scenario.seed),
            tick: None,
        };
        emit_log(
            LogLevel::Info,
            "scenario_started",
            scope,
            json!({
                "maxTicks": scenario.max_ticks,
                "idle": scenario.idle,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                LogLevel::Warn,
                "anomaly_detected",
                LogScope {
                    tick: Some(anomaly.tick),
                    ..scope
                },
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        total_ticks += scenario_run.result.ticks;
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            LogLevel::Info,
            "scenario_finished",
            LogScope {
                tick: Some(scenario_run.finished_tick),
                ..scope
            },
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "remainingCollectibles": scenario_run.result.remaining_collectibles,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        scenario_results,
        outcome_counts,
        total_anomalies,
        total_ticks,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                LogLevel::Error,
                "summary_write_failed",
                LogScope::run(&run_id),
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        LogLevel::Info,
        "run_finished",
        LogScope::run(&run_id),
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTicks": summary.average_ticks,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = GameEngine::new();
    let mut anomalies = AnomalyLog::default();
    if !engine.start() {
        anomalies.push(0, "session refused to start".to_string());
    }

    let mut autopilot = (!scenario.idle).then(|| Autopilot::new(scenario.seed));
    let mut eliminated_at: Vec<Option<(i32, i32)>> = vec![None; engine.adversaries().len()];
    let mut power_expirations = 0;

    while engine.is_playing() {
        if engine.tick() >= scenario.max_ticks {
            anomalies.push(
                engine.tick(),
                format!("tick limit reached: {}", scenario.max_ticks),
            );
            break;
        }

        if let Some(autopilot) = autopilot.as_mut() {
            if let Some(dir) = autopilot.decide(&engine) {
                engine.receive_input(dir);
            }
        }
        engine.step();

        let live_collectibles = engine.grid().map(Grid::count_collectibles);
        let snapshot = engine.build_snapshot(true);
        for message in collect_snapshot_anomalies(&snapshot, live_collectibles) {
            anomalies.push(snapshot.tick, message);
        }
        for message in track_eliminated(&mut eliminated_at, &snapshot) {
            anomalies.push(snapshot.tick, message);
        }
        power_expirations += snapshot
            .events
            .iter()
            .filter(|event| matches!(event, RuntimeEvent::PowerExpired))
            .count() as i32;
    }

    let finished_tick = engine.tick();
    let result = match engine.build_summary() {
        Some(summary) => ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome: summary.outcome,
            ticks: summary.ticks,
            score: summary.score,
            coins_eaten: summary.coins_eaten,
            power_pellets_eaten: summary.power_pellets_eaten,
            adversaries_eliminated: summary.adversaries_eliminated,
            remaining_collectibles: summary.remaining_collectibles,
            power_expirations,
            anomalies: anomalies.messages,
        },
        None => ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            outcome: engine.mode(),
            ticks: finished_tick,
            score: 0,
            coins_eaten: 0,
            power_pellets_eaten: 0,
            adversaries_eliminated: 0,
            remaining_collectibles: engine.remaining_collectibles(),
            power_expirations,
            anomalies: anomalies.messages,
        },
    };

    ScenarioRunResult {
        result,
        anomaly_records: anomalies.records,
        finished_tick,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, live_collectibles: Option<i32>) -> Vec<String> {
    let mut anomalies = Vec::new();
    if let Some(live) = live_collectibles {
        if live != snapshot.remaining_collectibles {
            anomalies.push(format!(
                "collectible counter drift: counter {} vs grid {live}",
                snapshot.remaining_collectibles
            ));
        }
    }
    if snapshot.remaining_collectibles < 0 {
        anomalies.push(format!(
            "negative collectible counter: {}",
            snapshot.remaining_collectibles
        ));
    }

    let bounds = 0..MAP_SIZE;
    let steps = 0..STEPS_PER_CELL;
    if let Some(player) = &snapshot.player {
        let motion = &player.motion;
        if !steps.contains(&motion.sub_step) {
            anomalies.push(format!("player sub-step out of range: {}", motion.sub_step));
        }
        if !bounds.contains(&motion.x) || !bounds.contains(&motion.y) {
            anomalies.push(format!("player off grid: ({}, {})", motion.x, motion.y));
        }
        if player.power_ticks > POWER_DURATION_TICKS {
            anomalies.push(format!("power timer out of range: {}", player.power_ticks));
        }
        if player.score < 0 {
            anomalies.push(format!("negative score: {}", player.score));
        }
    } else {
        anomalies.push("snapshot without player".to_string());
    }

    for adversary in &snapshot.adversaries {
        let motion = &adversary.motion;
        if !steps.contains(&motion.sub_step) {
            anomalies.push(format!(
                "adversary sub-step out of range: {:?} {}",
                adversary.identity, motion.sub_step
            ));
        }
        if !bounds.contains(&motion.x) || !bounds.contains(&motion.y) {
            anomalies.push(format!(
                "adversary off grid: {:?} ({}, {})",
                adversary.identity, motion.x, motion.y
            ));
        }
    }
    anomalies
}

/// Remembers where each adversary was eliminated and reports any that moved
/// or changed mode afterwards.
fn track_eliminated(
    eliminated_at: &mut Vec<Option<(i32, i32)>>,
    snapshot: &Snapshot,
) -> Vec<String> {
    if eliminated_at.len() < snapshot.adversaries.len() {
        eliminated_at.resize(snapshot.adversaries.len(), None);
    }
    let mut anomalies = Vec::new();
    for (slot, adversary) in eliminated_at.iter_mut().zip(&snapshot.adversaries) {
        let cell = (adversary.motion.x, adversary.motion.y);
        match (*slot, adversary.mode) {
            (None, AdversaryMode::Eliminated) => *slot = Some(cell),
            (Some(at), AdversaryMode::Eliminated) if at != cell => anomalies.push(format!(
                "eliminated adversary moved: {:?} {:?} -> {:?}",
                adversary.identity, at, cell
            )),
            (Some(_), AdversaryMode::Normal | AdversaryMode::Fleeing) => anomalies.push(format!(
                "eliminated adversary came back: {:?}",
                adversary.identity
            )),
            _ => {}
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = cli.seed.unwrap_or_else(rand::random::<u64>);
    (0..cli.scenarios)
        .map(|idx| Scenario {
            name: format!("maze-{:02}", idx + 1),
            seed: seed.wrapping_add(idx as u64),
            max_ticks: cli.max_ticks,
            idle: cli.idle,
        })
        .collect()
}

fn outcome_key(outcome: GameMode) -> String {
    match outcome {
        GameMode::NotStarted => "not_started",
        GameMode::Playing => "unfinished",
        GameMode::Failed => "failed",
        GameMode::Won => "won",
    }
    .to_string()
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
    total_ticks: u64,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_ticks = if scenario_count == 0 {
        0
    } else {
        total_ticks / scenario_count as u64
    };
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count,
        anomaly_count,
        average_ticks,
        outcome_counts,
        scenarios,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
