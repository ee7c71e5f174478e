use clap::Parser;
use gridchase::constants::PICKUP_SCORE;
use gridchase::engine::{EpisodeSetup, GameEngine, GameEngineOptions};
use gridchase::types::{Outcome, PickupAccounting, RuntimeEvent, Snapshot};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_TICK_CAP: u64 = 20_000;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    depth: Option<u32>,
    #[arg(long)]
    pickup_accounting: Option<String>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    #[serde(rename = "tickCap")]
    tick_cap: u64,
    depth: u32,
    #[serde(rename = "pickupAccounting")]
    pickup_accounting: PickupAccounting,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    depth: u32,
    #[serde(rename = "pickupAccounting")]
    pickup_accounting: PickupAccounting,
    outcome: Outcome,
    ticks: u64,
    score: i32,
    #[serde(rename = "pickupsCollected")]
    pickups_collected: i32,
    #[serde(rename = "pickupsTotal")]
    pickups_total: i32,
    #[serde(rename = "pickupEvents")]
    pickup_events: i32,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
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
    #[serde(rename = "outcomeCounts")]
    outcome_counts: BTreeMap<String, usize>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let scenarios = resolve_scenarios(&cli);
    let run_started_at_ms = now_ms();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(run_started_at_ms));
    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            None,
            json!({
                "tickCap": scenario.tick_cap,
                "depth": scenario.depth,
                "pickupAccounting": scenario.pickup_accounting,
            }),
        );
        let scenario_run = run_scenario(&scenario);

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();
        *outcome_counts
            .entry(outcome_key(scenario_run.result.outcome))
            .or_insert(0) += 1;

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario_run.result.ticks),
            json!({
                "outcome": scenario_run.result.outcome,
                "score": scenario_run.result.score,
                "pickupsCollected": scenario_run.result.pickups_collected,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let run_finished_at_ms = now_ms();
    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        run_finished_at_ms,
        scenario_results,
        outcome_counts,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
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
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "outcomeCounts": summary.outcome_counts,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(scenario: &Scenario) -> ScenarioRunResult {
    let mut engine = GameEngine::new(
        EpisodeSetup::default(),
        GameEngineOptions {
            search_depth: Some(scenario.depth),
            pickup_accounting: scenario.pickup_accounting,
        },
    );

    let mut pickup_events = 0;
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    for tick in 0..scenario.tick_cap {
        engine.on_tick(tick);
        let snapshot = engine.build_snapshot(true);

        for event in &snapshot.events {
            match event {
                RuntimeEvent::PickupCollected { .. } => pickup_events += 1,
            }
        }
        for message in collect_snapshot_anomalies(&snapshot) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }

        if snapshot.terminal {
            break;
        }
    }

    let summary = engine.build_summary();
    if pickup_events != summary.pickups_collected {
        push_anomaly(
            &mut anomalies,
            &mut anomaly_records,
            &mut anomaly_seen,
            summary.ticks,
            format!(
                "pickup event mismatch: {} events for {} collected",
                pickup_events, summary.pickups_collected
            ),
        );
    }

    ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            depth: scenario.depth,
            pickup_accounting: scenario.pickup_accounting,
            outcome: summary.outcome,
            ticks: summary.ticks,
            score: summary.score,
            pickups_collected: summary.pickups_collected,
            pickups_total: summary.pickups_total,
            pickup_events,
            anomalies,
        },
        anomaly_records,
    }
}

fn collect_snapshot_anomalies(snapshot: &Snapshot) -> Vec<String> {
    let mut anomalies = Vec::new();
    if snapshot.score != snapshot.pickups_collected * PICKUP_SCORE {
        anomalies.push(format!(
            "score {} does not match {} collected pickups",
            snapshot.score, snapshot.pickups_collected
        ));
    }
    if snapshot.pickups_collected < 0 || snapshot.pickups_collected > snapshot.pickups_total {
        anomalies.push(format!(
            "pickup counter out of range: {}/{}",
            snapshot.pickups_collected, snapshot.pickups_total
        ));
    }
    if snapshot.terminal && snapshot.outcome == Outcome::InProgress {
        anomalies.push("terminal snapshot without an outcome".to_string());
    }
    if !snapshot.terminal && snapshot.outcome != Outcome::InProgress {
        anomalies.push("outcome set on a live snapshot".to_string());
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let tick_cap = cli.ticks.unwrap_or(DEFAULT_TICK_CAP).max(1);
    let depth = cli.depth.unwrap_or(3).clamp(1, 8);
    let pickup_accounting = cli
        .pickup_accounting
        .as_deref()
        .and_then(PickupAccounting::parse)
        .unwrap_or(PickupAccounting::LiveGrid);

    if cli.single || cli.ticks.is_some() || cli.depth.is_some() || cli.pickup_accounting.is_some()
    {
        return vec![Scenario {
            name: format!("custom-depth{depth}"),
            tick_cap,
            depth,
            pickup_accounting,
        }];
    }

    vec![
        Scenario {
            name: "classic-live-grid".to_string(),
            tick_cap,
            depth,
            pickup_accounting: PickupAccounting::LiveGrid,
        },
        Scenario {
            name: "classic-per-branch".to_string(),
            tick_cap,
            depth,
            pickup_accounting: PickupAccounting::PerBranch,
        },
    ]
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(timestamp_ms: u64) -> String {
    format!("sim-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    scenarios: Vec<ScenarioResultLine>,
    outcome_counts: BTreeMap<String, usize>,
    anomaly_count: usize,
) -> RunSummary {
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        scenario_count: scenarios.len(),
        anomaly_count,
        outcome_counts,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn outcome_key(outcome: Outcome) -> String {
    match outcome {
        Outcome::InProgress => "in_progress",
        Outcome::Win => "win",
        Outcome::Loss => "loss",
    }
    .to_string()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
