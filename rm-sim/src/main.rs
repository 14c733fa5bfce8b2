/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use rm_sim::config::SimConfig;
use rm_sim::simulation::Simulation;

// ── CLI argument definition ───────────────────────────────────────────────────

/// Rate-monotonic preemptive scheduling simulator.
///
/// Example:
///   rm-sim tasks.txt --config sim.yaml --trace timeline.txt
///
/// The task set holds one `task_type computation_ticks period_ticks` row per
/// task class.  The transition trace goes to stdout unless `--trace` is given;
/// diagnostics go to stderr.
#[derive(Debug, Parser)]
#[command(
    name = "rm-sim",
    about = "Rate-monotonic preemptive scheduling simulator",
    long_about = None,
)]
struct Cli {
    /// Task-set file.
    tasks: PathBuf,

    /// Path to the YAML simulation configuration file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Microseconds per tick (overrides the configuration file).
    #[arg(short = 't', long = "tick-us")]
    tick_us: Option<u64>,

    /// Upper bound on the simulated run, in microseconds.
    #[arg(short = 'm', long = "max-duration-us")]
    max_duration_us: Option<u64>,

    /// File the completed-task report is appended to.
    #[arg(short = 'r', long = "report")]
    report: Option<PathBuf>,

    /// Write the transition trace to this file instead of stdout.
    #[arg(long = "trace")]
    trace: Option<PathBuf>,
}

impl Cli {
    /// Overlay command-line overrides on `config`.
    fn apply_overrides(&self, config: &mut SimConfig) {
        if let Some(tick_us) = self.tick_us {
            config.tick_us = tick_us;
        }
        if let Some(max_duration_us) = self.max_duration_us {
            config.max_duration_us = max_duration_us;
        }
        if let Some(report) = &self.report {
            config.report_path = report.clone();
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    // stdout carries the trace, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!(
        tasks   = %cli.tasks.display(),
        config  = ?cli.config,
        trace   = ?cli.trace,
        "rm-sim starting up..."
    );

    // ── Load simulation configuration ─────────────────────────────────────────
    let mut config = match &cli.config {
        Some(path) => match SimConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load simulation configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No configuration file provided, using default simulation settings");
            SimConfig::default()
        }
    };
    cli.apply_overrides(&mut config);
    if let Err(e) = config.validate() {
        error!("Invalid simulation configuration: {:#}", e);
        process::exit(1);
    }

    // ── Load task set ─────────────────────────────────────────────────────────
    let report_path = config.report_path.clone();
    let simulation = match Simulation::from_task_file(&cli.tasks, config) {
        Ok(simulation) => simulation,
        Err(e) => {
            error!("Failed to load task set: {}", e);
            process::exit(1);
        }
    };
    info!("Loaded {} task class(es):", simulation.classes().len());
    for class in simulation.classes() {
        info!(
            "  [type {ty}]  C={c} ticks  T={t} ticks  U={u:.3}",
            ty = class.task_type,
            c = class.computation_ticks,
            t = class.period_ticks,
            u = class.utilization(),
        );
    }

    // ── Run ───────────────────────────────────────────────────────────────────
    let result = match simulation.run().await {
        Ok(result) => result,
        Err(e) => {
            error!("Simulation aborted: {}", e);
            process::exit(1);
        }
    };

    // ── Outputs ───────────────────────────────────────────────────────────────
    if let Err(e) = result.write_trace_to(cli.trace.as_deref()) {
        error!("{}", e);
        process::exit(1);
    }
    if let Err(e) = result.append_report(&report_path) {
        error!("{}", e);
        process::exit(1);
    }

    info!(
        emitted = result.emitted(),
        completed = result.outcome.completed.len(),
        abandoned = result.outcome.abandoned.len(),
        late = result.outcome.stats.late_arrivals,
        "rm-sim finished"
    );
}

// ── Tests ─────────────────────────────────────────────────────────────────────
