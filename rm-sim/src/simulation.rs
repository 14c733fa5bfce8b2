/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! One complete simulation run.
//!
//! [`Simulation::run`] derives the stop time, starts the shared clock, spawns
//! one [`Generator`] per task class, drives the [`Scheduler`] until every
//! generator has exited and the processor is idle, then joins the generators.
//!
//! ```text
//!  Generator(1) ──┐
//!  Generator(2) ──┼── unbounded mpsc ──► Scheduler ──► SchedulerOutcome
//!  Generator(n) ──┘
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::generator::{Generator, GeneratorReport};
use crate::hyperperiod::{stop_time, StopTime};
use crate::report::{log_summary, CompletedReport};
use crate::scheduler::feasibility::{log_feasibility, Feasibility};
use crate::scheduler::{Scheduler, SchedulerOutcome, SimError};
use crate::taskset::{self, TaskClass};

/// A validated task set together with the configuration to run it under.
#[derive(Debug, Clone)]
pub struct Simulation {
    classes: Vec<TaskClass>,
    config: SimConfig,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct SimulationResult {
    pub stop: StopTime,
    pub feasibility: Feasibility,
    pub outcome: SchedulerOutcome,
    pub generators: Vec<GeneratorReport>,
    tick_us: u64,
}

impl Simulation {
    pub fn new(classes: Vec<TaskClass>, config: SimConfig) -> Self {
        Self { classes, config }
    }

    /// Load the task set at `path` under `config`.
    ///
    /// # Errors
    /// [`SimError::TaskSet`] if the file cannot be read or holds no valid
    /// class.
    pub fn from_task_file(path: &Path, config: SimConfig) -> Result<Self, SimError> {
        let classes = taskset::load_from_file(path, config.max_tasks)?;
        Ok(Self::new(classes, config))
    }

    pub fn classes(&self) -> &[TaskClass] {
        &self.classes
    }

    /// Run the simulation to completion.
    ///
    /// # Errors
    /// - [`SimError::Hyperperiod`] if no stop time can be derived; nothing has
    ///   been spawned at that point.
    /// - [`SimError::ChannelClosed`] / [`SimError::GeneratorFailed`] if a
    ///   generator could not deliver its arrivals.
    pub async fn run(&self) -> Result<SimulationResult, SimError> {
        let tick_us = self.config.tick_us;

        let feasibility = log_feasibility(&self.classes);
        let stop = stop_time(&self.classes, tick_us, self.config.max_duration_us)?;
        info!(
            task_count = self.classes.len(),
            stop_us = stop.stop_us,
            stop_ticks = self.config.ticks(stop.stop_us),
            clamped = stop.is_clamped(),
            "Starting simulation"
        );

        let clock = SimClock::start();
        let (tx, rx) = mpsc::unbounded_channel();

        let handles: Vec<(u32, JoinHandle<Result<GeneratorReport, SimError>>)> = self
            .classes
            .iter()
            .map(|class| {
                let generator = Generator::new(*class, tick_us, stop.stop_us, clock);
                (class.task_type, tokio::spawn(generator.run(tx.clone())))
            })
            .collect();
        // Only the generators hold senders from here on; the channel closes
        // when the last one exits.
        drop(tx);

        let outcome = Scheduler::new(stop.stop_us).run(clock, rx).await;

        let mut generators = Vec::with_capacity(handles.len());
        for (task_type, handle) in handles {
            match handle.await {
                Ok(Ok(report)) => generators.push(report),
                Ok(Err(e)) => {
                    error!(task_type, "Generator aborted: {e}");
                    return Err(e);
                }
                Err(source) => {
                    error!(task_type, "Generator task failed: {source}");
                    return Err(SimError::GeneratorFailed { task_type, source });
                }
            }
        }

        log_summary(&outcome.completed, &outcome.abandoned, tick_us);

        Ok(SimulationResult {
            stop,
            feasibility,
            outcome,
            generators,
            tick_us,
        })
    }
}

impl SimulationResult {
    pub fn report(&self) -> CompletedReport<'_> {
        CompletedReport::new(&self.outcome.completed)
    }

    /// Total arrivals emitted by all generators.
    pub fn emitted(&self) -> u64 {
        self.generators.iter().map(|g| g.emitted).sum()
    }

    /// Write the transition trace to `out`.
    pub fn write_trace<W: Write>(&self, out: W) -> Result<(), SimError> {
        self.outcome
            .timeline
            .write_tsv(out, self.tick_us)
            .map_err(|source| SimError::Output {
                what: "transition trace",
                source,
            })
    }

    /// Write the transition trace to `path`, or to stdout when `None`.
    pub fn write_trace_to(&self, path: Option<&Path>) -> Result<(), SimError> {
        match path {
            Some(path) => {
                let file = File::create(path).map_err(|source| SimError::Output {
                    what: "transition trace",
                    source,
                })?;
                self.write_trace(BufWriter::new(file))
            }
            None => self.write_trace(io::stdout().lock()),
        }
    }

    /// Append the completed-task report to `path`.
    pub fn append_report(&self, path: &Path) -> Result<(), SimError> {
        self.report()
            .append_to_file(path)
            .map_err(|source| SimError::Output {
                what: "completed-task report",
                source,
            })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
