/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Structured error types for the simulation run.
//!
//! Setup failures ([`SimError::TaskSet`], [`SimError::Hyperperiod`]) abort
//! before any generator is spawned.  Runtime failures
//! ([`SimError::ChannelClosed`], [`SimError::GeneratorFailed`]) abort the run:
//! a lost arrival corrupts the timeline, so nothing is retried.
//!
//! Missed deadlines are deliberately absent; they show up as a larger waiting
//! time in the report.

use thiserror::Error;

use crate::hyperperiod::HyperperiodError;
use crate::taskset::TaskSetError;

/// Top-level error type returned by
/// [`Simulation::from_task_file()`](crate::simulation::Simulation::from_task_file)
/// and [`Simulation::run()`](crate::simulation::Simulation::run).
#[derive(Debug, Error)]
pub enum SimError {
    /// The task set could not be read or contains a degenerate class.
    #[error(transparent)]
    TaskSet(#[from] TaskSetError),

    /// No stop time could be derived from the task set.
    #[error("cannot compute stop time: {0}")]
    Hyperperiod(#[from] HyperperiodError),

    /// A generator tried to send after the scheduler dropped its receiver.
    #[error("arrival channel closed while generator for task type {task_type} was sending")]
    ChannelClosed { task_type: u32 },

    /// A generator task panicked or was cancelled.
    #[error("generator for task type {task_type} failed: {source}")]
    GeneratorFailed {
        task_type: u32,
        #[source]
        source: tokio::task::JoinError,
    },

    /// Writing the transition trace or the report failed.
    #[error("cannot write {what}: {source}")]
    Output {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },
}
