/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task-set input: one row per periodic task class.
//!
//! The expected file layout is one class per line, three integer columns
//! separated by tabs or spaces:
//! ```text
//! <task_type>  <computation_ticks>  <period_ticks>
//! 1            15                   75
//! 2            20                   100
//! ```
//!
//! Reading stops at the first row that does not parse as three integers; the
//! rows read so far are kept.  Rows that parse but describe an impossible
//! class (non-positive period, negative computation, the reserved idle type
//! `0`) are rejected outright, because they would otherwise turn into
//! zero-length or unbounded generator sleeps.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

/// Task type reserved for "no task running" in the transition trace.
pub const IDLE_TASK_TYPE: u32 = 0;

// ── TaskClass ─────────────────────────────────────────────────────────────────

/// A periodic task class as described by one input row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskClass {
    /// Identifier printed in the trace and the report.  Never `0`.
    pub task_type: u32,

    /// Work required by every instance, in ticks.
    pub computation_ticks: u64,

    /// Recurrence interval in ticks.  Always `> 0`.
    pub period_ticks: u64,
}

impl TaskClass {
    /// Period converted to microseconds for a given tick length.
    pub fn period_us(&self, tick_us: u64) -> u64 {
        self.period_ticks.saturating_mul(tick_us)
    }

    /// Computation converted to microseconds for a given tick length.
    pub fn computation_us(&self, tick_us: u64) -> u64 {
        self.computation_ticks.saturating_mul(tick_us)
    }

    /// Processor utilisation `C / T` of this class.
    pub fn utilization(&self) -> f64 {
        self.computation_ticks as f64 / self.period_ticks as f64
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Setup failures while reading or validating the task set.
#[derive(Debug, Error)]
pub enum TaskSetError {
    #[error("cannot read task set '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("task set contains no valid rows")]
    Empty,

    #[error("row {row}: task type {task_type} is invalid (type 0 is reserved for the idle marker)")]
    InvalidTaskType { row: usize, task_type: i64 },

    #[error("row {row}: period must be positive, got {period}")]
    InvalidPeriod { row: usize, period: i64 },

    #[error("row {row}: computation must not be negative, got {computation}")]
    InvalidComputation { row: usize, computation: i64 },
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Load and validate a task set from `path`, keeping at most `max_tasks` rows.
pub fn load_from_file(path: &Path, max_tasks: usize) -> Result<Vec<TaskClass>, TaskSetError> {
    info!("Loading task set from: {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| TaskSetError::Unreadable {
        path: path.display().to_string(),
        source,
    })?;
    parse(&content, max_tasks)
}

/// Parse task-set text.  See the module docs for the accepted layout.
pub fn parse(content: &str, max_tasks: usize) -> Result<Vec<TaskClass>, TaskSetError> {
    let mut classes = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let row = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let Some((task_type, computation, period)) = parse_row(line) else {
            warn!(row, line, "Unparsable task-set row, ignoring it and everything after it");
            break;
        };
        if classes.len() == max_tasks {
            warn!(max_tasks, "Task set exceeds the maximum class count, extra rows ignored");
            break;
        }
        let class = validate_row(row, task_type, computation, period)?;
        debug!(
            row,
            task_type = class.task_type,
            computation_ticks = class.computation_ticks,
            period_ticks = class.period_ticks,
            "task class"
        );
        classes.push(class);
    }

    if classes.is_empty() {
        return Err(TaskSetError::Empty);
    }
    info!("Loaded {} task class(es)", classes.len());
    Ok(classes)
}

/// Split a row into exactly three integers.
fn parse_row(line: &str) -> Option<(i64, i64, i64)> {
    let mut fields = line.split_whitespace().map(str::parse::<i64>);
    let row = (
        fields.next()?.ok()?,
        fields.next()?.ok()?,
        fields.next()?.ok()?,
    );
    fields.next().is_none().then_some(row)
}

fn validate_row(
    row: usize,
    task_type: i64,
    computation: i64,
    period: i64,
) -> Result<TaskClass, TaskSetError> {
    let task_type = u32::try_from(task_type)
        .ok()
        .filter(|&t| t != IDLE_TASK_TYPE)
        .ok_or(TaskSetError::InvalidTaskType { row, task_type })?;
    if period <= 0 {
        return Err(TaskSetError::InvalidPeriod { row, period });
    }
    if computation < 0 {
        return Err(TaskSetError::InvalidComputation { row, computation });
    }
    Ok(TaskClass {
        task_type,
        computation_ticks: computation as u64,
        period_ticks: period as u64,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
