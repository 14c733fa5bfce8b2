/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Transition trace: which task type occupies the processor over time.
//!
//! Each line is `<elapsed_ticks>\t<task_type>`, with `0` meaning idle.  The
//! plotting side draws a step graph through consecutive points, so every
//! change of occupant is framed by an idle marker:
//!
//! ```text
//! 0.000000    0      ← install on an idle processor
//! 0.000000    2
//! 0.000000    2      ← preemption of 2 by 1
//! 0.000000    0
//! 0.000000    1
//! 15.000000   1      ← completion of 1
//! 15.000000   0
//! 15.000000   0      ← dispatch of 2 from the ready queue
//! 15.000000   2
//! ```

use std::io::{self, Write};

use crate::taskset::IDLE_TASK_TYPE;

/// One point of the step graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceEvent {
    pub at_us: u64,
    pub task_type: u32,
}

/// In-memory record of every transition of one run.
#[derive(Debug, Default, Clone)]
pub struct Timeline {
    events: Vec<TraceEvent>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// An idle processor starts running `task_type`.
    pub fn install(&mut self, at_us: u64, task_type: u32) {
        self.push(at_us, IDLE_TASK_TYPE);
        self.push(at_us, task_type);
    }

    /// `old` is preempted by `new`.
    pub fn preempt(&mut self, at_us: u64, old: u32, new: u32) {
        self.push(at_us, old);
        self.push(at_us, IDLE_TASK_TYPE);
        self.push(at_us, new);
    }

    /// `task_type` finishes and the processor goes idle.
    pub fn complete(&mut self, at_us: u64, task_type: u32) {
        self.push(at_us, task_type);
        self.push(at_us, IDLE_TASK_TYPE);
    }

    fn push(&mut self, at_us: u64, task_type: u32) {
        self.events.push(TraceEvent { at_us, task_type });
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Occupancy intervals `(start_us, end_us, task_type)`, idle excluded.
    ///
    /// An interval still open at the end of the trace is omitted.
    pub fn busy_intervals(&self) -> Vec<(u64, u64, u32)> {
        let mut intervals = Vec::new();
        let mut current: Option<(u64, u32)> = None;
        for ev in &self.events {
            match current {
                Some((start, ty)) if ev.task_type != ty => {
                    intervals.push((start, ev.at_us, ty));
                    current = None;
                }
                _ => {}
            }
            if current.is_none() && ev.task_type != IDLE_TASK_TYPE {
                current = Some((ev.at_us, ev.task_type));
            }
        }
        intervals
    }

    /// Write the trace, converting microseconds to ticks.
    pub fn write_tsv<W: Write>(&self, mut out: W, tick_us: u64) -> io::Result<()> {
        for ev in &self.events {
            writeln!(
                out,
                "{:.6}\t{}",
                ev.at_us as f64 / tick_us as f64,
                ev.task_type
            )?;
        }
        out.flush()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
