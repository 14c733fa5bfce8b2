/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Periodic task generators.
//!
//! One generator per task class runs as its own tokio task.  Each cycle it
//! builds a fresh [`TaskArrival`], sends it and sleeps for one period.  The
//! sleep is relative to the wake-up, so scheduling jitter accumulates across
//! cycles; this drift is part of the model and is not corrected.
//!
//! A generator emits while its elapsed time is below the stop time and then
//! returns, dropping its sender.  A release that would fall at or after the
//! stop time is never waited for: the last sleep ends at the stop instant, so
//! a long period cannot hold the run open past it.  The scheduler sees the
//! channel close once every generator has done so.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error};

use crate::clock::SimClock;
use crate::scheduler::SimError;
use crate::task::TaskArrival;
use crate::taskset::TaskClass;

/// What a generator did before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorReport {
    pub task_type: u32,
    pub emitted: u64,
    pub exited_us: u64,
}

/// A periodic producer of arrivals for one task class.
#[derive(Debug, Clone)]
pub struct Generator {
    class: TaskClass,
    tick_us: u64,
    stop_us: u64,
    clock: SimClock,
}

impl Generator {
    pub fn new(class: TaskClass, tick_us: u64, stop_us: u64, clock: SimClock) -> Self {
        Self {
            class,
            tick_us,
            stop_us,
            clock,
        }
    }

    /// Emit arrivals until the stop time.
    ///
    /// # Errors
    /// [`SimError::ChannelClosed`] if the scheduler has dropped its receiver.
    pub async fn run(self, tx: UnboundedSender<TaskArrival>) -> Result<GeneratorReport, SimError> {
        let task_type = self.class.task_type;
        let period_us = self.class.period_us(self.tick_us);
        let period = Duration::from_micros(period_us);
        let mut emitted = 0u64;

        debug!(task_type, period_us, "generator started");

        loop {
            let now_us = self.clock.elapsed_us();
            if now_us >= self.stop_us {
                debug!(task_type, emitted, now_us, "generator exiting");
                return Ok(GeneratorReport {
                    task_type,
                    emitted,
                    exited_us: now_us,
                });
            }

            let arrival = TaskArrival::new(&self.class, self.tick_us, now_us);
            if tx.send(arrival).is_err() {
                error!(task_type, now_us, "arrival channel closed");
                return Err(SimError::ChannelClosed { task_type });
            }
            emitted += 1;

            let next_release_us = now_us.saturating_add(period_us);
            if next_release_us < self.stop_us {
                tokio::time::sleep(period).await;
            } else {
                self.clock.sleep_until_us(self.stop_us).await;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
