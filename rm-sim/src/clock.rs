/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Monotonic timing service shared by the generators and the scheduler.
//!
//! All simulated times are microseconds elapsed since one fixed start
//! instant.  The clock is built on `tokio::time::Instant`, so a runtime with a
//! paused clock (tests) drives the whole simulation on virtual time.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// Elapsed-time source anchored at the simulation start.
#[derive(Debug, Clone, Copy)]
pub struct SimClock {
    start: Instant,
}

impl SimClock {
    /// Start the clock now.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds elapsed since [`start`](Self::start), truncated.
    pub fn elapsed_us(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    /// The absolute instant `at_us` microseconds after the start.
    pub fn instant_at(&self, at_us: u64) -> Instant {
        self.start + Duration::from_micros(at_us)
    }

    /// Suspend until `at_us` microseconds after the start.  Returns
    /// immediately if that instant has already passed.
    pub async fn sleep_until_us(&self, at_us: u64) {
        sleep_until(self.instant_at(at_us)).await;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
