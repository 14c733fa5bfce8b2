/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Rate-monotonic schedulability pre-check.
//!
//! Advisory only: the simulation runs regardless, and an overloaded task set
//! simply produces missed deadlines in the report.
//!
//! # Theory
//! **Liu & Layland (1973)**: under Rate Monotonic scheduling, `n` independent
//! periodic tasks are guaranteed schedulable on one processor if
//!
//! $$U = \sum_{i=1}^{n} \frac{C_i}{T_i} \leq n \left(2^{1/n} - 1\right)$$
//!
//! | n | Bound |
//! |---|---|
//! | 1 | 1.000 |
//! | 2 | 0.828 |
//! | 3 | 0.780 |
//! | ∞ | ln(2) ≈ 0.693 |
//!
//! Between the bound and `1.0` the set may or may not be schedulable; above
//! `1.0` the processor is overloaded and deadlines will be missed.

use tracing::{info, warn};

use crate::taskset::TaskClass;

/// Outcome of the utilisation test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feasibility {
    /// `U ≤ bound`: every deadline will be met.
    Guaranteed { utilization: f64, bound: f64 },

    /// `bound < U ≤ 1`: the simulation will tell.
    Inconclusive { utilization: f64, bound: f64 },

    /// `U > 1`: deadlines will be missed.
    Overloaded { utilization: f64 },
}

/// `U_bound(n) = n × (2^(1/n) − 1)`; `0.0` for `n = 0`.
pub fn liu_layland_bound(n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let nf = n as f64;
    nf * (2.0_f64.powf(1.0 / nf) - 1.0)
}

/// Total utilisation `Σ C_i / T_i`.  Zero-period classes contribute nothing.
pub fn total_utilization(classes: &[TaskClass]) -> f64 {
    classes
        .iter()
        .filter(|c| c.period_ticks > 0)
        .map(TaskClass::utilization)
        .sum()
}

/// Classify `classes` against the Liu & Layland bound.
pub fn check_liu_layland(classes: &[TaskClass]) -> Feasibility {
    let utilization = total_utilization(classes);
    let bound = liu_layland_bound(classes.len());
    if utilization > 1.0 {
        Feasibility::Overloaded { utilization }
    } else if utilization > bound {
        Feasibility::Inconclusive { utilization, bound }
    } else {
        Feasibility::Guaranteed { utilization, bound }
    }
}

/// Run the check and log its verdict.
pub fn log_feasibility(classes: &[TaskClass]) -> Feasibility {
    let verdict = check_liu_layland(classes);
    match verdict {
        Feasibility::Guaranteed { utilization, bound } => info!(
            utilization,
            bound,
            task_count = classes.len(),
            "Task set is RM-schedulable (Liu & Layland)"
        ),
        Feasibility::Inconclusive { utilization, bound } => warn!(
            utilization,
            bound,
            task_count = classes.len(),
            "Utilization exceeds the Liu & Layland bound; schedulability decided by simulation"
        ),
        Feasibility::Overloaded { utilization } => warn!(
            utilization,
            task_count = classes.len(),
            "Task set overloads the processor; deadlines will be missed"
        ),
    }
    verdict
}

// ── Tests ─────────────────────────────────────────────────────────────────────
