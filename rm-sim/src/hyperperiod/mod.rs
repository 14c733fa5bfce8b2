//! Hyperperiod and simulation stop time.
//!
//! The hyperperiod of a set of periodic tasks is the Least Common Multiple
//! (LCM) of all their periods: the smallest window after which the whole
//! arrival pattern repeats.  Simulating exactly one hyperperiod therefore
//! covers every distinct interleaving of the task set.
//!
//! The stop time `T_STOP` is the hyperperiod converted to microseconds, capped
//! at the configured maximum duration.  Incommensurate periods can make the
//! LCM astronomically large (or overflow `u64`); in both cases the run is
//! clamped instead of rejected, so a generator can never be told to run for
//! an unbounded time.

pub mod math;

use tracing::{debug, info, warn};

use crate::taskset::TaskClass;
use math::lcm_of_slice;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur during hyperperiod calculation.
#[derive(Debug, PartialEq, Eq)]
pub enum HyperperiodError {
    /// The task-class slice was empty (or every period was zero).
    NoValidPeriods,

    /// LCM calculation overflowed `u64`.
    ///
    /// Carries the two operands of the failing step.
    Overflow { a: u64, b: u64 },

    /// The hyperperiod, converted to microseconds, exceeds the limit.
    TooLarge { value_us: u64, limit_us: u64 },
}

impl std::fmt::Display for HyperperiodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HyperperiodError::NoValidPeriods => {
                write!(f, "no task class with a valid (non-zero) period")
            }
            HyperperiodError::Overflow { a, b } => {
                write!(f, "LCM overflow computing lcm({a}, {b})")
            }
            HyperperiodError::TooLarge { value_us, limit_us } => write!(
                f,
                "hyperperiod {value_us}µs ({:.1}s) exceeds limit {limit_us}µs ({:.1}s)",
                *value_us as f64 / 1_000_000.0,
                *limit_us as f64 / 1_000_000.0
            ),
        }
    }
}

impl std::error::Error for HyperperiodError {}

// ── HyperperiodInfo ───────────────────────────────────────────────────────────

/// Exact hyperperiod of a task set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperperiodInfo {
    /// LCM of all unique periods, in ticks.
    pub hyperperiod_ticks: u64,

    /// Hyperperiod in microseconds.
    pub hyperperiod_us: u64,

    /// Unique periods of the task set in ticks (sorted, deduplicated).
    pub unique_periods: Vec<u64>,

    /// Number of task classes that contributed.
    pub task_count: usize,
}

/// Calculate the exact hyperperiod of `classes`.
///
/// # Errors
/// * [`HyperperiodError::NoValidPeriods`] – no class with a non-zero period.
/// * [`HyperperiodError::Overflow`] – the LCM (in ticks or in µs) overflowed.
/// * [`HyperperiodError::TooLarge`] – the result exceeds `limit_us`.
pub fn calculate_hyperperiod(
    classes: &[TaskClass],
    tick_us: u64,
    limit_us: u64,
) -> Result<HyperperiodInfo, HyperperiodError> {
    let mut unique_periods: Vec<u64> = classes
        .iter()
        .map(|c| c.period_ticks)
        .filter(|&p| p > 0)
        .collect();
    let task_count = unique_periods.len();
    if task_count == 0 {
        return Err(HyperperiodError::NoValidPeriods);
    }
    unique_periods.sort_unstable();
    unique_periods.dedup();

    let hyperperiod_ticks = lcm_of_slice(&unique_periods)?;
    let hyperperiod_us = hyperperiod_ticks
        .checked_mul(tick_us)
        .ok_or(HyperperiodError::Overflow {
            a: hyperperiod_ticks,
            b: tick_us,
        })?;

    if hyperperiod_us > limit_us {
        return Err(HyperperiodError::TooLarge {
            value_us: hyperperiod_us,
            limit_us,
        });
    }

    for p in &unique_periods {
        debug!(period_ticks = p, "  unique period");
    }

    Ok(HyperperiodInfo {
        hyperperiod_ticks,
        hyperperiod_us,
        unique_periods,
        task_count,
    })
}

// ── StopTime ──────────────────────────────────────────────────────────────────

/// The global deadline of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    /// `T_STOP` in microseconds since the simulation start.
    pub stop_us: u64,

    /// The exact hyperperiod, or `None` when it overflowed or exceeded the
    /// limit and `stop_us` was clamped.
    pub hyperperiod: Option<HyperperiodInfo>,
}

impl StopTime {
    /// `true` when the run was cut short of one full hyperperiod.
    pub fn is_clamped(&self) -> bool {
        self.hyperperiod.is_none()
    }
}

/// Compute `T_STOP` for `classes`, clamping to `max_duration_us`.
///
/// Only an empty task set is an error; overflow and oversize hyperperiods are
/// downgraded to a warning and a clamped stop time.
pub fn stop_time(
    classes: &[TaskClass],
    tick_us: u64,
    max_duration_us: u64,
) -> Result<StopTime, HyperperiodError> {
    match calculate_hyperperiod(classes, tick_us, max_duration_us) {
        Ok(info) => {
            info!(
                hyperperiod_ticks = info.hyperperiod_ticks,
                stop_us = info.hyperperiod_us,
                unique_count = info.unique_periods.len(),
                task_count = info.task_count,
                "Simulating one hyperperiod"
            );
            Ok(StopTime {
                stop_us: info.hyperperiod_us,
                hyperperiod: Some(info),
            })
        }
        Err(HyperperiodError::NoValidPeriods) => Err(HyperperiodError::NoValidPeriods),
        Err(e) => {
            warn!(
                reason = %e,
                stop_us = max_duration_us,
                "Hyperperiod not usable, clamping stop time to the maximum duration"
            );
            Ok(StopTime {
                stop_us: max_duration_us,
                hyperperiod: None,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
