/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Pure arithmetic helpers: GCD and checked LCM over task periods.
//!
//! Kept as free functions so the stop-time calculation and its tests do not
//! need a task set to exercise them.

use super::HyperperiodError;

/// Iterative Euclidean GCD.  `gcd(0, n) == n`, `gcd(0, 0) == 0`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Checked LCM of two periods.
///
/// Divides before multiplying so that only genuinely unrepresentable results
/// fail; those return [`HyperperiodError::Overflow`] carrying both operands.
/// Either operand being `0` yields `Ok(0)`.
pub fn lcm(a: u64, b: u64) -> Result<u64, HyperperiodError> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    (a / gcd(a, b))
        .checked_mul(b)
        .ok_or(HyperperiodError::Overflow { a, b })
}

/// Fold a list of periods into their common hyperperiod.
///
/// An empty list folds to `Ok(0)`; the first overflowing step aborts the fold.
pub fn lcm_of_slice(periods: &[u64]) -> Result<u64, HyperperiodError> {
    let Some((&first, rest)) = periods.split_first() else {
        return Ok(0);
    };
    rest.iter().try_fold(first, |acc, &p| lcm(acc, p))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
