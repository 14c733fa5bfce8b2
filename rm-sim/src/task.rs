/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Task instance data structures for the rate-monotonic simulator.
//!
//! Three types model the three stages of an instance's life:
//!
//! ```text
//! generator ──(TaskArrival)──► channel ──► scheduler: TaskInstance ──► CompletedTask
//!              immutable message           Ready ⇄ Running              terminal record
//! ```
//!
//! # Ownership model
//! A [`TaskArrival`] is built fresh by a generator for every release and
//! moved into the channel; the generator keeps nothing.  The scheduler turns
//! it into a [`TaskInstance`] stamped with its own clock, and from then on
//! the instance is owned by exactly one of the Ready Queue, the Running slot
//! or (after [`TaskInstance::complete`]) the Completed Queue.  Completion
//! consumes the instance, so a finished task cannot be revived.

use crate::taskset::TaskClass;

// ── TaskArrival (channel message) ─────────────────────────────────────────────

/// One release of a task class, sent by its generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskArrival {
    pub task_type: u32,

    /// The generator's own elapsed time at emission.  Informational only; the
    /// scheduler's receipt time is authoritative.
    pub emitted_us: u64,

    pub period_us: u64,
    pub computation_us: u64,
}

impl TaskArrival {
    /// Build the message for one release of `class`.
    pub fn new(class: &TaskClass, tick_us: u64, emitted_us: u64) -> Self {
        Self {
            task_type: class.task_type,
            emitted_us,
            period_us: class.period_us(tick_us),
            computation_us: class.computation_us(tick_us),
        }
    }
}

// ── TaskInstance (scheduler-owned) ────────────────────────────────────────────

/// A released task instance inside the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInstance {
    pub task_type: u32,

    /// Scheduler time at which the instance was received.
    pub arrival_us: u64,

    /// Recurrence interval; shorter period = higher priority.
    pub period_us: u64,

    /// Work required when the instance arrived.
    pub computation_us: u64,

    /// Work still outstanding.  Only updated when the instance leaves the
    /// Running slot.
    pub remaining_us: u64,

    /// Number of times this instance was preempted.
    pub preemptions: u32,
}

impl TaskInstance {
    /// Stamp an arrival with the scheduler's receipt time.
    pub fn from_arrival(arrival: TaskArrival, now_us: u64) -> Self {
        Self {
            task_type: arrival.task_type,
            arrival_us: now_us,
            period_us: arrival.period_us,
            computation_us: arrival.computation_us,
            remaining_us: arrival.computation_us,
            preemptions: 0,
        }
    }

    /// Priority key: ascending period, then ascending arrival.
    pub fn priority_key(&self) -> (u64, u64) {
        (self.period_us, self.arrival_us)
    }

    /// `true` if `self` should preempt `running`.  Ties keep the incumbent.
    pub fn preempts(&self, running: &TaskInstance) -> bool {
        self.period_us < running.period_us
    }

    /// Finalise the instance at `now_us`.
    pub fn complete(self, now_us: u64) -> CompletedTask {
        CompletedTask {
            task_type: self.task_type,
            arrival_us: self.arrival_us,
            period_us: self.period_us,
            computation_us: self.computation_us,
            completion_us: now_us,
            waiting_us: now_us.saturating_sub(self.arrival_us),
            preemptions: self.preemptions,
        }
    }
}

// ── CompletedTask (terminal record) ───────────────────────────────────────────

/// An instance that reached the Completed state.  Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTask {
    pub task_type: u32,
    pub arrival_us: u64,
    pub period_us: u64,
    pub computation_us: u64,
    pub completion_us: u64,

    /// `completion_us − arrival_us`, including any preempted intervals.
    pub waiting_us: u64,

    pub preemptions: u32,
}

impl CompletedTask {
    /// A deadline is missed when the instance outlives its own period.
    pub fn missed_deadline(&self) -> bool {
        self.waiting_us > self.period_us
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival(task_type: u32, period_us: u64, computation_us: u64) -> TaskArrival {
        TaskArrival {
            task_type,
            emitted_us: 0,
            period_us,
            computation_us,
        }
    }

    #[test]
    fn arrival_converts_ticks_to_microseconds() {
        let class = TaskClass {
            task_type: 3,
            computation_ticks: 15,
            period_ticks: 75,
        };
        let msg = TaskArrival::new(&class, 10_000, 42);
        assert_eq!(msg.task_type, 3);
        assert_eq!(msg.emitted_us, 42);
        assert_eq!(msg.period_us, 750_000);
        assert_eq!(msg.computation_us, 150_000);
    }

    #[test]
    fn instance_is_stamped_with_receipt_time_not_emission_time() {
        let mut msg = arrival(1, 750, 150);
        msg.emitted_us = 10;
        let inst = TaskInstance::from_arrival(msg, 25);
        assert_eq!(inst.arrival_us, 25);
        assert_eq!(inst.remaining_us, 150);
        assert_eq!(inst.preemptions, 0);
    }

    #[test]
    fn shorter_period_preempts_and_ties_do_not() {
        let a = TaskInstance::from_arrival(arrival(1, 750, 150), 0);
        let b = TaskInstance::from_arrival(arrival(2, 1_000, 200), 0);
        let b2 = TaskInstance::from_arrival(arrival(3, 1_000, 200), 5);
        assert!(a.preempts(&b));
        assert!(!b.preempts(&a));
        assert!(!b2.preempts(&b), "equal periods keep the incumbent");
    }

    #[test]
    fn complete_records_waiting_time() {
        let inst = TaskInstance::from_arrival(arrival(1, 750, 150), 100);
        let done = inst.complete(400);
        assert_eq!(done.waiting_us, 300);
        assert_eq!(done.completion_us, 400);
        assert_eq!(done.computation_us, 150);
        assert!(!done.missed_deadline());
    }

    #[test]
    fn waiting_beyond_period_is_a_missed_deadline() {
        let inst = TaskInstance::from_arrival(arrival(1, 100, 50), 0);
        assert!(inst.complete(101).missed_deadline());
    }
}
