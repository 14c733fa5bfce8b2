/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The scheduler's Ready Queue and Running slot.
//!
//! Task classes are few (a dozen at most), so the Ready Queue is a plain
//! `Vec` kept sorted on insertion.  The head is the highest-priority
//! instance.

use crate::task::TaskInstance;

// ── ReadyQueue ────────────────────────────────────────────────────────────────

/// Non-running instances in rate-monotonic order.
///
/// Primary key: ascending `period_us`.  Secondary key: ascending
/// `arrival_us`.  An instance whose key equals an existing one is placed
/// after it, so equal-priority instances keep their insertion order.
#[derive(Debug, Default)]
pub struct ReadyQueue {
    tasks: Vec<TaskInstance>,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `task` behind every instance of equal or higher priority.
    pub fn insert(&mut self, task: TaskInstance) {
        let key = task.priority_key();
        let pos = self.tasks.partition_point(|t| t.priority_key() <= key);
        self.tasks.insert(pos, task);
    }

    /// Remove and return the highest-priority instance.
    pub fn pop(&mut self) -> Option<TaskInstance> {
        if self.tasks.is_empty() {
            None
        } else {
            Some(self.tasks.remove(0))
        }
    }

    pub fn peek(&self) -> Option<&TaskInstance> {
        self.tasks.first()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Empty the queue, yielding instances in priority order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, TaskInstance> {
        self.tasks.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskInstance> {
        self.tasks.iter()
    }
}

// ── Running ───────────────────────────────────────────────────────────────────

/// Occupant of the Running slot.
///
/// `expected_completion_us` is fixed when the instance is installed; the
/// instance's `remaining_us` is only brought up to date when it leaves the
/// slot.
#[derive(Debug)]
pub struct Running {
    pub task: TaskInstance,
    pub started_us: u64,
    pub expected_completion_us: u64,
}

impl Running {
    pub fn install(task: TaskInstance, now_us: u64) -> Self {
        let expected_completion_us = now_us.saturating_add(task.remaining_us);
        Self {
            task,
            started_us: now_us,
            expected_completion_us,
        }
    }

    /// `true` once `now_us` has reached the expected completion.
    pub fn is_done(&self, now_us: u64) -> bool {
        now_us >= self.expected_completion_us
    }

    /// Work left at `now_us`; `0` if the occupant has logically finished.
    pub fn remaining_at(&self, now_us: u64) -> u64 {
        self.expected_completion_us.saturating_sub(now_us)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
