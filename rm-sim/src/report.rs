/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Completed-task report and per-class statistics.
//!
//! The report is a read-only projection of the Completed Queue, in completion
//! order.  Persisted as one tab-separated row per instance:
//!
//! ```text
//! task_type  arrival_us  period_us  computation_us  waiting_us
//! ```
//!
//! The file is opened in append mode so that consecutive runs accumulate in
//! one file.
//!
//! Instances abandoned in the Ready Queue at the stop time are not part of
//! the report; [`log_summary`] only counts them.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::task::{CompletedTask, TaskInstance};

// ── Report rows ───────────────────────────────────────────────────────────────

/// One line of the completed-task report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRow {
    pub task_type: u32,
    pub arrival_us: u64,
    pub period_us: u64,
    pub computation_us: u64,
    pub waiting_us: u64,
}

impl From<&CompletedTask> for ReportRow {
    fn from(task: &CompletedTask) -> Self {
        Self {
            task_type: task.task_type,
            arrival_us: task.arrival_us,
            period_us: task.period_us,
            computation_us: task.computation_us,
            waiting_us: task.waiting_us,
        }
    }
}

/// Read-only view over the Completed Queue.
#[derive(Debug, Clone, Copy)]
pub struct CompletedReport<'a> {
    completed: &'a [CompletedTask],
}

impl<'a> CompletedReport<'a> {
    pub fn new(completed: &'a [CompletedTask]) -> Self {
        Self { completed }
    }

    /// Rows in completion order.
    pub fn rows(&self) -> impl Iterator<Item = ReportRow> + 'a {
        self.completed.iter().map(ReportRow::from)
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Write every row as tab-separated text.
    pub fn write_tsv<W: Write>(&self, mut out: W) -> io::Result<()> {
        for row in self.rows() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}",
                row.task_type, row.arrival_us, row.period_us, row.computation_us, row.waiting_us
            )?;
        }
        out.flush()
    }

    /// Append the report to `path`, creating the file if needed.
    pub fn append_to_file(&self, path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.write_tsv(BufWriter::new(file))?;
        info!(rows = self.len(), path = %path.display(), "Completed-task report written");
        Ok(())
    }
}

// ── Summary statistics ────────────────────────────────────────────────────────

/// Waiting-time statistics for one task class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassSummary {
    pub task_type: u32,
    pub completed: usize,
    pub min_waiting_us: u64,
    pub max_waiting_us: u64,
    pub mean_waiting_us: f64,
    pub deadline_misses: usize,
    pub preemptions: u64,
}

/// Per-class summaries keyed by task type (ascending).
pub fn summarize(completed: &[CompletedTask]) -> BTreeMap<u32, ClassSummary> {
    let mut by_type: BTreeMap<u32, Vec<&CompletedTask>> = BTreeMap::new();
    for task in completed {
        by_type.entry(task.task_type).or_default().push(task);
    }

    by_type
        .into_iter()
        .map(|(task_type, tasks)| {
            let waits = tasks.iter().map(|t| t.waiting_us);
            let total: u64 = waits.clone().sum();
            let summary = ClassSummary {
                task_type,
                completed: tasks.len(),
                min_waiting_us: waits.clone().min().unwrap_or(0),
                max_waiting_us: waits.max().unwrap_or(0),
                mean_waiting_us: total as f64 / tasks.len() as f64,
                deadline_misses: tasks.iter().filter(|t| t.missed_deadline()).count(),
                preemptions: tasks.iter().map(|t| u64::from(t.preemptions)).sum(),
            };
            (task_type, summary)
        })
        .collect()
}

/// Log the per-class summary and any abandoned instances.
pub fn log_summary(completed: &[CompletedTask], abandoned: &[TaskInstance], tick_us: u64) {
    let ticks = |us: u64| us as f64 / tick_us as f64;
    for s in summarize(completed).values() {
        info!(
            task_type = s.task_type,
            completed = s.completed,
            min_wait_ticks = ticks(s.min_waiting_us),
            max_wait_ticks = ticks(s.max_waiting_us),
            mean_wait_ticks = s.mean_waiting_us / tick_us as f64,
            deadline_misses = s.deadline_misses,
            preemptions = s.preemptions,
            "class summary"
        );
        if s.deadline_misses > 0 {
            warn!(
                task_type = s.task_type,
                deadline_misses = s.deadline_misses,
                "instances finished after their period"
            );
        }
    }
    if !abandoned.is_empty() {
        warn!(count = abandoned.len(), "instances left unfinished at the stop time");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    fn done(task_type: u32, arrival_us: u64, period_us: u64, waiting_us: u64) -> CompletedTask {
        CompletedTask {
            task_type,
            arrival_us,
            period_us,
            computation_us: 10,
            completion_us: arrival_us + waiting_us,
            waiting_us,
            preemptions: 0,
        }
    }

    #[test]
    fn rows_follow_completion_order() {
        let completed = vec![done(1, 0, 75, 15), done(2, 0, 100, 35), done(1, 75, 75, 15)];
        let report = CompletedReport::new(&completed);
        let types: Vec<u32> = report.rows().map(|r| r.task_type).collect();
        assert_eq!(types, vec![1, 2, 1]);
        assert_eq!(report.len(), 3);
    }

    #[test]
    fn tsv_layout() {
        let completed = vec![done(2, 5, 100, 35)];
        let mut buf = Vec::new();
        CompletedReport::new(&completed).write_tsv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "2\t5\t100\t10\t35\n");
    }

    #[test]
    fn append_accumulates_across_runs() {
        let f = NamedTempFile::new().unwrap();
        let completed = vec![done(1, 0, 75, 15)];
        let report = CompletedReport::new(&completed);
        report.append_to_file(f.path()).unwrap();
        report.append_to_file(f.path()).unwrap();

        let mut text = String::new();
        std::fs::File::open(f.path())
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn append_to_unwritable_path_fails() {
        let completed = vec![done(1, 0, 75, 15)];
        let result =
            CompletedReport::new(&completed).append_to_file(Path::new("/nonexistent/dir/r.tsv"));
        assert!(result.is_err());
    }

    #[test]
    fn summary_per_class() {
        let completed = vec![
            done(1, 0, 75, 15),
            done(2, 0, 100, 35),
            done(1, 75, 75, 25),
            done(2, 100, 100, 120),
        ];
        let summary = summarize(&completed);
        assert_eq!(summary.len(), 2);

        let a = summary[&1];
        assert_eq!(a.completed, 2);
        assert_eq!(a.min_waiting_us, 15);
        assert_eq!(a.max_waiting_us, 25);
        assert!((a.mean_waiting_us - 20.0).abs() < 1e-9);
        assert_eq!(a.deadline_misses, 0);

        let b = summary[&2];
        assert_eq!(b.deadline_misses, 1);
        assert_eq!(b.max_waiting_us, 120);
    }

    #[test]
    fn summary_of_nothing_is_empty() {
        assert!(summarize(&[]).is_empty());
    }
}
