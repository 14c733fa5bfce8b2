//! Rate-monotonic preemptive scheduler core.
//!
//! [`Scheduler`] owns the Ready Queue, the single Running slot and the
//! Completed Queue.  Arrivals come in over the arrival channel; every loop
//! iteration runs three steps against the scheduler's own clock:
//!
//! 1. **Ingest** one arrival, stamping it with the receipt time.  An idle
//!    processor takes it at once; a strictly shorter period preempts the
//!    occupant; anything else joins the Ready Queue.
//! 2. **Dispatch** the Ready Queue head onto an idle processor.
//! 3. **Complete** the occupant once its expected completion time is reached.
//!
//! The state machine ([`Scheduler::step`]) takes `now` as an argument and is
//! fully deterministic; [`Scheduler::run`] wraps it in an async loop that
//! sleeps until the nearer of "next arrival" and "next expected completion"
//! instead of busy-polling.
//!
//! # Shutdown
//! Once the stop time is reached, arrivals are no longer admitted, instances
//! still waiting in the Ready Queue are moved to the abandoned list, and the
//! current occupant is allowed to finish.  No instance is installed in the
//! Running slot after the stop time.
//!
//! Abandoned instances never reach the Completed Queue, so the completed-task
//! report can hold fewer rows than there were arrivals.  They are returned in
//! [`SchedulerOutcome::abandoned`] and counted in the run summary.

pub mod error;
pub mod feasibility;
pub mod queue;

pub use error::SimError;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::clock::SimClock;
use crate::task::{CompletedTask, TaskArrival, TaskInstance};
use crate::trace::Timeline;

use queue::{ReadyQueue, Running};

// ── Outcome types ─────────────────────────────────────────────────────────────

/// Event counters of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Messages received from the arrival channel.
    pub arrivals: u64,

    /// Arrivals received at or after the stop time and therefore dropped.
    pub late_arrivals: u64,

    /// Occupants displaced by a higher-priority arrival (including those
    /// that had just finished).
    pub preemptions: u64,

    /// Ready Queue heads moved onto an idle processor.
    pub dispatches: u64,
}

/// Everything the scheduler produced, handed over after shutdown.
#[derive(Debug)]
pub struct SchedulerOutcome {
    /// Finished instances in completion order.
    pub completed: Vec<CompletedTask>,

    /// Instances still waiting in the Ready Queue at the stop time.
    pub abandoned: Vec<TaskInstance>,

    pub timeline: Timeline,
    pub stats: SchedulerStats,

    /// Scheduler time at which the loop exited.
    pub finished_us: u64,
}

// ── Scheduler ─────────────────────────────────────────────────────────────────

/// The scheduler's state machine.
#[derive(Debug)]
pub struct Scheduler {
    stop_us: u64,
    ready: ReadyQueue,
    running: Option<Running>,
    completed: Vec<CompletedTask>,
    abandoned: Vec<TaskInstance>,
    timeline: Timeline,
    stats: SchedulerStats,
    shutting_down: bool,
}

impl Scheduler {
    /// Create an idle scheduler for a run that stops at `stop_us`.
    pub fn new(stop_us: u64) -> Self {
        Self {
            stop_us,
            ready: ReadyQueue::new(),
            running: None,
            completed: Vec::new(),
            abandoned: Vec::new(),
            timeline: Timeline::new(),
            stats: SchedulerStats::default(),
            shutting_down: false,
        }
    }

    // ── Async driver ──────────────────────────────────────────────────────────

    /// Drive the state machine until the stop time has passed, every
    /// generator has dropped its sender and the processor is idle.
    pub async fn run(
        mut self,
        clock: SimClock,
        mut arrivals: UnboundedReceiver<TaskArrival>,
    ) -> SchedulerOutcome {
        info!(stop_us = self.stop_us, "Scheduler started");

        let mut channel_open = true;
        let mut pending: Option<TaskArrival> = None;

        loop {
            let now_us = clock.elapsed_us();

            if pending.is_none() && channel_open {
                match arrivals.try_recv() {
                    Ok(arrival) => pending = Some(arrival),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        debug!(now_us, "all generators have exited");
                        channel_open = false;
                    }
                }
            }

            let progressed = self.step(pending.take(), now_us);

            if now_us >= self.stop_us && !channel_open && self.is_idle() {
                break;
            }
            if progressed {
                continue;
            }

            let Some(wake_us) = self.next_wake_us() else {
                if !channel_open {
                    break;
                }
                // Nothing scheduled: only a new arrival (or the channel
                // closing) can change the state.
                match arrivals.recv().await {
                    Some(arrival) => pending = Some(arrival),
                    None => channel_open = false,
                }
                continue;
            };

            tokio::select! {
                biased;
                msg = arrivals.recv(), if channel_open => match msg {
                    Some(arrival) => pending = Some(arrival),
                    None => channel_open = false,
                },
                _ = clock.sleep_until_us(wake_us) => {}
            }
        }

        self.finish(clock.elapsed_us())
    }

    // ── State machine ─────────────────────────────────────────────────────────

    /// One scheduling iteration at `now_us`.  Returns `true` if any state
    /// changed.
    pub fn step(&mut self, arrival: Option<TaskArrival>, now_us: u64) -> bool {
        let mut progressed = false;

        if let Some(arrival) = arrival {
            self.ingest(arrival, now_us);
            progressed = true;
        }
        if now_us >= self.stop_us && !self.shutting_down {
            self.begin_shutdown(now_us);
            progressed = true;
        }
        progressed |= self.dispatch(now_us);
        progressed |= self.complete(now_us);

        progressed
    }

    /// Step 1: classify a freshly received arrival.
    pub fn ingest(&mut self, arrival: TaskArrival, now_us: u64) {
        self.stats.arrivals += 1;

        if now_us >= self.stop_us {
            self.stats.late_arrivals += 1;
            warn!(
                task_type = arrival.task_type,
                emitted_us = arrival.emitted_us,
                now_us,
                "Arrival after the stop time, not admitted"
            );
            return;
        }

        let task = TaskInstance::from_arrival(arrival, now_us);
        debug!(
            task_type = task.task_type,
            now_us,
            emitted_us = arrival.emitted_us,
            period_us = task.period_us,
            computation_us = task.computation_us,
            "arrival"
        );

        match self.running.take() {
            None => {
                self.timeline.install(now_us, task.task_type);
                self.running = Some(Running::install(task, now_us));
            }
            Some(incumbent) if task.preempts(&incumbent.task) => {
                self.preempt(incumbent, task, now_us);
            }
            Some(incumbent) => {
                self.running = Some(incumbent);
                self.ready.insert(task);
            }
        }
    }

    /// Replace `incumbent` with the higher-priority `task`.
    fn preempt(&mut self, incumbent: Running, task: TaskInstance, now_us: u64) {
        let remaining_us = incumbent.remaining_at(now_us);
        let incumbent_started_us = incumbent.started_us;
        let mut old = incumbent.task;
        self.stats.preemptions += 1;
        self.timeline.preempt(now_us, old.task_type, task.task_type);

        if remaining_us == 0 {
            // The incumbent finished exactly as the new arrival came in.
            debug!(task_type = old.task_type, now_us, "completed at preemption");
            self.completed.push(old.complete(now_us));
        } else {
            debug!(
                preempted = old.task_type,
                by = task.task_type,
                ran_us = now_us.saturating_sub(incumbent_started_us),
                remaining_us,
                now_us,
                "preemption"
            );
            old.remaining_us = remaining_us;
            old.preemptions += 1;
            self.ready.insert(old);
        }

        self.running = Some(Running::install(task, now_us));
    }

    /// Step 2: move the Ready Queue head onto an idle processor.
    pub fn dispatch(&mut self, now_us: u64) -> bool {
        if self.running.is_some() || self.shutting_down {
            return false;
        }
        let Some(task) = self.ready.pop() else {
            return false;
        };
        debug!(
            task_type = task.task_type,
            remaining_us = task.remaining_us,
            now_us,
            "dispatch"
        );
        self.stats.dispatches += 1;
        self.timeline.install(now_us, task.task_type);
        self.running = Some(Running::install(task, now_us));
        true
    }

    /// Step 3: finalise the occupant once its expected completion is reached.
    pub fn complete(&mut self, now_us: u64) -> bool {
        match self.running.take() {
            Some(running) if running.is_done(now_us) => {
                let done = running.task.complete(now_us);
                debug!(
                    task_type = done.task_type,
                    waiting_us = done.waiting_us,
                    now_us,
                    "completion"
                );
                self.timeline.complete(now_us, done.task_type);
                self.completed.push(done);
                true
            }
            other => {
                self.running = other;
                false
            }
        }
    }

    /// Stop admitting work: the Ready Queue is abandoned, the occupant may
    /// finish.
    fn begin_shutdown(&mut self, now_us: u64) {
        self.shutting_down = true;
        self.abandoned.extend(self.ready.drain());
        info!(
            now_us,
            running = self.running.as_ref().map(|r| r.task.task_type),
            abandoned = self.abandoned.len(),
            "Stop time reached, draining"
        );
        for task in &self.abandoned {
            warn!(
                task_type = task.task_type,
                arrival_us = task.arrival_us,
                remaining_us = task.remaining_us,
                "Ready task abandoned at shutdown"
            );
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    /// `true` when nothing is running and nothing is waiting.
    pub fn is_idle(&self) -> bool {
        self.running.is_none() && self.ready.is_empty()
    }

    /// The next instant at which the state changes without a new arrival:
    /// the occupant's expected completion, or the stop time.
    pub fn next_wake_us(&self) -> Option<u64> {
        let completion = self.running.as_ref().map(|r| r.expected_completion_us);
        let stop = (!self.shutting_down).then_some(self.stop_us);
        match (completion, stop) {
            (Some(c), Some(s)) => Some(c.min(s)),
            (c, s) => c.or(s),
        }
    }

    /// Task type of the current occupant, if any.
    pub fn running_task_type(&self) -> Option<u32> {
        self.running.as_ref().map(|r| r.task.task_type)
    }

    /// Expected completion of the current occupant, if any.
    pub fn expected_completion_us(&self) -> Option<u64> {
        self.running.as_ref().map(|r| r.expected_completion_us)
    }

    pub fn ready_queue(&self) -> &ReadyQueue {
        &self.ready
    }

    pub fn completed(&self) -> &[CompletedTask] {
        &self.completed
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Consume the scheduler and hand over its queues.
    pub fn finish(self, now_us: u64) -> SchedulerOutcome {
        info!(
            finished_us = now_us,
            arrivals = self.stats.arrivals,
            completed = self.completed.len(),
            abandoned = self.abandoned.len(),
            late = self.stats.late_arrivals,
            preemptions = self.stats.preemptions,
            "Scheduler finished"
        );
        SchedulerOutcome {
            completed: self.completed,
            abandoned: self.abandoned,
            timeline: self.timeline,
            stats: self.stats,
            finished_us: now_us,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taskset::TaskClass;

    const TICK_US: u64 = 10_000;

    fn arrival(task_type: u32, period_ticks: u64, computation_ticks: u64) -> TaskArrival {
        TaskArrival {
            task_type,
            emitted_us: 0,
            period_us: period_ticks * TICK_US,
            computation_us: computation_ticks * TICK_US,
        }
    }

    fn ticks(t: u64) -> u64 {
        t * TICK_US
    }

    /// Deterministic discrete-event driver: releases every class at
    /// multiples of its period inside `[0, stop)` and advances time straight
    /// to the next event.  Arrivals at the same instant are received in class
    /// order.
    fn simulate(classes: &[TaskClass], stop_us: u64) -> SchedulerOutcome {
        let mut sched = Scheduler::new(stop_us);
        let mut next_release: Vec<u64> = vec![0; classes.len()];
        let mut now = 0;
        loop {
            for (i, class) in classes.iter().enumerate() {
                if next_release[i] == now && now < stop_us {
                    sched.step(Some(TaskArrival::new(class, TICK_US, now)), now);
                    next_release[i] += class.period_us(TICK_US);
                }
            }
            while sched.step(None, now) {}

            if now >= stop_us && sched.is_idle() {
                return sched.finish(now);
            }
            let next_arrival = next_release
                .iter()
                .copied()
                .filter(|&t| t < stop_us)
                .min();
            now = match (next_arrival, sched.next_wake_us()) {
                (Some(a), Some(w)) => a.min(w),
                (a, w) => a.or(w).expect("pending event"),
            };
        }
    }

    fn class(task_type: u32, computation_ticks: u64, period_ticks: u64) -> TaskClass {
        TaskClass {
            task_type,
            computation_ticks,
            period_ticks,
        }
    }

    // ── ingest ────────────────────────────────────────────────────────────────

    #[test]
    fn arrival_on_idle_processor_runs_immediately() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(2, 100, 20), ticks(3));
        assert_eq!(s.running_task_type(), Some(2));
        assert_eq!(s.expected_completion_us(), Some(ticks(23)));
        assert!(s.ready_queue().is_empty());
    }

    #[test]
    fn shorter_period_preempts_and_incumbent_is_requeued() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(1, 100, 20), 0);
        s.ingest(arrival(2, 75, 15), ticks(5));

        assert_eq!(s.running_task_type(), Some(2));
        assert_eq!(s.expected_completion_us(), Some(ticks(20)));
        let requeued = s.ready_queue().peek().expect("incumbent requeued");
        assert_eq!(requeued.task_type, 1);
        assert_eq!(requeued.remaining_us, ticks(15));
        assert_eq!(requeued.preemptions, 1);
        assert_eq!(s.stats().preemptions, 1);
    }

    #[test]
    fn equal_period_does_not_preempt() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(1, 100, 20), 0);
        s.ingest(arrival(2, 100, 5), ticks(1));
        assert_eq!(s.running_task_type(), Some(1));
        assert_eq!(s.ready_queue().len(), 1);
    }

    #[test]
    fn longer_period_joins_ready_queue_in_priority_order() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(1, 50, 20), 0);
        s.ingest(arrival(3, 200, 5), ticks(1));
        s.ingest(arrival(2, 100, 5), ticks(2));
        let order: Vec<u32> = s.ready_queue().iter().map(|t| t.task_type).collect();
        assert_eq!(order, vec![2, 3]);
    }

    #[test]
    fn equal_period_arrivals_keep_arrival_order() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(9, 10, 50), 0);
        s.ingest(arrival(1, 100, 5), ticks(1));
        s.ingest(arrival(2, 100, 5), ticks(2));
        s.ingest(arrival(3, 100, 5), ticks(3));
        let order: Vec<u32> = s.ready_queue().iter().map(|t| t.task_type).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn preemption_at_completion_boundary_completes_incumbent() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(1, 100, 20), 0);
        s.ingest(arrival(2, 75, 15), ticks(20));

        assert_eq!(s.running_task_type(), Some(2));
        assert!(s.ready_queue().is_empty(), "finished incumbent is not requeued");
        assert_eq!(s.completed().len(), 1);
        assert_eq!(s.completed()[0].task_type, 1);
        assert_eq!(s.completed()[0].waiting_us, ticks(20));
    }

    #[test]
    fn arrival_after_stop_is_not_admitted() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(1, 100, 20), ticks(300));
        assert!(s.is_idle());
        assert_eq!(s.stats().late_arrivals, 1);
        assert_eq!(s.stats().arrivals, 1);
    }

    // ── dispatch / complete ───────────────────────────────────────────────────

    #[test]
    fn completion_then_dispatch_of_ready_head() {
        let mut s = Scheduler::new(ticks(300));
        s.ingest(arrival(1, 75, 15), 0);
        s.ingest(arrival(2, 100, 20), 0);

        assert!(!s.complete(ticks(14)));
        assert!(s.complete(ticks(15)));
        assert_eq!(s.running_task_type(), None);
        assert!(s.dispatch(ticks(15)));
        assert_eq!(s.running_task_type(), Some(2));
        assert_eq!(s.expected_completion_us(), Some(ticks(35)));
        assert!(s.complete(ticks(35)));
        assert_eq!(s.completed()[1].waiting_us, ticks(35));
    }

    #[test]
    fn step_runs_ingest_dispatch_complete_in_order() {
        let mut s = Scheduler::new(ticks(300));
        s.step(Some(arrival(1, 75, 0)), 0);
        // Zero-computation instance completes within the same iteration
        assert!(s.is_idle());
        assert_eq!(s.completed().len(), 1);
        assert_eq!(s.completed()[0].waiting_us, 0);
    }

    // ── shutdown ──────────────────────────────────────────────────────────────

    #[test]
    fn shutdown_abandons_ready_queue_and_lets_occupant_finish() {
        let mut s = Scheduler::new(ticks(100));
        s.step(Some(arrival(1, 50, 80)), ticks(40));
        s.step(Some(arrival(2, 500, 10)), ticks(60));
        assert_eq!(s.ready_queue().len(), 1);

        assert!(s.step(None, ticks(100)));
        assert!(s.ready_queue().is_empty());
        assert_eq!(s.running_task_type(), Some(1));
        assert_eq!(s.next_wake_us(), Some(ticks(120)));

        s.step(None, ticks(120));
        assert!(s.is_idle());
        assert!(!s.dispatch(ticks(120)));
        let out = s.finish(ticks(120));
        assert_eq!(out.completed.len(), 1);
        assert_eq!(out.abandoned.len(), 1);
        assert_eq!(out.abandoned[0].task_type, 2);
        assert!(
            out.completed.iter().all(|c| c.task_type != 2),
            "abandoned instances are never reported as completed"
        );
        assert_eq!(out.stats.arrivals, 2);
    }

    #[test]
    fn next_wake_is_nearer_of_completion_and_stop() {
        let mut s = Scheduler::new(ticks(100));
        assert_eq!(s.next_wake_us(), Some(ticks(100)));
        s.ingest(arrival(1, 50, 20), ticks(10));
        assert_eq!(s.next_wake_us(), Some(ticks(30)));
        s.ingest(arrival(2, 40, 200), ticks(20));
        assert_eq!(s.next_wake_us(), Some(ticks(100)));
    }

    // ── whole hyperperiods ────────────────────────────────────────────────────

    #[test]
    fn two_class_hyperperiod_completes_seven_instances() {
        let out = simulate(&[class(1, 15, 75), class(2, 20, 100)], ticks(300));

        let a = out.completed.iter().filter(|c| c.task_type == 1).count();
        let b = out.completed.iter().filter(|c| c.task_type == 2).count();
        assert_eq!((a, b), (4, 3));
        assert!(out.abandoned.is_empty());
        assert_eq!(out.stats.late_arrivals, 0);

        for c in &out.completed {
            assert!(c.waiting_us >= c.computation_us, "{c:?}");
            assert!(c.waiting_us <= ticks(300), "{c:?}");
        }
        let arrivals: Vec<u64> = out.completed.iter().map(|c| c.arrival_us).collect();
        assert!(arrivals.windows(2).all(|w| w[0] <= w[1]));

        // A runs first at t=0; B waits for it
        assert_eq!(out.completed[0].task_type, 1);
        assert_eq!(out.completed[1].waiting_us, ticks(35));
    }

    #[test]
    fn shorter_period_class_preempts_longer_one() {
        // B starts alone at 0; A arrives at 10 and must displace it.
        let mut s = Scheduler::new(ticks(300));
        s.step(Some(arrival(2, 100, 40)), 0);
        s.step(Some(arrival(1, 75, 15)), ticks(10));
        assert_eq!(s.running_task_type(), Some(1));
        s.step(None, ticks(25));
        s.step(None, ticks(25));
        assert_eq!(s.running_task_type(), Some(2));
        assert_eq!(s.expected_completion_us(), Some(ticks(55)));
        s.step(None, ticks(55));
        let waits: Vec<(u32, u64)> = s
            .completed()
            .iter()
            .map(|c| (c.task_type, c.waiting_us))
            .collect();
        assert_eq!(waits, vec![(1, ticks(15)), (2, ticks(55))]);
    }

    #[test]
    fn at_most_one_task_occupies_the_processor() {
        let out = simulate(
            &[class(1, 3, 10), class(2, 7, 25), class(3, 9, 50)],
            ticks(50),
        );
        let intervals = out.timeline.busy_intervals();
        for w in intervals.windows(2) {
            assert!(w[0].1 <= w[1].0, "overlapping occupancy: {w:?}");
        }
        for c in &out.completed {
            assert!(c.waiting_us >= c.computation_us);
        }
    }

    #[test]
    fn overloaded_set_records_missed_deadlines_without_failing() {
        let out = simulate(&[class(1, 6, 10), class(2, 10, 20)], ticks(40));
        assert!(out.completed.iter().any(CompletedTask::missed_deadline));
        // Nothing is installed after the stop time
        let last_install = out
            .timeline
            .busy_intervals()
            .iter()
            .map(|&(start, _, _)| start)
            .max()
            .unwrap();
        assert!(last_install < ticks(40));
    }
}
