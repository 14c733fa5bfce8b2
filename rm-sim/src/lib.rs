/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! rm-sim – rate-monotonic preemptive scheduling simulator
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── config/         – YAML simulation configuration + defaults
//! ├── taskset         – task-set file loader
//! ├── task            – arrivals, task instances, completed records
//! ├── hyperperiod/    – GCD / LCM helpers and the stop time
//! ├── clock           – elapsed-time source shared by every component
//! ├── generator       – one periodic arrival producer per task class
//! ├── scheduler/      – RM state machine, queues, feasibility pre-check
//! ├── trace           – transition timeline (`<ticks>\t<task_type>`)
//! ├── report          – completed-task report and per-class statistics
//! └── simulation      – wiring: channel, generators, scheduler
//! ```

pub mod clock;
pub mod config;
pub mod generator;
pub mod hyperperiod;
pub mod report;
pub mod scheduler;
pub mod simulation;
pub mod task;
pub mod taskset;
pub mod trace;
