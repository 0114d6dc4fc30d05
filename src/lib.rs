// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `zr-core`: the execution pipeline of a task-runner/DAG orchestrator —
//! graph engine, OS-thread scheduler, process manager, condition evaluator,
//! cache store, and retry controller.
//!
//! Configuration parsing and the workflow runner are thin layers over this
//! pipeline; argument handling, progress rendering, and remote caches are
//! left to external consumers. `run_config`/`plan_config` below are the
//! crate's two outward-facing entry points for a caller that just wants to
//! point at a TOML file and a root task.

pub mod cache;
pub mod condition;
pub mod config;
pub mod control;
pub mod error;
pub mod graph;
pub mod history;
pub mod observability;
pub mod process;
pub mod retry;
pub mod scheduler;
pub mod workflow;

use std::path::Path;

pub use error::Error;
pub use scheduler::{DryRunPlan, ScheduleResult, Scheduler, SchedulerConfig};
pub use workflow::{StageResult, WorkflowRunner};

/// Load, validate, and run `root` from the TOML config at `path`.
pub fn run_config(
    path: impl AsRef<Path>,
    root: &str,
    opts: SchedulerConfig,
) -> Result<ScheduleResult, Error> {
    let config = config::load_and_validate(path)?;
    let scheduler = Scheduler::new(&config, opts);
    Ok(scheduler.run(root)?)
}

/// Load, validate, and plan `root` from the TOML config at `path` without
/// running anything.
pub fn plan_config(
    path: impl AsRef<Path>,
    root: &str,
    opts: SchedulerConfig,
) -> Result<DryRunPlan, Error> {
    let config = config::load_and_validate(path)?;
    let scheduler = Scheduler::new(&config, opts);
    Ok(scheduler.plan(root)?)
}
