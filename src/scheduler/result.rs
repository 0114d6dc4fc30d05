// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Result types produced by a scheduler run: per-task outcomes and the
//! run-level summary.

use std::time::Duration;

/// Why a task did not actually spawn a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ConditionFalse,
    CacheHit,
    DryRun,
    UpstreamFailure,
}

/// The outcome of running (or skipping) a single task.
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub name: String,
    pub success: bool,
    pub skip_reason: Option<SkipReason>,
    pub exit_code: Option<i32>,
    pub duration: Duration,
    pub attempts: u32,
    pub allow_failure: bool,
    pub timed_out: bool,
    pub cancelled: bool,
}

impl TaskResult {
    pub fn skipped(name: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            name: name.into(),
            success: true,
            skip_reason: Some(reason),
            exit_code: Some(0),
            duration: Duration::ZERO,
            attempts: 0,
            allow_failure: false,
            timed_out: false,
            cancelled: false,
        }
    }

    /// Whether this task's outcome should count against the run's overall
    /// `failed` flag — a failure that `allow_failure` tolerates still
    /// produces a non-`success` record, it just doesn't taint the run.
    pub fn taints_run(&self) -> bool {
        !self.success && !self.allow_failure
    }
}

/// The full ledger and summary of one `Scheduler::run` invocation.
#[derive(Debug, Clone)]
pub struct ScheduleResult {
    pub results: Vec<TaskResult>,
    pub success: bool,
    pub elapsed: Duration,
}

/// One execution level of the layered order, as a plain list of task names
/// — the same shape `Scheduler::plan` and `Scheduler::run` both derive from.
pub type DryRunPlan = Vec<Vec<String>>;
