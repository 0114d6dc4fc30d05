// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for scheduler lifecycle: level dispatch, task outcomes,
//! and run completion.

use std::fmt::{Display, Formatter};
use std::time::Duration;

use tracing::Span;

use crate::observability::messages::StructuredLog;

/// A scheduler run started against a given root task.
pub struct RunStarted<'a> {
    pub root: &'a str,
    pub task_count: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting run for '{}': {} tasks needed",
            self.root, self.task_count
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(root = self.root, task_count = self.task_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "scheduler_run",
            span_name = name,
            root = self.root,
            task_count = self.task_count,
        )
    }
}

/// One execution level was dispatched.
pub struct LevelDispatched<'a> {
    pub level_index: usize,
    pub tasks: &'a [String],
}

impl Display for LevelDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching level {}: [{}]",
            self.level_index,
            self.tasks.join(", ")
        )
    }
}

impl StructuredLog for LevelDispatched<'_> {
    fn log(&self) {
        tracing::info!(
            level_index = self.level_index,
            task_count = self.tasks.len(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "level_dispatch",
            span_name = name,
            level_index = self.level_index,
            task_count = self.tasks.len(),
        )
    }
}

/// A single task finished, successfully or not.
pub struct TaskFinished<'a> {
    pub task: &'a str,
    pub success: bool,
    pub duration: Duration,
}

impl Display for TaskFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' finished ({}) in {:?}",
            self.task,
            if self.success { "ok" } else { "failed" },
            self.duration
        )
    }
}

impl StructuredLog for TaskFinished<'_> {
    fn log(&self) {
        if self.success {
            tracing::info!(
                task = self.task,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        } else {
            tracing::warn!(
                task = self.task,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "task_finished",
            span_name = name,
            task = self.task,
            success = self.success,
        )
    }
}

/// A scheduler run completed.
pub struct RunCompleted<'a> {
    pub root: &'a str,
    pub success: bool,
    pub duration: Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Run for '{}' completed ({}) in {:?}",
            self.root,
            if self.success { "success" } else { "failure" },
            self.duration
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            root = self.root,
            success = self.success,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            root = self.root,
            success = self.success,
        )
    }
}

/// Topological sort failed (cyclic dependency detected).
pub struct CycleDetected<'a> {
    pub cycle: &'a [String],
}

impl Display for CycleDetected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cyclic dependency detected: {}", self.cycle.join(", "))
    }
}

impl StructuredLog for CycleDetected<'_> {
    fn log(&self) {
        tracing::error!(cycle = ?self.cycle, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("cycle_detected", span_name = name, cycle = ?self.cycle)
    }
}
