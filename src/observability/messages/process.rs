// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for child-process supervision: spawn, timeout, and
//! termination escalation.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;

pub struct ProcessSpawned<'a> {
    pub task: &'a str,
    pub cmd: &'a str,
}

impl Display for ProcessSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task '{}' spawned: {}", self.task, self.cmd)
    }
}

impl StructuredLog for ProcessSpawned<'_> {
    fn log(&self) {
        tracing::debug!(task = self.task, cmd = self.cmd, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("process_spawn", span_name = name, task = self.task)
    }
}

pub struct ProcessTimedOut<'a> {
    pub task: &'a str,
    pub timeout_ms: u64,
}

impl Display for ProcessTimedOut<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' exceeded its {}ms timeout and was terminated",
            self.task, self.timeout_ms
        )
    }
}

impl StructuredLog for ProcessTimedOut<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, timeout_ms = self.timeout_ms, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "process_timeout",
            span_name = name,
            task = self.task,
            timeout_ms = self.timeout_ms,
        )
    }
}

pub struct ResourceLimitUnavailable<'a> {
    pub task: &'a str,
    pub reason: &'a str,
}

impl Display for ResourceLimitUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' could not have its memory limit applied, falling back to a soft monitor: {}",
            self.task, self.reason
        )
    }
}

impl StructuredLog for ResourceLimitUnavailable<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "resource_limit_unavailable",
            span_name = name,
            task = self.task,
            reason = self.reason,
        )
    }
}

pub struct ProcessKillEscalated<'a> {
    pub task: &'a str,
}

impl Display for ProcessKillEscalated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' ignored SIGTERM past the grace period; sending SIGKILL",
            self.task
        )
    }
}

impl StructuredLog for ProcessKillEscalated<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("process_kill_escalated", span_name = name, task = self.task)
    }
}
