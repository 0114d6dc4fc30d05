// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for retry attempts.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;

pub struct RetryAttempted<'a> {
    pub task: &'a str,
    pub attempt: u32,
    pub max: u32,
}

impl Display for RetryAttempted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Retrying task '{}' (attempt {} of {})",
            self.task, self.attempt, self.max + 1
        )
    }
}

impl StructuredLog for RetryAttempted<'_> {
    fn log(&self) {
        tracing::warn!(task = self.task, attempt = self.attempt, max = self.max, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "retry_attempt",
            span_name = name,
            task = self.task,
            attempt = self.attempt,
        )
    }
}

pub struct RetryExhausted<'a> {
    pub task: &'a str,
    pub attempts: u32,
}

impl Display for RetryExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task '{}' failed after {} attempts",
            self.task, self.attempts
        )
    }
}

impl StructuredLog for RetryExhausted<'_> {
    fn log(&self) {
        tracing::error!(task = self.task, attempts = self.attempts, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "retry_exhausted",
            span_name = name,
            task = self.task,
            attempts = self.attempts,
        )
    }
}
