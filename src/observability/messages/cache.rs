// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for cache lookups.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;

pub struct CacheHit<'a> {
    pub task: &'a str,
    pub key: &'a str,
}

impl Display for CacheHit<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task '{}' skipped: cache hit ({})", self.task, self.key)
    }
}

impl StructuredLog for CacheHit<'_> {
    fn log(&self) {
        tracing::info!(task = self.task, key = self.key, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("cache_hit", span_name = name, task = self.task, key = self.key)
    }
}

pub struct CacheUnavailable<'a> {
    pub reason: &'a str,
}

impl Display for CacheUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Cache unavailable, treating as miss: {}", self.reason)
    }
}

impl StructuredLog for CacheUnavailable<'_> {
    fn log(&self) {
        tracing::warn!(reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("cache_unavailable", span_name = name, reason = self.reason)
    }
}
