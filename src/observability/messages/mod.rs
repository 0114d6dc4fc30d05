// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging and distributed tracing.
//!
//! This module contains all message types used throughout the scheduler for
//! diagnostic and operational logging. Each message type implements:
//!
//! * `Display` - Human-readable output (supports future i18n)
//! * `StructuredLog` - Machine-readable fields + OpenTelemetry span creation
//!
//! # Organization
//!
//! Messages are organized by subsystem to maintain Single Responsibility Principle:
//!
//! * `scheduler` - level dispatch, task outcomes, run completion
//! * `process` - child-process spawn, timeout, and kill escalation
//! * `cache` - cache hits and cache-unavailable warnings
//! * `retry` - retry attempts and exhaustion
//!
//! # Usage Patterns
//!
//! ## Basic Logging (Human-Readable)
//! ```rust
//! use zr_core::observability::messages::scheduler::RunStarted;
//!
//! let msg = RunStarted {
//!     root: "build",
//!     task_count: 5,
//! };
//!
//! tracing::info!("{}", msg);
//! ```
//!
//! ## Structured Logging (Machine-Readable)
//! ```rust
//! use zr_core::observability::messages::{StructuredLog, scheduler::RunStarted};
//!
//! let msg = RunStarted {
//!     root: "build",
//!     task_count: 5,
//! };
//!
//! // Emits both human-readable message AND structured fields
//! msg.log();
//! ```
//!
//! ## Distributed Tracing (OpenTelemetry)
//! ```rust
//! use zr_core::observability::messages::{StructuredLog, scheduler::RunStarted};
//!
//! let msg = RunStarted {
//!     root: "build",
//!     task_count: 5,
//! };
//!
//! // Create span with message fields as attributes
//! let span = msg.span("scheduler_run");
//! let _guard = span.enter();
//!
//! // ... work happens here with span context ...
//! ```

pub mod cache;
pub mod process;
pub mod retry;
pub mod scheduler;
pub mod workflow;

use tracing::Span;

/// Trait for messages that support structured logging and distributed tracing.
///
/// This trait provides two key capabilities:
///
/// 1. **Structured Logging** - Emit log events with machine-readable fields
///    for querying, metrics extraction, and alerting
/// 2. **Distributed Tracing** - Create OpenTelemetry spans with attributes
///    for end-to-end request tracing and performance analysis
///
/// # Example: Structured Logging
/// ```rust
/// use zr_core::observability::messages::{StructuredLog, scheduler::RunStarted};
///
/// let msg = RunStarted {
///     root: "build",
///     task_count: 5,
/// };
///
/// msg.log();
/// ```
///
/// # Example: Distributed Tracing
/// ```rust
/// use zr_core::observability::messages::{StructuredLog, scheduler::RunStarted};
///
/// let msg = RunStarted {
///     root: "build",
///     task_count: 5,
/// };
///
/// let span = msg.span("scheduler_run");
/// let _guard = span.enter();
/// // Work happens here with span context
/// // Span automatically closed when _guard drops
/// ```
pub trait StructuredLog {
    /// Emit a log event with structured fields.
    ///
    /// Logs both the human-readable message (via `Display`) and
    /// machine-readable fields for querying and metrics. The log level
    /// (info, warn, error) is determined by the message type itself.
    fn log(&self);

    /// Create a tracing span with this message's fields as attributes.
    ///
    /// `name` is the span name (e.g. `"scheduler_run"`). The returned span
    /// must be entered by the caller; it is closed when its guard drops.
    fn span(&self, name: &str) -> Span;
}
