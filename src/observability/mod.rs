// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging, tracing, and metrics.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout this crate. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Enable future internationalization without code changes
//! * Maintain Single Responsibility Principle (SRP)
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::scheduler` - level dispatch, task outcomes, run completion
//! * `messages::process` - child-process spawn, timeout, and kill escalation
//! * `messages::cache` - cache hits and cache-unavailable warnings
//! * `messages::retry` - retry attempts and exhaustion
//!
//! # Usage
//!
//! ```rust
//! use zr_core::observability::messages::process::ProcessTimedOut;
//!
//! let msg = ProcessTimedOut {
//!     task: "build",
//!     timeout_ms: 30_000,
//! };
//!
//! tracing::warn!("{}", msg);
//! ```

pub mod messages;
