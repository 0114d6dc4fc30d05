// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Crate-level error aggregate for the outward-facing entry points
//! (`run_config`, `plan_config`). Each component keeps its own focused
//! error enum; this just lets a caller match on "what stage failed" without
//! threading every component's error type through its own call site.

use thiserror::Error;

use crate::config::ConfigError;
use crate::scheduler::ScheduleError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scheduling error: {0}")]
    Schedule(#[from] ScheduleError),
}
