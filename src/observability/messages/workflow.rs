// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for workflow stage lifecycle.

use std::fmt::{Display, Formatter};

use tracing::Span;

use crate::observability::messages::StructuredLog;

pub struct StageStarted<'a> {
    pub workflow: &'a str,
    pub stage: &'a str,
    pub parallel: bool,
}

impl Display for StageStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow '{}' entering stage '{}' ({})",
            self.workflow,
            self.stage,
            if self.parallel { "parallel" } else { "sequential" }
        )
    }
}

impl StructuredLog for StageStarted<'_> {
    fn log(&self) {
        tracing::info!(
            workflow = self.workflow,
            stage = self.stage,
            parallel = self.parallel,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow_stage",
            span_name = name,
            workflow = self.workflow,
            stage = self.stage,
        )
    }
}

pub struct StageSkipped<'a> {
    pub workflow: &'a str,
    pub stage: &'a str,
}

impl Display for StageSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow '{}' skipped stage '{}': condition false",
            self.workflow, self.stage
        )
    }
}

impl StructuredLog for StageSkipped<'_> {
    fn log(&self) {
        tracing::info!(workflow = self.workflow, stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow_stage_skipped",
            span_name = name,
            workflow = self.workflow,
            stage = self.stage,
        )
    }
}

pub struct WorkflowCompleted<'a> {
    pub workflow: &'a str,
    pub success: bool,
}

impl Display for WorkflowCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Workflow '{}' completed ({})",
            self.workflow,
            if self.success { "success" } else { "failure" }
        )
    }
}

impl StructuredLog for WorkflowCompleted<'_> {
    fn log(&self) {
        tracing::info!(workflow = self.workflow, success = self.success, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "workflow_completed",
            span_name = name,
            workflow = self.workflow,
            success = self.success,
        )
    }
}
