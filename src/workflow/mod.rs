// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow runner: pure composition over `Scheduler`. A workflow is an
//! ordered sequence of stages, each either a parallel fan-out (modeled as a
//! synthetic root task the real `Scheduler` dispatches normally) or a
//! sequential chain of individual `Scheduler::run` calls.
//!
//! This module never touches a child process, a cache marker, or a
//! semaphore directly — everything here is config plumbing and result
//! aggregation over the one `Scheduler` instance it owns.

use std::time::Duration;

use crate::condition;
use crate::config::{Config, Task};
use crate::observability::messages::{
    workflow::{StageSkipped, StageStarted, WorkflowCompleted},
    StructuredLog,
};
use crate::scheduler::{ScheduleError, ScheduleResult, Scheduler, SchedulerConfig};

/// The outcome of one stage: either skipped outright (its `condition`
/// evaluated false) or the aggregated schedule of every task it ran.
#[derive(Debug)]
pub struct StageResult {
    pub stage: String,
    pub skipped: bool,
    pub schedule: Option<ScheduleResult>,
}

pub struct WorkflowRunner;

impl WorkflowRunner {
    pub fn run(
        config: &Config,
        workflow_name: &str,
        opts: SchedulerConfig,
    ) -> Result<Vec<StageResult>, ScheduleError> {
        let workflow = config
            .workflow(workflow_name)
            .ok_or_else(|| ScheduleError::WorkflowNotFound(workflow_name.to_string()))?;

        let mut augmented = config.clone();
        let mut synthetic_roots = Vec::with_capacity(workflow.stages.len());

        for (index, stage) in workflow.stages.iter().enumerate() {
            if stage.parallel {
                let root_name = synthetic_root_name(workflow_name, index, &stage.name);
                augmented.tasks.push(synthetic_root_task(root_name.clone(), &stage.tasks));
                synthetic_roots.push(Some(root_name));
            } else {
                synthetic_roots.push(None);
            }
        }

        let scheduler = Scheduler::new(&augmented, opts);
        let mut results = Vec::with_capacity(workflow.stages.len());
        let mut overall_success = true;

        for (index, stage) in workflow.stages.iter().enumerate() {
            if let Some(expr) = &stage.condition {
                if !condition::evaluate(expr, &[]) {
                    StageSkipped {
                        workflow: workflow_name,
                        stage: &stage.name,
                    }
                    .log();
                    results.push(StageResult {
                        stage: stage.name.clone(),
                        skipped: true,
                        schedule: None,
                    });
                    continue;
                }
            }

            StageStarted {
                workflow: workflow_name,
                stage: &stage.name,
                parallel: stage.parallel,
            }
            .log();

            let schedule = if stage.parallel {
                let root = synthetic_roots[index]
                    .as_deref()
                    .expect("parallel stage has a synthetic root");
                scheduler.run(root)?
            } else {
                run_sequential(&scheduler, &stage.tasks, stage.fail_fast)?
            };

            let stage_failed = !schedule.success;
            overall_success &= schedule.success;
            results.push(StageResult {
                stage: stage.name.clone(),
                skipped: false,
                schedule: Some(schedule),
            });

            if stage_failed && stage.fail_fast {
                break;
            }
        }

        WorkflowCompleted {
            workflow: workflow_name,
            success: overall_success,
        }
        .log();

        Ok(results)
    }
}

/// Run every task in `names` through `scheduler.run` in order, aggregating
/// the individual `ScheduleResult`s into one. Stops early if `fail_fast` and
/// a task's run did not succeed.
fn run_sequential(
    scheduler: &Scheduler,
    names: &[String],
    fail_fast: bool,
) -> Result<ScheduleResult, ScheduleError> {
    let mut combined = ScheduleResult {
        results: Vec::new(),
        success: true,
        elapsed: Duration::ZERO,
    };

    for name in names {
        let schedule = scheduler.run(name)?;
        combined.elapsed += schedule.elapsed;
        combined.success &= schedule.success;
        let task_failed = !schedule.success;
        combined.results.extend(schedule.results);

        if task_failed && fail_fast {
            break;
        }
    }

    Ok(combined)
}

fn synthetic_root_name(workflow_name: &str, index: usize, stage_name: &str) -> String {
    format!("__workflow__{workflow_name}__{index}__{stage_name}")
}

/// A zero-cost in-memory task that exists only to give the real `Scheduler`
/// a root whose `deps` are a parallel stage's task list. Never touches the
/// caller's `Config` on disk or otherwise escapes this module's augmented
/// copy.
fn synthetic_root_task(name: String, deps: &[String]) -> Task {
    Task {
        name,
        cmd: "true".to_string(),
        cwd: None,
        description: None,
        deps: deps.to_vec(),
        deps_serial: Vec::new(),
        env: Vec::new(),
        timeout_ms: 0,
        allow_failure: false,
        retry_max: 0,
        retry_delay_ms: 0,
        retry_backoff: false,
        condition: None,
        cache: false,
        max_concurrent: None,
        matrix: None,
    }
}
