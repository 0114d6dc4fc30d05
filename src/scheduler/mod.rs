// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The orchestration core: collects a task's transitive dependencies,
//! layers them into levels via the graph engine, and runs each level with a
//! bounded OS-thread worker pool.

pub mod result;
pub mod semaphore;

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::cache::Cache;
use crate::condition;
use crate::config::{Config, Task};
use crate::control::ControlHandle;
use crate::graph::{Graph, Level};
use crate::observability::messages::{
    cache::CacheHit,
    scheduler::{CycleDetected, LevelDispatched, RunCompleted, RunStarted, TaskFinished},
    StructuredLog,
};
use crate::process::{self, ProcSpec};
use crate::retry;

pub use result::{DryRunPlan, ScheduleResult, SkipReason, TaskResult};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("task not found: '{0}'")]
    TaskNotFound(String),

    #[error("cyclic dependency detected among tasks: {}", .0.join(", "))]
    Cycle(Vec<String>),

    #[error("serial dependency cycle detected at '{0}'")]
    SerialCycle(String),

    #[error("workflow not found: '{0}'")]
    WorkflowNotFound(String),

    #[error("out of memory")]
    OutOfMemory,
}

/// Run-wide options controlling concurrency, dry-run mode, and the
/// thread-pool/process model this crate uses to execute a task graph.
pub struct SchedulerConfig {
    pub max_jobs: usize,
    pub dry_run: bool,
    pub inherit_stdio: bool,
    pub control: ControlHandle,
    pub cache_root: Option<PathBuf>,
    pub shell: String,
    pub memory_limit_bytes: Option<u64>,
    /// Notified once per `TaskResult` after a run completes. The scheduler
    /// never inspects this beyond the trait object — file format, rotation,
    /// and storage are entirely the sink's business.
    pub history: Option<Box<dyn crate::history::HistorySink>>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_jobs: thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            dry_run: false,
            inherit_stdio: true,
            control: ControlHandle::new(),
            cache_root: None,
            shell: "sh".to_string(),
            memory_limit_bytes: None,
            history: None,
        }
    }
}

enum SerialState {
    Visiting,
    Done(bool),
}

pub struct Scheduler {
    config: Config,
    graph: Graph,
    cache: Cache,
    opts: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: &Config, opts: SchedulerConfig) -> Self {
        let graph = Graph::build(config.tasks.iter().map(|t| (t.name.clone(), t.deps.clone())));
        let cache_root = opts
            .cache_root
            .clone()
            .unwrap_or_else(Cache::default_root);

        Self {
            config: config.clone(),
            graph,
            cache: Cache::new(cache_root),
            opts,
        }
    }

    /// Compute the layered execution order for `root` without running
    /// anything. Shares the needed-set/levels code path with `run` so the
    /// two can never drift apart.
    pub fn plan(&self, root: &str) -> Result<DryRunPlan, ScheduleError> {
        let (_, levels) = self.needed_and_levels(root)?;
        Ok(levels)
    }

    pub fn run(&self, root: &str) -> Result<ScheduleResult, ScheduleError> {
        let start = Instant::now();
        let (needed, levels) = self.needed_and_levels(root)?;

        RunStarted {
            root,
            task_count: needed.len(),
        }
        .log();

        let results: Mutex<Vec<TaskResult>> = Mutex::new(Vec::with_capacity(needed.len()));
        let failed = AtomicBool::new(false);
        let global_sem = semaphore::Semaphore::new(self.opts.max_jobs);
        let mut per_task_sems: HashMap<String, Arc<semaphore::Semaphore>> = HashMap::new();
        let mut serial_state: HashMap<String, SerialState> = HashMap::new();

        let mut upstream_skip = false;

        for (index, level) in levels.iter().enumerate() {
            if upstream_skip {
                let mut guard = results.lock().unwrap();
                for name in level {
                    guard.push(TaskResult::skipped(name.clone(), SkipReason::UpstreamFailure));
                }
                continue;
            }

            LevelDispatched {
                level_index: index,
                tasks: level,
            }
            .log();

            let chain_ok = self.run_level_serial_chains(
                level,
                &mut serial_state,
                &results,
                &failed,
                &global_sem,
            )?;

            let results_ref = &results;
            let failed_ref = &failed;

            thread::scope(|scope| {
                for name in level {
                    let task = self.config.task(name).expect("validated by needed_set");
                    if !chain_ok[name] {
                        let result = TaskResult {
                            name: name.clone(),
                            success: task.allow_failure,
                            skip_reason: Some(SkipReason::UpstreamFailure),
                            exit_code: None,
                            duration: Duration::ZERO,
                            attempts: 0,
                            allow_failure: task.allow_failure,
                            timed_out: false,
                            cancelled: false,
                        };
                        if result.taints_run() {
                            failed.store(true, Ordering::Release);
                        }
                        results.lock().unwrap().push(result);
                        continue;
                    }

                    let global_sem = Arc::clone(&global_sem);
                    let per_task_sem = task.max_concurrent.map(|limit| {
                        Arc::clone(
                            per_task_sems
                                .entry(semaphore_key(name).to_string())
                                .or_insert_with(|| semaphore::Semaphore::new(limit)),
                        )
                    });

                    scope.spawn(move || {
                        let _global_permit = global_sem.acquire();
                        let _task_permit = per_task_sem.as_ref().map(|s| s.acquire());

                        let result = self.execute_task(task);
                        TaskFinished {
                            task: &result.name,
                            success: result.success,
                            duration: result.duration,
                        }
                        .log();
                        if result.taints_run() {
                            failed_ref.store(true, Ordering::Release);
                        }
                        results_ref.lock().unwrap().push(result);
                    });
                }
            });

            if failed.load(Ordering::Acquire) {
                upstream_skip = true;
            }
        }

        let results = results.into_inner().unwrap();
        let success = !failed.load(Ordering::Acquire);
        let elapsed = start.elapsed();

        if let Some(sink) = &self.opts.history {
            for result in &results {
                sink.record(result, needed.len());
            }
        }

        RunCompleted {
            root,
            success,
            duration: elapsed,
        }
        .log();

        Ok(ScheduleResult {
            results,
            success,
            elapsed,
        })
    }

    fn needed_and_levels(&self, root: &str) -> Result<(HashSet<String>, Vec<Level>), ScheduleError> {
        let needed = self.needed_set(root)?;
        let levels = self.graph.levels(&needed).map_err(|e| {
            CycleDetected { cycle: &e.0 }.log();
            ScheduleError::Cycle(e.0)
        })?;
        Ok((needed, levels))
    }

    fn needed_set(&self, root: &str) -> Result<HashSet<String>, ScheduleError> {
        let mut needed = HashSet::new();
        let mut stack = vec![root.to_string()];

        while let Some(name) = stack.pop() {
            if !needed.insert(name.clone()) {
                continue;
            }
            let task = self
                .config
                .task(&name)
                .ok_or_else(|| ScheduleError::TaskNotFound(name.clone()))?;
            stack.extend(task.deps.iter().cloned());
        }

        Ok(needed)
    }

    /// Run every task-in-level's `deps_serial` chain inline, before that
    /// level's parallel workers are spawned. Returns whether each task's
    /// own chain succeeded (and so the task itself is eligible to run).
    fn run_level_serial_chains(
        &self,
        level: &[String],
        serial_state: &mut HashMap<String, SerialState>,
        results: &Mutex<Vec<TaskResult>>,
        failed: &AtomicBool,
        global_sem: &Arc<semaphore::Semaphore>,
    ) -> Result<HashMap<String, bool>, ScheduleError> {
        let mut chain_ok = HashMap::new();

        for name in level {
            let task = self
                .config
                .task(name)
                .ok_or_else(|| ScheduleError::TaskNotFound(name.clone()))?;

            let mut ok = true;
            for dep in &task.deps_serial {
                let dep_ok =
                    self.ensure_serial_dep_done(dep, serial_state, results, failed, global_sem)?;
                ok &= dep_ok;
            }
            chain_ok.insert(name.clone(), ok);
        }

        Ok(chain_ok)
    }

    fn ensure_serial_dep_done(
        &self,
        name: &str,
        serial_state: &mut HashMap<String, SerialState>,
        results: &Mutex<Vec<TaskResult>>,
        failed: &AtomicBool,
        global_sem: &Arc<semaphore::Semaphore>,
    ) -> Result<bool, ScheduleError> {
        match serial_state.get(name) {
            Some(SerialState::Done(success)) => return Ok(*success),
            Some(SerialState::Visiting) => return Err(ScheduleError::SerialCycle(name.to_string())),
            None => {}
        }

        serial_state.insert(name.to_string(), SerialState::Visiting);

        let task = self
            .config
            .task(name)
            .ok_or_else(|| ScheduleError::TaskNotFound(name.to_string()))?;

        let mut chain_ok = true;
        for dep in &task.deps_serial {
            let ok = self.ensure_serial_dep_done(dep, serial_state, results, failed, global_sem)?;
            chain_ok &= ok;
        }

        let success = if chain_ok {
            let _permit = global_sem.acquire();
            let result = self.execute_task(task);
            let ok = result.success || result.allow_failure;
            if result.taints_run() {
                failed.store(true, Ordering::Release);
            }
            results.lock().unwrap().push(result);
            ok
        } else {
            let result = TaskResult {
                name: name.to_string(),
                success: task.allow_failure,
                skip_reason: Some(SkipReason::UpstreamFailure),
                exit_code: None,
                duration: Duration::ZERO,
                attempts: 0,
                allow_failure: task.allow_failure,
                timed_out: false,
                cancelled: false,
            };
            if result.taints_run() {
                failed.store(true, Ordering::Release);
            }
            results.lock().unwrap().push(result);
            task.allow_failure
        };

        serial_state.insert(name.to_string(), SerialState::Done(success));
        Ok(success)
    }

    /// Evaluate condition/cache, then retry+spawn a single task. Shared by
    /// both parallel level-workers and inline serial-chain execution.
    fn execute_task(&self, task: &Task) -> TaskResult {
        let start = Instant::now();
        let env_pairs: Vec<(&str, &str)> = task.env_pairs().collect();

        let condition_expr = task.condition.as_deref().unwrap_or("true");
        if !condition::evaluate(condition_expr, &env_pairs) {
            return TaskResult::skipped(task.name.clone(), SkipReason::ConditionFalse);
        }

        let cache_key = task.cache.then(|| crate::cache::key(&task.cmd, &env_pairs));
        if let Some(key) = &cache_key {
            if self.cache.hit(key) {
                CacheHit {
                    task: &task.name,
                    key,
                }
                .log();
                return TaskResult::skipped(task.name.clone(), SkipReason::CacheHit);
            }
        }

        if self.opts.dry_run {
            return TaskResult::skipped(task.name.clone(), SkipReason::DryRun);
        }

        let spec = ProcSpec {
            cmd: &task.cmd,
            cwd: task.cwd.as_deref(),
            env: &env_pairs,
            timeout_ms: task.timeout_ms,
            shell: &self.opts.shell,
            inherit_stdio: self.opts.inherit_stdio,
            memory_limit_bytes: self.opts.memory_limit_bytes,
        };

        let outcome = retry::run(
            task.retry_max,
            task.retry_delay_ms,
            task.retry_backoff,
            &self.opts.control,
            || process::run(&spec, &self.opts.control),
            |r| matches!(r, Ok(proc) if proc.success),
        );

        let (exit_code, success, timed_out, cancelled) = match &outcome.result {
            Ok(proc) => (proc.exit_code, proc.success, proc.timed_out, proc.cancelled),
            Err(_) => (None, false, false, false),
        };

        if success {
            if let Some(key) = &cache_key {
                let _ = self.cache.mark(key);
            }
        }

        TaskResult {
            name: task.name.clone(),
            success,
            skip_reason: None,
            exit_code,
            duration: start.elapsed(),
            attempts: outcome.attempts,
            allow_failure: task.allow_failure,
            timed_out,
            cancelled,
        }
    }
}

fn semaphore_key(task_name: &str) -> &str {
    task_name.split(':').next().unwrap_or(task_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn task(name: &str, cmd: &str, deps: &[&str]) -> Task {
        Task {
            name: name.to_string(),
            cmd: cmd.to_string(),
            cwd: None,
            description: None,
            deps: deps.iter().map(|s| s.to_string()).collect(),
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

    fn config(tasks: Vec<Task>) -> Config {
        Config {
            tasks,
            workflows: BTreeMap::new(),
        }
    }

    #[test]
    fn runs_a_diamond_to_completion() {
        let cfg = config(vec![
            task("a", "true", &[]),
            task("b", "true", &["a"]),
            task("c", "true", &["a"]),
            task("d", "true", &["b", "c"]),
        ]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        let outcome = scheduler.run("d").unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.results.len(), 4);
    }

    #[test]
    fn a_failing_task_taints_the_run_and_skips_dependents() {
        let cfg = config(vec![
            task("a", "exit 1", &[]),
            task("b", "true", &["a"]),
        ]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        let outcome = scheduler.run("b").unwrap();
        assert!(!outcome.success);
        let b = outcome.results.iter().find(|r| r.name == "b").unwrap();
        assert_eq!(b.skip_reason, Some(SkipReason::UpstreamFailure));
    }

    #[test]
    fn allow_failure_does_not_taint_the_run() {
        let mut a = task("a", "exit 1", &[]);
        a.allow_failure = true;
        let cfg = config(vec![a, task("b", "true", &["a"])]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        let outcome = scheduler.run("b").unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn missing_root_is_task_not_found() {
        let cfg = config(vec![task("a", "true", &[])]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        assert!(matches!(
            scheduler.run("missing"),
            Err(ScheduleError::TaskNotFound(_))
        ));
    }

    #[test]
    fn cyclic_graph_is_rejected_before_any_work() {
        let cfg = config(vec![
            task("a", "true", &["b"]),
            task("b", "true", &["a"]),
        ]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        assert!(matches!(scheduler.run("a"), Err(ScheduleError::Cycle(_))));
    }

    #[test]
    fn plan_matches_run_levels() {
        let cfg = config(vec![
            task("a", "true", &[]),
            task("b", "true", &["a"]),
        ]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        let plan = scheduler.plan("b").unwrap();
        assert_eq!(plan, vec![vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn dry_run_skips_every_task_without_spawning() {
        let cfg = config(vec![task("a", "exit 1", &[])]);
        let mut opts = SchedulerConfig::default();
        opts.dry_run = true;
        let scheduler = Scheduler::new(&cfg, opts);
        let outcome = scheduler.run("a").unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.results[0].skip_reason, Some(SkipReason::DryRun));
    }

    #[test]
    fn false_condition_skips_a_task() {
        let mut a = task("a", "exit 1", &[]);
        a.condition = Some("false".to_string());
        let cfg = config(vec![a]);
        let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
        let outcome = scheduler.run("a").unwrap();
        assert!(outcome.success);
        assert_eq!(
            outcome.results[0].skip_reason,
            Some(SkipReason::ConditionFalse)
        );
    }
}
