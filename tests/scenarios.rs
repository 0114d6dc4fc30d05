// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! End-to-end scenarios run against real shell children, one per behavior
//! this crate's scheduler is responsible for getting right.

use std::io::Write;
use std::time::{Duration, Instant};

use tempfile::NamedTempFile;

use zr_core::config;
use zr_core::scheduler::{ScheduleError, Scheduler, SchedulerConfig, SkipReason};

fn config_from_toml(toml: &str) -> (NamedTempFile, zr_core::config::Config) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    let cfg = config::load_and_validate(file.path()).unwrap();
    (file, cfg)
}

#[test]
fn diamond_runs_four_tasks_to_completion() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "a"
        cmd = "true"

        [[tasks]]
        name = "b"
        cmd = "true"
        deps = ["a"]

        [[tasks]]
        name = "c"
        cmd = "true"
        deps = ["a"]

        [[tasks]]
        name = "d"
        cmd = "true"
        deps = ["b", "c"]
        "#,
    );

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());

    let plan = scheduler.plan("d").unwrap();
    assert_eq!(
        plan,
        vec![
            vec!["a".to_string()],
            vec!["b".to_string(), "c".to_string()],
            vec!["d".to_string()],
        ]
    );

    let outcome = scheduler.run("d").unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 4);
    assert!(outcome.results.iter().all(|r| r.success));
}

#[test]
fn a_cycle_is_rejected_before_any_child_spawns() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "x"
        cmd = "touch /tmp/zr-cycle-test-should-never-run"
        deps = ["y"]

        [[tasks]]
        name = "y"
        cmd = "true"
        deps = ["x"]
        "#,
    );

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
    assert!(matches!(scheduler.run("x"), Err(ScheduleError::Cycle(_))));
    assert!(matches!(scheduler.plan("x"), Err(ScheduleError::Cycle(_))));
}

#[test]
fn false_condition_skips_the_task_without_running_it() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "t"
        cmd = "exit 1"
        condition = "env.RUN == \"yes\""

        [[tasks.env]]
        key = "RUN"
        value = "no"
        "#,
    );

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
    let outcome = scheduler.run("t").unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 1);
    assert!(outcome.results[0].success);
    assert_eq!(outcome.results[0].skip_reason, Some(SkipReason::ConditionFalse));
}

#[test]
fn a_cached_task_is_skipped_on_the_second_run() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "b"
        cmd = "true"
        cache = true
        "#,
    );

    let cache_root = tempfile::tempdir().unwrap();
    let opts = || SchedulerConfig {
        cache_root: Some(cache_root.path().to_path_buf()),
        ..SchedulerConfig::default()
    };

    let first = Scheduler::new(&cfg, opts()).run("b").unwrap();
    assert!(first.results[0].success);
    assert_eq!(first.results[0].skip_reason, None);

    let second = Scheduler::new(&cfg, opts()).run("b").unwrap();
    assert!(second.results[0].success);
    assert_eq!(second.results[0].skip_reason, Some(SkipReason::CacheHit));
}

#[test]
fn a_failing_task_retries_up_to_the_configured_max() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "f"
        cmd = "exit 1"
        retry_max = 2
        retry_delay_ms = 0
        "#,
    );

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
    let outcome = scheduler.run("f").unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.results[0].attempts, 3);
    assert!(!outcome.results[0].success);
}

#[test]
fn allow_failure_lets_the_run_succeed_overall() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "g"
        cmd = "exit 1"
        allow_failure = true

        [[tasks]]
        name = "h"
        cmd = "true"
        deps = ["g"]
        "#,
    );

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
    let outcome = scheduler.run("h").unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 2);
    let g = outcome.results.iter().find(|r| r.name == "g").unwrap();
    let h = outcome.results.iter().find(|r| r.name == "h").unwrap();
    assert!(!g.success);
    assert!(h.success);
}

#[test]
fn a_slow_task_is_killed_at_its_timeout() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "s"
        cmd = "sleep 60"
        timeout_ms = 100
        "#,
    );

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
    let start = Instant::now();
    let outcome = scheduler.run("s").unwrap();
    let elapsed = start.elapsed();

    assert!(!outcome.success);
    assert!(outcome.results[0].timed_out);
    assert!(elapsed < Duration::from_secs(5), "timeout should fire well before the 60s sleep");
}

#[test]
fn matrix_expansion_produces_alphabetical_variants_and_a_meta_task() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "build"
        cmd = "echo ${matrix.os}-${matrix.arch}"

        [tasks.matrix]
        os = ["linux", "mac"]
        arch = ["x", "y"]
        "#,
    );

    let names: Vec<&str> = cfg.tasks.iter().map(|t| t.name.as_str()).collect();
    for expected in [
        "build:arch=x:os=linux",
        "build:arch=x:os=mac",
        "build:arch=y:os=linux",
        "build:arch=y:os=mac",
        "build",
    ] {
        assert!(names.contains(&expected), "missing variant {expected}, got {names:?}");
    }

    let scheduler = Scheduler::new(&cfg, SchedulerConfig::default());
    let outcome = scheduler.run("build").unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.results.len(), 5);
}

#[test]
fn a_workflow_runs_a_parallel_stage_then_a_sequential_stage() {
    let (_file, cfg) = config_from_toml(
        r#"
        [[tasks]]
        name = "lint"
        cmd = "true"

        [[tasks]]
        name = "unit-tests"
        cmd = "true"

        [[tasks]]
        name = "package"
        cmd = "true"

        [[tasks]]
        name = "publish"
        cmd = "true"

        [workflows.release]

        [[workflows.release.stages]]
        name = "verify"
        tasks = ["lint", "unit-tests"]
        parallel = true

        [[workflows.release.stages]]
        name = "ship"
        tasks = ["package", "publish"]
        parallel = false
        "#,
    );

    let stages = zr_core::workflow::WorkflowRunner::run(&cfg, "release", SchedulerConfig::default()).unwrap();
    assert_eq!(stages.len(), 2);
    assert!(stages.iter().all(|s| s.schedule.as_ref().unwrap().success));
    assert_eq!(stages[0].schedule.as_ref().unwrap().results.len(), 2);
    assert_eq!(stages[1].schedule.as_ref().unwrap().results.len(), 2);
}
