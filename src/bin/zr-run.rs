// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::process::ExitCode;

use zr_core::history::FileHistorySink;
use zr_core::scheduler::SkipReason;
use zr_core::workflow::WorkflowRunner;
use zr_core::{config, SchedulerConfig, Scheduler};

fn usage(program: &str) -> String {
    format!(
        "Usage: {program} <config.toml> <root-task> [--dry-run] [--history <path>]\n       {program} <config.toml> --workflow <name> [--history <path>]"
    )
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("{}", usage(&args[0]));
        return ExitCode::FAILURE;
    }

    let config_path = &args[1];
    let mut dry_run = false;
    let mut history_path: Option<String> = None;
    let mut workflow_name: Option<String> = None;
    let mut root: Option<String> = None;

    let mut rest = args[2..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--dry-run" => dry_run = true,
            "--history" => history_path = rest.next().cloned(),
            "--workflow" => workflow_name = rest.next().cloned(),
            other if root.is_none() && workflow_name.is_none() => root = Some(other.to_string()),
            other => {
                eprintln!("unrecognized argument: {other}");
                eprintln!("{}", usage(&args[0]));
                return ExitCode::FAILURE;
            }
        }
    }

    let cfg = match config::load_and_validate(config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load '{config_path}': {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut opts = SchedulerConfig {
        dry_run,
        ..SchedulerConfig::default()
    };
    if let Some(path) = history_path {
        opts.history = Some(Box::new(FileHistorySink::new(path)));
    }

    if let Some(workflow_name) = workflow_name {
        match WorkflowRunner::run(&cfg, &workflow_name, opts) {
            Ok(stages) => {
                let success = stages.iter().all(|s| {
                    s.skipped || s.schedule.as_ref().map(|r| r.success).unwrap_or(false)
                });
                report_stages(&stages);
                exit_for(success, None)
            }
            Err(err) => {
                eprintln!("workflow '{workflow_name}' failed: {err}");
                ExitCode::FAILURE
            }
        }
    } else {
        let root = match root {
            Some(root) => root,
            None => {
                eprintln!("{}", usage(&args[0]));
                return ExitCode::FAILURE;
            }
        };

        let scheduler = Scheduler::new(&cfg, opts);
        match scheduler.run(&root) {
            Ok(result) => {
                let first_failure_code = result
                    .results
                    .iter()
                    .find(|r| !r.success)
                    .and_then(|r| r.exit_code);
                report_results(&result.results);
                exit_for(result.success, first_failure_code)
            }
            Err(err) => {
                eprintln!("run failed: {err}");
                ExitCode::FAILURE
            }
        }
    }
}

fn report_results(results: &[zr_core::scheduler::TaskResult]) {
    for result in results {
        let status = match (&result.skip_reason, result.success) {
            (Some(SkipReason::ConditionFalse), _) => "skip (condition)".to_string(),
            (Some(SkipReason::CacheHit), _) => "skip (cached)".to_string(),
            (Some(SkipReason::DryRun), _) => "skip (dry-run)".to_string(),
            (Some(SkipReason::UpstreamFailure), _) => "skip (upstream failure)".to_string(),
            (None, true) => "ok".to_string(),
            (None, false) => "fail".to_string(),
        };
        println!(
            "{:<32} {:<22} {:>5} attempt(s)  {:?}",
            result.name, status, result.attempts, result.duration
        );
    }
}

fn report_stages(stages: &[zr_core::StageResult]) {
    for stage in stages {
        if stage.skipped {
            println!("stage {:<24} skipped (condition)", stage.stage);
            continue;
        }
        if let Some(schedule) = &stage.schedule {
            println!(
                "stage {:<24} {}",
                stage.stage,
                if schedule.success { "ok" } else { "fail" }
            );
            report_results(&schedule.results);
        }
    }
}

fn exit_for(success: bool, first_failure_code: Option<i32>) -> ExitCode {
    if success {
        return ExitCode::SUCCESS;
    }
    match first_failure_code {
        Some(code) if (0..=255).contains(&code) => ExitCode::from(code as u8),
        _ => ExitCode::FAILURE,
    }
}
