// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation: task-name uniqueness, dependency reference
//! resolution, and acyclicity.
//!
//! A three-stage pipeline — names, references, acyclicity — that delegates
//! cycle detection to `graph::Graph::levels` instead of a bespoke DFS, since
//! the scheduler already needs that same layering.
//!
//! Rejecting `:` in a task name is `config::matrix`'s job, not this module's
//! — it has to run before expansion so the check sees only user-authored
//! names, never the variant names expansion itself produces.

use std::collections::HashSet;

use thiserror::Error;

use crate::config::model::Config;
use crate::graph::Graph;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("duplicate task name: '{0}'")]
    DuplicateTaskName(String),

    #[error("task '{task}' depends on '{missing}' which does not exist")]
    UnresolvedDependency { task: String, missing: String },

    #[error("cyclic dependency detected among tasks: {}", .0.join(", "))]
    CyclicDependency(Vec<String>),
}

/// Validate `config` for structural integrity: unique names, resolvable
/// `deps`/`deps_serial` references, and an acyclic `deps` graph.
///
/// Must run after matrix expansion (`config::matrix::expand`) so that any
/// errors are reported against concrete variant names, never the template.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_names(config));
    errors.extend(validate_references(config));

    if errors.is_empty() {
        if let Err(cycle) = validate_acyclic(config) {
            errors.push(cycle);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_names(config: &Config) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for task in &config.tasks {
        if !seen.insert(&task.name) {
            errors.push(ValidationError::DuplicateTaskName(task.name.clone()));
        }
    }

    errors
}

fn validate_references(config: &Config) -> Vec<ValidationError> {
    let names: HashSet<&String> = config.tasks.iter().map(|t| &t.name).collect();
    let mut errors = Vec::new();

    for task in &config.tasks {
        for dep in task.deps.iter().chain(task.deps_serial.iter()) {
            if !names.contains(dep) {
                errors.push(ValidationError::UnresolvedDependency {
                    task: task.name.clone(),
                    missing: dep.clone(),
                });
            }
        }
    }

    errors
}

fn validate_acyclic(config: &Config) -> Result<(), ValidationError> {
    let graph = Graph::build(
        config
            .tasks
            .iter()
            .map(|t| (t.name.clone(), t.deps.clone())),
    );
    let needed: HashSet<String> = config.tasks.iter().map(|t| t.name.clone()).collect();

    graph
        .levels(&needed)
        .map(|_| ())
        .map_err(|e| ValidationError::CyclicDependency(e.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Stage, Task, Workflow};
    use std::collections::BTreeMap;

    fn task(name: &str, deps: &[&str]) -> Task {
        Task {
            name: name.to_string(),
            cmd: "true".to_string(),
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
    fn valid_diamond_passes() {
        let cfg = config(vec![
            task("a", &[]),
            task("b", &["a"]),
            task("c", &["a"]),
            task("d", &["b", "c"]),
        ]);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let cfg = config(vec![task("a", &[]), task("a", &[])]);
        let errs = validate(&cfg).unwrap_err();
        assert!(errs
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateTaskName(n) if n == "a")));
    }

    #[test]
    fn unresolved_dependency_is_rejected() {
        let cfg = config(vec![task("a", &["missing"])]);
        let errs = validate(&cfg).unwrap_err();
        assert!(errs.iter().any(|e| matches!(
            e,
            ValidationError::UnresolvedDependency { task, missing }
                if task == "a" && missing == "missing"
        )));
    }

    #[test]
    fn cycle_is_rejected() {
        let cfg = config(vec![task("a", &["b"]), task("b", &["a"])]);
        let errs = validate(&cfg).unwrap_err();
        assert!(errs
            .iter()
            .any(|e| matches!(e, ValidationError::CyclicDependency(_))));
    }

    #[test]
    fn deps_serial_references_are_checked_too() {
        let mut t = task("a", &[]);
        t.deps_serial = vec!["missing".to_string()];
        let cfg = config(vec![t]);
        let errs = validate(&cfg).unwrap_err();
        assert!(errs.iter().any(|e| matches!(
            e,
            ValidationError::UnresolvedDependency { missing, .. } if missing == "missing"
        )));
    }

    #[test]
    fn workflow_stage_references_are_not_validated_here() {
        // Stage -> task references are resolved lazily by the workflow
        // runner, not by this structural pass.
        let mut workflows = BTreeMap::new();
        workflows.insert(
            "ci".to_string(),
            Workflow {
                stages: vec![Stage {
                    name: "build".to_string(),
                    tasks: vec!["does-not-exist".to_string()],
                    parallel: true,
                    fail_fast: true,
                    condition: None,
                }],
            },
        );
        let cfg = Config {
            tasks: vec![task("a", &[])],
            workflows,
        };
        assert!(validate(&cfg).is_ok());
    }
}
