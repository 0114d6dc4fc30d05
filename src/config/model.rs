//! In-memory configuration model: the data the core consumes.
//!
//! These types are deliberately plain data — no behavior beyond what serde
//! needs to deserialize them and the small accessor helpers below. Graph
//! construction, validation, and matrix expansion live in sibling modules so
//! that `Config` itself stays a dumb, easily-testable record.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A single `(key, value)` environment override, kept as a struct (rather
/// than a bare tuple) so TOML's array-of-tables syntax reads naturally:
///
/// ```toml
/// [[tasks.env]]
/// key = "RUST_LOG"
/// value = "debug"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// The atomic unit of work: a shell command plus scheduling metadata.
///
/// Every optional field defaults to the value that makes the task behave as
/// if the field were absent — a bare `name`+`cmd` pair is a complete, valid
/// task.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub name: String,
    pub cmd: String,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deps: Vec<String>,
    #[serde(default)]
    pub deps_serial: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub timeout_ms: u64,
    #[serde(default)]
    pub allow_failure: bool,
    #[serde(default)]
    pub retry_max: u32,
    #[serde(default)]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub retry_backoff: bool,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub cache: bool,
    #[serde(default)]
    pub max_concurrent: Option<usize>,
    /// Matrix dimensions, keyed by name. `BTreeMap` rather than `HashMap` so
    /// iteration is already alphabetical by key, which gives deterministic
    /// variant naming during matrix expansion.
    #[serde(default)]
    pub matrix: Option<BTreeMap<String, Vec<String>>>,
}

impl Task {
    /// `true` if `timeout_ms == 0`, meaning no limit.
    pub fn has_no_timeout(&self) -> bool {
        self.timeout_ms == 0
    }

    /// Task-local environment overrides as key/value pairs in stored order.
    pub fn env_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env.iter().map(|e| (e.key.as_str(), e.value.as_str()))
    }
}

/// A named stage within a `Workflow`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stage {
    pub name: String,
    pub tasks: Vec<String>,
    #[serde(default = "default_true")]
    pub parallel: bool,
    #[serde(default = "default_true")]
    pub fail_fast: bool,
    #[serde(default)]
    pub condition: Option<String>,
}

fn default_true() -> bool {
    true
}

/// An ordered sequence of stages, composed over the Scheduler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Workflow {
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// The fully materialized configuration: every task (including matrix
/// variants and meta tasks, once expanded) plus named workflows.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub workflows: BTreeMap<String, Workflow>,
}

impl Config {
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.get(name)
    }
}
