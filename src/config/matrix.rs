//! Matrix expansion: pre-expands a templated task into one variant task per
//! point in the Cartesian product of its dimensions, plus a meta task that
//! depends on every variant.
//!
//! Runs once at config-load time, before validation sees the task set, so
//! cycle/reference errors are always reported in terms of concrete variant
//! names rather than the template.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::config::model::{Config, EnvVar, Task};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("task '{0}' has a matrix dimension with no values")]
    EmptyDimension(String),

    #[error("task name '{0}' contains ':', which is reserved for matrix variant naming")]
    ReservedCharacterInName(String),
}

/// Expand every templated task in `config` in place, returning a new config
/// with all `matrix` fields consumed. Idempotent: a config with no `matrix`
/// fields (including one this function already produced) passes through
/// unchanged.
///
/// Checks every user-authored name for the `:` reserved character before any
/// expansion runs, so the check never sees a variant/meta name this function
/// itself produced.
pub fn expand(config: Config) -> Result<Config, MatrixError> {
    for task in &config.tasks {
        if task.name.contains(':') {
            return Err(MatrixError::ReservedCharacterInName(task.name.clone()));
        }
    }

    let mut expanded_tasks = Vec::with_capacity(config.tasks.len());

    for task in config.tasks {
        match &task.matrix {
            None => expanded_tasks.push(task),
            Some(dims) => {
                let variants = expand_task(&task, dims)?;
                let variant_names: Vec<String> =
                    variants.iter().map(|v| v.name.clone()).collect();
                expanded_tasks.extend(variants);
                expanded_tasks.push(meta_task(&task, variant_names));
            }
        }
    }

    Ok(Config {
        tasks: expanded_tasks,
        workflows: config.workflows,
    })
}

fn expand_task(
    template: &Task,
    dims: &BTreeMap<String, Vec<String>>,
) -> Result<Vec<Task>, MatrixError> {
    for (key, values) in dims {
        if values.is_empty() {
            return Err(MatrixError::EmptyDimension(key.clone()));
        }
    }

    let keys: Vec<&String> = dims.keys().collect();
    let mut points: Vec<Vec<(String, String)>> = vec![Vec::new()];

    // Standard nested Cartesian product over keys in sorted order: the last
    // (alphabetically greatest) key varies fastest.
    for key in &keys {
        let values = &dims[*key];
        let mut next = Vec::with_capacity(points.len() * values.len());
        for point in &points {
            for value in values {
                let mut extended = point.clone();
                extended.push(((*key).clone(), value.clone()));
                next.push(extended);
            }
        }
        points = next;
    }

    Ok(points
        .into_iter()
        .map(|point| instantiate_variant(template, &point))
        .collect())
}

fn instantiate_variant(template: &Task, point: &[(String, String)]) -> Task {
    let suffix: String = point
        .iter()
        .map(|(k, v)| format!(":{}={}", k, v))
        .collect();
    let name = format!("{}{}", template.name, suffix);

    let substitute = |s: &str| -> String {
        let mut out = s.to_string();
        for (k, v) in point {
            out = out.replace(&format!("${{matrix.{}}}", k), v);
        }
        out
    };

    Task {
        name,
        cmd: substitute(&template.cmd),
        cwd: template.cwd.as_deref().map(substitute),
        description: template.description.as_deref().map(substitute),
        deps: template.deps.clone(),
        deps_serial: template.deps_serial.clone(),
        env: template
            .env
            .iter()
            .map(|e| EnvVar {
                key: e.key.clone(),
                value: substitute(&e.value),
            })
            .collect(),
        timeout_ms: template.timeout_ms,
        allow_failure: template.allow_failure,
        retry_max: template.retry_max,
        retry_delay_ms: template.retry_delay_ms,
        retry_backoff: template.retry_backoff,
        condition: template.condition.clone(),
        cache: template.cache,
        max_concurrent: template.max_concurrent,
        matrix: None,
    }
}

fn meta_task(template: &Task, variant_names: Vec<String>) -> Task {
    Task {
        name: template.name.clone(),
        cmd: format!("echo '{}: matrix expansion complete'", template.name),
        cwd: None,
        description: template.description.clone(),
        deps: variant_names,
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
