//! Dependency graph engine: builds a DAG from `deps` edges and computes a
//! layered topological order ("execution levels") for maximum parallelism.
//!
//! Only `deps` edges participate in this graph — `deps_serial` chains are
//! run inline by the scheduler and never appear here (see `scheduler::serial`).

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

/// A task could not be scheduled because its `deps` form a cycle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cyclic dependency detected among tasks: {}", .0.join(", "))]
pub struct CycleError(pub Vec<String>);

/// One execution level: a maximal antichain of the DAG in topological order.
/// Tasks within a level are mutually independent and safe to run in parallel.
pub type Level = Vec<String>;

/// Forward adjacency dependency graph: `task -> [tasks that depend on it]`.
///
/// This orientation (`u -> [dependents of u]`) keeps `levels()` a single
/// forward Kahn's-algorithm pass with no reversal step.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// task name -> names of tasks that list it in `deps`
    dependents: HashMap<String, Vec<String>>,
    /// task name -> names it depends on (the reverse of `dependents`)
    dependencies: HashMap<String, Vec<String>>,
}

impl Graph {
    /// Build the DAG from `(task_name, deps)` pairs. Every task in the config
    /// must appear as a key, even with an empty `deps` list, so that isolated
    /// tasks are still valid entry points.
    pub fn build<I, D>(tasks: I) -> Self
    where
        I: IntoIterator<Item = (String, D)>,
        D: IntoIterator<Item = String>,
    {
        let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();

        for (name, deps) in tasks {
            dependents.entry(name.clone()).or_default();
            let entry = dependencies.entry(name.clone()).or_default();
            for dep in deps {
                entry.push(dep.clone());
                dependents.entry(dep).or_default().push(name.clone());
            }
        }

        Self {
            dependents,
            dependencies,
        }
    }

    /// Compute the layered topological order of `needed` (the transitive
    /// closure of `deps` from the requested root(s)). Level 0 holds every
    /// needed task with no unresolved dependency; level N holds those whose
    /// dependencies all lie in levels `< N`.
    ///
    /// Uses Kahn's algorithm restricted to `needed`: in-degree is counted
    /// only over dependencies that are themselves in `needed`, since tasks
    /// outside the needed set are by contract unreachable from the root.
    pub fn levels(&self, needed: &HashSet<String>) -> Result<Vec<Level>, CycleError> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        for name in needed {
            let count = self
                .dependencies
                .get(name)
                .map(|deps| deps.iter().filter(|d| needed.contains(*d)).count())
                .unwrap_or(0);
            in_degree.insert(name.as_str(), count);
        }

        let mut queue: VecDeque<String> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(name, _)| name.to_string())
            .collect();
        // Deterministic ordering within a level: sort by name.
        let mut initial: Vec<String> = queue.drain(..).collect();
        initial.sort();
        queue.extend(initial);

        let mut levels = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        while !queue.is_empty() {
            let mut level: Vec<String> = queue.drain(..).collect();
            level.sort();
            for name in &level {
                processed.insert(name.clone());
            }

            let mut next: HashSet<String> = HashSet::new();
            for name in &level {
                if let Some(dependents) = self.dependents.get(name) {
                    for dependent in dependents {
                        if !needed.contains(dependent) || processed.contains(dependent) {
                            continue;
                        }
                        if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                            *count -= 1;
                            if *count == 0 {
                                next.insert(dependent.clone());
                            }
                        }
                    }
                }
            }

            levels.push(level);
            queue.extend(next);
        }

        if processed.len() != needed.len() {
            let mut remaining: Vec<String> =
                needed.difference(&processed).cloned().collect();
            remaining.sort();
            return Err(CycleError(remaining));
        }

        Ok(levels)
    }

    /// Names this task depends on via `deps` (not `deps_serial`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.dependencies
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}
