// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Loads a `Config` from a TOML file on disk.
//!
//! This is the one place the core touches the filesystem and a text format;
//! everything past `load_and_validate` operates purely on the in-memory
//! `config::model` types. Matrix expansion runs before validation so that
//! any reported errors name concrete variant tasks, never the template.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::matrix::{self, MatrixError};
use crate::config::model::Config;
use crate::config::validation::{self, ValidationError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config as TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("matrix expansion failed: {0}")]
    Matrix(#[from] MatrixError),

    #[error("configuration validation failed:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<ValidationError>),
}

/// Read and parse a config file, expanding matrix tasks but performing no
/// validation. Prefer [`load_and_validate`] unless the caller has its own
/// validation plan (e.g. the dry-run planner reporting raw parse errors).
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: Config = toml::from_str(&content)?;
    let cfg = matrix::expand(cfg)?;
    Ok(cfg)
}

/// Load a config and validate the resulting (post-matrix-expansion) task
/// graph: unique names, resolvable dependencies, no cycles.
pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load(path)?;
    validation::validate(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}
