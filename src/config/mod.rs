// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod matrix;
mod model;
mod validation;

pub use loader::{load, load_and_validate, ConfigError};
pub use matrix::MatrixError;
pub use model::{Config, EnvVar, Stage, Task, Workflow};
pub use validation::{validate, ValidationError};
