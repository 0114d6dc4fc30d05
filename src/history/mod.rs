// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Optional history persistence: a thin external consumer of `TaskResult`s.
//!
//! The scheduler never knows this module exists beyond the `HistorySink`
//! trait object it is handed — it has no opinion on file formats, rotation,
//! or storage backends. `FileHistorySink` is one such consumer, writing the
//! tab-separated line format the demo binary uses.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::scheduler::TaskResult;

/// Receives a notification for every `TaskResult` a run produces.
pub trait HistorySink: Send + Sync {
    fn record(&self, result: &TaskResult, task_count: usize);
}

/// Appends one tab-separated line per task result:
/// `<unix_seconds>\t<task_name>\t<ok|fail>\t<duration_ms>\t<task_count>`.
pub struct FileHistorySink {
    path: PathBuf,
}

impl FileHistorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append_line(&self, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl HistorySink for FileHistorySink {
    fn record(&self, result: &TaskResult, task_count: usize) {
        let unix_seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let line = format!(
            "{}\t{}\t{}\t{}\t{}",
            unix_seconds,
            result.name,
            if result.success { "ok" } else { "fail" },
            result.duration.as_millis(),
            task_count,
        );

        if let Err(err) = self.append_line(&line) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to append history line");
        }
    }
}

/// A sink that discards every record, used when history is not configured.
pub struct NullHistorySink;

impl HistorySink for NullHistorySink {
    fn record(&self, _result: &TaskResult, _task_count: usize) {}
}
