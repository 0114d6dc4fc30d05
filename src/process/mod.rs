// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Blocking child-process execution: `sh -c <cmd>` with timeout enforcement,
//! terminate-then-kill escalation, and control-handle cooperation.
//!
//! There is no async runtime anywhere in this crate — tasks run on plain
//! OS-thread workers, not cooperative tasks, so spawning and waiting happen
//! synchronously on the calling worker thread. A dedicated supervisor thread
//! watches the running child on the side (see `process::supervisor`).

pub mod resource;
pub mod supervisor;

use std::collections::HashMap;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::control::ControlHandle;
use crate::observability::messages::{process::ResourceLimitUnavailable, StructuredLog};
pub use resource::ResourceError;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn '{cmd}': {source}")]
    SpawnFailed {
        cmd: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of running one child process to completion (or until it was
/// stopped by timeout/cancellation).
#[derive(Debug, Clone)]
pub struct ProcResult {
    pub exit_code: Option<i32>,
    pub success: bool,
    pub timed_out: bool,
    pub cancelled: bool,
    pub duration: Duration,
    /// Captured output, populated only when `ProcSpec::inherit_stdio` is
    /// `false`. Empty (not missing) when stdio was inherited.
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// How to run a single command.
pub struct ProcSpec<'a> {
    pub cmd: &'a str,
    pub cwd: Option<&'a str>,
    pub env: &'a [(&'a str, &'a str)],
    /// `0` means no timeout.
    pub timeout_ms: u64,
    pub shell: &'a str,
    /// `true` routes the child's stdout/stderr straight to this process's
    /// own (production use); `false` pipes and drains them into
    /// `ProcResult::stdout`/`stderr` (tests, live-log multiplexing). A
    /// caller that multiplexes output must not set this to `true`.
    pub inherit_stdio: bool,
    /// Address-space limit applied to the child where the platform
    /// supports it, with a soft polling-monitor fallback otherwise. `None`
    /// means unbounded.
    pub memory_limit_bytes: Option<u64>,
}

impl<'a> Default for ProcSpec<'a> {
    fn default() -> Self {
        Self {
            cmd: "",
            cwd: None,
            env: &[],
            timeout_ms: 0,
            shell: "sh",
            inherit_stdio: true,
            memory_limit_bytes: None,
        }
    }
}

/// Run `spec.cmd` to completion, honoring `control` for cancellation and
/// `spec.timeout_ms` for a hard deadline. Blocks the calling thread.
pub fn run(spec: &ProcSpec, control: &ControlHandle) -> Result<ProcResult, ProcessError> {
    let start = Instant::now();

    if control.is_cancelled() {
        return Ok(ProcResult {
            exit_code: None,
            success: false,
            timed_out: false,
            cancelled: true,
            duration: start.elapsed(),
            stdout: Vec::new(),
            stderr: Vec::new(),
        });
    }

    let mut command = Command::new(spec.shell);
    command.arg("-c").arg(spec.cmd);
    command.stdin(Stdio::null());

    if spec.inherit_stdio {
        command.stdout(Stdio::inherit());
        command.stderr(Stdio::inherit());
    } else {
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
    }

    if let Some(cwd) = spec.cwd {
        command.current_dir(cwd);
    }

    // Merge onto a fresh environment map built from the spec, never mutating
    // the parent process's actual environment.
    let merged: HashMap<&str, &str> = spec.env.iter().copied().collect();
    command.env_clear();
    command.envs(std::env::vars().filter(|(k, _)| !merged.contains_key(k.as_str())));
    command.envs(merged);

    let mut child = command.spawn().map_err(|source| ProcessError::SpawnFailed {
        cmd: spec.cmd.to_string(),
        source,
    })?;

    // Pipes must be drained on a side thread: the child can block on a full
    // pipe buffer while the supervisor is still polling for its exit.
    let stdout_drain = child.stdout.take().map(spawn_drain);
    let stderr_drain = child.stderr.take().map(spawn_drain);

    if let Some(limit) = spec.memory_limit_bytes {
        if let Err(ResourceError::LimitUnavailable(reason)) =
            resource::apply_memory_limit(&child, limit)
        {
            ResourceLimitUnavailable {
                task: spec.cmd,
                reason: &reason,
            }
            .log();
            resource::spawn_soft_monitor(child.id(), limit);
        }
    }

    let outcome = supervisor::supervise(
        &mut child,
        control,
        if spec.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(spec.timeout_ms))
        },
    );

    let stdout = stdout_drain.map(|h| h.join().unwrap_or_default()).unwrap_or_default();
    let stderr = stderr_drain.map(|h| h.join().unwrap_or_default()).unwrap_or_default();

    Ok(ProcResult {
        exit_code: outcome.exit_code,
        success: outcome.exit_code == Some(0),
        timed_out: outcome.timed_out,
        cancelled: outcome.cancelled,
        duration: start.elapsed(),
        stdout,
        stderr,
    })
}

fn spawn_drain<R>(mut reader: R) -> thread::JoinHandle<Vec<u8>>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        buf
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_command_reports_success() {
        let spec = ProcSpec {
            cmd: "true",
            ..Default::default()
        };
        let result = run(&spec, &ControlHandle::new()).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(!result.timed_out);
        assert!(!result.cancelled);
    }

    #[test]
    fn failing_command_reports_failure_exit_code() {
        let spec = ProcSpec {
            cmd: "exit 7",
            ..Default::default()
        };
        let result = run(&spec, &ControlHandle::new()).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(7));
    }

    #[test]
    fn timeout_kills_a_long_running_command() {
        let spec = ProcSpec {
            cmd: "sleep 5",
            timeout_ms: 100,
            ..Default::default()
        };
        let result = run(&spec, &ControlHandle::new()).unwrap();
        assert!(result.timed_out);
        assert!(!result.success);
        assert!(result.duration < Duration::from_secs(5));
    }

    #[test]
    fn piped_stdio_is_drained_into_the_result() {
        let spec = ProcSpec {
            cmd: "echo hello; echo world >&2",
            inherit_stdio: false,
            ..Default::default()
        };
        let result = run(&spec, &ControlHandle::new()).unwrap();
        assert!(result.success);
        assert_eq!(String::from_utf8_lossy(&result.stdout).trim(), "hello");
        assert_eq!(String::from_utf8_lossy(&result.stderr).trim(), "world");
    }

    #[test]
    fn inherited_stdio_leaves_the_result_buffers_empty() {
        let spec = ProcSpec {
            cmd: "echo hello",
            inherit_stdio: true,
            ..Default::default()
        };
        let result = run(&spec, &ControlHandle::new()).unwrap();
        assert!(result.stdout.is_empty());
    }

    #[test]
    fn pre_cancelled_control_skips_spawning_entirely() {
        let control = ControlHandle::new();
        control.cancel();
        let spec = ProcSpec {
            cmd: "true",
            ..Default::default()
        };
        let result = run(&spec, &control).unwrap();
        assert!(result.cancelled);
        assert!(!result.success);
    }

    #[test]
    fn env_overrides_are_visible_to_the_child_without_mutating_the_parent() {
        let spec = ProcSpec {
            cmd: "[ \"$ZR_PROC_TEST\" = \"hello\" ]",
            env: &[("ZR_PROC_TEST", "hello")],
            ..Default::default()
        };
        let result = run(&spec, &ControlHandle::new()).unwrap();
        assert!(result.success);
        assert!(std::env::var("ZR_PROC_TEST").is_err());
    }
}
