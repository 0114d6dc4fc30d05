// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Watches a spawned child on the side: polls for exit, a timeout deadline,
//! and cancellation, in ~50ms slices, escalating to termination when either
//! fires. Runs on the same worker thread that spawned the child — there is
//! no separate watcher thread per process, since the worker thread has
//! nothing else to do while the child runs.

use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use crate::control::ControlHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const GRACE_PERIOD: Duration = Duration::from_secs(5);

pub struct SuperviseOutcome {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub cancelled: bool,
}

/// Poll `child` until it exits, `deadline` elapses, or `control` is
/// cancelled — whichever comes first. On timeout/cancellation, escalates to
/// termination (SIGTERM then, after a grace period, SIGKILL on Unix;
/// `Child::kill()` only elsewhere).
///
/// When `control` is paused, the child is suspended (SIGSTOP) and the
/// supervisor blocks on [`ControlHandle::wait_while_paused`] until resumed
/// (SIGCONT) or cancelled, without counting paused time against `deadline`.
pub fn supervise(
    child: &mut Child,
    control: &ControlHandle,
    deadline: Option<Duration>,
) -> SuperviseOutcome {
    let mut start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                return SuperviseOutcome {
                    exit_code: status.code(),
                    timed_out: false,
                    cancelled: false,
                }
            }
            Ok(None) => {}
            Err(_) => {
                return SuperviseOutcome {
                    exit_code: None,
                    timed_out: false,
                    cancelled: false,
                }
            }
        }

        if control.is_paused() && !control.is_cancelled() {
            suspend(child);
            let paused_at = Instant::now();
            control.wait_while_paused();
            resume(child);
            // Don't let time spent suspended count toward the deadline.
            start += paused_at.elapsed();
            continue;
        }

        let timed_out = deadline.is_some_and(|d| start.elapsed() >= d);
        let cancelled = control.is_cancelled();

        if timed_out || cancelled {
            escalate(child);
            let exit_code = child.wait().ok().and_then(|s| s.code());
            return SuperviseOutcome {
                exit_code,
                timed_out,
                cancelled,
            };
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(unix)]
fn suspend(child: &Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGSTOP);
    }
}

#[cfg(unix)]
fn resume(child: &Child) {
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGCONT);
    }
}

#[cfg(not(unix))]
fn suspend(_child: &Child) {}

#[cfg(not(unix))]
fn resume(_child: &Child) {}

#[cfg(unix)]
fn escalate(child: &mut Child) {
    let pid = child.id() as libc::pid_t;
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }

    let deadline = Instant::now() + GRACE_PERIOD;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return,
            Ok(None) => {}
            Err(_) => return,
        }
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    unsafe {
        libc::kill(pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn escalate(child: &mut Child) {
    let _ = child.kill();
}
