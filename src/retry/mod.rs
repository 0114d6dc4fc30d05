// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded retry with optional exponential backoff, cancellation-aware
//! between attempts: a cancel is observed at every boundary between
//! attempts, never mid-attempt.

use std::thread;
use std::time::Duration;

use crate::control::ControlHandle;

/// The outcome of one retry loop: the last attempt's result plus how many
/// attempts were made.
pub struct RetryOutcome<T> {
    pub result: T,
    pub attempts: u32,
}

/// Run `attempt` up to `max + 1` times total (the initial try plus `max`
/// retries), sleeping `delay_ms` (doubling each time if `backoff`) between
/// attempts that `succeeded` reports as a failure. Returns the final
/// attempt's result regardless of outcome — retry never manufactures
/// success or failure, it only decides whether to try again.
///
/// Checks `control.is_cancelled()` before each attempt (including the
/// first) and stops retrying immediately if so, returning whatever the most
/// recent attempt produced.
pub fn run<T>(
    max: u32,
    delay_ms: u64,
    backoff: bool,
    control: &ControlHandle,
    mut attempt: impl FnMut() -> T,
    succeeded: impl Fn(&T) -> bool,
) -> RetryOutcome<T> {
    let mut delay = delay_ms;
    let mut attempts = 0;
    let mut result;

    loop {
        result = attempt();
        attempts += 1;

        if succeeded(&result) || attempts > max || control.is_cancelled() {
            break;
        }

        if delay_ms > 0 {
            thread::sleep(Duration::from_millis(delay));
            if backoff {
                delay = delay.saturating_mul(2);
            }
        }
    }

    RetryOutcome { result, attempts }
}
