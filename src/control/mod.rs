// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shared cancel/pause/resume signaling between a scheduler run and its
//! caller, consumed by the process supervisor during a long-running command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};

/// A cheaply cloneable handle into one run's control state. Every clone
/// refers to the same underlying signals.
#[derive(Clone)]
pub struct ControlHandle {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    paused: AtomicBool,
    pause_lock: Mutex<()>,
    pause_cv: Condvar,
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                paused: AtomicBool::new(false),
                pause_lock: Mutex::new(()),
                pause_cv: Condvar::new(),
            }),
        }
    }

    /// Request cancellation. Monotonic: once set, never clears.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        // Wake anything parked in `wait_while_paused` so it can observe
        // cancellation instead of blocking forever.
        let _guard = self.inner.pause_lock.lock().unwrap();
        self.inner.pause_cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        self.inner.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.inner.paused.store(false, Ordering::SeqCst);
        let _guard = self.inner.pause_lock.lock().unwrap();
        self.inner.pause_cv.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::SeqCst)
    }

    /// Block the calling thread while paused. Returns immediately (without
    /// blocking) once cancelled, even if still nominally paused, since a
    /// cancelled run must never hang.
    pub fn wait_while_paused(&self) {
        let guard = self.inner.pause_lock.lock().unwrap();
        let _unused = self
            .inner
            .pause_cv
            .wait_while(guard, |_| self.is_paused() && !self.is_cancelled())
            .unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn cancel_is_visible_across_clones() {
        let handle = ControlHandle::new();
        let other = handle.clone();
        assert!(!other.is_cancelled());
        handle.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn pause_blocks_until_resume() {
        let handle = ControlHandle::new();
        handle.pause();
        let waiter = handle.clone();
        let joined = thread::spawn(move || {
            waiter.wait_while_paused();
        });
        thread::sleep(Duration::from_millis(50));
        assert!(!joined.is_finished());
        handle.resume();
        joined.join().unwrap();
    }

    #[test]
    fn cancel_releases_a_paused_waiter() {
        let handle = ControlHandle::new();
        handle.pause();
        let waiter = handle.clone();
        let joined = thread::spawn(move || {
            waiter.wait_while_paused();
        });
        thread::sleep(Duration::from_millis(50));
        handle.cancel();
        joined.join().unwrap();
    }
}
