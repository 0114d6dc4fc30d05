// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! A blocking counting semaphore over `std::sync::{Mutex, Condvar}`.
//!
//! No external semaphore crate: the scheduler's concurrency model is plain
//! OS threads, and this primitive is small enough that pulling in a
//! dependency for it would just be indirection.

use std::sync::{Arc, Condvar, Mutex};

pub struct Semaphore {
    state: Mutex<usize>,
    cv: Condvar,
}

impl Semaphore {
    pub fn new(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(permits),
            cv: Condvar::new(),
        })
    }

    /// Block until a permit is available, then take it. Returns a guard
    /// that releases the permit (and wakes one waiter) on drop.
    pub fn acquire(self: &Arc<Self>) -> SemaphoreGuard {
        let mut available = self.state.lock().unwrap();
        while *available == 0 {
            available = self.cv.wait(available).unwrap();
        }
        *available -= 1;
        SemaphoreGuard {
            semaphore: Arc::clone(self),
        }
    }
}

pub struct SemaphoreGuard {
    semaphore: Arc<Semaphore>,
}

impl Drop for SemaphoreGuard {
    fn drop(&mut self) {
        let mut available = self.semaphore.state.lock().unwrap();
        *available += 1;
        self.semaphore.cv.notify_one();
    }
}
