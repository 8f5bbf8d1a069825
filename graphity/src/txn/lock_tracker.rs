// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lock contention tracking

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters for node lock acquisition
#[derive(Debug, Default)]
pub struct LockTracker {
    acquisitions: AtomicU64,
    contended: AtomicU64,
    timeouts: AtomicU64,
    restarts: AtomicU64,
    wait_micros: AtomicU64,
}

impl LockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a granted lock and how long it was waited for
    pub fn record_acquisition(&self, waited: Duration, contended: bool) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        if contended {
            self.contended.fetch_add(1, Ordering::Relaxed);
        }
        self.wait_micros
            .fetch_add(waited.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lock set released and acquired again because it grew
    pub fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_wait_time(&self) -> Duration {
        Duration::from_micros(self.wait_micros.load(Ordering::Relaxed))
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            restarts: self.restarts.load(Ordering::Relaxed),
            total_wait: self.total_wait_time(),
        }
    }
}

/// Snapshot of [`LockTracker`] counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LockStats {
    pub acquisitions: u64,
    pub contended: u64,
    pub timeouts: u64,
    pub restarts: u64,
    pub total_wait: Duration,
}
