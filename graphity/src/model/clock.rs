// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Publish timestamps
//!
//! Every post gets a distinct millisecond stamp that is strictly greater than
//! every stamp handed out before it, even when wall-clock time stalls or goes
//! backwards.

use super::ids::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide strictly increasing millisecond clock
#[derive(Debug, Default)]
pub struct PostClock {
    last: AtomicI64,
}

impl PostClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next stamp: `max(now, last + 1)`
    pub fn next(&self) -> Timestamp {
        let now = wall_clock_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(previous + 1)
    }

    /// Most recent stamp handed out, 0 before the first
    pub fn last(&self) -> Timestamp {
        self.last.load(Ordering::SeqCst)
    }
}

fn wall_clock_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_stamps_strictly_increase() {
        let clock = PostClock::new();
        let mut previous = 0;
        for _ in 0..1_000 {
            let stamp = clock.next();
            assert!(stamp > previous);
            previous = stamp;
        }
        assert_eq!(clock.last(), previous);
    }

    #[test]
    fn test_stamps_are_unique_across_threads() {
        let clock = Arc::new(PostClock::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || (0..500).map(|_| clock.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for stamp in handle.join().unwrap() {
                assert!(seen.insert(stamp), "duplicate stamp {}", stamp);
            }
        }
        assert_eq!(seen.len(), 2_000);
    }
}
