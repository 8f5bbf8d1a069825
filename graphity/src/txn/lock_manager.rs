// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Canonical-order multi-node locking
//!
//! A mutation names every user it will touch, and the coordinator locks them
//! in ascending identifier order. Two operations with overlapping sets
//! therefore always contend on their smallest shared user first and can
//! never wait on each other in a cycle.
//!
//! The touched set is computed from an unlocked view of the graph, so it can
//! be stale by the time the locks are held. The plan is computed again under
//! the locks; if it needs a user that is not held, everything is released
//! and acquisition starts over with the union.

use super::lock_tracker::{LockStats, LockTracker};
use crate::error::{GraphityError, Result};
use crate::model::{UserId, UserRecord};
use crate::storage::{GraphStore, NodeId, NodeLockGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Users to lock, in acquisition order
pub type LockPlan = BTreeMap<UserId, NodeId>;

/// Acquires lock sets in ascending user identifier order
pub struct LockCoordinator {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
    max_attempts: usize,
    tracker: LockTracker,
}

impl LockCoordinator {
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration, max_attempts: usize) -> Self {
        Self {
            store,
            timeout,
            max_attempts: max_attempts.max(1),
            tracker: LockTracker::new(),
        }
    }

    /// Lock `base` plus every user `plan` reports
    ///
    /// `plan` is called once before locking and again with the locks held;
    /// the returned set is only handed out once the second call asks for
    /// nothing beyond what is held.
    pub fn lock_with<F>(&self, base: &[UserRecord], plan: F) -> Result<LockSet>
    where
        F: Fn() -> Result<Vec<UserRecord>>,
    {
        let mut wanted = plan_of(base);
        match plan() {
            Ok(extra) => wanted.extend(plan_of(&extra)),
            // A concurrent splice can make the unlocked view unreadable; the
            // locked pass below sees a settled list
            Err(err) => log::debug!("unlocked lock planning failed, locking base set: {}", err),
        }

        for attempt in 1..=self.max_attempts {
            let held = self.acquire(&wanted)?;

            let mut needed = plan_of(base);
            match plan() {
                Ok(extra) => needed.extend(plan_of(&extra)),
                // The view can still be unsettled when the first plan failed
                // and only the base set is held
                Err(err) => {
                    log::debug!("locked lock planning failed on attempt {}: {}", attempt, err);
                    self.tracker.record_restart();
                    drop(held);
                    continue;
                }
            }
            let missing: Vec<UserId> = needed
                .keys()
                .filter(|id| !held.contains(**id))
                .copied()
                .collect();
            if missing.is_empty() {
                return Ok(held);
            }

            log::debug!(
                "lock set grew by {:?} on attempt {}, restarting",
                missing,
                attempt
            );
            self.tracker.record_restart();
            drop(held);
            wanted.extend(needed);
        }

        Err(GraphityError::LockConflict(format!(
            "lock set did not settle after {} attempts",
            self.max_attempts
        )))
    }

    /// Lock exactly the users in `plan`
    pub fn acquire(&self, plan: &LockPlan) -> Result<LockSet> {
        let mut set = LockSet {
            guards: Vec::with_capacity(plan.len()),
        };
        for (&user, &node) in plan {
            match self.store.lock_node(node, self.timeout) {
                Ok(guard) => {
                    self.tracker
                        .record_acquisition(guard.waited(), guard.was_contended());
                    set.guards.push((user, guard));
                }
                Err(err) => {
                    if err.is_lock_conflict() {
                        self.tracker.record_timeout();
                        log::warn!("gave up waiting for the lock of user {}: {}", user, err);
                    }
                    // Dropping `set` releases what was acquired, newest first
                    return Err(err.into());
                }
            }
        }
        Ok(set)
    }

    pub fn stats(&self) -> LockStats {
        self.tracker.snapshot()
    }
}

fn plan_of(users: &[UserRecord]) -> LockPlan {
    users.iter().map(|user| (user.id, user.node)).collect()
}

/// Scoped set of held user locks, released in reverse acquisition order
pub struct LockSet {
    guards: Vec<(UserId, NodeLockGuard)>,
}

impl LockSet {
    pub fn contains(&self, user: UserId) -> bool {
        self.guards.iter().any(|(id, _)| *id == user)
    }

    /// Held users in acquisition order
    pub fn users(&self) -> Vec<UserId> {
        self.guards.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }
}

impl Drop for LockSet {
    fn drop(&mut self) {
        while let Some((_, guard)) = self.guards.pop() {
            drop(guard);
        }
    }
}

impl std::fmt::Debug for LockSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockSet").field("users", &self.users()).finish()
    }
}
