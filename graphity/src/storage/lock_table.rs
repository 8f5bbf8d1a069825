// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-node write locks
//!
//! A node lock is exclusive and not re-entrant. Waiters block on a condition
//! variable of the shard owning the node until the holder drops its guard or
//! the timeout expires; expiry is reported as [`StoreError::LockTimeout`]
//! instead of blocking indefinitely.

use super::types::{NodeId, StoreError, StoreResult};
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of shards when none is configured
pub const DEFAULT_LOCK_SHARDS: usize = 64;

struct LockShard {
    held: Mutex<HashSet<NodeId>>,
    released: Condvar,
}

impl LockShard {
    fn new() -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
        }
    }
}

/// Table of node write locks, sharded by node handle
pub struct LockTable {
    shards: Vec<Arc<LockShard>>,
}

impl LockTable {
    /// Create a lock table with the given number of shards
    pub fn new(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count).map(|_| Arc::new(LockShard::new())).collect(),
        }
    }

    fn shard(&self, node: NodeId) -> &Arc<LockShard> {
        &self.shards[(node.id() % self.shards.len() as u64) as usize]
    }

    /// Block until the write lock on `node` is granted or `timeout` elapses
    pub fn acquire(&self, node: NodeId, timeout: Duration) -> StoreResult<NodeLockGuard> {
        let shard = self.shard(node);
        let started = Instant::now();
        let deadline = started + timeout;
        let mut contended = false;

        let mut held = shard.held.lock();
        while held.contains(&node) {
            contended = true;
            if shard.released.wait_until(&mut held, deadline).timed_out() && held.contains(&node)
            {
                return Err(StoreError::LockTimeout {
                    node,
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
        }
        held.insert(node);
        drop(held);

        Ok(NodeLockGuard {
            shard: Arc::clone(shard),
            node,
            waited: started.elapsed(),
            contended,
        })
    }

    /// Whether some caller currently holds the lock on `node`
    pub fn is_locked(&self, node: NodeId) -> bool {
        self.shard(node).held.lock().contains(&node)
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new(DEFAULT_LOCK_SHARDS)
    }
}

/// Held write lock on one node; released on drop
pub struct NodeLockGuard {
    shard: Arc<LockShard>,
    node: NodeId,
    waited: Duration,
    contended: bool,
}

impl NodeLockGuard {
    /// Node this guard locks
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Time spent waiting before the lock was granted
    pub fn waited(&self) -> Duration {
        self.waited
    }

    /// Whether another holder had to be waited for
    pub fn was_contended(&self) -> bool {
        self.contended
    }
}

impl Drop for NodeLockGuard {
    fn drop(&mut self) {
        self.shard.held.lock().remove(&self.node);
        self.shard.released.notify_all();
    }
}

impl std::fmt::Debug for NodeLockGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeLockGuard")
            .field("node", &self.node)
            .field("waited", &self.waited)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_lock_released_on_drop() {
        let table = LockTable::new(4);
        let node = NodeId::from_u64(9);

        let guard = table.acquire(node, Duration::from_millis(50)).unwrap();
        assert!(table.is_locked(node));
        assert!(!guard.was_contended());
        drop(guard);
        assert!(!table.is_locked(node));
    }

    #[test]
    fn test_second_acquire_times_out() {
        let table = LockTable::new(4);
        let node = NodeId::from_u64(1);

        let _guard = table.acquire(node, Duration::from_millis(50)).unwrap();
        let err = table.acquire(node, Duration::from_millis(20)).unwrap_err();
        assert!(err.is_lock_conflict());
    }

    #[test]
    fn test_waiter_is_granted_after_release() {
        let table = Arc::new(LockTable::new(1));
        let node = NodeId::from_u64(5);
        let guard = table.acquire(node, Duration::from_secs(1)).unwrap();

        let waiter = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let guard = table.acquire(node, Duration::from_secs(5)).unwrap();
                guard.was_contended()
            })
        };

        thread::sleep(Duration::from_millis(20));
        drop(guard);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_distinct_nodes_in_same_shard_do_not_block() {
        let table = LockTable::new(1);
        let _a = table.acquire(NodeId::from_u64(1), Duration::from_millis(10)).unwrap();
        let b = table.acquire(NodeId::from_u64(2), Duration::from_millis(10));
        assert!(b.is_ok());
    }
}
