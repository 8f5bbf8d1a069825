// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ego-network index
//!
//! Every follower keeps the users it follows in a list ordered by each
//! followed user's newest post, newest first. Feed reads walk this list and
//! stop opening timelines once the remaining users cannot contribute.
//!
//! # Strategies
//!
//! ```text
//! direct:    F -EGO(F)-> N1 -EGO(F)-> N2 -EGO(F)-> N3
//! replica:   F -EGO(F)-> r1 -EGO(F)-> r2 -EGO(F)-> r3
//!                        |            |            |
//!                   REPLICA_OF   REPLICA_OF   REPLICA_OF
//!                        v            v            v
//!                        N1           N2           N3
//! unindexed: no list; order derived from FOLLOWS edges on demand
//! ```
//!
//! Writers must hold the locks returned by the `*_lock_set` methods (plus the
//! follower and followed user, or the author) before calling `insert`,
//! `remove` or `promote`.

pub mod indexed;
pub mod layout;
pub mod list;
pub mod unindexed;

pub use indexed::IndexedNetwork;
pub use layout::{DirectLayout, EntryLayout, ReplicaLayout};
pub use list::EgoList;
pub use unindexed::UnindexedNetwork;

use crate::config::IndexStrategy;
use crate::model::UserRecord;
use crate::storage::{GraphStore, NodeId, StoreResult};
use std::sync::Arc;

/// Position in an owner's ego network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EgoEntry {
    /// List node of the entry
    pub node: NodeId,
    /// Followed user the entry stands for
    pub user: UserRecord,
}

/// Maintenance and traversal of ego networks
pub trait EgoNetwork: Send + Sync {
    fn strategy(&self) -> IndexStrategy;

    /// Users besides follower and followed whose locks a follow needs
    fn follow_lock_set(
        &self,
        follower: &UserRecord,
        followed: &UserRecord,
    ) -> StoreResult<Vec<UserRecord>>;

    /// Users besides follower and followed whose locks an unfollow needs
    fn unfollow_lock_set(
        &self,
        follower: &UserRecord,
        followed: &UserRecord,
    ) -> StoreResult<Vec<UserRecord>>;

    /// Users besides the author whose locks a post needs
    fn post_lock_set(&self, author: &UserRecord) -> StoreResult<Vec<UserRecord>>;

    /// Add `followed` to `follower`'s ego network at its recency position
    fn insert(&self, follower: &UserRecord, followed: &UserRecord) -> StoreResult<()>;

    /// Take `followed` out of `follower`'s ego network
    fn remove(&self, follower: &UserRecord, followed: &UserRecord) -> StoreResult<()>;

    /// Move `author` to the head of every follower's ego network
    ///
    /// Returns the number of lists that changed.
    fn promote(&self, author: &UserRecord) -> StoreResult<usize>;

    /// Most recent entry, `None` for an empty or unindexed network
    fn first_entry(&self, owner: &UserRecord) -> StoreResult<Option<EgoEntry>>;

    /// Entry following `entry`
    fn next_entry(&self, owner: &UserRecord, entry: &EgoEntry) -> StoreResult<Option<EgoEntry>>;

    /// Followed users, most recent first
    fn entries(&self, owner: &UserRecord) -> StoreResult<Vec<UserRecord>>;

    fn is_indexed(&self) -> bool {
        self.strategy().is_indexed()
    }
}

/// Create the ego network implementation for `strategy`
pub fn create_ego_network(
    strategy: IndexStrategy,
    store: Arc<dyn GraphStore>,
) -> Box<dyn EgoNetwork> {
    match strategy {
        IndexStrategy::Unindexed => Box::new(UnindexedNetwork::new(store)),
        IndexStrategy::Direct => Box::new(IndexedNetwork::new(store, DirectLayout)),
        IndexStrategy::Replica => Box::new(IndexedNetwork::new(store, ReplicaLayout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::FollowGraph;
    use crate::model::UserId;
    use crate::storage::MemoryGraphStore;

    struct Fixture {
        store: Arc<dyn GraphStore>,
        network: Box<dyn EgoNetwork>,
        follows: FollowGraph,
    }

    impl Fixture {
        fn new(strategy: IndexStrategy) -> Self {
            let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::new());
            Self {
                network: create_ego_network(strategy, Arc::clone(&store)),
                follows: FollowGraph::new(Arc::clone(&store)),
                store,
            }
        }

        fn user(&self, id: u64) -> UserRecord {
            UserRecord::load_or_create(self.store.as_ref(), UserId::new(id))
                .unwrap()
                .0
        }

        fn follow(&self, follower: u64, followed: u64) {
            let (f, n) = (self.user(follower), self.user(followed));
            self.follows.link(&f, &n).unwrap();
            self.network.insert(&f, &n).unwrap();
        }

        fn unfollow(&self, follower: u64, followed: u64) {
            let (f, n) = (self.user(follower), self.user(followed));
            self.network.remove(&f, &n).unwrap();
            let edge = self.follows.follow_edge(&f, &n).unwrap().unwrap();
            self.follows.unlink(&edge).unwrap();
        }

        fn post(&self, author: u64, timestamp: i64) {
            let a = self.user(author);
            a.set_last_post(self.store.as_ref(), timestamp).unwrap();
            self.network.promote(&a).unwrap();
        }

        fn ego(&self, owner: u64) -> Vec<u64> {
            self.network
                .entries(&self.user(owner))
                .unwrap()
                .iter()
                .map(|u| u.id.get())
                .collect()
        }

        fn walk(&self, owner: u64) -> Vec<u64> {
            let owner = self.user(owner);
            let mut ids = Vec::new();
            let mut entry = self.network.first_entry(&owner).unwrap();
            while let Some(current) = entry {
                ids.push(current.user.id.get());
                entry = self.network.next_entry(&owner, &current).unwrap();
            }
            ids
        }
    }

    #[test]
    fn test_all_strategies_agree_on_order() {
        for strategy in IndexStrategy::all() {
            let fx = Fixture::new(strategy);
            fx.follow(1, 2);
            fx.follow(1, 3);
            fx.follow(1, 4);
            assert_eq!(fx.ego(1), vec![2, 3, 4], "{}", strategy);

            fx.post(4, 10);
            fx.post(3, 20);
            assert_eq!(fx.ego(1), vec![3, 4, 2], "{}", strategy);

            fx.post(4, 30);
            assert_eq!(fx.ego(1), vec![4, 3, 2], "{}", strategy);

            fx.unfollow(1, 3);
            assert_eq!(fx.ego(1), vec![4, 2], "{}", strategy);
        }
    }

    #[test]
    fn test_insert_uses_existing_recency() {
        for strategy in [IndexStrategy::Direct, IndexStrategy::Replica] {
            let fx = Fixture::new(strategy);
            fx.post(2, 10);
            fx.post(3, 30);
            fx.post(4, 20);
            fx.follow(1, 2);
            fx.follow(1, 3);
            fx.follow(1, 4);
            fx.follow(1, 5);
            assert_eq!(fx.ego(1), vec![3, 4, 2, 5], "{}", strategy);
            assert_eq!(fx.walk(1), fx.ego(1), "{}", strategy);
        }
    }

    #[test]
    fn test_remove_restores_previous_order() {
        for strategy in [IndexStrategy::Direct, IndexStrategy::Replica] {
            let fx = Fixture::new(strategy);
            fx.follow(1, 2);
            fx.follow(1, 3);
            fx.post(2, 5);
            let before = fx.ego(1);

            fx.post(9, 7);
            fx.follow(1, 9);
            assert_eq!(fx.ego(1)[0], 9);
            fx.unfollow(1, 9);
            assert_eq!(fx.ego(1), before, "{}", strategy);
        }
    }

    #[test]
    fn test_promotion_only_touches_followers() {
        let fx = Fixture::new(IndexStrategy::Direct);
        fx.follow(1, 2);
        fx.follow(1, 3);
        fx.follow(5, 3);
        fx.follow(5, 2);
        fx.post(3, 10);
        assert_eq!(fx.ego(1), vec![3, 2]);
        assert_eq!(fx.ego(5), vec![3, 2]);
        assert!(fx.ego(3).is_empty());
    }

    #[test]
    fn test_direct_lock_sets_name_list_neighbours() {
        let fx = Fixture::new(IndexStrategy::Direct);
        fx.follow(1, 2);
        fx.follow(1, 3);
        fx.follow(1, 4);
        fx.post(3, 10);
        // ego(1) = [3, 2, 4]

        let f = fx.user(1);
        let ids = |users: Vec<UserRecord>| -> Vec<u64> {
            let mut ids: Vec<u64> = users.iter().map(|u| u.id.get()).collect();
            ids.sort();
            ids
        };

        assert_eq!(ids(fx.network.unfollow_lock_set(&f, &fx.user(2)).unwrap()), vec![3, 4]);
        assert_eq!(ids(fx.network.unfollow_lock_set(&f, &fx.user(3)).unwrap()), vec![2]);
        assert_eq!(ids(fx.network.follow_lock_set(&f, &fx.user(7)).unwrap()), vec![4]);
        // Author 4 in list [3, 2, 4]: follower 1, head 3, predecessor 2
        assert_eq!(ids(fx.network.post_lock_set(&fx.user(4)).unwrap()), vec![1, 2, 3]);
    }

    #[test]
    fn test_replica_lock_sets_are_followers_only() {
        let fx = Fixture::new(IndexStrategy::Replica);
        fx.follow(1, 2);
        fx.follow(1, 3);
        fx.follow(6, 3);
        let f = fx.user(1);
        assert!(fx.network.follow_lock_set(&f, &fx.user(4)).unwrap().is_empty());
        assert!(fx.network.unfollow_lock_set(&f, &fx.user(2)).unwrap().is_empty());

        let mut followers: Vec<u64> = fx
            .network
            .post_lock_set(&fx.user(3))
            .unwrap()
            .iter()
            .map(|u| u.id.get())
            .collect();
        followers.sort();
        assert_eq!(followers, vec![1, 6]);
    }

    #[test]
    fn test_unindexed_has_no_list() {
        let fx = Fixture::new(IndexStrategy::Unindexed);
        fx.follow(1, 2);
        assert!(!fx.network.is_indexed());
        assert!(fx.walk(1).is_empty());
        assert_eq!(fx.ego(1), vec![2]);
        assert!(fx.network.post_lock_set(&fx.user(2)).unwrap().is_empty());
    }
}
