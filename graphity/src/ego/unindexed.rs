// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Baseline without an ego-network index
//!
//! Nothing is maintained on writes; the ordered ego network is derived from
//! the follow edges whenever it is asked for.

use super::{EgoEntry, EgoNetwork};
use crate::config::IndexStrategy;
use crate::graph::FollowGraph;
use crate::model::UserRecord;
use crate::storage::{GraphStore, StoreResult};
use std::cmp::Reverse;
use std::sync::Arc;

pub struct UnindexedNetwork {
    store: Arc<dyn GraphStore>,
    follows: FollowGraph,
}

impl UnindexedNetwork {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            follows: FollowGraph::new(Arc::clone(&store)),
            store,
        }
    }
}

impl EgoNetwork for UnindexedNetwork {
    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Unindexed
    }

    fn follow_lock_set(&self, _: &UserRecord, _: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        Ok(Vec::new())
    }

    fn unfollow_lock_set(&self, _: &UserRecord, _: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        Ok(Vec::new())
    }

    fn post_lock_set(&self, _: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        Ok(Vec::new())
    }

    fn insert(&self, _: &UserRecord, _: &UserRecord) -> StoreResult<()> {
        Ok(())
    }

    fn remove(&self, _: &UserRecord, _: &UserRecord) -> StoreResult<()> {
        Ok(())
    }

    fn promote(&self, _: &UserRecord) -> StoreResult<usize> {
        Ok(0)
    }

    fn first_entry(&self, _: &UserRecord) -> StoreResult<Option<EgoEntry>> {
        Ok(None)
    }

    fn next_entry(&self, _: &UserRecord, _: &EgoEntry) -> StoreResult<Option<EgoEntry>> {
        Ok(None)
    }

    /// Followed users sorted by recency; ties keep follow order
    fn entries(&self, owner: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        let mut keyed = Vec::new();
        for user in self.follows.followees(owner)? {
            keyed.push((user.last_post(self.store.as_ref())?, user));
        }
        keyed.sort_by_key(|(key, _)| Reverse(*key));
        Ok(keyed.into_iter().map(|(_, user)| user).collect())
    }
}
