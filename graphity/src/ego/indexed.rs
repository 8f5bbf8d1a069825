// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ego networks kept as recency-ordered lists

use super::layout::EntryLayout;
use super::list::EgoList;
use super::{EgoEntry, EgoNetwork};
use crate::config::IndexStrategy;
use crate::graph::FollowGraph;
use crate::model::{Timestamp, UserRecord, PROP_LAST_POST};
use crate::storage::{GraphStore, NodeId, StoreError, StoreResult};
use std::sync::Arc;

/// Ego-network index over one entry layout
pub struct IndexedNetwork<L: EntryLayout> {
    store: Arc<dyn GraphStore>,
    follows: FollowGraph,
    layout: L,
}

impl<L: EntryLayout> IndexedNetwork<L> {
    pub fn new(store: Arc<dyn GraphStore>, layout: L) -> Self {
        Self {
            follows: FollowGraph::new(Arc::clone(&store)),
            store,
            layout,
        }
    }

    fn list(&self, owner: &UserRecord) -> EgoList<'_> {
        EgoList::new(self.store.as_ref(), owner.node)
    }

    fn recency(&self, entry: NodeId) -> StoreResult<Timestamp> {
        let user = self.layout.user_of(self.store.as_ref(), entry)?;
        Ok(self
            .store
            .integer_property(user, PROP_LAST_POST)?
            .unwrap_or(0))
    }

    fn user_record(&self, entry: NodeId) -> StoreResult<UserRecord> {
        let user = self.layout.user_of(self.store.as_ref(), entry)?;
        UserRecord::from_node(self.store.as_ref(), user)
    }

    /// Resolve a list node for an unlocked reader
    ///
    /// A replica unlinked and deleted by a concurrent unfollow ends the walk.
    fn entry(&self, node: Option<NodeId>) -> StoreResult<Option<EgoEntry>> {
        let Some(node) = node else {
            return Ok(None);
        };
        match self.user_record(node) {
            Ok(user) => Ok(Some(EgoEntry { node, user })),
            Err(StoreError::NodeNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Users standing behind the given list nodes, skipping the list owner
    fn neighbour_users(
        &self,
        owner: &UserRecord,
        nodes: impl IntoIterator<Item = Option<NodeId>>,
    ) -> StoreResult<Vec<UserRecord>> {
        nodes
            .into_iter()
            .flatten()
            .filter(|node| *node != owner.node)
            .map(|node| self.user_record(node))
            .collect()
    }

    fn linked_entry(&self, owner: &UserRecord, user: &UserRecord) -> StoreResult<NodeId> {
        self.layout
            .find_entry(self.store.as_ref(), owner, user)?
            .ok_or_else(|| {
                StoreError::InvalidOperation(format!(
                    "user {} is not in the ego network of {}",
                    user.id, owner.id
                ))
            })
    }
}

impl<L: EntryLayout> EgoNetwork for IndexedNetwork<L> {
    fn strategy(&self) -> IndexStrategy {
        self.layout.strategy()
    }

    fn follow_lock_set(
        &self,
        follower: &UserRecord,
        followed: &UserRecord,
    ) -> StoreResult<Vec<UserRecord>> {
        if !self.layout.entries_are_shared() {
            return Ok(Vec::new());
        }
        let key = followed.last_post(self.store.as_ref())?;
        let (previous, successor) = self
            .list(follower)
            .insertion_point(key, |entry| self.recency(entry))?;
        self.neighbour_users(follower, [Some(previous), successor])
    }

    fn unfollow_lock_set(
        &self,
        follower: &UserRecord,
        followed: &UserRecord,
    ) -> StoreResult<Vec<UserRecord>> {
        if !self.layout.entries_are_shared() {
            return Ok(Vec::new());
        }
        let list = self.list(follower);
        let Some(entry) = self
            .layout
            .find_entry(self.store.as_ref(), follower, followed)?
        else {
            return Ok(Vec::new());
        };
        self.neighbour_users(follower, [list.previous(entry)?, list.next(entry)?])
    }

    fn post_lock_set(&self, author: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        let followers = self.follows.followers(author)?;
        let mut touched = followers.clone();
        if self.layout.entries_are_shared() {
            for follower in &followers {
                let list = self.list(follower);
                let Some(entry) = self
                    .layout
                    .find_entry(self.store.as_ref(), follower, author)?
                else {
                    continue;
                };
                touched.extend(self.neighbour_users(
                    follower,
                    [list.head()?, list.previous(entry)?, list.next(entry)?],
                )?);
            }
        }
        Ok(touched)
    }

    fn insert(&self, follower: &UserRecord, followed: &UserRecord) -> StoreResult<()> {
        let store = self.store.as_ref();
        let list = self.list(follower);
        let key = followed.last_post(store)?;
        let entry = self.layout.create_entry(store, follower, followed)?;

        let spliced = list
            .insertion_point(key, |entry| self.recency(entry))
            .and_then(|(previous, _)| list.splice_in(previous, entry));
        if let Err(err) = spliced {
            if !list.contains(entry).unwrap_or(false) {
                self.layout.destroy_entry(store, entry)?;
            }
            return Err(err);
        }
        log::debug!(
            "inserted {} into ego network of {} (key {})",
            followed.id,
            follower.id,
            key
        );
        Ok(())
    }

    fn remove(&self, follower: &UserRecord, followed: &UserRecord) -> StoreResult<()> {
        let entry = self.linked_entry(follower, followed)?;
        self.list(follower).unlink(entry)?;
        self.layout.destroy_entry(self.store.as_ref(), entry)?;
        log::debug!("removed {} from ego network of {}", followed.id, follower.id);
        Ok(())
    }

    fn promote(&self, author: &UserRecord) -> StoreResult<usize> {
        let mut moved = 0;
        let mut first_error = None;

        // Keep going after a failure so no other follower's list is left stale
        for follower in self.follows.followers(author)? {
            let result = self
                .linked_entry(&follower, author)
                .and_then(|entry| self.list(&follower).move_to_head(entry));
            match result {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(err) => {
                    log::warn!(
                        "failed to promote {} in ego network of {}: {}",
                        author.id,
                        follower.id,
                        err
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(moved),
        }
    }

    fn first_entry(&self, owner: &UserRecord) -> StoreResult<Option<EgoEntry>> {
        self.entry(self.list(owner).head()?)
    }

    fn next_entry(&self, owner: &UserRecord, entry: &EgoEntry) -> StoreResult<Option<EgoEntry>> {
        match self.list(owner).next(entry.node) {
            Ok(next) => self.entry(next),
            Err(StoreError::NodeNotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn entries(&self, owner: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        self.list(owner)
            .entries()?
            .into_iter()
            .map(|entry| self.user_record(entry))
            .collect()
    }
}
