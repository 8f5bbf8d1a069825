// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Follow relationships
//!
//! A follow is a single `FOLLOWS` edge from follower to followed user, at
//! most one per ordered pair. Keeping the ego-network index in step with
//! these edges is the caller's job.

use crate::model::UserRecord;
use crate::storage::{Direction, Edge, EdgeType, GraphStore, StoreResult};
use std::sync::Arc;

/// Directed follow edges between users
pub struct FollowGraph {
    store: Arc<dyn GraphStore>,
}

impl FollowGraph {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// The follow edge from `follower` to `followed`, if any
    pub fn follow_edge(
        &self,
        follower: &UserRecord,
        followed: &UserRecord,
    ) -> StoreResult<Option<Edge>> {
        Ok(self
            .store
            .edges(follower.node, EdgeType::Follows, Direction::Outgoing)?
            .into_iter()
            .find(|edge| edge.end == followed.node))
    }

    pub fn is_following(&self, follower: &UserRecord, followed: &UserRecord) -> StoreResult<bool> {
        Ok(self.follow_edge(follower, followed)?.is_some())
    }

    /// Create the follow edge; the pair must not be linked yet
    pub fn link(&self, follower: &UserRecord, followed: &UserRecord) -> StoreResult<Edge> {
        let edge = self
            .store
            .create_edge(follower.node, followed.node, EdgeType::Follows)?;
        log::debug!("{} now follows {}", follower.id, followed.id);
        Ok(edge)
    }

    /// Remove a follow edge
    pub fn unlink(&self, edge: &Edge) -> StoreResult<()> {
        self.store.delete_edge(edge)
    }

    /// Users `user` follows
    pub fn followees(&self, user: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        self.neighbours(user, Direction::Outgoing)
    }

    /// Users following `user`
    pub fn followers(&self, user: &UserRecord) -> StoreResult<Vec<UserRecord>> {
        self.neighbours(user, Direction::Incoming)
    }

    fn neighbours(&self, user: &UserRecord, direction: Direction) -> StoreResult<Vec<UserRecord>> {
        self.store
            .edges(user.node, EdgeType::Follows, direction)?
            .into_iter()
            .map(|edge| UserRecord::from_node(self.store.as_ref(), edge.other(user.node)))
            .collect()
    }
}
