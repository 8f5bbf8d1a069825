// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Physical layouts of ego-network entries
//!
//! Both layouts give the same logical list; they differ in which node stands
//! in the list for a followed user, and so in which nodes a splice rewrites.

use crate::config::IndexStrategy;
use crate::model::{UserRecord, PROP_OWNER};
use crate::storage::{
    Direction, EdgeType, GraphStore, NodeId, NodeType, Properties, StoreError, StoreResult,
    Value,
};

use super::list::EgoList;

/// Mapping between followed users and the list nodes standing for them
pub trait EntryLayout: Send + Sync {
    fn strategy(&self) -> IndexStrategy;

    /// Whether list entries are the followed users' own nodes
    ///
    /// Shared entries are rewritten by every follower's splices, so their
    /// owners have to be locked alongside the follower.
    fn entries_are_shared(&self) -> bool;

    /// Entry standing for `user` in `owner`'s list, if it is linked
    fn find_entry(
        &self,
        store: &dyn GraphStore,
        owner: &UserRecord,
        user: &UserRecord,
    ) -> StoreResult<Option<NodeId>>;

    /// Prepare the entry for `user` before it is spliced into `owner`'s list
    fn create_entry(
        &self,
        store: &dyn GraphStore,
        owner: &UserRecord,
        user: &UserRecord,
    ) -> StoreResult<NodeId>;

    /// Dispose of an entry after it was unlinked
    fn destroy_entry(&self, store: &dyn GraphStore, entry: NodeId) -> StoreResult<()>;

    /// User node an entry stands for
    fn user_of(&self, store: &dyn GraphStore, entry: NodeId) -> StoreResult<NodeId>;
}

/// Followed users' own nodes are the list entries
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectLayout;

impl EntryLayout for DirectLayout {
    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Direct
    }

    fn entries_are_shared(&self) -> bool {
        true
    }

    fn find_entry(
        &self,
        store: &dyn GraphStore,
        owner: &UserRecord,
        user: &UserRecord,
    ) -> StoreResult<Option<NodeId>> {
        let linked = EgoList::new(store, owner.node).contains(user.node)?;
        Ok(linked.then_some(user.node))
    }

    fn create_entry(
        &self,
        _store: &dyn GraphStore,
        owner: &UserRecord,
        user: &UserRecord,
    ) -> StoreResult<NodeId> {
        // The owner's node already heads its own list
        if owner.node == user.node {
            return Err(StoreError::InvalidOperation(format!(
                "user {} cannot be an entry of its own direct ego list",
                user.id
            )));
        }
        Ok(user.node)
    }

    fn destroy_entry(&self, _store: &dyn GraphStore, _entry: NodeId) -> StoreResult<()> {
        Ok(())
    }

    fn user_of(&self, _store: &dyn GraphStore, entry: NodeId) -> StoreResult<NodeId> {
        Ok(entry)
    }
}

/// One private replica node per follow relationship
///
/// `follower -REPLICA-> replica -REPLICA_OF-> followed`. The replica carries
/// the follower's node handle in its `owner` property.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplicaLayout;

impl EntryLayout for ReplicaLayout {
    fn strategy(&self) -> IndexStrategy {
        IndexStrategy::Replica
    }

    fn entries_are_shared(&self) -> bool {
        false
    }

    fn find_entry(
        &self,
        store: &dyn GraphStore,
        owner: &UserRecord,
        user: &UserRecord,
    ) -> StoreResult<Option<NodeId>> {
        for edge in store.edges(owner.node, EdgeType::Replica, Direction::Outgoing)? {
            if store.next_node(edge.end, EdgeType::ReplicaOf)? == Some(user.node) {
                return Ok(Some(edge.end));
            }
        }
        Ok(None)
    }

    fn create_entry(
        &self,
        store: &dyn GraphStore,
        owner: &UserRecord,
        user: &UserRecord,
    ) -> StoreResult<NodeId> {
        let mut properties = Properties::new();
        properties.insert(
            PROP_OWNER.to_string(),
            Value::Integer(owner.node.id() as i64),
        );
        let replica = store.create_node(NodeType::Replica, properties)?;
        store.create_edge(replica, user.node, EdgeType::ReplicaOf)?;
        store.create_edge(owner.node, replica, EdgeType::Replica)?;
        Ok(replica)
    }

    fn destroy_entry(&self, store: &dyn GraphStore, entry: NodeId) -> StoreResult<()> {
        for edge in store.edges(entry, EdgeType::Replica, Direction::Incoming)? {
            store.delete_edge(&edge)?;
        }
        for edge in store.edges(entry, EdgeType::ReplicaOf, Direction::Outgoing)? {
            store.delete_edge(&edge)?;
        }
        store.delete_node(entry)
    }

    fn user_of(&self, store: &dyn GraphStore, entry: NodeId) -> StoreResult<NodeId> {
        // A replica losing its target is being torn down by an unfollow
        store
            .next_node(entry, EdgeType::ReplicaOf)?
            .ok_or(StoreError::NodeNotFound(entry))
    }
}
