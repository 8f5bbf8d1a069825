// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! User node proxy

use super::ids::{Timestamp, UserId};
use super::{PROP_IDENTIFIER, PROP_LAST_POST};
use crate::storage::{
    EdgeType, GraphStore, NodeId, NodeType, Properties, StoreError, StoreResult, Value,
};

/// A user node together with its external identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserRecord {
    pub node: NodeId,
    pub id: UserId,
}

impl UserRecord {
    /// Look up an existing user
    pub fn find(store: &dyn GraphStore, id: UserId) -> StoreResult<Option<Self>> {
        Ok(store
            .find_indexed_node(NodeType::User, PROP_IDENTIFIER, id.as_i64())?
            .map(|node| UserRecord { node, id }))
    }

    /// Look up a user, creating it when it does not exist yet
    ///
    /// Returns the user and whether this call created it.
    pub fn load_or_create(store: &dyn GraphStore, id: UserId) -> StoreResult<(Self, bool)> {
        let mut properties = Properties::new();
        properties.insert(PROP_LAST_POST.to_string(), Value::Integer(0));
        let (node, created) =
            store.merge_indexed_node(NodeType::User, PROP_IDENTIFIER, id.as_i64(), properties)?;
        Ok((UserRecord { node, id }, created))
    }

    /// Build the proxy for a user node by reading its identifier
    pub fn from_node(store: &dyn GraphStore, node: NodeId) -> StoreResult<Self> {
        let raw = store.integer_property(node, PROP_IDENTIFIER)?.ok_or_else(|| {
            StoreError::InvalidOperation(format!("{} has no {} property", node, PROP_IDENTIFIER))
        })?;
        Ok(UserRecord {
            node,
            id: UserId::new(raw as u64),
        })
    }

    /// Timestamp of the user's newest post, 0 if it never posted
    pub fn last_post(&self, store: &dyn GraphStore) -> StoreResult<Timestamp> {
        Ok(store.integer_property(self.node, PROP_LAST_POST)?.unwrap_or(0))
    }

    pub fn set_last_post(&self, store: &dyn GraphStore, timestamp: Timestamp) -> StoreResult<()> {
        store.set_property(self.node, PROP_LAST_POST, Value::Integer(timestamp))
    }

    /// Head of the user's timeline
    pub fn newest_post(&self, store: &dyn GraphStore) -> StoreResult<Option<NodeId>> {
        store.next_node(self.node, EdgeType::Published)
    }
}
