// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory graph store
//!
//! Node records live in a sharded arena keyed by integer handles. Each record
//! keeps its own outgoing and incoming adjacency, so following a pointer is
//! one shard read. Shard latches are held for a single primitive call only;
//! logical exclusion across calls comes from the lock table.

use super::lock_table::{LockTable, NodeLockGuard};
use super::traits::GraphStore;
use super::types::{
    Direction, Edge, EdgeId, EdgeType, NodeId, NodeType, StoreError, StoreResult,
    StoreStatistics,
};
use super::value::{Properties, Value};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Number of arena shards when none is configured
pub const DEFAULT_STORE_SHARDS: usize = 16;

#[derive(Debug, Clone)]
struct NodeRecord {
    node_type: NodeType,
    properties: Properties,
    indexed: Option<(String, i64)>,
    outgoing: Vec<Edge>,
    incoming: Vec<Edge>,
}

impl NodeRecord {
    fn new(node_type: NodeType, properties: Properties) -> Self {
        Self {
            node_type,
            properties,
            indexed: None,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    fn adjacency(&self, direction: Direction) -> &Vec<Edge> {
        match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        }
    }
}

type IndexKey = (NodeType, String, i64);

/// Sharded in-memory implementation of [`GraphStore`]
pub struct MemoryGraphStore {
    shards: Vec<RwLock<HashMap<NodeId, NodeRecord>>>,
    identifiers: RwLock<HashMap<IndexKey, NodeId>>,
    locks: LockTable,
    next_node: AtomicU64,
    next_edge: AtomicU64,
}

impl MemoryGraphStore {
    /// Create an empty store with the default shard count
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_STORE_SHARDS)
    }

    /// Create an empty store with `shard_count` arena and lock shards
    pub fn with_shards(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        Self {
            shards: (0..shard_count)
                .map(|_| RwLock::new(HashMap::new()))
                .collect(),
            identifiers: RwLock::new(HashMap::new()),
            locks: LockTable::new(shard_count * 4),
            next_node: AtomicU64::new(1),
            next_edge: AtomicU64::new(1),
        }
    }

    fn shard(&self, node: NodeId) -> &RwLock<HashMap<NodeId, NodeRecord>> {
        &self.shards[(node.id() % self.shards.len() as u64) as usize]
    }

    fn allocate_node(&self) -> NodeId {
        NodeId::from_u64(self.next_node.fetch_add(1, Ordering::SeqCst))
    }

    fn allocate_edge(&self) -> EdgeId {
        EdgeId::from_u64(self.next_edge.fetch_add(1, Ordering::SeqCst))
    }

    fn insert_record(&self, record: NodeRecord) -> NodeId {
        let id = self.allocate_node();
        self.shard(id).write().insert(id, record);
        id
    }

    fn contains(&self, node: NodeId) -> bool {
        self.shard(node).read().contains_key(&node)
    }

    fn push_incoming(&self, edge: Edge) -> StoreResult<()> {
        let mut shard = self.shard(edge.end).write();
        let record = shard.get_mut(&edge.end).ok_or(StoreError::InvalidEdge {
            start: edge.start,
            end: edge.end,
        })?;
        record.incoming.push(edge);
        Ok(())
    }

    fn remove_incoming(&self, edge: &Edge) -> StoreResult<()> {
        let mut shard = self.shard(edge.end).write();
        let record = shard
            .get_mut(&edge.end)
            .ok_or(StoreError::NodeNotFound(edge.end))?;
        let before = record.incoming.len();
        record.incoming.retain(|e| e.id != edge.id);
        if record.incoming.len() == before {
            return Err(StoreError::EdgeNotFound(edge.id));
        }
        Ok(())
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for MemoryGraphStore {
    fn create_node(&self, node_type: NodeType, properties: Properties) -> StoreResult<NodeId> {
        Ok(self.insert_record(NodeRecord::new(node_type, properties)))
    }

    fn merge_indexed_node(
        &self,
        node_type: NodeType,
        key: &str,
        value: i64,
        mut properties: Properties,
    ) -> StoreResult<(NodeId, bool)> {
        let index_key = (node_type, key.to_string(), value);

        // Fast path without the exclusive latch
        if let Some(id) = self.identifiers.read().get(&index_key) {
            return Ok((*id, false));
        }

        let mut identifiers = self.identifiers.write();
        if let Some(id) = identifiers.get(&index_key) {
            return Ok((*id, false));
        }

        properties.insert(key.to_string(), Value::Integer(value));
        let mut record = NodeRecord::new(node_type, properties);
        record.indexed = Some((key.to_string(), value));
        let id = self.insert_record(record);
        identifiers.insert(index_key, id);
        log::debug!("created {} {} with {}={}", node_type, id, key, value);
        Ok((id, true))
    }

    fn find_indexed_node(
        &self,
        node_type: NodeType,
        key: &str,
        value: i64,
    ) -> StoreResult<Option<NodeId>> {
        Ok(self
            .identifiers
            .read()
            .get(&(node_type, key.to_string(), value))
            .copied())
    }

    fn delete_node(&self, node: NodeId) -> StoreResult<()> {
        let removed = {
            let mut shard = self.shard(node).write();
            let record = shard.get(&node).ok_or(StoreError::NodeNotFound(node))?;
            if !record.outgoing.is_empty() || !record.incoming.is_empty() {
                return Err(StoreError::InvalidOperation(format!(
                    "cannot delete {} while it still has {} edges",
                    node,
                    record.outgoing.len() + record.incoming.len()
                )));
            }
            shard.remove(&node)
        };

        if let Some(NodeRecord {
            node_type,
            indexed: Some((key, value)),
            ..
        }) = removed
        {
            self.identifiers.write().remove(&(node_type, key, value));
        }
        Ok(())
    }

    fn node_type(&self, node: NodeId) -> StoreResult<NodeType> {
        self.shard(node)
            .read()
            .get(&node)
            .map(|record| record.node_type)
            .ok_or(StoreError::NodeNotFound(node))
    }

    fn node_ids(&self, node_type: NodeType) -> StoreResult<Vec<NodeId>> {
        let mut ids: Vec<NodeId> = self
            .shards
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .iter()
                    .filter(|(_, record)| record.node_type == node_type)
                    .map(|(id, _)| *id)
                    .collect::<Vec<_>>()
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn create_edge(&self, start: NodeId, end: NodeId, edge_type: EdgeType) -> StoreResult<Edge> {
        if !self.contains(start) {
            return Err(StoreError::InvalidEdge { start, end });
        }

        let edge = Edge {
            id: self.allocate_edge(),
            edge_type,
            start,
            end,
        };

        self.push_incoming(edge)?;

        let mut shard = self.shard(start).write();
        match shard.get_mut(&start) {
            Some(record) => {
                record.outgoing.push(edge);
                Ok(edge)
            }
            None => {
                drop(shard);
                self.remove_incoming(&edge)?;
                Err(StoreError::InvalidEdge { start, end })
            }
        }
    }

    fn delete_edge(&self, edge: &Edge) -> StoreResult<()> {
        {
            let mut shard = self.shard(edge.start).write();
            let record = shard
                .get_mut(&edge.start)
                .ok_or(StoreError::NodeNotFound(edge.start))?;
            let before = record.outgoing.len();
            record.outgoing.retain(|e| e.id != edge.id);
            if record.outgoing.len() == before {
                return Err(StoreError::EdgeNotFound(edge.id));
            }
        }
        self.remove_incoming(edge)
    }

    fn edges(
        &self,
        node: NodeId,
        edge_type: EdgeType,
        direction: Direction,
    ) -> StoreResult<Vec<Edge>> {
        let shard = self.shard(node).read();
        let record = shard.get(&node).ok_or(StoreError::NodeNotFound(node))?;
        Ok(record
            .adjacency(direction)
            .iter()
            .filter(|edge| edge.edge_type == edge_type)
            .copied()
            .collect())
    }

    fn single_edge(
        &self,
        node: NodeId,
        edge_type: EdgeType,
        direction: Direction,
    ) -> StoreResult<Option<Edge>> {
        let shard = self.shard(node).read();
        let record = shard.get(&node).ok_or(StoreError::NodeNotFound(node))?;
        let mut matching = record
            .adjacency(direction)
            .iter()
            .filter(|edge| edge.edge_type == edge_type);

        let first = matching.next().copied();
        if matching.next().is_some() {
            return Err(StoreError::InvalidOperation(format!(
                "{} has more than one {:?} {} edge",
                node, direction, edge_type
            )));
        }
        Ok(first)
    }

    fn set_single_edge(
        &self,
        start: NodeId,
        edge_type: EdgeType,
        end: Option<NodeId>,
    ) -> StoreResult<Option<Edge>> {
        let current = self.single_edge(start, edge_type, Direction::Outgoing)?;
        if current.map(|edge| edge.end) == end {
            return Ok(current);
        }

        let replacement = match end {
            Some(end) => {
                let edge = Edge {
                    id: self.allocate_edge(),
                    edge_type,
                    start,
                    end,
                };
                self.push_incoming(edge)?;
                Some(edge)
            }
            None => None,
        };

        {
            let mut shard = self.shard(start).write();
            let record = shard
                .get_mut(&start)
                .ok_or(StoreError::NodeNotFound(start))?;
            if let Some(old) = current {
                record.outgoing.retain(|e| e.id != old.id);
            }
            if let Some(edge) = replacement {
                record.outgoing.push(edge);
            }
        }

        if let Some(old) = current {
            self.remove_incoming(&old)?;
        }
        Ok(replacement)
    }

    fn property(&self, node: NodeId, key: &str) -> StoreResult<Option<Value>> {
        let shard = self.shard(node).read();
        let record = shard.get(&node).ok_or(StoreError::NodeNotFound(node))?;
        Ok(record.properties.get(key).cloned())
    }

    fn set_property(&self, node: NodeId, key: &str, value: Value) -> StoreResult<()> {
        let mut shard = self.shard(node).write();
        let record = shard.get_mut(&node).ok_or(StoreError::NodeNotFound(node))?;
        record.properties.insert(key.to_string(), value);
        Ok(())
    }

    fn lock_node(&self, node: NodeId, timeout: Duration) -> StoreResult<NodeLockGuard> {
        if !self.contains(node) {
            return Err(StoreError::NodeNotFound(node));
        }
        self.locks.acquire(node, timeout)
    }

    fn statistics(&self) -> StoreResult<StoreStatistics> {
        let mut stats = StoreStatistics::default();
        for shard in &self.shards {
            for record in shard.read().values() {
                match record.node_type {
                    NodeType::User => stats.user_nodes += 1,
                    NodeType::Post => stats.post_nodes += 1,
                    NodeType::Replica => stats.replica_nodes += 1,
                }
                for edge in &record.outgoing {
                    match edge.edge_type {
                        EdgeType::Follows => stats.follow_edges += 1,
                        EdgeType::Published => stats.published_edges += 1,
                        EdgeType::Ego { .. } => stats.ego_edges += 1,
                        EdgeType::Replica | EdgeType::ReplicaOf => {}
                    }
                }
            }
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(store: &MemoryGraphStore, id: i64) -> NodeId {
        store
            .merge_indexed_node(NodeType::User, "identifier", id, Properties::new())
            .unwrap()
            .0
    }

    #[test]
    fn test_merge_indexed_node_is_idempotent() {
        let store = MemoryGraphStore::with_shards(2);
        let (a, created) = store
            .merge_indexed_node(NodeType::User, "identifier", 7, Properties::new())
            .unwrap();
        assert!(created);
        let (b, created) = store
            .merge_indexed_node(NodeType::User, "identifier", 7, Properties::new())
            .unwrap();
        assert!(!created);
        assert_eq!(a, b);
        assert_eq!(
            store.find_indexed_node(NodeType::User, "identifier", 7).unwrap(),
            Some(a)
        );
        assert_eq!(
            store.integer_property(a, "identifier").unwrap(),
            Some(7)
        );
        assert_eq!(
            store.find_indexed_node(NodeType::User, "identifier", 8).unwrap(),
            None
        );
    }

    #[test]
    fn test_edges_are_visible_from_both_ends() {
        let store = MemoryGraphStore::new();
        let a = user(&store, 1);
        let b = user(&store, 2);

        let edge = store.create_edge(a, b, EdgeType::Follows).unwrap();
        assert_eq!(
            store.edges(a, EdgeType::Follows, Direction::Outgoing).unwrap(),
            vec![edge]
        );
        assert_eq!(
            store.edges(b, EdgeType::Follows, Direction::Incoming).unwrap(),
            vec![edge]
        );
        assert!(store
            .edges(a, EdgeType::Published, Direction::Outgoing)
            .unwrap()
            .is_empty());

        store.delete_edge(&edge).unwrap();
        assert!(store
            .edges(b, EdgeType::Follows, Direction::Incoming)
            .unwrap()
            .is_empty());
        assert_eq!(
            store.delete_edge(&edge),
            Err(StoreError::EdgeNotFound(edge.id))
        );
    }

    #[test]
    fn test_create_edge_to_missing_node_fails() {
        let store = MemoryGraphStore::new();
        let a = user(&store, 1);
        let missing = NodeId::from_u64(999);
        assert!(matches!(
            store.create_edge(a, missing, EdgeType::Follows),
            Err(StoreError::InvalidEdge { .. })
        ));
        assert!(store
            .edges(a, EdgeType::Follows, Direction::Outgoing)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_set_single_edge_repoints() {
        let store = MemoryGraphStore::new();
        let owner = user(&store, 1);
        let b = user(&store, 2);
        let c = user(&store, 3);
        let ego = EdgeType::Ego { owner };

        store.set_single_edge(owner, ego, Some(b)).unwrap();
        assert_eq!(store.next_node(owner, ego).unwrap(), Some(b));
        assert_eq!(store.previous_node(b, ego).unwrap(), Some(owner));

        store.set_single_edge(owner, ego, Some(c)).unwrap();
        assert_eq!(store.next_node(owner, ego).unwrap(), Some(c));
        assert_eq!(store.previous_node(b, ego).unwrap(), None);
        assert_eq!(store.previous_node(c, ego).unwrap(), Some(owner));

        store.set_single_edge(owner, ego, None).unwrap();
        assert_eq!(store.next_node(owner, ego).unwrap(), None);
        assert_eq!(store.previous_node(c, ego).unwrap(), None);
    }

    #[test]
    fn test_single_edge_rejects_ambiguity() {
        let store = MemoryGraphStore::new();
        let a = user(&store, 1);
        let b = user(&store, 2);
        let c = user(&store, 3);
        store.create_edge(a, b, EdgeType::Follows).unwrap();
        store.create_edge(a, c, EdgeType::Follows).unwrap();
        assert!(matches!(
            store.single_edge(a, EdgeType::Follows, Direction::Outgoing),
            Err(StoreError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_delete_node_requires_no_edges() {
        let store = MemoryGraphStore::new();
        let a = user(&store, 1);
        let replica = store
            .create_node(NodeType::Replica, Properties::new())
            .unwrap();
        let edge = store.create_edge(a, replica, EdgeType::Replica).unwrap();

        assert!(matches!(
            store.delete_node(replica),
            Err(StoreError::InvalidOperation(_))
        ));
        store.delete_edge(&edge).unwrap();
        store.delete_node(replica).unwrap();
        assert_eq!(
            store.node_type(replica),
            Err(StoreError::NodeNotFound(replica))
        );
    }

    #[test]
    fn test_properties_and_statistics() {
        let store = MemoryGraphStore::new();
        let a = user(&store, 1);
        let post = store.create_node(NodeType::Post, Properties::new()).unwrap();
        store.set_property(a, "last_post", Value::Integer(42)).unwrap();
        store.create_edge(a, post, EdgeType::Published).unwrap();

        assert_eq!(store.integer_property(a, "last_post").unwrap(), Some(42));
        assert_eq!(store.property(a, "missing").unwrap(), None);

        let stats = store.statistics().unwrap();
        assert_eq!(stats.user_nodes, 1);
        assert_eq!(stats.post_nodes, 1);
        assert_eq!(stats.published_edges, 1);
        assert_eq!(store.node_ids(NodeType::User).unwrap(), vec![a]);
    }

    #[test]
    fn test_lock_node_requires_existing_node() {
        let store = MemoryGraphStore::new();
        let a = user(&store, 1);
        let guard = store.lock_node(a, Duration::from_millis(10)).unwrap();
        assert_eq!(guard.node(), a);
        assert!(store
            .lock_node(a, Duration::from_millis(10))
            .unwrap_err()
            .is_lock_conflict());
        assert!(matches!(
            store.lock_node(NodeId::from_u64(77), Duration::from_millis(10)),
            Err(StoreError::NodeNotFound(_))
        ));
    }
}
