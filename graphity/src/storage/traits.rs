// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph store contract
//!
//! Everything above the storage layer talks to the graph through this trait.
//! Implementations must be usable from many threads at once; each call is
//! atomic on its own, and multi-call consistency is the caller's business,
//! obtained through [`GraphStore::lock_node`].

use super::lock_table::NodeLockGuard;
use super::types::{Direction, Edge, EdgeType, NodeId, NodeType, StoreResult, StoreStatistics};
use super::value::{Properties, Value};
use std::time::Duration;

/// Typed node/edge store with per-node write locks
pub trait GraphStore: Send + Sync {
    /// Create a node of the given type carrying `properties`
    fn create_node(&self, node_type: NodeType, properties: Properties) -> StoreResult<NodeId>;

    /// Look up the node whose indexed `key` property equals `value`, creating
    /// it with `properties` when absent
    ///
    /// Returns the node and whether it was created by this call.
    fn merge_indexed_node(
        &self,
        node_type: NodeType,
        key: &str,
        value: i64,
        properties: Properties,
    ) -> StoreResult<(NodeId, bool)>;

    /// Look up a node by an indexed identifier property
    fn find_indexed_node(
        &self,
        node_type: NodeType,
        key: &str,
        value: i64,
    ) -> StoreResult<Option<NodeId>>;

    /// Delete a node that no longer has any edges
    fn delete_node(&self, node: NodeId) -> StoreResult<()>;

    /// Type of an existing node
    fn node_type(&self, node: NodeId) -> StoreResult<NodeType>;

    /// Handles of all nodes of one type, in creation order
    fn node_ids(&self, node_type: NodeType) -> StoreResult<Vec<NodeId>>;

    /// Create a directed typed edge
    fn create_edge(&self, start: NodeId, end: NodeId, edge_type: EdgeType) -> StoreResult<Edge>;

    /// Delete an edge from both of its endpoints
    fn delete_edge(&self, edge: &Edge) -> StoreResult<()>;

    /// All edges of a type touching `node` in the given direction
    fn edges(
        &self,
        node: NodeId,
        edge_type: EdgeType,
        direction: Direction,
    ) -> StoreResult<Vec<Edge>>;

    /// The only edge of a type touching `node` in the given direction
    ///
    /// Fails with `InvalidOperation` when more than one such edge exists.
    fn single_edge(
        &self,
        node: NodeId,
        edge_type: EdgeType,
        direction: Direction,
    ) -> StoreResult<Option<Edge>>;

    /// Atomically re-point the single outgoing edge of `edge_type` on `start`
    ///
    /// `Some(end)` makes `start -> end` the only such edge; `None` removes it.
    /// The new target's incoming side is linked before the outgoing pointer is
    /// swapped, so a reader following outgoing edges never meets a gap.
    fn set_single_edge(
        &self,
        start: NodeId,
        edge_type: EdgeType,
        end: Option<NodeId>,
    ) -> StoreResult<Option<Edge>>;

    /// Read a scalar property
    fn property(&self, node: NodeId, key: &str) -> StoreResult<Option<Value>>;

    /// Write a scalar property
    fn set_property(&self, node: NodeId, key: &str, value: Value) -> StoreResult<()>;

    /// Acquire the write lock on `node`, waiting at most `timeout`
    fn lock_node(&self, node: NodeId, timeout: Duration) -> StoreResult<NodeLockGuard>;

    /// Node and edge counts
    fn statistics(&self) -> StoreResult<StoreStatistics>;

    /// Read an integer property, treating a missing value as `None`
    fn integer_property(&self, node: NodeId, key: &str) -> StoreResult<Option<i64>> {
        Ok(self.property(node, key)?.and_then(|v| v.as_integer()))
    }

    /// Follow the single outgoing edge of `edge_type` from `node`
    fn next_node(&self, node: NodeId, edge_type: EdgeType) -> StoreResult<Option<NodeId>> {
        Ok(self
            .single_edge(node, edge_type, Direction::Outgoing)?
            .map(|edge| edge.end))
    }

    /// Follow the single incoming edge of `edge_type` back from `node`
    fn previous_node(&self, node: NodeId, edge_type: EdgeType) -> StoreResult<Option<NodeId>> {
        Ok(self
            .single_edge(node, edge_type, Direction::Incoming)?
            .map(|edge| edge.start))
    }
}
