// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph store handles, node/edge types and error handling
//!
//! Nodes and edges are addressed by integer handles into the store's arena.
//! Edges are typed; the ego-network edge type carries the node owning the
//! list it belongs to, so one user node can sit in many followers' lists.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Handle of a node in the graph store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a handle from its raw value
    pub fn from_u64(id: u64) -> Self {
        NodeId(id)
    }

    /// Get the underlying handle value
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

/// Handle of an edge in the graph store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(u64);

impl EdgeId {
    pub fn from_u64(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge_{}", self.0)
    }
}

/// Items a social graph node can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// User that can act in the social network
    User,
    /// Status update displayed in news feeds
    Post,
    /// Private ego-network entry representing one follow relationship
    Replica,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::User => "User",
            NodeType::Post => "Post",
            NodeType::Replica => "Replica",
        };
        write!(f, "{}", name)
    }
}

/// Relations a social graph edge can represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// One user follows another one
    Follows,
    /// User -> newest post, and post -> previous post of the same author
    Published,
    /// Follower -> replica node of one followed user
    Replica,
    /// Replica node -> the followed user it stands for
    ReplicaOf,
    /// Link in the ego-network list owned by `owner`
    Ego { owner: NodeId },
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeType::Follows => write!(f, "FOLLOWS"),
            EdgeType::Published => write!(f, "PUBLISHED"),
            EdgeType::Replica => write!(f, "REPLICA"),
            EdgeType::ReplicaOf => write!(f, "REPLICA_OF"),
            EdgeType::Ego { owner } => write!(f, "EGO({})", owner),
        }
    }
}

/// Edge direction relative to the node being inspected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// Directed typed edge between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub edge_type: EdgeType,
    pub start: NodeId,
    pub end: NodeId,
}

impl Edge {
    /// Node at the far side of this edge as seen from `node`
    pub fn other(&self, node: NodeId) -> NodeId {
        if self.start == node {
            self.end
        } else {
            self.start
        }
    }

    /// Check if this edge goes from `start` to `end`
    pub fn goes_from_to(&self, start: NodeId, end: NodeId) -> bool {
        self.start == start && self.end == end
    }
}

/// Error types for graph store operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: from node {start} to node {end} - one or both nodes don't exist")]
    InvalidEdge { start: NodeId, end: NodeId },

    #[error("Timed out after {waited_ms} ms waiting for the write lock on {node}")]
    LockTimeout { node: NodeId, waited_ms: u64 },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl StoreError {
    /// Whether the failure is a lock contention signal rather than a data problem
    pub fn is_lock_conflict(&self) -> bool {
        matches!(self, StoreError::LockTimeout { .. })
    }
}

/// Result type for graph store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Node and edge counts for monitoring
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStatistics {
    pub user_nodes: usize,
    pub post_nodes: usize,
    pub replica_nodes: usize,
    pub follow_edges: usize,
    pub ego_edges: usize,
    pub published_edges: usize,
}
