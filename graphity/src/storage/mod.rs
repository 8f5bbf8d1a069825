// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graph storage for the social graph
//!
//! This module provides:
//! - Node/edge handles, typed edges and store errors
//! - Scalar property values
//! - The [`GraphStore`] contract the index is built on
//! - A sharded in-memory store with per-node write locks

pub mod lock_table;
pub mod memory;
pub mod traits;
pub mod types;
pub mod value;

pub use lock_table::{LockTable, NodeLockGuard};
pub use memory::MemoryGraphStore;
pub use traits::GraphStore;
pub use types::{
    Direction, Edge, EdgeId, EdgeType, NodeId, NodeType, StoreError, StoreResult,
    StoreStatistics,
};
pub use value::{Properties, Value};
