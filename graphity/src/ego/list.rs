// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Recency-ordered singly linked list of ego-network entries
//!
//! The list of owner `F` is the chain of `EGO(F)` edges starting at `F`'s own
//! node. Every rewrite keeps the chain reachable from `F` without gaps: an
//! entry is attached to its successor before its predecessor points at it,
//! and a removed entry's neighbours are bridged before the entry lets go of
//! its successor. Unlocked readers therefore always find a well-formed list,
//! although one that moves under them may show them an entry twice.

use crate::model::Timestamp;
use crate::storage::{EdgeType, GraphStore, NodeId, StoreError, StoreResult};
use std::collections::HashSet;

/// View of one owner's ego-network list
pub struct EgoList<'a> {
    store: &'a dyn GraphStore,
    owner: NodeId,
}

impl<'a> EgoList<'a> {
    pub fn new(store: &'a dyn GraphStore, owner: NodeId) -> Self {
        Self { store, owner }
    }

    fn link(&self) -> EdgeType {
        EdgeType::Ego { owner: self.owner }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// First entry of the list
    pub fn head(&self) -> StoreResult<Option<NodeId>> {
        self.store.next_node(self.owner, self.link())
    }

    /// Entry after `entry`
    pub fn next(&self, entry: NodeId) -> StoreResult<Option<NodeId>> {
        self.store.next_node(entry, self.link())
    }

    /// Node pointing at `entry`: the previous entry, or the owner for the head
    pub fn previous(&self, entry: NodeId) -> StoreResult<Option<NodeId>> {
        self.store.previous_node(entry, self.link())
    }

    /// Whether `entry` is currently linked into this list
    pub fn contains(&self, entry: NodeId) -> StoreResult<bool> {
        Ok(self.previous(entry)?.is_some())
    }

    /// All entries in list order
    ///
    /// A node seen twice ends the walk, so a walk racing a writer terminates.
    pub fn entries(&self) -> StoreResult<Vec<NodeId>> {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        let mut current = self.head()?;
        while let Some(entry) = current {
            if !seen.insert(entry) {
                break;
            }
            entries.push(entry);
            current = self.next(entry)?;
        }
        Ok(entries)
    }

    /// Find where an entry with recency `key` belongs
    ///
    /// Walks past every entry whose key is greater than or equal to `key`, so
    /// a new entry lands after older entries with the same key. Returns the
    /// node to splice after (the owner when the entry becomes the head) and
    /// the entry that will follow it.
    pub fn insertion_point<F>(
        &self,
        key: Timestamp,
        recency: F,
    ) -> StoreResult<(NodeId, Option<NodeId>)>
    where
        F: Fn(NodeId) -> StoreResult<Timestamp>,
    {
        let mut seen = HashSet::new();
        let mut previous = self.owner;
        let mut current = self.head()?;
        while let Some(entry) = current {
            if !seen.insert(entry) {
                return Err(StoreError::InvalidOperation(format!(
                    "ego list of {} changed during traversal",
                    self.owner
                )));
            }
            if recency(entry)? < key {
                break;
            }
            previous = entry;
            current = self.next(entry)?;
        }
        Ok((previous, current))
    }

    /// Link `entry` directly after `previous` (which may be the owner)
    pub fn splice_in(&self, previous: NodeId, entry: NodeId) -> StoreResult<()> {
        let link = self.link();
        let successor = self.store.next_node(previous, link)?;
        self.store.set_single_edge(entry, link, successor)?;
        self.store.set_single_edge(previous, link, Some(entry))?;
        Ok(())
    }

    /// Unlink `entry`, bridging its neighbours
    pub fn unlink(&self, entry: NodeId) -> StoreResult<()> {
        let link = self.link();
        let previous = self
            .previous(entry)?
            .ok_or_else(|| self.not_linked(entry))?;
        let successor = self.next(entry)?;
        self.store.set_single_edge(previous, link, successor)?;
        self.store.set_single_edge(entry, link, None)?;
        Ok(())
    }

    /// Move a linked entry to the front of the list
    ///
    /// Returns false when it already was the head.
    pub fn move_to_head(&self, entry: NodeId) -> StoreResult<bool> {
        let link = self.link();
        let head = self.head()?;
        if head == Some(entry) {
            return Ok(false);
        }
        let previous = self
            .previous(entry)?
            .ok_or_else(|| self.not_linked(entry))?;
        let successor = self.next(entry)?;

        self.store.set_single_edge(previous, link, successor)?;
        self.store.set_single_edge(entry, link, head)?;
        self.store.set_single_edge(self.owner, link, Some(entry))?;
        Ok(true)
    }

    fn not_linked(&self, entry: NodeId) -> StoreError {
        StoreError::InvalidOperation(format!(
            "{} is not linked into the ego list of {}",
            entry, self.owner
        ))
    }
}
