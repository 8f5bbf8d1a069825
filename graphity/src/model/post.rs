// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Post node proxy and feed items

use super::ids::{PostId, Timestamp, UserId};
use super::{PROP_AUTHOR, PROP_MESSAGE, PROP_PUBLISHED};
use crate::storage::{GraphStore, NodeId, NodeType, Properties, StoreError, StoreResult, Value};
use serde::{Deserialize, Serialize};

/// An immutable post read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub node: NodeId,
    pub author: UserId,
    pub published: Timestamp,
    pub message: String,
}

impl PostRecord {
    /// Store a new post node; linking it into a timeline is up to the caller
    pub fn create(
        store: &dyn GraphStore,
        author: UserId,
        published: Timestamp,
        message: &str,
    ) -> StoreResult<Self> {
        let mut properties = Properties::new();
        properties.insert(PROP_AUTHOR.to_string(), Value::Integer(author.as_i64()));
        properties.insert(PROP_PUBLISHED.to_string(), Value::Integer(published));
        properties.insert(PROP_MESSAGE.to_string(), Value::from(message));
        let node = store.create_node(NodeType::Post, properties)?;
        Ok(PostRecord {
            node,
            author,
            published,
            message: message.to_string(),
        })
    }

    pub fn load(store: &dyn GraphStore, node: NodeId) -> StoreResult<Self> {
        let author = store
            .integer_property(node, PROP_AUTHOR)?
            .ok_or_else(|| missing(node, PROP_AUTHOR))?;
        let published = store
            .integer_property(node, PROP_PUBLISHED)?
            .ok_or_else(|| missing(node, PROP_PUBLISHED))?;
        let message = match store.property(node, PROP_MESSAGE)? {
            Some(Value::String(message)) => message,
            _ => return Err(missing(node, PROP_MESSAGE)),
        };
        Ok(PostRecord {
            node,
            author: UserId::new(author as u64),
            published,
            message,
        })
    }

    pub fn id(&self) -> PostId {
        self.node.id() as PostId
    }

    /// Render as a feed item
    pub fn to_feed_item(&self) -> FeedItem {
        FeedItem {
            author: self.author,
            timestamp: self.published,
            message: self.message.clone(),
            post_id: self.id(),
        }
    }
}

fn missing(node: NodeId, key: &str) -> StoreError {
    StoreError::InvalidOperation(format!("post {} has no {} property", node, key))
}

/// One entry of a news feed or timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedItem {
    pub author: UserId,
    pub timestamp: Timestamp,
    pub message: String,
    pub post_id: PostId,
}
