// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Per-author post timelines
//!
//! A user's `PUBLISHED` edge points at its newest post, and every post points
//! at the same author's previous post, giving a newest-first chain. Appending
//! links the new post to the old head before the user's head pointer is
//! swapped, so unlocked readers always see a complete chain.

use crate::model::{PostRecord, Timestamp, UserId, UserRecord};
use crate::storage::{EdgeType, GraphStore, NodeId, StoreResult};
use std::sync::Arc;

/// Newest-first post chains
pub struct PostTimeline {
    store: Arc<dyn GraphStore>,
}

impl PostTimeline {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Create a post and make it the head of its author's timeline
    ///
    /// The caller must hold the author's write lock.
    pub fn append(
        &self,
        author: &UserRecord,
        published: Timestamp,
        message: &str,
    ) -> StoreResult<PostRecord> {
        let store = self.store.as_ref();
        let post = PostRecord::create(store, author.id, published, message)?;

        if let Some(previous) = author.newest_post(store)? {
            store.create_edge(post.node, previous, EdgeType::Published)?;
        }
        store.set_single_edge(author.node, EdgeType::Published, Some(post.node))?;
        author.set_last_post(store, published)?;

        log::debug!("user {} published post {} at {}", author.id, post.id(), published);
        Ok(post)
    }

    /// Cursor over `user`'s posts, newest first
    pub fn cursor(&self, user: &UserRecord) -> StoreResult<TimelineCursor> {
        TimelineCursor::open(Arc::clone(&self.store), user)
    }

    /// Up to `limit` of `user`'s newest posts
    pub fn read(&self, user: &UserRecord, limit: usize) -> StoreResult<Vec<PostRecord>> {
        self.cursor(user)?.take(limit).collect()
    }

    /// Number of posts in `user`'s timeline
    pub fn len(&self, user: &UserRecord) -> StoreResult<usize> {
        let mut count = 0;
        for post in self.cursor(user)? {
            post?;
            count += 1;
        }
        Ok(count)
    }
}

/// Walks one author's posts from newest to oldest
///
/// The current post is loaded eagerly so it can be compared without touching
/// the store again; the merge in the feed reader ranks cursors by it.
pub struct TimelineCursor {
    store: Arc<dyn GraphStore>,
    author: UserId,
    current: Option<PostRecord>,
}

impl TimelineCursor {
    /// Position a cursor on `user`'s newest post
    pub fn open(store: Arc<dyn GraphStore>, user: &UserRecord) -> StoreResult<Self> {
        let head = user.newest_post(store.as_ref())?;
        Self::starting_at(store, user.id, head)
    }

    fn starting_at(
        store: Arc<dyn GraphStore>,
        author: UserId,
        node: Option<NodeId>,
    ) -> StoreResult<Self> {
        let current = match node {
            Some(node) => Some(PostRecord::load(store.as_ref(), node)?),
            None => None,
        };
        Ok(Self {
            store,
            author,
            current,
        })
    }

    pub fn author(&self) -> UserId {
        self.author
    }

    /// Post the cursor is positioned on
    pub fn current(&self) -> Option<&PostRecord> {
        self.current.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.current.is_none()
    }

    /// Return the current post and move to the next older one
    pub fn advance(&mut self) -> StoreResult<Option<PostRecord>> {
        let Some(post) = self.current.take() else {
            return Ok(None);
        };
        let older = self.store.next_node(post.node, EdgeType::Published)?;
        self.current = match older {
            Some(node) => Some(PostRecord::load(self.store.as_ref(), node)?),
            None => None,
        };
        Ok(Some(post))
    }
}

impl Iterator for TimelineCursor {
    type Item = StoreResult<PostRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGraphStore;

    fn setup() -> (Arc<dyn GraphStore>, PostTimeline, UserRecord) {
        let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::new());
        let timeline = PostTimeline::new(Arc::clone(&store));
        let (user, _) = UserRecord::load_or_create(store.as_ref(), UserId::new(1)).unwrap();
        (store, timeline, user)
    }

    #[test]
    fn test_append_keeps_newest_first() {
        let (store, timeline, user) = setup();
        for (i, message) in ["first", "second", "third"].iter().enumerate() {
            timeline.append(&user, 100 + i as i64, message).unwrap();
        }

        let posts = timeline.read(&user, 10).unwrap();
        let messages: Vec<_> = posts.iter().map(|p| p.message.as_str()).collect();
        assert_eq!(messages, vec!["third", "second", "first"]);
        assert_eq!(user.last_post(store.as_ref()).unwrap(), 102);
        assert_eq!(timeline.len(&user).unwrap(), 3);
    }

    #[test]
    fn test_read_respects_limit() {
        let (_store, timeline, user) = setup();
        for i in 0..5 {
            timeline.append(&user, i, "post").unwrap();
        }
        assert_eq!(timeline.read(&user, 2).unwrap().len(), 2);
        assert!(timeline.read(&user, 0).unwrap().is_empty());
    }

    #[test]
    fn test_cursor_on_empty_timeline() {
        let (_store, timeline, user) = setup();
        let mut cursor = timeline.cursor(&user).unwrap();
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.advance().unwrap(), None);
        assert_eq!(cursor.author(), UserId::new(1));
    }
}
