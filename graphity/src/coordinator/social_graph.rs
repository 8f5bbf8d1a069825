// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Social graph facade
//!
//! Wires the store, follow graph, timelines, ego-network index, feed reader
//! and lock coordinator together behind the public operations.
//!
//! Every mutation follows the same shape: validate identifiers, resolve the
//! users involved, lock the touched set, re-check the precondition under the
//! locks, then rewrite pointers. Nothing is locked or written before the
//! input has been validated.

use crate::config::{FollowPolicy, GraphityConfig, IndexStrategy};
use crate::ego::{create_ego_network, EgoNetwork};
use crate::error::{GraphityError, Result};
use crate::feed::{FeedReader, FeedStats};
use crate::graph::FollowGraph;
use crate::model::{FeedItem, IntoUserId, PostClock, PostId, UserId, UserRecord};
use crate::storage::{GraphStore, MemoryGraphStore};
use crate::timeline::PostTimeline;
use crate::txn::{LockCoordinator, LockStats};
use crate::verify::{self, IntegrityReport};
use serde::Serialize;
use std::sync::Arc;

/// Size of the social graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub users: usize,
    pub posts: usize,
    pub follows: usize,
    pub replicas: usize,
    pub ego_links: usize,
}

/// Social network with recency-ordered ego networks
///
/// This is the entry point of the crate. All operations take `&self` and
/// may be called from many threads at once.
///
/// # Example
/// ```ignore
/// use graphity::SocialGraph;
///
/// let graph = SocialGraph::with_strategy(IndexStrategy::Direct)?;
/// graph.add_follow(1, 2)?;
/// graph.post(2, "hello")?;
/// let feed = graph.read_feed(1, 15)?;
/// ```
pub struct SocialGraph {
    config: GraphityConfig,
    store: Arc<dyn GraphStore>,
    follows: FollowGraph,
    timeline: PostTimeline,
    ego: Box<dyn EgoNetwork>,
    feeds: FeedReader,
    locks: LockCoordinator,
    clock: PostClock,
}

impl SocialGraph {
    /// Create a social graph over a fresh in-memory store
    pub fn new(config: GraphityConfig) -> Result<Self> {
        config.validate()?;
        let store: Arc<dyn GraphStore> = Arc::new(MemoryGraphStore::with_shards(config.store_shards));
        Self::with_store(config, store)
    }

    /// Create a social graph with default settings and the given strategy
    pub fn with_strategy(strategy: IndexStrategy) -> Result<Self> {
        Self::new(GraphityConfig::with_strategy(strategy))
    }

    /// Create a social graph over an existing, empty store
    pub fn with_store(config: GraphityConfig, store: Arc<dyn GraphStore>) -> Result<Self> {
        config.validate()?;
        log::info!(
            "social graph ready: strategy={}, lock_timeout={:?}",
            config.index_strategy,
            config.lock_timeout
        );
        Ok(Self {
            follows: FollowGraph::new(Arc::clone(&store)),
            timeline: PostTimeline::new(Arc::clone(&store)),
            ego: create_ego_network(config.index_strategy, Arc::clone(&store)),
            feeds: FeedReader::new(Arc::clone(&store)),
            locks: LockCoordinator::new(
                Arc::clone(&store),
                config.lock_timeout,
                config.max_lock_attempts,
            ),
            clock: PostClock::new(),
            store,
            config,
        })
    }

    pub fn config(&self) -> &GraphityConfig {
        &self.config
    }

    pub fn strategy(&self) -> IndexStrategy {
        self.ego.strategy()
    }

    /// Register a user; returns false if it already existed
    pub fn add_user(&self, id: impl IntoUserId) -> Result<bool> {
        let id = id.into_user_id()?;
        let (_, created) = UserRecord::load_or_create(self.store.as_ref(), id)?;
        Ok(created)
    }

    /// Let `follower` follow `followed`, creating either user if needed
    ///
    /// Returns false when nothing changed: the pair was already linked, or
    /// it is a self-follow, under the `Ignore` policies.
    pub fn add_follow(&self, follower: impl IntoUserId, followed: impl IntoUserId) -> Result<bool> {
        let follower_id = follower.into_user_id()?;
        let followed_id = followed.into_user_id()?;

        if follower_id == followed_id {
            return match self.config.self_follow {
                FollowPolicy::Ignore => {
                    log::debug!("ignoring self-follow of {}", follower_id);
                    Ok(false)
                }
                FollowPolicy::Reject => Err(GraphityError::SelfFollow(follower_id)),
            };
        }

        let store = self.store.as_ref();
        let (follower, _) = UserRecord::load_or_create(store, follower_id)?;
        let (followed, _) = UserRecord::load_or_create(store, followed_id)?;
        if self.follows.is_following(&follower, &followed)? {
            return self.duplicate_follow(&follower, &followed);
        }

        {
            let _locks = self.locks.lock_with(&[follower, followed], || {
                Ok(self.ego.follow_lock_set(&follower, &followed)?)
            })?;

            if self.follows.is_following(&follower, &followed)? {
                return self.duplicate_follow(&follower, &followed);
            }

            let edge = self.follows.link(&follower, &followed)?;
            if let Err(err) = self.ego.insert(&follower, &followed) {
                if let Err(unlink_err) = self.follows.unlink(&edge) {
                    log::error!(
                        "could not undo follow {} -> {} after failed index insert: {}",
                        follower.id,
                        followed.id,
                        unlink_err
                    );
                }
                return Err(err.into());
            }
        }

        if self.config.announce_follows {
            self.post(follower.id, &format!("now follows {}", followed.id))?;
            self.post(followed.id, &format!("has new follower {}", follower.id))?;
        }
        Ok(true)
    }

    fn duplicate_follow(&self, follower: &UserRecord, followed: &UserRecord) -> Result<bool> {
        match self.config.duplicate_follow {
            FollowPolicy::Ignore => Ok(false),
            FollowPolicy::Reject => Err(GraphityError::AlreadyFollowing {
                follower: follower.id,
                followed: followed.id,
            }),
        }
    }

    /// Let `follower` stop following `followed`
    ///
    /// Returns false if `follower` did not follow `followed`.
    pub fn remove_follow(
        &self,
        follower: impl IntoUserId,
        followed: impl IntoUserId,
    ) -> Result<bool> {
        let follower_id = follower.into_user_id()?;
        let followed_id = followed.into_user_id()?;

        let store = self.store.as_ref();
        let follower = UserRecord::find(store, follower_id)?
            .ok_or(GraphityError::UnknownFollower(follower_id))?;
        let followed = UserRecord::find(store, followed_id)?
            .ok_or(GraphityError::UnknownFollowed(followed_id))?;
        if !self.follows.is_following(&follower, &followed)? {
            return Ok(false);
        }

        {
            let _locks = self.locks.lock_with(&[follower, followed], || {
                Ok(self.ego.unfollow_lock_set(&follower, &followed)?)
            })?;

            let Some(edge) = self.follows.follow_edge(&follower, &followed)? else {
                return Ok(false);
            };
            self.follows.unlink(&edge)?;
            if let Err(err) = self.ego.remove(&follower, &followed) {
                self.restore_follow(&follower, &followed);
                return Err(err.into());
            }
        }

        if self.config.announce_follows {
            self.post(follower.id, &format!("did unfollow {}", followed.id))?;
            self.post(followed.id, &format!("was unfollowed by {}", follower.id))?;
        }
        Ok(true)
    }

    /// Put back a follow edge whose index entry survived a failed removal
    fn restore_follow(&self, follower: &UserRecord, followed: &UserRecord) {
        let listed = self
            .ego
            .entries(follower)
            .map(|entries| entries.iter().any(|user| user.node == followed.node))
            .unwrap_or(true);
        if !listed {
            return;
        }
        if let Err(link_err) = self.follows.link(follower, followed) {
            log::error!(
                "could not restore follow {} -> {} after failed index removal: {}",
                follower.id,
                followed.id,
                link_err
            );
        }
    }

    /// Publish a post, creating the author if needed
    pub fn post(&self, author: impl IntoUserId, message: &str) -> Result<PostId> {
        let author_id = author.into_user_id()?;
        let (author, _) = UserRecord::load_or_create(self.store.as_ref(), author_id)?;

        let _locks = self
            .locks
            .lock_with(&[author], || Ok(self.ego.post_lock_set(&author)?))?;

        // Stamped under the locks so stamps follow lock-grant order
        let published = self.clock.next();
        let post = self.timeline.append(&author, published, message)?;
        let promoted = self.ego.promote(&author)?;
        log::debug!(
            "post {} by {} promoted in {} ego networks",
            post.id(),
            author.id,
            promoted
        );
        Ok(post.id())
    }

    /// Newest `limit` posts of the users `reader` follows, newest first
    pub fn read_feed(&self, reader: impl IntoUserId, limit: usize) -> Result<Vec<FeedItem>> {
        Ok(self.read_feed_with_stats(reader, limit)?.0)
    }

    /// [`read_feed`](Self::read_feed) together with merge counters
    pub fn read_feed_with_stats(
        &self,
        reader: impl IntoUserId,
        limit: usize,
    ) -> Result<(Vec<FeedItem>, FeedStats)> {
        let reader_id = reader.into_user_id()?;
        let reader = UserRecord::find(self.store.as_ref(), reader_id)?
            .ok_or(GraphityError::UnknownReader(reader_id))?;
        Ok(self.feeds.read(self.ego.as_ref(), &reader, limit)?)
    }

    /// Newest `limit` posts of `user` itself
    pub fn timeline(&self, user: impl IntoUserId, limit: usize) -> Result<Vec<FeedItem>> {
        let user = self.existing_user(user)?;
        Ok(self
            .timeline
            .read(&user, limit)?
            .iter()
            .map(|post| post.to_feed_item())
            .collect())
    }

    /// Users `user` follows, in follow order
    pub fn followees(&self, user: impl IntoUserId) -> Result<Vec<UserId>> {
        let user = self.existing_user(user)?;
        Ok(ids(self.follows.followees(&user)?))
    }

    /// Users following `user`, in follow order
    pub fn followers(&self, user: impl IntoUserId) -> Result<Vec<UserId>> {
        let user = self.existing_user(user)?;
        Ok(ids(self.follows.followers(&user)?))
    }

    /// Users `user` follows, most recently active first
    pub fn ego_network(&self, user: impl IntoUserId) -> Result<Vec<UserId>> {
        let user = self.existing_user(user)?;
        Ok(ids(self.ego.entries(&user)?))
    }

    /// Whether `follower` follows `followed`; unknown users follow no one
    pub fn is_following(
        &self,
        follower: impl IntoUserId,
        followed: impl IntoUserId,
    ) -> Result<bool> {
        let follower_id = follower.into_user_id()?;
        let followed_id = followed.into_user_id()?;
        let store = self.store.as_ref();
        match (
            UserRecord::find(store, follower_id)?,
            UserRecord::find(store, followed_id)?,
        ) {
            (Some(follower), Some(followed)) => {
                Ok(self.follows.is_following(&follower, &followed)?)
            }
            _ => Ok(false),
        }
    }

    pub fn stats(&self) -> Result<GraphStats> {
        let stats = self.store.statistics()?;
        Ok(GraphStats {
            users: stats.user_nodes,
            posts: stats.post_nodes,
            follows: stats.follow_edges,
            replicas: stats.replica_nodes,
            ego_links: stats.ego_edges,
        })
    }

    pub fn lock_stats(&self) -> LockStats {
        self.locks.stats()
    }

    /// Check timelines and ego networks of every user
    pub fn verify(&self) -> Result<IntegrityReport> {
        Ok(verify::check_graph(&self.store, self.ego.as_ref())?)
    }

    fn existing_user(&self, user: impl IntoUserId) -> Result<UserRecord> {
        let id = user.into_user_id()?;
        UserRecord::find(self.store.as_ref(), id)?.ok_or(GraphityError::UnknownUser(id))
    }
}

fn ids(users: Vec<UserRecord>) -> Vec<UserId> {
    users.into_iter().map(|user| user.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        Direction, Edge, EdgeType, NodeId, NodeLockGuard, NodeType, Properties, StoreError,
        StoreResult, StoreStatistics, Value,
    };
    use parking_lot::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Failure {
        DeleteReplica,
        RewriteEgoLink,
    }

    /// Memory store that can be told to fail one kind of write
    #[derive(Default)]
    struct FailingStore {
        inner: MemoryGraphStore,
        failure: Mutex<Option<Failure>>,
    }

    impl FailingStore {
        fn fail(&self, failure: Failure) {
            *self.failure.lock() = Some(failure);
        }

        fn failing(&self, failure: Failure) -> bool {
            *self.failure.lock() == Some(failure)
        }

        fn injected() -> StoreError {
            StoreError::InvalidOperation("injected failure".to_string())
        }
    }

    impl GraphStore for FailingStore {
        fn create_node(&self, node_type: NodeType, properties: Properties) -> StoreResult<NodeId> {
            self.inner.create_node(node_type, properties)
        }

        fn merge_indexed_node(
            &self,
            node_type: NodeType,
            key: &str,
            value: i64,
            properties: Properties,
        ) -> StoreResult<(NodeId, bool)> {
            self.inner.merge_indexed_node(node_type, key, value, properties)
        }

        fn find_indexed_node(
            &self,
            node_type: NodeType,
            key: &str,
            value: i64,
        ) -> StoreResult<Option<NodeId>> {
            self.inner.find_indexed_node(node_type, key, value)
        }

        fn delete_node(&self, node: NodeId) -> StoreResult<()> {
            if self.failing(Failure::DeleteReplica)
                && self.inner.node_type(node)? == NodeType::Replica
            {
                return Err(Self::injected());
            }
            self.inner.delete_node(node)
        }

        fn node_type(&self, node: NodeId) -> StoreResult<NodeType> {
            self.inner.node_type(node)
        }

        fn node_ids(&self, node_type: NodeType) -> StoreResult<Vec<NodeId>> {
            self.inner.node_ids(node_type)
        }

        fn create_edge(&self, start: NodeId, end: NodeId, edge_type: EdgeType) -> StoreResult<Edge> {
            self.inner.create_edge(start, end, edge_type)
        }

        fn delete_edge(&self, edge: &Edge) -> StoreResult<()> {
            self.inner.delete_edge(edge)
        }

        fn edges(
            &self,
            node: NodeId,
            edge_type: EdgeType,
            direction: Direction,
        ) -> StoreResult<Vec<Edge>> {
            self.inner.edges(node, edge_type, direction)
        }

        fn single_edge(
            &self,
            node: NodeId,
            edge_type: EdgeType,
            direction: Direction,
        ) -> StoreResult<Option<Edge>> {
            self.inner.single_edge(node, edge_type, direction)
        }

        fn set_single_edge(
            &self,
            start: NodeId,
            edge_type: EdgeType,
            end: Option<NodeId>,
        ) -> StoreResult<Option<Edge>> {
            if self.failing(Failure::RewriteEgoLink) && matches!(edge_type, EdgeType::Ego { .. }) {
                return Err(Self::injected());
            }
            self.inner.set_single_edge(start, edge_type, end)
        }

        fn property(&self, node: NodeId, key: &str) -> StoreResult<Option<Value>> {
            self.inner.property(node, key)
        }

        fn set_property(&self, node: NodeId, key: &str, value: Value) -> StoreResult<()> {
            self.inner.set_property(node, key, value)
        }

        fn lock_node(&self, node: NodeId, timeout: Duration) -> StoreResult<NodeLockGuard> {
            self.inner.lock_node(node, timeout)
        }

        fn statistics(&self) -> StoreResult<StoreStatistics> {
            self.inner.statistics()
        }
    }

    fn graph_over(strategy: IndexStrategy) -> (Arc<FailingStore>, SocialGraph) {
        let store = Arc::new(FailingStore::default());
        let graph =
            SocialGraph::with_store(GraphityConfig::with_strategy(strategy), store.clone()).unwrap();
        (store, graph)
    }

    fn messages(items: &[FeedItem]) -> Vec<&str> {
        items.iter().map(|item| item.message.as_str()).collect()
    }

    #[test]
    fn test_add_user_reports_creation() {
        let graph = SocialGraph::new(GraphityConfig::default()).unwrap();
        assert!(graph.add_user(1).unwrap());
        assert!(!graph.add_user("1").unwrap());
        assert!(matches!(
            graph.add_user(0),
            Err(GraphityError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_duplicate_follow_is_false_by_default() {
        let graph = SocialGraph::new(GraphityConfig::default()).unwrap();
        assert!(graph.add_follow(1, 2).unwrap());
        assert!(!graph.add_follow(1, 2).unwrap());
        assert_eq!(graph.followees(1).unwrap(), vec![UserId::new(2)]);
    }

    #[test]
    fn test_invalid_identifiers_have_no_side_effects() {
        let graph = SocialGraph::new(GraphityConfig::default()).unwrap();
        assert!(matches!(
            graph.add_follow(1, -2),
            Err(GraphityError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            graph.post("x", "hi"),
            Err(GraphityError::InvalidIdentifier(_))
        ));
        assert_eq!(graph.stats().unwrap(), GraphStats::default());
    }

    #[test]
    fn test_remove_follow_errors() {
        let graph = SocialGraph::new(GraphityConfig::default()).unwrap();
        graph.add_user(1).unwrap();
        assert_eq!(
            graph.remove_follow(5, 1),
            Err(GraphityError::UnknownFollower(UserId::new(5)))
        );
        assert_eq!(
            graph.remove_follow(1, 5),
            Err(GraphityError::UnknownFollowed(UserId::new(5)))
        );
        graph.add_user(2).unwrap();
        assert_eq!(graph.remove_follow(1, 2), Ok(false));
    }

    #[test]
    fn test_failed_replica_cleanup_still_drops_follow() {
        let (store, graph) = graph_over(IndexStrategy::Replica);
        graph.add_follow(1, 2).unwrap();
        graph.add_follow(1, 3).unwrap();
        graph.post(2, "hi").unwrap();

        // The entry is unlinked before its replica node fails to go away
        store.fail(Failure::DeleteReplica);
        assert!(matches!(
            graph.remove_follow(1, 2),
            Err(GraphityError::StorageFailure(_))
        ));
        assert!(!graph.is_following(1, 2).unwrap());
        assert_eq!(graph.ego_network(1).unwrap(), vec![UserId::new(3)]);
        assert!(graph.verify().unwrap().is_clean());

        *store.failure.lock() = None;
        assert!(graph.add_follow(1, 2).unwrap());
        assert_eq!(
            graph.ego_network(1).unwrap(),
            vec![UserId::new(2), UserId::new(3)]
        );
        assert!(graph.verify().unwrap().is_clean());
    }

    #[test]
    fn test_failed_unlink_restores_follow() {
        let (store, graph) = graph_over(IndexStrategy::Direct);
        graph.add_follow(1, 2).unwrap();
        graph.add_follow(1, 3).unwrap();

        store.fail(Failure::RewriteEgoLink);
        assert!(graph.remove_follow(1, 2).is_err());
        assert!(graph.is_following(1, 2).unwrap());
        assert_eq!(graph.ego_network(1).unwrap().len(), 2);
        assert!(graph.verify().unwrap().is_clean());
    }

    #[test]
    fn test_post_returns_distinct_ids_and_fills_timeline() {
        let graph = SocialGraph::new(GraphityConfig::default()).unwrap();
        let first = graph.post(3, "one").unwrap();
        let second = graph.post(3, "two").unwrap();
        assert_ne!(first, second);

        let timeline = graph.timeline(3, 10).unwrap();
        assert_eq!(messages(&timeline), vec!["two", "one"]);
        assert_eq!(timeline[0].post_id, second);
        assert!(timeline[0].timestamp > timeline[1].timestamp);
        assert_eq!(
            graph.timeline(4, 10),
            Err(GraphityError::UnknownUser(UserId::new(4)))
        );
    }

    #[test]
    fn test_feed_for_unknown_reader() {
        let graph = SocialGraph::new(GraphityConfig::default()).unwrap();
        assert_eq!(
            graph.read_feed(999, 10),
            Err(GraphityError::UnknownReader(UserId::new(999)))
        );
    }

    #[test]
    fn test_stats_count_replicas() {
        let graph = SocialGraph::with_strategy(IndexStrategy::Replica).unwrap();
        graph.add_follow(1, 2).unwrap();
        graph.add_follow(1, 3).unwrap();
        graph.post(2, "hi").unwrap();

        let stats = graph.stats().unwrap();
        assert_eq!(stats.users, 3);
        assert_eq!(stats.posts, 1);
        assert_eq!(stats.follows, 2);
        assert_eq!(stats.replicas, 2);

        graph.remove_follow(1, 3).unwrap();
        assert_eq!(graph.stats().unwrap().replicas, 1);
        assert!(graph.verify().unwrap().is_clean());
    }
}
