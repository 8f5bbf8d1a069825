//! Test fixture for Graphity integration tests
//!
//! Wraps a fresh SocialGraph and adds shorthands for building graphs and
//! reading feeds back as plain messages.

#![allow(dead_code)]

use graphity::{
    FeedItem, GraphityConfig, GraphityError, IndexStrategy, SocialGraph, UserId,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Route library logs to the test harness; `RUST_LOG` picks the level
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Assert a feed read is strictly newest-first, free of duplicates and holds
/// no posts of the reader itself
pub fn assert_feed_well_formed(reader: u64, feed: &[FeedItem]) {
    assert!(
        feed.windows(2).all(|w| w[0].timestamp > w[1].timestamp),
        "feed of {} not newest-first: {:?}",
        reader,
        feed
    );
    let mut seen = HashSet::new();
    assert!(
        feed.iter().all(|item| seen.insert(item.post_id)),
        "feed of {} repeats a post: {:?}",
        reader,
        feed
    );
    assert!(feed.iter().all(|item| item.author.get() != reader));
}

/// Test fixture with an isolated social graph
pub struct TestFixture {
    graph: Arc<SocialGraph>,
}

impl TestFixture {
    /// Create a fixture with default configuration for `strategy`
    pub fn new(strategy: IndexStrategy) -> Result<Self, GraphityError> {
        Self::with_config(GraphityConfig::with_strategy(strategy))
    }

    pub fn with_config(config: GraphityConfig) -> Result<Self, GraphityError> {
        init_test_logging();
        Ok(Self {
            graph: Arc::new(SocialGraph::new(config)?),
        })
    }

    /// One fixture per index strategy
    pub fn for_all_strategies() -> Vec<Self> {
        IndexStrategy::all()
            .into_iter()
            .map(|strategy| Self::new(strategy).expect("Failed to create fixture"))
            .collect()
    }

    pub fn graph(&self) -> &SocialGraph {
        &self.graph
    }

    /// Shared handle for use across threads
    pub fn shared(&self) -> Arc<SocialGraph> {
        Arc::clone(&self.graph)
    }

    pub fn strategy(&self) -> IndexStrategy {
        self.graph.strategy()
    }

    pub fn follow(&self, follower: u64, followed: u64) -> bool {
        self.graph
            .add_follow(follower, followed)
            .expect("add_follow should succeed")
    }

    pub fn unfollow(&self, follower: u64, followed: u64) -> bool {
        self.graph
            .remove_follow(follower, followed)
            .expect("remove_follow should succeed")
    }

    pub fn post(&self, author: u64, message: &str) -> i64 {
        self.graph.post(author, message).expect("post should succeed")
    }

    pub fn feed(&self, reader: u64, limit: usize) -> Vec<FeedItem> {
        self.graph
            .read_feed(reader, limit)
            .expect("read_feed should succeed")
    }

    /// Feed as (author, message) pairs
    pub fn feed_messages(&self, reader: u64, limit: usize) -> Vec<(u64, String)> {
        self.feed(reader, limit)
            .into_iter()
            .map(|item| (item.author.get(), item.message))
            .collect()
    }

    pub fn ego_network(&self, user: u64) -> Vec<u64> {
        self.graph
            .ego_network(user)
            .expect("ego_network should succeed")
            .into_iter()
            .map(|id: UserId| id.get())
            .collect()
    }

    /// Build the reference graph: follows 1->2, 1->3, 1->4, 2->1, 2->4 and
    /// six posts by users 4, 3 and 2
    pub fn load_reference_scenario(&self) {
        for (follower, followed) in [(1, 2), (1, 3), (1, 4), (2, 1), (2, 4)] {
            assert!(self.follow(follower, followed));
        }
        for (author, message) in [
            (4, "mine"),
            (4, "of"),
            (3, "friend"),
            (2, "dear"),
            (2, "my"),
            (3, "hello"),
        ] {
            self.post(author, message);
        }
    }

    /// Assert the graph's structural invariants hold
    pub fn assert_consistent(&self) {
        let report = self.graph.verify().expect("verify should succeed");
        assert!(
            report.is_clean(),
            "{} graph has violations: {:?}",
            self.strategy(),
            report.violations
        );
    }
}
