// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graphity - recency-ordered ego-network index for social news feeds
//!
//! Every user keeps the accounts it follows in a linked list ordered by each
//! account's newest post. Writes pay for keeping that order (a post moves its
//! author to the front of every follower's list); feed reads walk the list
//! and open only as many timelines as the requested page needs.
//!
//! # Features
//!
//! - **Three index strategies**: direct entries, private replica entries,
//!   and an unindexed baseline, all producing identical feeds
//! - **Concurrent mutations**: follow, unfollow and post lock the users they
//!   touch in ascending identifier order, so overlapping operations never
//!   deadlock
//! - **Lock-free reads**: feed reads see a possibly stale but always
//!   well-formed index
//! - **Pluggable storage**: everything runs on the [`storage::GraphStore`]
//!   contract; an in-memory sharded store is included
//!
//! # Usage
//!
//! ```ignore
//! use graphity::{GraphityConfig, IndexStrategy, SocialGraph};
//!
//! let graph = SocialGraph::new(GraphityConfig::with_strategy(IndexStrategy::Replica))?;
//! graph.add_follow(1, 2)?;
//! graph.post(2, "hello")?;
//! for item in graph.read_feed(1, 15)? {
//!     println!("{} {} {}", item.timestamp, item.author, item.message);
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod ego;
pub mod error;
pub mod feed;
pub mod graph;
pub mod model;
pub mod storage;
pub mod timeline;
pub mod txn;
pub mod verify;

// Re-export the public API - SocialGraph is the entry point
pub use config::{FollowPolicy, GraphityConfig, IndexStrategy};
pub use coordinator::{GraphStats, SocialGraph};
pub use error::{GraphityError, Result};
pub use feed::FeedStats;
pub use model::{FeedItem, IntoUserId, PostId, Timestamp, UserId};
pub use txn::LockStats;
pub use verify::{IntegrityReport, Violation};

/// Graphity version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Graphity crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
