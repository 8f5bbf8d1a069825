// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Social graph configuration

use crate::error::{GraphityError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// How each follower's ego network is kept
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum IndexStrategy {
    /// No index; feed reads open every followed timeline
    /// Best for: correctness baseline, write-heavy loads
    Unindexed,

    /// Followed users' own nodes are linked into the follower's list
    /// Best for: low memory, moderate fan-in
    #[default]
    Direct,

    /// One private replica node per follow relationship
    /// Best for: popular accounts, where direct splicing would contend
    Replica,
}

impl IndexStrategy {
    /// Whether the strategy keeps a recency-ordered list per follower
    pub fn is_indexed(&self) -> bool {
        !matches!(self, IndexStrategy::Unindexed)
    }

    /// All strategies, in declaration order
    pub fn all() -> [IndexStrategy; 3] {
        [
            IndexStrategy::Unindexed,
            IndexStrategy::Direct,
            IndexStrategy::Replica,
        ]
    }
}

impl std::str::FromStr for IndexStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unindexed" | "baseline" => Ok(IndexStrategy::Unindexed),
            "direct" => Ok(IndexStrategy::Direct),
            "replica" => Ok(IndexStrategy::Replica),
            _ => Err(format!(
                "Unknown index strategy: {}. Valid options: unindexed, direct, replica",
                s
            )),
        }
    }
}

impl std::fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexStrategy::Unindexed => "unindexed",
            IndexStrategy::Direct => "direct",
            IndexStrategy::Replica => "replica",
        };
        write!(f, "{}", name)
    }
}

/// What to do with a follow request that cannot change the graph
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FollowPolicy {
    /// Report `false` and leave the graph untouched
    #[default]
    Ignore,
    /// Fail with a client error
    Reject,
}

impl std::str::FromStr for FollowPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(FollowPolicy::Ignore),
            "reject" => Ok(FollowPolicy::Reject),
            _ => Err(format!(
                "Unknown follow policy: {}. Valid options: ignore, reject",
                s
            )),
        }
    }
}

impl std::fmt::Display for FollowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FollowPolicy::Ignore => write!(f, "ignore"),
            FollowPolicy::Reject => write!(f, "reject"),
        }
    }
}

/// Configuration for a [`SocialGraph`](crate::SocialGraph)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphityConfig {
    /// Ego-network index strategy
    pub index_strategy: IndexStrategy,

    /// Longest wait for a single node lock before reporting a conflict
    pub lock_timeout: Duration,

    /// Lock plan recomputations allowed before giving up
    pub max_lock_attempts: usize,

    /// Handling of a user following itself
    pub self_follow: FollowPolicy,

    /// Handling of following a user that is already followed
    pub duplicate_follow: FollowPolicy,

    /// Post a status update when follow relationships change
    pub announce_follows: bool,

    /// Shards of the in-memory store
    pub store_shards: usize,
}

impl Default for GraphityConfig {
    fn default() -> Self {
        Self {
            index_strategy: IndexStrategy::Direct,
            lock_timeout: Duration::from_secs(5),
            max_lock_attempts: 8,
            self_follow: FollowPolicy::Ignore,
            duplicate_follow: FollowPolicy::Ignore,
            announce_follows: false,
            store_shards: 16,
        }
    }
}

impl GraphityConfig {
    /// Default configuration using `strategy`
    pub fn with_strategy(strategy: IndexStrategy) -> Self {
        Self {
            index_strategy: strategy,
            ..Self::default()
        }
    }

    /// Check that the values can drive a social graph
    pub fn validate(&self) -> Result<()> {
        if self.lock_timeout.is_zero() {
            return Err(GraphityError::Config(
                "lock_timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_lock_attempts == 0 {
            return Err(GraphityError::Config(
                "max_lock_attempts must be at least 1".to_string(),
            ));
        }
        if self.store_shards == 0 {
            return Err(GraphityError::Config(
                "store_shards must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load and validate a configuration from a JSON file
    ///
    /// Missing fields take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: GraphityConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!(
            "loaded configuration from {}: strategy={}",
            path.as_ref().display(),
            config.index_strategy
        );
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
