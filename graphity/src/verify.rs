// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Structural integrity checks
//!
//! Walks every user's timeline and ego network and reports where they break
//! their ordering or membership rules. Meant for tests and offline checks on
//! a quiescent graph; concurrent writers can produce transient reports.

use crate::ego::EgoNetwork;
use crate::graph::FollowGraph;
use crate::model::{UserId, UserRecord};
use crate::storage::{GraphStore, NodeType, StoreResult};
use crate::timeline::PostTimeline;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Kinds of integrity violations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Violation {
    /// A post in the timeline is not older than the one before it
    TimelineOrder { user: UserId, position: usize },
    /// A post in the timeline belongs to someone else
    TimelineAuthor { user: UserId, author: UserId },
    /// The cached last-post stamp disagrees with the newest post
    LastPostMismatch {
        user: UserId,
        cached: i64,
        newest: i64,
    },
    /// The ego network lists a user more than once
    DuplicateEntry { owner: UserId, user: UserId },
    /// The ego network lists a user that is not followed
    UnexpectedEntry { owner: UserId, user: UserId },
    /// A followed user is missing from the ego network
    MissingEntry { owner: UserId, user: UserId },
    /// An ego-network entry is more recent than the one before it
    EgoOrder { owner: UserId, position: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::TimelineOrder { user, position } => {
                write!(f, "timeline of {} out of order at position {}", user, position)
            }
            Violation::TimelineAuthor { user, author } => {
                write!(f, "timeline of {} holds a post by {}", user, author)
            }
            Violation::LastPostMismatch {
                user,
                cached,
                newest,
            } => write!(
                f,
                "user {} caches last post {} but its newest post is {}",
                user, cached, newest
            ),
            Violation::DuplicateEntry { owner, user } => {
                write!(f, "ego network of {} lists {} twice", owner, user)
            }
            Violation::UnexpectedEntry { owner, user } => {
                write!(f, "ego network of {} lists {} without following", owner, user)
            }
            Violation::MissingEntry { owner, user } => {
                write!(f, "ego network of {} is missing {}", owner, user)
            }
            Violation::EgoOrder { owner, position } => {
                write!(f, "ego network of {} out of order at position {}", owner, position)
            }
        }
    }
}

/// Outcome of an integrity check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub users_checked: usize,
    pub posts_checked: usize,
    pub entries_checked: usize,
    pub violations: Vec<Violation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check every user in `store` against the rules of `ego`
pub fn check_graph(
    store: &Arc<dyn GraphStore>,
    ego: &dyn EgoNetwork,
) -> StoreResult<IntegrityReport> {
    let follows = FollowGraph::new(Arc::clone(store));
    let timeline = PostTimeline::new(Arc::clone(store));
    let mut report = IntegrityReport::default();

    for node in store.node_ids(NodeType::User)? {
        let user = UserRecord::from_node(store.as_ref(), node)?;
        report.users_checked += 1;
        check_timeline(store.as_ref(), &timeline, &user, &mut report)?;
        if ego.is_indexed() {
            check_ego_network(store.as_ref(), &follows, ego, &user, &mut report)?;
        }
    }

    if !report.is_clean() {
        log::warn!(
            "integrity check found {} violations",
            report.violations.len()
        );
    }
    Ok(report)
}

fn check_timeline(
    store: &dyn GraphStore,
    timeline: &PostTimeline,
    user: &UserRecord,
    report: &mut IntegrityReport,
) -> StoreResult<()> {
    let mut previous = None;
    let mut newest = 0;
    for (position, post) in timeline.cursor(user)?.enumerate() {
        let post = post?;
        report.posts_checked += 1;
        if position == 0 {
            newest = post.published;
        }
        if post.author != user.id {
            report.violations.push(Violation::TimelineAuthor {
                user: user.id,
                author: post.author,
            });
        }
        if let Some(previous) = previous {
            if post.published >= previous {
                report.violations.push(Violation::TimelineOrder {
                    user: user.id,
                    position,
                });
            }
        }
        previous = Some(post.published);
    }

    let cached = user.last_post(store)?;
    if cached != newest {
        report.violations.push(Violation::LastPostMismatch {
            user: user.id,
            cached,
            newest,
        });
    }
    Ok(())
}

fn check_ego_network(
    store: &dyn GraphStore,
    follows: &FollowGraph,
    ego: &dyn EgoNetwork,
    owner: &UserRecord,
    report: &mut IntegrityReport,
) -> StoreResult<()> {
    let followed: HashSet<UserId> = follows.followees(owner)?.iter().map(|u| u.id).collect();
    let mut seen = HashSet::new();
    let mut previous_key = None;

    for (position, entry) in ego.entries(owner)?.iter().enumerate() {
        report.entries_checked += 1;
        if !seen.insert(entry.id) {
            report.violations.push(Violation::DuplicateEntry {
                owner: owner.id,
                user: entry.id,
            });
        }
        if !followed.contains(&entry.id) {
            report.violations.push(Violation::UnexpectedEntry {
                owner: owner.id,
                user: entry.id,
            });
        }
        let key = entry.last_post(store)?;
        if previous_key.map_or(false, |previous| key > previous) {
            report.violations.push(Violation::EgoOrder {
                owner: owner.id,
                position,
            });
        }
        previous_key = Some(key);
    }

    for user in followed.difference(&seen) {
        report.violations.push(Violation::MissingEntry {
            owner: owner.id,
            user: *user,
        });
    }
    Ok(())
}
