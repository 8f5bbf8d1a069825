// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! News feed reads
//!
//! A feed is a bounded k-way merge of followed users' timelines. Open
//! timeline cursors sit in a max-heap ranked by the publish time of the post
//! they are positioned on.
//!
//! With an ego-network index, cursors are admitted lazily in list order.
//! The list is sorted by each user's newest post, so the next entry cannot
//! hold anything newer than the newest post of the entry admitted before it;
//! it only has to join the merge once that post has been emitted. An entry
//! without posts ends admission, since every entry after it has none either.
//! Without an index every followed timeline is opened up front.
//!
//! Reads take no logical locks. A promotion racing the reader can move a
//! user with newer posts behind entries already admitted; posts ranking at
//! or above the last emitted one are skipped so the page stays strictly
//! newest-first.

use crate::ego::{EgoEntry, EgoNetwork};
use crate::graph::FollowGraph;
use crate::model::{FeedItem, PostId, Timestamp, UserRecord};
use crate::storage::{GraphStore, NodeId, StoreResult};
use crate::timeline::TimelineCursor;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;

/// Counters describing the work done by one feed read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedStats {
    /// Timeline cursors that joined the merge
    pub cursors_opened: usize,
    /// Posts returned
    pub posts_emitted: usize,
    /// Ego-network entries looked at
    pub entries_scanned: usize,
    /// Posts passed over because they outranked one already emitted
    pub stale_skipped: usize,
}

/// Cursor ranked by its current post
struct RankedCursor {
    rank: (Timestamp, PostId),
    user: NodeId,
    cursor: TimelineCursor,
}

impl RankedCursor {
    fn new(user: NodeId, cursor: TimelineCursor) -> Option<Self> {
        let rank = cursor.current().map(|post| (post.published, post.id()))?;
        Some(Self { rank, user, cursor })
    }
}

impl Ord for RankedCursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank.cmp(&other.rank)
    }
}

impl PartialOrd for RankedCursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for RankedCursor {}

impl PartialEq for RankedCursor {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank
    }
}

/// Lazy admission state along an ego network
struct Admission<'a> {
    ego: &'a dyn EgoNetwork,
    reader: &'a UserRecord,
    /// Most recently admitted entry, while more entries may follow it
    frontier: Option<EgoEntry>,
}

/// Bounded k-way merge over followed users' timelines
pub struct FeedReader {
    store: Arc<dyn GraphStore>,
    follows: FollowGraph,
}

impl FeedReader {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            follows: FollowGraph::new(Arc::clone(&store)),
            store,
        }
    }

    /// Up to `limit` of the newest posts by users `reader` follows
    pub fn read(
        &self,
        ego: &dyn EgoNetwork,
        reader: &UserRecord,
        limit: usize,
    ) -> StoreResult<(Vec<FeedItem>, FeedStats)> {
        let mut stats = FeedStats::default();
        let mut items = Vec::with_capacity(limit.min(64));
        if limit == 0 {
            return Ok((items, stats));
        }

        let mut heap = BinaryHeap::new();
        let mut admitted = HashSet::new();
        let mut admission = None;

        if ego.is_indexed() {
            let mut lazy = Admission {
                ego,
                reader,
                frontier: None,
            };
            let first = ego.first_entry(reader)?;
            self.admit_from(&mut lazy, first, &mut heap, &mut admitted, &mut stats)?;
            admission = Some(lazy);
        } else {
            for user in self.follows.followees(reader)? {
                stats.entries_scanned += 1;
                self.open(&user, &mut heap, &mut admitted, &mut stats)?;
            }
        }

        let mut last_rank: Option<(Timestamp, PostId)> = None;
        while items.len() < limit {
            let Some(mut top) = heap.pop() else {
                break;
            };
            let Some(post) = top.cursor.advance()? else {
                continue;
            };
            let rank = (post.published, post.id());
            if last_rank.map_or(false, |last| rank >= last) {
                stats.stale_skipped += 1;
            } else {
                items.push(post.to_feed_item());
                stats.posts_emitted += 1;
                last_rank = Some(rank);
            }

            if let Some(lazy) = admission.as_mut() {
                let frontier_passed = lazy
                    .frontier
                    .map_or(false, |entry| entry.user.node == top.user);
                if frontier_passed {
                    let frontier = lazy.frontier.take();
                    let next = match frontier {
                        Some(entry) => ego.next_entry(reader, &entry)?,
                        None => None,
                    };
                    self.admit_from(lazy, next, &mut heap, &mut admitted, &mut stats)?;
                }
            }

            if let Some(ranked) = RankedCursor::new(top.user, top.cursor) {
                heap.push(ranked);
            }
        }

        log::debug!(
            "feed of {}: {} posts from {} cursors ({} entries scanned, {} stale)",
            reader.id,
            stats.posts_emitted,
            stats.cursors_opened,
            stats.entries_scanned,
            stats.stale_skipped
        );
        Ok((items, stats))
    }

    /// Admit `entry`, or the first entry after it not admitted yet
    ///
    /// Entries already admitted can reappear when a concurrent promotion
    /// moves the list under the reader; they are skipped, but never more
    /// often than there are admitted users.
    fn admit_from(
        &self,
        lazy: &mut Admission<'_>,
        mut entry: Option<EgoEntry>,
        heap: &mut BinaryHeap<RankedCursor>,
        admitted: &mut HashSet<NodeId>,
        stats: &mut FeedStats,
    ) -> StoreResult<()> {
        let mut skipped = 0;
        while let Some(current) = entry {
            stats.entries_scanned += 1;
            if admitted.contains(&current.user.node) {
                skipped += 1;
                if skipped > admitted.len() {
                    break;
                }
                entry = lazy.ego.next_entry(lazy.reader, &current)?;
                continue;
            }

            if self.open(&current.user, heap, admitted, stats)? {
                lazy.frontier = Some(current);
            }
            return Ok(());
        }
        lazy.frontier = None;
        Ok(())
    }

    /// Open `user`'s timeline; false if it has no posts
    fn open(
        &self,
        user: &UserRecord,
        heap: &mut BinaryHeap<RankedCursor>,
        admitted: &mut HashSet<NodeId>,
        stats: &mut FeedStats,
    ) -> StoreResult<bool> {
        admitted.insert(user.node);
        let cursor = TimelineCursor::open(Arc::clone(&self.store), user)?;
        match RankedCursor::new(user.node, cursor) {
            Some(ranked) => {
                stats.cursors_opened += 1;
                heap.push(ranked);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
