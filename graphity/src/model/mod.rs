// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Users, posts and the identifiers that name them

pub mod clock;
pub mod ids;
pub mod post;
pub mod user;

pub use clock::PostClock;
pub use ids::{IntoUserId, PostId, Timestamp, UserId};
pub use post::{FeedItem, PostRecord};
pub use user::UserRecord;

/// Indexed external identifier of a user
pub const PROP_IDENTIFIER: &str = "identifier";
/// Timestamp of a user's newest post
pub const PROP_LAST_POST: &str = "last_post";
/// Publish timestamp of a post
pub const PROP_PUBLISHED: &str = "published";
pub const PROP_MESSAGE: &str = "message";
/// Identifier of a post's author
pub const PROP_AUTHOR: &str = "author";
/// Node of the follower owning a replica
pub const PROP_OWNER: &str = "owner";
