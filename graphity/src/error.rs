// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Social graph error types
//!
//! Client-input problems (bad identifiers, unknown users, policy rejections)
//! are reported before anything is locked or written. Lock contention and
//! store failures are the retryable class: nothing about the request itself
//! was wrong, so resubmitting the whole operation may succeed.

use crate::model::UserId;
use crate::storage::StoreError;
use thiserror::Error;

/// Errors returned by [`SocialGraph`](crate::SocialGraph) operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphityError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Unknown follower: {0}")]
    UnknownFollower(UserId),

    #[error("Unknown followed user: {0}")]
    UnknownFollowed(UserId),

    #[error("Unknown reader: {0}")]
    UnknownReader(UserId),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("User {0} cannot follow itself")]
    SelfFollow(UserId),

    #[error("User {follower} already follows {followed}")]
    AlreadyFollowing { follower: UserId, followed: UserId },

    #[error("Lock conflict: {0}")]
    LockConflict(String),

    #[error("Storage failure: {0}")]
    StorageFailure(StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraphityError {
    /// Whether resubmitting the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GraphityError::LockConflict(_) | GraphityError::StorageFailure(_)
        )
    }

    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        !self.is_retryable() && !matches!(self, GraphityError::Config(_))
    }
}

impl From<StoreError> for GraphityError {
    fn from(error: StoreError) -> Self {
        if error.is_lock_conflict() {
            GraphityError::LockConflict(error.to_string())
        } else {
            GraphityError::StorageFailure(error)
        }
    }
}

impl From<serde_json::Error> for GraphityError {
    fn from(error: serde_json::Error) -> Self {
        GraphityError::Config(error.to_string())
    }
}

impl From<std::io::Error> for GraphityError {
    fn from(error: std::io::Error) -> Self {
        GraphityError::Config(error.to_string())
    }
}

/// Result type for social graph operations
pub type Result<T> = std::result::Result<T, GraphityError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NodeId;

    #[test]
    fn test_lock_timeout_becomes_lock_conflict() {
        let err: GraphityError = StoreError::LockTimeout {
            node: NodeId::from_u64(4),
            waited_ms: 250,
        }
        .into();
        assert!(matches!(err, GraphityError::LockConflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_store_failure_is_retryable() {
        let err: GraphityError = StoreError::NodeNotFound(NodeId::from_u64(4)).into();
        assert!(matches!(err, GraphityError::StorageFailure(_)));
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_input_errors_are_not_retryable() {
        let errors = [
            GraphityError::InvalidIdentifier("-1".to_string()),
            GraphityError::UnknownReader(UserId::new(999)),
            GraphityError::SelfFollow(UserId::new(1)),
        ];
        for err in errors {
            assert!(!err.is_retryable());
            assert!(err.is_client_error());
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            GraphityError::UnknownReader(UserId::new(999)).to_string(),
            "Unknown reader: 999"
        );
        assert_eq!(
            GraphityError::AlreadyFollowing {
                follower: UserId::new(1),
                followed: UserId::new(2)
            }
            .to_string(),
            "User 1 already follows 2"
        );
    }
}
