// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! User identifiers and their validation

use crate::error::{GraphityError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Identifier of a post (the handle of its node in the store)
pub type PostId = i64;

/// Externally assigned, strictly positive user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw identifier without validation
    pub fn new(id: u64) -> Self {
        UserId(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// Identifier as stored in the graph's identifier index
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Conversion of caller-supplied identifiers into a validated [`UserId`]
///
/// Identifiers arrive as integers or as text (request files, CLI arguments).
/// Anything that is not a positive integer representable in the store's
/// identifier index is an [`GraphityError::InvalidIdentifier`].
pub trait IntoUserId {
    fn into_user_id(self) -> Result<UserId>;
}

impl IntoUserId for UserId {
    fn into_user_id(self) -> Result<UserId> {
        if self.0 == 0 || self.0 > i64::MAX as u64 {
            return Err(GraphityError::InvalidIdentifier(self.0.to_string()));
        }
        Ok(self)
    }
}

impl IntoUserId for i64 {
    fn into_user_id(self) -> Result<UserId> {
        if self <= 0 {
            return Err(GraphityError::InvalidIdentifier(self.to_string()));
        }
        Ok(UserId(self as u64))
    }
}

impl IntoUserId for i32 {
    fn into_user_id(self) -> Result<UserId> {
        i64::from(self).into_user_id()
    }
}

impl IntoUserId for u64 {
    fn into_user_id(self) -> Result<UserId> {
        UserId(self).into_user_id()
    }
}

impl IntoUserId for &str {
    fn into_user_id(self) -> Result<UserId> {
        self.trim()
            .parse::<i64>()
            .map_err(|_| GraphityError::InvalidIdentifier(self.to_string()))?
            .into_user_id()
    }
}

impl IntoUserId for String {
    fn into_user_id(self) -> Result<UserId> {
        self.as_str().into_user_id()
    }
}

impl IntoUserId for &String {
    fn into_user_id(self) -> Result<UserId> {
        self.as_str().into_user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_integers_are_accepted() {
        assert_eq!(1i64.into_user_id(), Ok(UserId::new(1)));
        assert_eq!(42u64.into_user_id(), Ok(UserId::new(42)));
        assert_eq!(" 17 ".into_user_id(), Ok(UserId::new(17)));
        assert_eq!("9".to_string().into_user_id(), Ok(UserId::new(9)));
    }

    #[test]
    fn test_non_positive_and_malformed_are_rejected() {
        for bad in ["0", "-3", "abc", "", "1.5", "99999999999999999999"] {
            assert!(
                matches!(bad.into_user_id(), Err(GraphityError::InvalidIdentifier(_))),
                "{:?} should be rejected",
                bad
            );
        }
        assert!(0i64.into_user_id().is_err());
        assert!((-1i32).into_user_id().is_err());
        assert!(u64::MAX.into_user_id().is_err());
    }

    #[test]
    fn test_display_is_bare_number() {
        assert_eq!(UserId::new(123).to_string(), "123");
        assert_eq!(UserId::new(123).as_i64(), 123);
    }
}
