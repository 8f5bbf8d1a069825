//! Test utilities for Graphity integration tests
//!
//! - TestFixture: a social graph per index strategy, driven through the
//!   public SocialGraph API only

pub mod test_fixture;
