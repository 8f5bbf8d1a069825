// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lock coordination for multi-user mutations
//!
//! # Features
//! - Deadlock-free acquisition in ascending user identifier order
//! - Lock set re-planning under the held locks
//! - Timeout-based conflict reporting instead of indefinite waits
//! - Contention counters

pub mod lock_manager;
pub mod lock_tracker;

pub use lock_manager::{LockCoordinator, LockPlan, LockSet};
pub use lock_tracker::{LockStats, LockTracker};
