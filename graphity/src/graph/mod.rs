// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Social graph relationships

pub mod follow;

pub use follow::FollowGraph;
