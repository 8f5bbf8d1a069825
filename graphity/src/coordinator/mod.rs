// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Public entry point coordinating the social graph components

pub mod social_graph;

pub use social_graph::{GraphStats, SocialGraph};
