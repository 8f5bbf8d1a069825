// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for Graphity
//!
//! Runs the built-in demo graph, replays workload scripts against one index
//! strategy, and compares all strategies on the same script.

pub mod commands;
pub mod handlers;
pub mod output;
pub mod workload;

pub use commands::{Cli, Commands};
pub use handlers::{handle_compare, handle_demo, handle_replay, load_config};
