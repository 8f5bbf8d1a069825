// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for Graphity

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use graphity::{GraphityConfig, IndexStrategy, SocialGraph};
use std::path::Path;

use super::commands::OutputFormat;
use super::output::FeedFormatter;
use super::workload::{RunReport, Workload};

/// Follows and posts of the demo graph
const DEMO_FOLLOWS: [(u64, u64); 5] = [(1, 2), (1, 3), (1, 4), (2, 1), (2, 4)];
const DEMO_POSTS: [(u64, &str); 6] = [
    (4, "mine"),
    (4, "of"),
    (3, "friend"),
    (2, "dear"),
    (2, "my"),
    (3, "hello"),
];

/// Resolve the configuration from an optional file and strategy override
pub fn load_config(
    path: Option<&Path>,
    strategy: Option<IndexStrategy>,
) -> Result<GraphityConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => GraphityConfig::from_json_file(path)
            .map_err(|e| format!("Failed to load configuration {:?}: {}", path, e))?,
        None => GraphityConfig::default(),
    };
    if let Some(strategy) = strategy {
        config.index_strategy = strategy;
    }
    Ok(config)
}

/// Handle the demo command
pub fn handle_demo(
    config: GraphityConfig,
    limit: usize,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let graph = SocialGraph::new(config)?;
    println!(
        "{}",
        format!("Building demo graph ({} index)...", graph.strategy())
            .bold()
            .green()
    );

    for (follower, followed) in DEMO_FOLLOWS {
        graph.add_follow(follower, followed)?;
        println!("  → {} follows {}", follower, followed);
    }
    for (author, message) in DEMO_POSTS {
        graph.post(author, message)?;
        println!("  → {} posts {:?}", author, message);
    }
    println!();

    for reader in [1u64, 2] {
        let items = graph.read_feed(reader, limit)?;
        println!("{}", FeedFormatter::format(&reader.to_string(), &items, format));
    }

    if format == OutputFormat::Table {
        let ego: Vec<String> = graph
            .ego_network(1u64)?
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!("Ego network of user 1: {}\n", ego.join(" → ").cyan());
        println!(
            "{}",
            FeedFormatter::format_stats(&graph.stats()?, &graph.lock_stats())
        );
    }
    Ok(())
}

/// Handle the replay command
pub fn handle_replay(
    config: GraphityConfig,
    file: &Path,
    format: OutputFormat,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let workload = Workload::from_file(file)?;
    let graph = SocialGraph::new(config)?;
    log::info!(
        "replaying {} steps from {:?} on the {} index",
        workload.len(),
        file,
        graph.strategy()
    );

    let report = workload.run(&graph)?;
    for read in &report.feeds {
        println!("{}", FeedFormatter::format(&read.reader, &read.items, format));
    }

    if format == OutputFormat::Table {
        print_rejections(&report);
        println!(
            "{}",
            format!("{} steps in {:?}", report.steps, report.elapsed).bold()
        );
        println!(
            "{}",
            FeedFormatter::format_stats(&graph.stats()?, &graph.lock_stats())
        );
    }

    if verify {
        let integrity = graph.verify()?;
        if !integrity.is_clean() {
            for violation in &integrity.violations {
                eprintln!("{}", violation.to_string().red());
            }
            return Err(format!(
                "{} integrity violations found",
                integrity.violations.len()
            )
            .into());
        }
        println!(
            "{}",
            format!(
                "✅ Integrity check passed ({} users, {} posts, {} entries)",
                integrity.users_checked, integrity.posts_checked, integrity.entries_checked
            )
            .green()
        );
    }
    Ok(())
}

/// Handle the compare command
///
/// The configured strategy is ignored; every strategy replays the script on
/// its own graph and the feeds are checked against the unindexed baseline.
pub fn handle_compare(
    config: GraphityConfig,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let workload = Workload::from_file(file)?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(
        ["Strategy", "Steps", "Rejected", "Feeds", "Elapsed", "Matches baseline"]
            .iter()
            .map(|col| Cell::new(col).fg(Color::Green))
            .collect::<Vec<_>>(),
    );

    let mut baseline: Option<Vec<Vec<(u64, String)>>> = None;
    let mut mismatches = 0;
    for strategy in IndexStrategy::all() {
        let graph = SocialGraph::new(GraphityConfig {
            index_strategy: strategy,
            ..config.clone()
        })?;
        let report = workload.run(&graph)?;
        let feeds = feed_messages(&report);

        let matches = match &baseline {
            None => {
                baseline = Some(feeds);
                true
            }
            Some(expected) => *expected == feeds,
        };
        if !matches {
            mismatches += 1;
        }

        table.add_row(vec![
            Cell::new(strategy),
            Cell::new(report.steps),
            Cell::new(report.rejected.len()),
            Cell::new(report.feeds.len()),
            Cell::new(format!("{:?}", report.elapsed)),
            if matches {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("NO").fg(Color::Red)
            },
        ]);
    }

    println!("{}", "Strategy comparison".bold().green());
    println!("{}", table);
    if mismatches > 0 {
        return Err(format!("{} strategies disagree with the baseline", mismatches).into());
    }
    Ok(())
}

fn print_rejections(report: &RunReport) {
    if report.rejected.is_empty() {
        return;
    }
    println!("{}", "Rejected operations:".bold().yellow());
    for (line, err) in &report.rejected {
        println!("  line {}: {}", line, err.to_string().yellow());
    }
    println!();
}

/// Feeds of a run as (author, message) pairs; stamps differ between runs
fn feed_messages(report: &RunReport) -> Vec<Vec<(u64, String)>> {
    report
        .feeds
        .iter()
        .map(|read| {
            read.items
                .iter()
                .map(|item| (item.author.get(), item.message.clone()))
                .collect()
        })
        .collect()
}
