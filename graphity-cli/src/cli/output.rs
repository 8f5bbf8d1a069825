// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Feed and statistics formatting for CLI output

use chrono::{DateTime, Utc};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use graphity::{FeedItem, GraphStats, LockStats, Timestamp};

use super::commands::OutputFormat;

/// Formatter for feeds and run summaries
pub struct FeedFormatter;

impl FeedFormatter {
    /// Format one feed page in the specified format
    pub fn format(reader: &str, items: &[FeedItem], format: OutputFormat) -> String {
        match format {
            OutputFormat::Table => Self::format_table(reader, items),
            OutputFormat::Json => Self::format_json(reader, items),
        }
    }

    fn format_table(reader: &str, items: &[FeedItem]) -> String {
        let mut output = format!("{}\n", format!("Feed of user {}", reader).bold().green());
        if items.is_empty() {
            output.push_str(&format!("{}\n", "No posts found".yellow()));
            return output;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(
            ["Published", "Author", "Post", "Message"]
                .iter()
                .map(|col| Cell::new(col).fg(Color::Green))
                .collect::<Vec<_>>(),
        );
        for item in items {
            table.add_row(vec![
                Self::timestamp_to_string(item.timestamp),
                item.author.to_string(),
                item.post_id.to_string(),
                item.message.clone(),
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output
    }

    fn format_json(reader: &str, items: &[FeedItem]) -> String {
        let json = serde_json::json!({
            "reader": reader,
            "items": items,
            "count": items.len(),
        });
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| {
            "{\"status\": \"error\", \"error\": \"Could not serialize feed to JSON\"}".to_string()
        })
    }

    /// Render a millisecond stamp as UTC time, falling back to the raw number
    pub fn timestamp_to_string(timestamp: Timestamp) -> String {
        DateTime::<Utc>::from_timestamp_millis(timestamp)
            .map(|time| time.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| timestamp.to_string())
    }

    /// Graph size and lock counters as a two-column table
    pub fn format_stats(stats: &GraphStats, locks: &LockStats) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Metric").fg(Color::Green),
            Cell::new("Value").fg(Color::Green),
        ]);
        let rows: [(&str, String); 9] = [
            ("users", stats.users.to_string()),
            ("posts", stats.posts.to_string()),
            ("follows", stats.follows.to_string()),
            ("replicas", stats.replicas.to_string()),
            ("ego links", stats.ego_links.to_string()),
            ("lock acquisitions", locks.acquisitions.to_string()),
            ("contended locks", locks.contended.to_string()),
            ("lock restarts", locks.restarts.to_string()),
            ("lock wait", format!("{:?}", locks.total_wait)),
        ];
        for (name, value) in rows {
            table.add_row(vec![name.to_string(), value]);
        }
        format!("{}\n{}\n", "Graph statistics".bold().green(), table)
    }
}
