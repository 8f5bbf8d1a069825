// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use graphity::IndexStrategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "graphity", version, about = "Graphity news-feed index driver")]
pub struct Cli {
    /// Ego-network index strategy: unindexed, direct or replica
    #[arg(short, long, global = true)]
    pub strategy: Option<IndexStrategy>,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<log::Level>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a small sample graph and print its feeds
    Demo {
        /// Feed page size
        #[arg(short, long, default_value_t = 15)]
        limit: usize,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Run a workload script and print every feed it reads
    Replay {
        /// Workload script
        file: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Check index integrity after the run
        #[arg(long)]
        verify: bool,
    },

    /// Run a workload script on every strategy and compare the results
    Compare {
        /// Workload script
        file: PathBuf,
    },

    /// Show version information
    Version,
}

/// Feed output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "graphity",
            "replay",
            "script.txt",
            "--strategy",
            "replica",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.strategy, Some(IndexStrategy::Replica));
        assert!(cli.verbose);
        match cli.command {
            Commands::Replay {
                file,
                format,
                verify,
            } => {
                assert_eq!(file, PathBuf::from("script.txt"));
                assert_eq!(format, OutputFormat::Json);
                assert!(!verify);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["graphity", "demo", "--strategy", "sorted"]).is_err());
    }
}
