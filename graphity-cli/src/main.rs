// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Graphity CLI entry point

use clap::Parser;
use colored::Colorize;

mod cli;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if let Some(level) = cli.log_level {
        level.to_level_filter()
    } else {
        // RUST_LOG can still override this
        log::LevelFilter::Warn
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    match cli.command {
        Commands::Version => {
            println!("{} {}", "Graphity".bold().green(), graphity::VERSION);
            println!("Recency-ordered ego-network index for news feeds");
            Ok(())
        }

        Commands::Demo { limit, format } => {
            let config = cli::load_config(cli.config.as_deref(), cli.strategy)?;
            cli::handle_demo(config, limit, format)
        }

        Commands::Replay {
            file,
            format,
            verify,
        } => {
            let config = cli::load_config(cli.config.as_deref(), cli.strategy)?;
            cli::handle_replay(config, &file, format, verify)
        }

        Commands::Compare { file } => {
            let config = cli::load_config(cli.config.as_deref(), cli.strategy)?;
            cli::handle_compare(config, &file)
        }
    }
}
