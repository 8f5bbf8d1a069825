// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Workload scripts
//!
//! One operation per line, `#` starts a comment:
//!
//! ```text
//! user 1
//! follow 1 2
//! unfollow 1 2
//! post 2 hello world
//! feed 1 15
//! ```
//!
//! User identifiers are kept as written so the graph itself decides which
//! ones are valid.

use graphity::{FeedItem, GraphityError, SocialGraph};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors reading a workload script
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error("Could not read workload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// One scripted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    User(String),
    Follow(String, String),
    Unfollow(String, String),
    Post(String, String),
    Feed(String, usize),
}

/// Step together with its script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub step: Step,
}

/// Parsed workload script
#[derive(Debug, Clone, Default)]
pub struct Workload {
    pub lines: Vec<ScriptLine>,
}

/// A feed read performed during a run
#[derive(Debug, Clone)]
pub struct FeedRead {
    pub line: usize,
    pub reader: String,
    pub limit: usize,
    pub items: Vec<FeedItem>,
}

/// Outcome of running a workload
#[derive(Debug, Default)]
pub struct RunReport {
    pub steps: usize,
    pub feeds: Vec<FeedRead>,
    /// Operations the graph refused, with their line numbers
    pub rejected: Vec<(usize, GraphityError)>,
    pub elapsed: Duration,
}

impl Workload {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WorkloadError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, WorkloadError> {
        let mut lines = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = index + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }
            let step = parse_step(content).map_err(|message| WorkloadError::Parse { line, message })?;
            lines.push(ScriptLine { line, step });
        }
        Ok(Self { lines })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Run every step against `graph`
    ///
    /// Client errors are collected in the report and the run goes on; any
    /// other failure stops it.
    pub fn run(&self, graph: &SocialGraph) -> Result<RunReport, GraphityError> {
        let mut report = RunReport::default();
        let start = Instant::now();

        for ScriptLine { line, step } in &self.lines {
            let result = match step {
                Step::User(id) => graph.add_user(id).map(|_| ()),
                Step::Follow(a, b) => graph.add_follow(a, b).map(|_| ()),
                Step::Unfollow(a, b) => graph.remove_follow(a, b).map(|_| ()),
                Step::Post(author, message) => graph.post(author, message).map(|_| ()),
                Step::Feed(reader, limit) => graph.read_feed(reader, *limit).map(|items| {
                    report.feeds.push(FeedRead {
                        line: *line,
                        reader: reader.clone(),
                        limit: *limit,
                        items,
                    });
                }),
            };
            report.steps += 1;

            match result {
                Ok(()) => {}
                Err(err) if err.is_client_error() => {
                    log::info!("line {}: {}", line, err);
                    report.rejected.push((*line, err));
                }
                Err(err) => return Err(err),
            }
        }

        report.elapsed = start.elapsed();
        Ok(report)
    }
}

fn parse_step(content: &str) -> Result<Step, String> {
    let (keyword, rest) = match content.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (content, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    match keyword.to_lowercase().as_str() {
        "user" => match args.as_slice() {
            [id] => Ok(Step::User(id.to_string())),
            _ => Err("expected: user <id>".to_string()),
        },
        "follow" => match args.as_slice() {
            [a, b] => Ok(Step::Follow(a.to_string(), b.to_string())),
            _ => Err("expected: follow <follower> <followed>".to_string()),
        },
        "unfollow" => match args.as_slice() {
            [a, b] => Ok(Step::Unfollow(a.to_string(), b.to_string())),
            _ => Err("expected: unfollow <follower> <followed>".to_string()),
        },
        "post" => match rest.split_once(char::is_whitespace) {
            Some((author, message)) => Ok(Step::Post(author.to_string(), message.trim().to_string())),
            None if !rest.is_empty() => Ok(Step::Post(rest.to_string(), String::new())),
            None => Err("expected: post <author> <message>".to_string()),
        },
        "feed" => match args.as_slice() {
            [reader] => Ok(Step::Feed(reader.to_string(), 15)),
            [reader, limit] => limit
                .parse()
                .map(|limit| Step::Feed(reader.to_string(), limit))
                .map_err(|_| format!("invalid feed limit '{}'", limit)),
            _ => Err("expected: feed <reader> [limit]".to_string()),
        },
        other => Err(format!("unknown operation '{}'", other)),
    }
}
