//! Collapse command - preview the rescans a batch of changes would cause

use crate::cli::app::CollapseArgs;
use anyhow::{Context, Result};
use std::io::{self, BufRead};
use std::path::Path;
use syncwatch_core::{Aggregator, AncestorMatch, ReportSet, Settings};

pub fn execute(args: CollapseArgs, config: Option<&Path>) -> Result<()> {
    let settings = Settings::load(config)?;
    let paths = if args.paths.is_empty() {
        read_paths(io::stdin().lock())?
    } else {
        args.paths
    };

    let ancestor_match = if args.legacy_substring {
        AncestorMatch::Substring
    } else {
        settings.debounce.ancestor_match
    };
    let aggregator = Aggregator::new(&args.root)
        .with_threshold(args.dir_vs_files.unwrap_or(settings.debounce.dir_vs_files))
        .with_ancestor_match(ancestor_match);

    let report = aggregator.collapse(&paths);
    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        print!("{}", render(&report));
    }
    Ok(())
}

fn read_paths(reader: impl BufRead) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line.context("failed to read paths from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            paths.push(line.to_string());
        }
    }
    Ok(paths)
}

/// One entry per line; the root itself shows as `.`
fn render(report: &ReportSet) -> String {
    report
        .iter()
        .map(|entry| if entry.is_empty() { ".\n".to_string() } else { format!("{entry}\n") })
        .collect()
}
