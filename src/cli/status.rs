//! Status command implementation

use crate::config::Config;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Data lake root directory; overrides the configured root
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Per-book summary of what the lake holds
#[derive(Debug, Default)]
struct BookSummary {
    partitions: usize,
    latest_file: Option<String>,
}

impl StatusArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let lake_root = self
            .output
            .clone()
            .unwrap_or_else(|| config.data.lake_root.clone());
        let markets = lake_root.join("markets");

        if !markets.is_dir() {
            println!("No data lake at {}", lake_root.display());
            return Ok(());
        }

        println!("Data lake: {}", lake_root.display());
        let mut books: Vec<_> = fs::read_dir(&markets)?
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        books.sort();

        for book in books {
            let summary = summarize_book(&markets.join(&book).join("bid_ask_spread"));
            match summary.latest_file {
                Some(latest) => println!(
                    "  {book}: {} partition file(s), latest {latest}",
                    summary.partitions
                ),
                None => println!("  {book}: no partition files"),
            }
        }

        Ok(())
    }
}

/// Walk `<book>/bid_ask_spread/<date>/<hour>` and count partition files
fn summarize_book(spread_dir: &Path) -> BookSummary {
    let mut summary = BookSummary::default();

    let hour_dirs = list_dirs(spread_dir)
        .into_iter()
        .flat_map(|date_dir| list_dirs(&date_dir));

    for hour_dir in hour_dirs {
        let Ok(entries) = fs::read_dir(&hour_dir) else {
            continue;
        };
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".csv") {
                continue;
            }
            summary.partitions += 1;
            if summary.latest_file.as_deref() < Some(name.as_str()) {
                summary.latest_file = Some(name);
            }
        }
    }

    summary
}

fn list_dirs(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return vec![];
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}
