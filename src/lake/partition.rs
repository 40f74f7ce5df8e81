//! Partition resolution for the data lake
//!
//! A partition is one CSV file within an hour-bucketed directory:
//!
//! ```text
//! <root>/markets/<book>/bid_ask_spread/<YYYYMMDD>/<HH>/
//!     bid_ask_spread-<book>-<YYYYMMDD-HH>-part-<N>.csv
//! ```
//!
//! The resolver scans what already exists on disk and picks the partition
//! index according to the append/new-partition policy. The minute is not
//! part of the key; every snapshot within an hour targets the same bucket.

use anyhow::Context;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// A resolved partition target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPath {
    /// Hour-bucket directory, created if absent
    pub dir: PathBuf,
    /// Partition file name within the directory
    pub file_name: String,
    /// Partition index encoded in the file name
    pub index: u32,
}

impl PartitionPath {
    /// Full path to the partition file
    pub fn full_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

/// Resolves the on-disk partition for a book and snapshot time
#[derive(Debug, Clone)]
pub struct PartitionResolver {
    lake_root: PathBuf,
}

impl PartitionResolver {
    /// Create a resolver rooted at the given lake directory
    pub fn new(lake_root: impl Into<PathBuf>) -> Self {
        Self {
            lake_root: lake_root.into(),
        }
    }

    /// Resolve the partition for a snapshot
    ///
    /// Index selection, per the lake's file-naming contract:
    /// - new partition, none exist: 0
    /// - new partition, highest is 0: 1
    /// - new partition, highest is above 0: highest + 1
    /// - append, none exist: 0 (a fresh file is effectively started)
    /// - append, some exist: highest
    pub fn resolve(
        &self,
        book: &str,
        captured_at: DateTime<Utc>,
        wants_new_partition: bool,
    ) -> anyhow::Result<PartitionPath> {
        let dir = self.partition_dir(book, captured_at);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

        let prefix = file_prefix(book, captured_at);
        let highest = highest_partition_index(&dir, &prefix)?;

        let index = match (wants_new_partition, highest) {
            (true, None) => 0,
            (true, Some(0)) => 1,
            (true, Some(highest)) => highest + 1,
            (false, None) => 0,
            (false, Some(highest)) => highest,
        };

        Ok(PartitionPath {
            dir,
            file_name: format!("{prefix}{index}.csv"),
            index,
        })
    }

    /// Hour-bucket directory for a book and snapshot time
    pub fn partition_dir(&self, book: &str, captured_at: DateTime<Utc>) -> PathBuf {
        self.lake_root
            .join("markets")
            .join(book)
            .join("bid_ask_spread")
            .join(captured_at.format("%Y%m%d").to_string())
            .join(captured_at.format("%H").to_string())
    }
}

/// File name prefix up to the partition index
fn file_prefix(book: &str, captured_at: DateTime<Utc>) -> String {
    format!(
        "bid_ask_spread-{book}-{}-part-",
        captured_at.format("%Y%m%d-%H")
    )
}

/// Extract the partition index from a file name matching the prefix
///
/// Names that do not match the prefix, the `.csv` suffix, or whose index
/// is not numeric are ignored rather than failing the scan.
pub fn parse_partition_index(file_name: &str, prefix: &str) -> Option<u32> {
    file_name
        .strip_prefix(prefix)?
        .strip_suffix(".csv")?
        .parse()
        .ok()
}

/// Highest existing partition index in a directory, if any
fn highest_partition_index(dir: &Path, prefix: &str) -> anyhow::Result<Option<u32>> {
    let mut highest = None;

    for entry in fs::read_dir(dir).with_context(|| format!("scan {}", dir.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let Some(index) = parse_partition_index(name, prefix) else {
            continue;
        };
        highest = Some(highest.map_or(index, |h: u32| h.max(index)));
    }

    Ok(highest)
}
