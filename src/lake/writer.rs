//! Append-only CSV writer for spread rows
//!
//! The row shape is contractual with the downstream warehouse loader:
//! timestamp and book double-quoted, numeric fields bare, header written
//! exactly once at partition creation.

use super::partition::{PartitionPath, PartitionResolver};
use crate::spread::SpreadRow;
use anyhow::Context;
use chrono::SecondsFormat;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Fixed CSV header, written once per partition file
pub const CSV_HEADER: &str = "timestamp,book,bid,ask,spread";

/// Format one spread row as a CSV line
///
/// Decimals are normalized so `17.10` serializes as `17.1`, matching the
/// lake's historical row shape.
pub fn format_row(row: &SpreadRow) -> String {
    format!(
        "\"{}\",\"{}\",{},{},{}\n",
        row.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        row.book,
        row.bid.normalize(),
        row.ask.normalize(),
        row.spread.normalize(),
    )
}

/// Writes spread rows into resolved partition files
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    resolver: PartitionResolver,
}

impl SnapshotWriter {
    /// Create a writer rooted at the given lake directory
    pub fn new(lake_root: impl Into<PathBuf>) -> Self {
        Self {
            resolver: PartitionResolver::new(lake_root),
        }
    }

    /// Persist one row, creating or appending its partition file
    ///
    /// A new partition truncates the target file before writing the
    /// header; partition 0 of an interrupted run may hold partial rows.
    /// An append opens the existing file (creating it if missing) and
    /// writes the row only.
    pub fn write(&self, row: &SpreadRow, new_partition: bool) -> anyhow::Result<PartitionPath> {
        let partition = self
            .resolver
            .resolve(&row.book, row.timestamp, new_partition)?;
        let path = partition.full_path();

        let mut file = if new_partition {
            File::create(&path)
        } else {
            OpenOptions::new().create(true).append(true).open(&path)
        }
        .with_context(|| format!("open {}", path.display()))?;

        if new_partition {
            writeln!(file, "{CSV_HEADER}")?;
        }
        file.write_all(format_row(row).as_bytes())
            .with_context(|| format!("write {}", path.display()))?;

        tracing::info!(
            book = %row.book,
            file = %partition.file_name,
            "Processed spread data"
        );

        Ok(partition)
    }
}
