//! Per-book spread recorder
//!
//! One bounded queue feeding one writer task per book. All writes for a
//! book are applied in dispatch order; partition decisions and header
//! emission depend on that order, so the writer task is the only thing
//! that touches the book's partition files.

use super::writer::SnapshotWriter;
use crate::spread::SpreadRow;
use crate::telemetry::{increment_counter, CounterMetric};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One queued persistence request
#[derive(Debug)]
struct WriteRequest {
    row: SpreadRow,
    new_partition: bool,
}

/// Recording statistics, returned when the recorder is closed
#[derive(Debug, Default, Clone)]
pub struct RecorderStats {
    pub rows_received: u64,
    pub rows_written: u64,
    pub write_errors: u64,
    pub files_created: u64,
}

/// Handle to a book's writer task
pub struct SpreadRecorder {
    book: String,
    tx: mpsc::Sender<WriteRequest>,
    handle: JoinHandle<RecorderStats>,
}

impl SpreadRecorder {
    /// Spawn the writer task for a book
    pub fn new(book: &str, lake_root: impl Into<PathBuf>, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel(queue_depth);
        let writer = SnapshotWriter::new(lake_root);
        let book = book.to_string();
        let handle = tokio::spawn(run_writer(book.clone(), rx, writer));

        Self { book, tx, handle }
    }

    /// Queue one row for persistence
    ///
    /// Blocks only when the queue is full, which bounds how far the
    /// poller can run ahead of disk.
    pub async fn record(&self, row: SpreadRow, new_partition: bool) -> anyhow::Result<()> {
        self.tx
            .send(WriteRequest { row, new_partition })
            .await
            .map_err(|_| anyhow::anyhow!("writer task for {} is gone", self.book))
    }

    /// Close the queue, drain in-flight writes and return the stats
    pub async fn close(self) -> RecorderStats {
        drop(self.tx);
        self.handle.await.unwrap_or_default()
    }
}

/// Consume the queue until every sender is dropped
async fn run_writer(
    book: String,
    mut rx: mpsc::Receiver<WriteRequest>,
    writer: SnapshotWriter,
) -> RecorderStats {
    let mut stats = RecorderStats::default();

    while let Some(request) = rx.recv().await {
        stats.rows_received += 1;

        match writer.write(&request.row, request.new_partition) {
            Ok(_) => {
                stats.rows_written += 1;
                if request.new_partition {
                    stats.files_created += 1;
                }
                increment_counter(CounterMetric::RowsWritten, &book);
            }
            Err(e) => {
                // The row is lost; the queue keeps serving
                stats.write_errors += 1;
                increment_counter(CounterMetric::WriteErrors, &book);
                tracing::error!(book = %book, error = %e, "Failed to write spread row");
            }
        }
    }

    tracing::info!(
        book = %book,
        rows = stats.rows_written,
        files = stats.files_created,
        "Spread writer shutting down"
    );

    stats
}
