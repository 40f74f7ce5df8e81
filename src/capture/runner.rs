//! Capture loop state machine
//!
//! POLLING accumulates one request per tick toward the per-batch target,
//! dispatching a write for every fetched snapshot. FLUSH logs progress,
//! resets the batch counter and arms the new-partition flag. DONE after
//! the configured number of batches. No error aborts the run; every
//! failure is local to a single tick.

use crate::exchange::{FetchError, OrderBookSource};
use crate::lake::SpreadRecorder;
use crate::spread::SpreadRow;
use crate::telemetry::{increment_counter, record_fetch_latency, CounterMetric};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Per-book capture loop configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Book this loop captures
    pub book: String,
    /// Rows dispatched per batch before a new partition file begins
    pub requests_per_partition: u32,
    /// Batches to complete before the run ends
    pub progress_cycles: u32,
    /// Sleep between ticks
    pub tick_interval: Duration,
}

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Polling,
    Flush,
    Done,
}

/// Per-run statistics
#[derive(Debug, Default, Clone)]
pub struct RunnerStats {
    pub snapshots_fetched: u64,
    pub ticks_skipped: u64,
    pub rows_dispatched: u64,
    pub batches_completed: u32,
}

/// Bounded capture loop for one book
pub struct CaptureRunner<S: OrderBookSource> {
    source: Arc<S>,
    config: RunnerConfig,
}

impl<S: OrderBookSource + 'static> CaptureRunner<S> {
    /// Create a runner over the given snapshot source
    pub fn new(source: Arc<S>, config: RunnerConfig) -> Self {
        Self { source, config }
    }

    /// Run the loop to completion or until the stop signal fires
    ///
    /// The recorder outlives the run; the caller closes it afterwards to
    /// drain in-flight writes.
    pub async fn run(
        &self,
        recorder: &SpreadRecorder,
        mut shutdown: watch::Receiver<bool>,
    ) -> RunnerStats {
        let book = self.config.book.as_str();
        let mut stats = RunnerStats::default();
        let mut state = LoopState::Polling;
        let mut dispatched_in_batch: u32 = 0;
        // Latches until the first dispatch of each batch succeeds, so a
        // failed first tick never produces a headerless file
        let mut partition_pending = true;

        tracing::info!(
            book,
            target = self.config.requests_per_partition,
            cycles = self.config.progress_cycles,
            "Starting capture loop"
        );

        while state != LoopState::Done {
            if *shutdown.borrow() {
                tracing::info!(book, "Capture loop stopping on shutdown signal");
                break;
            }

            match state {
                LoopState::Polling => {
                    self.tick(
                        recorder,
                        &mut stats,
                        &mut dispatched_in_batch,
                        &mut partition_pending,
                    )
                    .await;

                    if dispatched_in_batch >= self.config.requests_per_partition {
                        state = LoopState::Flush;
                    }
                }
                LoopState::Flush => {
                    stats.batches_completed += 1;
                    tracing::info!(
                        book,
                        batch = stats.batches_completed,
                        remaining = self.config.progress_cycles - stats.batches_completed,
                        "Completed capture batch"
                    );

                    dispatched_in_batch = 0;
                    partition_pending = true;
                    state = if stats.batches_completed >= self.config.progress_cycles {
                        LoopState::Done
                    } else {
                        LoopState::Polling
                    };
                }
                LoopState::Done => break,
            }

            if state == LoopState::Done {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.tick_interval) => {}
                _ = shutdown.changed() => {}
            }
        }

        tracing::info!(
            book,
            fetched = stats.snapshots_fetched,
            dispatched = stats.rows_dispatched,
            skipped = stats.ticks_skipped,
            batches = stats.batches_completed,
            "Capture loop finished"
        );

        stats
    }

    /// One polling tick: fetch, derive, dispatch
    async fn tick(
        &self,
        recorder: &SpreadRecorder,
        stats: &mut RunnerStats,
        dispatched_in_batch: &mut u32,
        partition_pending: &mut bool,
    ) {
        let book = self.config.book.as_str();

        let started = Instant::now();
        let snapshot = match self.source.fetch_order_book(book).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                stats.ticks_skipped += 1;
                increment_counter(CounterMetric::TicksSkipped, book);
                match e {
                    FetchError::Auth { .. } => {
                        tracing::error!(book, error = %e, "Authentication failed; check credentials and clock skew");
                    }
                    FetchError::Remote { status, .. } => {
                        tracing::warn!(book, status, error = %e, "Exchange returned an error");
                    }
                    FetchError::Decode(_) | FetchError::Transport(_) => {
                        tracing::warn!(book, error = %e, "Order book fetch failed");
                    }
                }
                return;
            }
        };
        record_fetch_latency(book, started.elapsed());

        stats.snapshots_fetched += 1;
        increment_counter(CounterMetric::SnapshotsFetched, book);
        tracing::debug!(book, sequence = snapshot.sequence, "Fetched order book snapshot");

        let row = match SpreadRow::from_snapshot(&snapshot) {
            Ok(row) => row,
            Err(e) => {
                stats.ticks_skipped += 1;
                increment_counter(CounterMetric::TicksSkipped, book);
                tracing::warn!(book, error = %e, "Skipping tick without a spread");
                return;
            }
        };

        let new_partition = *partition_pending;
        match recorder.record(row, new_partition).await {
            Ok(()) => {
                *partition_pending = false;
                *dispatched_in_batch += 1;
                stats.rows_dispatched += 1;
            }
            Err(e) => {
                stats.ticks_skipped += 1;
                tracing::error!(book, error = %e, "Write queue closed");
            }
        }
    }
}
