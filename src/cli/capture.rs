//! Capture command implementation

use crate::capture::{align_to_minute, CaptureRunner, RunnerConfig};
use crate::config::{Config, Credentials};
use crate::exchange::BitsoClient;
use crate::lake::SpreadRecorder;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Books to capture; defaults to the configured set
    #[arg(short, long)]
    pub book: Vec<String>,

    /// Data lake root directory; overrides the configured root
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start immediately instead of waiting for the aligned minute
    #[arg(long)]
    pub now: bool,
}

impl CaptureArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let credentials = Credentials::from_env()?;
        let client = Arc::new(BitsoClient::new(&config.api, credentials));

        let books = if self.book.is_empty() {
            config.capture.books.clone()
        } else {
            self.book.clone()
        };
        let lake_root = self
            .output
            .clone()
            .unwrap_or_else(|| config.data.lake_root.clone());

        if !self.now {
            align_to_minute(config.capture.align_minute).await;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stagger = Duration::from_secs(config.capture.stagger_secs);

        let mut handles = Vec::new();
        for (position, book) in books.iter().enumerate() {
            let runner = CaptureRunner::new(
                Arc::clone(&client),
                RunnerConfig {
                    book: book.clone(),
                    requests_per_partition: config.capture.requests_per_partition,
                    progress_cycles: config.capture.progress_cycles,
                    tick_interval: Duration::from_millis(config.capture.tick_interval_ms),
                },
            );
            let recorder = SpreadRecorder::new(book, lake_root.clone(), config.data.queue_depth);
            let delay = stagger * position as u32;
            let shutdown = shutdown_rx.clone();
            let book = book.clone();

            handles.push(tokio::spawn(async move {
                if !delay.is_zero() {
                    tracing::info!(book = %book, delay_secs = delay.as_secs(), "Staggered start");
                    tokio::time::sleep(delay).await;
                }
                let stats = runner.run(&recorder, shutdown).await;
                let writer_stats = recorder.close().await;
                tracing::info!(
                    book = %book,
                    fetched = stats.snapshots_fetched,
                    written = writer_stats.rows_written,
                    skipped = stats.ticks_skipped,
                    write_errors = writer_stats.write_errors,
                    "Book capture complete"
                );
            }));
        }

        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested, draining in-flight writes");
                let _ = shutdown_tx.send(true);
            }
        });

        for handle in handles {
            let _ = handle.await;
        }
        ctrl_c.abort();

        Ok(())
    }
}
