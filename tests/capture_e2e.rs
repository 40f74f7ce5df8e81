//! End-to-end capture loop tests against a scripted order book source

use async_trait::async_trait;
use bitso_capture::capture::{CaptureRunner, RunnerConfig};
use bitso_capture::exchange::{FetchError, OrderBookSnapshot, OrderBookSource, OrderLevel};
use bitso_capture::lake::{SpreadRecorder, CSV_HEADER};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

/// Yields snapshots with a bid that steps one centavo per fetch, so the
/// persisted rows reveal dispatch order.
struct SteppingSource {
    fetches: AtomicU64,
    empty_asks: bool,
}

impl SteppingSource {
    fn new() -> Self {
        Self {
            fetches: AtomicU64::new(0),
            empty_asks: false,
        }
    }

    fn with_empty_asks() -> Self {
        Self {
            fetches: AtomicU64::new(0),
            empty_asks: true,
        }
    }
}

fn fixed_ts() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2022-05-12T15:33:20Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[async_trait]
impl OrderBookSource for SteppingSource {
    async fn fetch_order_book(&self, book: &str) -> Result<OrderBookSnapshot, FetchError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        let bid = dec!(17.00) + Decimal::new(n as i64, 2);
        let asks = if self.empty_asks {
            vec![]
        } else {
            vec![OrderLevel {
                price: dec!(17.20),
                amount: dec!(1),
            }]
        };

        Ok(OrderBookSnapshot {
            book: book.to_string(),
            captured_at: fixed_ts(),
            sequence: n,
            bids: vec![OrderLevel {
                price: bid,
                amount: dec!(1),
            }],
            asks,
        })
    }
}

fn runner_config(target: u32, cycles: u32) -> RunnerConfig {
    RunnerConfig {
        book: "usd_mxn".to_string(),
        requests_per_partition: target,
        progress_cycles: cycles,
        tick_interval: Duration::from_millis(1),
    }
}

fn hour_dir(lake_root: &Path) -> std::path::PathBuf {
    lake_root.join("markets/usd_mxn/bid_ask_spread/20220512/15")
}

fn partition_file(lake_root: &Path, index: u32) -> std::path::PathBuf {
    hour_dir(lake_root).join(format!("bid_ask_spread-usd_mxn-20220512-15-part-{index}.csv"))
}

async fn run_once<S: OrderBookSource + 'static>(
    source: Arc<S>,
    lake_root: &Path,
    target: u32,
    cycles: u32,
) {
    let runner = CaptureRunner::new(source, runner_config(target, cycles));
    let recorder = SpreadRecorder::new("usd_mxn", lake_root, 32);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);

    runner.run(&recorder, shutdown_rx).await;
    recorder.close().await;
}

#[tokio::test]
async fn test_run_produces_hour_partitioned_csv_files() {
    let temp = TempDir::new().unwrap();
    run_once(Arc::new(SteppingSource::new()), temp.path(), 3, 2).await;

    // One file per batch, numbered 0 then 1
    let part0 = fs::read_to_string(partition_file(temp.path(), 0)).unwrap();
    let part1 = fs::read_to_string(partition_file(temp.path(), 1)).unwrap();
    assert!(!partition_file(temp.path(), 2).exists());

    for content in [&part0, &part1] {
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], CSV_HEADER);
    }

    // First fetch: bid 17.00 against ask 17.20
    assert!(part0
        .lines()
        .nth(1)
        .unwrap()
        .starts_with("\"2022-05-12T15:33:20Z\",\"usd_mxn\",17,17.2,1.1627906976"));
}

#[tokio::test]
async fn test_rows_appear_in_fetch_order() {
    let temp = TempDir::new().unwrap();
    run_once(Arc::new(SteppingSource::new()), temp.path(), 5, 1).await;

    let content = fs::read_to_string(partition_file(temp.path(), 0)).unwrap();
    let bids: Vec<&str> = content
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(2).unwrap())
        .collect();

    assert_eq!(bids, vec!["17", "17.01", "17.02", "17.03", "17.04"]);
}

#[tokio::test]
async fn test_known_spread_row_shape() {
    let temp = TempDir::new().unwrap();

    struct FixedSource;

    #[async_trait]
    impl OrderBookSource for FixedSource {
        async fn fetch_order_book(&self, book: &str) -> Result<OrderBookSnapshot, FetchError> {
            Ok(OrderBookSnapshot {
                book: book.to_string(),
                captured_at: fixed_ts(),
                sequence: 27214,
                bids: vec![OrderLevel {
                    price: dec!(17.10),
                    amount: dec!(1),
                }],
                asks: vec![OrderLevel {
                    price: dec!(17.20),
                    amount: dec!(1),
                }],
            })
        }
    }

    run_once(Arc::new(FixedSource), temp.path(), 1, 1).await;

    let content = fs::read_to_string(partition_file(temp.path(), 0)).unwrap();
    let row = content.lines().nth(1).unwrap();
    // spread = (17.20 - 17.10) * 100 / 17.20
    assert!(row.starts_with("\"2022-05-12T15:33:20Z\",\"usd_mxn\",17.1,17.2,0.5813953488"));
}

#[tokio::test]
async fn test_empty_asks_produce_no_files() {
    let temp = TempDir::new().unwrap();

    // Every tick is skipped; bound the run with a shutdown signal
    let runner = CaptureRunner::new(
        Arc::new(SteppingSource::with_empty_asks()),
        runner_config(3, 1),
    );
    let recorder = SpreadRecorder::new("usd_mxn", temp.path(), 32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = shutdown_tx.send(true);
    });

    let stats = runner.run(&recorder, shutdown_rx).await;
    let writer_stats = recorder.close().await;

    assert!(stats.ticks_skipped > 0);
    assert_eq!(stats.rows_dispatched, 0);
    assert_eq!(writer_stats.rows_written, 0);
    assert!(!hour_dir(temp.path()).exists());
}

#[tokio::test]
async fn test_second_run_steps_the_partition_index() {
    let temp = TempDir::new().unwrap();

    // Two bounded runs against the same hour bucket, as when the agent is
    // restarted by its external scheduler
    run_once(Arc::new(SteppingSource::new()), temp.path(), 2, 1).await;
    run_once(Arc::new(SteppingSource::new()), temp.path(), 2, 1).await;

    let part0 = fs::read_to_string(partition_file(temp.path(), 0)).unwrap();
    let part1 = fs::read_to_string(partition_file(temp.path(), 1)).unwrap();

    assert_eq!(part0.lines().count(), 3);
    assert_eq!(part1.lines().count(), 3);
    assert_eq!(part0.lines().filter(|l| *l == CSV_HEADER).count(), 1);
    assert_eq!(part1.lines().filter(|l| *l == CSV_HEADER).count(), 1);
}
