//! Bounded capture loop
//!
//! One loop per configured book: poll, derive the spread, dispatch the
//! write, roll to a new partition every N requests, stop after the
//! configured number of batches.

mod runner;
mod schedule;

pub use runner::{CaptureRunner, RunnerConfig, RunnerStats};
pub use schedule::{align_to_minute, duration_until_minute};
