//! Hour-partitioned CSV data lake
//!
//! Partition resolution, the append-only CSV writer, and the per-book
//! recorder task that serializes writes so the poller never blocks on I/O.

mod partition;
mod recorder;
mod writer;

pub use partition::{parse_partition_index, PartitionPath, PartitionResolver};
pub use recorder::{RecorderStats, SpreadRecorder};
pub use writer::{format_row, SnapshotWriter, CSV_HEADER};
