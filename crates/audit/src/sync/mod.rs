//! Sync engine for harvesting audit logs
//!
//! A cycle runs one pass per source. Each pass resolves a checkpoint, then
//! walks bounded windows up to "now", writing every window to the day
//! partitions before moving on. Re-running a pass never duplicates records
//! at the resume point.

mod checkpoint;
mod scheduler;
mod shutdown;
mod timing;
mod window;
mod writer;

pub use checkpoint::{Checkpoint, CheckpointOrigin, resolve_checkpoint};
pub use scheduler::Scheduler;
pub use shutdown::ShutdownFlag;
pub use timing::{Clock, ManualClock, SystemClock, backoff_delay, lookback_start, utc_now};
pub use window::{Advance, PassOutcome, PassReport, WindowController};
pub use writer::{WriteOutcome, write_records};
