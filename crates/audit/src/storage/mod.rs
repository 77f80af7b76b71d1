//! Storage traits and implementations
//!
//! Each source's records live in a directory of daily partitions. The trait
//! lets the sync engine run against the real directory or an in-memory map.

mod daily_file;
mod memory;
mod traits;

pub use daily_file::DailyFileStore;
pub use memory::InMemoryLogStore;
pub use traits::LogStore;
