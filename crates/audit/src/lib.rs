//! Audit crate - Business logic for harvesting organization audit logs
//!
//! This crate provides platform-independent harvesting functionality including:
//! - Domain models (EventRecord, Cursor, FetchWindow)
//! - Audit API client with retries and per-source pagination
//! - Day-partitioned, append-only log storage
//! - Idempotent, resumable sync engine and polling scheduler
//! - Validated settings from a JSON file or the environment
//!
//! This crate has no UI dependencies; the harvester binary wires it to a
//! real HTTP transport, the system clock and an interrupt handler.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod sync;

pub use api::{AuditClient, EventFetcher, OAuthToken, RetryPolicy, SourceFetcher, Transport, UreqTransport};
pub use config::{ConfigError, Settings, SourceSettings, Tuning};
pub use error::{Cause, ErrorClass, Operation, SyncError};
pub use models::{Cursor, EventRecord, FetchWindow, SourceKind, TimestampPolicy};
pub use storage::{DailyFileStore, InMemoryLogStore, LogStore};
pub use sync::{
    // Pass execution
    Checkpoint, CheckpointOrigin, PassOutcome, PassReport, WindowController, resolve_checkpoint,
    // Writing
    WriteOutcome, write_records,
    // Scheduling
    Scheduler, ShutdownFlag,
    // Time
    Clock, ManualClock, SystemClock,
};
