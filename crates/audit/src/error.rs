//! Structured errors for the sync engine
//!
//! Every failure carries the operation that raised it, a short context
//! string (source, window, file) and the underlying cause.

use std::fmt;

/// Operation that was running when an error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ResolveCheckpoint,
    FetchPage,
    FetchWindow,
    ReadPartition,
    AppendPartition,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ResolveCheckpoint => "resolve checkpoint",
            Operation::FetchPage => "fetch page",
            Operation::FetchWindow => "fetch window",
            Operation::ReadPartition => "read partition",
            Operation::AppendPartition => "append partition",
        };
        f.write_str(name)
    }
}

/// Underlying cause of a [`SyncError`]
#[derive(Debug, thiserror::Error)]
pub enum Cause {
    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<Cause> },

    #[error("{0}")]
    Malformed(String),

    #[error("pagination stalled: {0}")]
    Stalled(String),
}

/// How the engine reacts to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Worth retrying the same request
    Transient,
    /// Aborts the current source's pass; the next cycle resumes from the checkpoint
    WindowFatal,
    /// Affects a single record, which is skipped
    Record,
    /// Anything else; treated as window-fatal inside a pass
    Unexpected,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorClass::Transient => "transient",
            ErrorClass::WindowFatal => "window-fatal",
            ErrorClass::Record => "record",
            ErrorClass::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// Error raised by the sync engine
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed ({context}): {cause}")]
pub struct SyncError {
    pub operation: Operation,
    pub context: String,
    #[source]
    pub cause: Cause,
}

impl SyncError {
    pub fn new(operation: Operation, context: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self {
            operation,
            context: context.into(),
            cause: cause.into(),
        }
    }

    /// Classify this error for the caller's failure policy
    pub fn class(&self) -> ErrorClass {
        match (&self.operation, &self.cause) {
            (_, Cause::RetriesExhausted { .. } | Cause::Stalled(_)) => ErrorClass::WindowFatal,
            (Operation::FetchPage, Cause::Status { .. } | Cause::Transport(_) | Cause::Decode(_)) => {
                ErrorClass::Transient
            }
            (Operation::FetchWindow | Operation::AppendPartition, _) => ErrorClass::WindowFatal,
            (_, Cause::Malformed(_)) => ErrorClass::Record,
            _ => ErrorClass::Unexpected,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
