//! Domain models for audit harvesting

mod cursor;
pub mod record;
mod source;
mod window;

pub use cursor::Cursor;
pub use record::{EventRecord, RecordError, TimestampPolicy, format_cursor, second_prefix};
pub use source::SourceKind;
pub use window::FetchWindow;
