//! Audit API integration
//!
//! This module provides:
//! - OAuth token handling
//! - A transport seam with a blocking ureq implementation
//! - A retrying page client
//! - Pagination strategies for the legacy and organization event APIs
//! - Response normalization to [`EventRecord`]s

mod auth;
mod client;
mod normalize;
mod pagination;
mod transport;

pub use auth::OAuthToken;
pub use client::{AuditClient, RetryPolicy};
pub use normalize::{normalize_events, sort_newest_first};
pub use pagination::{IterationKeyPages, PageStrategy, RecordSet, SourceFetcher, TokenPages};
pub use transport::{ApiRequest, ApiResponse, Transport, TransportError, UreqTransport};

use crate::error::SyncError;
use crate::models::{EventRecord, FetchWindow, SourceKind};

/// Fetches every record of one source inside a window
///
/// The order of the returned records is unspecified.
pub trait EventFetcher {
    fn source(&self) -> SourceKind;

    fn fetch(&self, window: &FetchWindow) -> Result<Vec<EventRecord>, SyncError>;
}

/// Audit API response types
pub mod api {
    use serde::Deserialize;
    use serde_json::Value;

    /// Page of the legacy mail/disk audit log
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LegacyEventsPage {
        pub events: Vec<Value>,
        /// Empty or absent on the last page
        #[serde(default)]
        pub next_page_token: Option<String>,
    }

    /// Page of the organization events audit log
    #[derive(Debug, Deserialize)]
    pub struct OrgEventsPage {
        pub items: Vec<Value>,
        /// Empty or absent on the last page
        #[serde(default)]
        pub iteration_key: Option<String>,
    }
}
