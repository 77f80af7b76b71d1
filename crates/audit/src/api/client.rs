//! Audit API client
//!
//! Issues page requests through a [`Transport`], retrying failed requests
//! with linear backoff and decoding successful bodies.

use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use super::{ApiRequest, Transport};
use crate::error::{Cause, Operation, SyncError};
use crate::sync::{Clock, backoff_delay};

/// Retry budget for a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failure; grows linearly with the attempt number
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Client shared by every pagination strategy
#[derive(Clone)]
pub struct AuditClient {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl AuditClient {
    pub fn new(transport: Arc<dyn Transport>, clock: Arc<dyn Clock>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            clock,
            retry,
        }
    }

    /// Fetch and decode one page
    ///
    /// Failures classified as transient (non-200 statuses, transport
    /// failures, undecodable bodies) are retried until the budget is spent;
    /// after attempt `n` fails the client sleeps `delay * n`.
    ///
    /// # Errors
    /// Returns a [`Cause::RetriesExhausted`] error carrying the last failure.
    pub fn get_page<T: DeserializeOwned>(&self, request: &ApiRequest, context: &str) -> Result<T, SyncError> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let cause = match self.transport.get(request) {
                Ok(response) if response.status == 200 => {
                    match serde_json::from_str::<T>(&response.body) {
                        Ok(page) => return Ok(page),
                        Err(e) => {
                            error!("Failed to decode response from {}: {}", request.url, e);
                            debug!("Undecodable body: {}", response.body);
                            Cause::Decode(e)
                        }
                    }
                }
                Ok(response) => {
                    error!(
                        "Error during GET request: {}. Error message: {}",
                        response.status, response.body
                    );
                    debug!("Error during GET request: {}", request);
                    debug!(
                        "X-Request-Id: {}",
                        response.request_id.as_deref().unwrap_or("")
                    );
                    Cause::Status {
                        status: response.status,
                        body: response.body,
                    }
                }
                Err(e) => {
                    error!("Transport failure during GET request: {}", e);
                    debug!("Failed GET request: {}", request);
                    Cause::Transport(e.0)
                }
            };

            let failure = SyncError::new(Operation::FetchPage, context, cause);
            if !failure.is_transient() {
                error!("Not retrying GET request ({} error): {}", failure.class(), failure);
                return Err(failure);
            }

            if attempt >= max_attempts {
                error!("Forcing exit without getting data ({}).", context);
                return Err(SyncError::new(
                    Operation::FetchPage,
                    context,
                    Cause::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(failure.cause),
                    },
                ));
            }

            let delay = backoff_delay(self.retry.delay, attempt);
            warn!(
                "Retrying ({}/{}) in {}s",
                attempt + 1,
                max_attempts,
                delay.as_secs_f32()
            );
            self.clock.sleep(delay);
        }
    }
}
