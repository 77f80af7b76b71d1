//! HTTP transport seam
//!
//! The engine only ever needs "perform one GET, give me status and body".
//! [`UreqTransport`] does that with synchronous HTTP (ureq) so the engine
//! stays executor-agnostic; tests substitute a scripted transport.

use std::fmt;

use super::OAuthToken;

/// A GET request: absolute URL plus ordered query parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
        }
    }

    /// Builder-style [`ApiRequest::set`]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Set a query parameter, replacing an existing value in place
    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.query.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.query.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.query.retain(|(k, _)| k != key);
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for ApiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)?;
        for (i, (key, value)) in self.query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

/// Raw HTTP response; any status is a successful transport round trip
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// `X-Request-Id` header, useful when reporting API failures
    pub request_id: Option<String>,
}

impl ApiResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            request_id: None,
        }
    }
}

/// The request never produced an HTTP response (DNS, TLS, reset, ...)
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Performs a single authenticated GET
pub trait Transport: Send + Sync {
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Blocking HTTP transport using ureq
pub struct UreqTransport {
    agent: ureq::Agent,
    token: OAuthToken,
}

impl UreqTransport {
    pub fn new(token: OAuthToken) -> Self {
        // Non-2xx statuses are returned as responses; the client decides what to retry.
        let config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            token,
        }
    }
}

impl Transport for UreqTransport {
    fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .agent
            .get(&request.url)
            .header("Authorization", &self.token.header_value());
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }

        let mut response = builder
            .call()
            .map_err(|e| TransportError(format!("GET {} failed: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get("X-Request-Id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(format!("failed to read response body: {}", e)))?;

        Ok(ApiResponse {
            status,
            body,
            request_id,
        })
    }
}
