//! OAuth token handling for the audit APIs
//!
//! Both audit APIs accept a long-lived OAuth token passed as
//! `Authorization: OAuth <token>`. The token is issued out of band and
//! supplied through settings; it is never logged.

use std::fmt;

/// Bearer credential for the audit APIs
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthToken(String);

impl OAuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the `Authorization` header
    pub fn header_value(&self) -> String {
        format!("OAuth {}", self.0)
    }
}

impl fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OAuthToken(***)")
    }
}
