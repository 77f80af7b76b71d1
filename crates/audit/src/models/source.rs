//! Audit log sources

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::TimestampPolicy;

/// One of the audit event streams harvested by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Legacy per-mailbox event API
    Mail,
    /// Legacy per-disk event API
    Disk,
    /// Organization-wide event API
    #[serde(rename = "all")]
    Organization,
}

impl SourceKind {
    /// Processing order within one scheduler cycle
    pub const ALL: [SourceKind; 3] = [SourceKind::Mail, SourceKind::Disk, SourceKind::Organization];

    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Mail => "mail",
            SourceKind::Disk => "disk",
            SourceKind::Organization => "all",
        }
    }

    /// Whether this source uses the legacy token-paginated API
    pub fn is_legacy(&self) -> bool {
        matches!(self, SourceKind::Mail | SourceKind::Disk)
    }

    pub fn timestamp_policy(&self) -> TimestampPolicy {
        if self.is_legacy() {
            TimestampPolicy::Legacy
        } else {
            TimestampPolicy::Native
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mail" => Ok(SourceKind::Mail),
            "disk" => Ok(SourceKind::Disk),
            "all" | "organization" | "new" => Ok(SourceKind::Organization),
            other => Err(format!("unknown source '{other}' (expected mail, disk or all)")),
        }
    }
}
