//! Settings for the harvester
//!
//! Supports loading settings from (in order of priority):
//! 1. An explicit JSON file
//! 2. `settings.json` in the harvester config directory
//! 3. Environment variables (after an optional `.env` file was applied)
//!
//! Every value is validated up front; all problems are reported together.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::api::OAuthToken;
use crate::models::SourceKind;

/// Settings filename in the harvester config directory
pub const SETTINGS_FILE: &str = "settings.json";

pub const DEFAULT_LEGACY_API_URL: &str = "https://api360.yandex.net";
pub const DEFAULT_ORG_API_URL: &str = "https://cloud-api.yandex.net/v1";

const DEFAULT_POLL_INTERVAL_MINUTES: u64 = 10;
const DEFAULT_LOOKBACK_DAYS: u32 = 90;

/// Upper bounds keeping time arithmetic within chrono's range
const MAX_POLL_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
const MAX_LOOKBACK_DAYS: u32 = 3650;
const MAX_OVERLAP_SECS: u64 = 3600;
const MAX_RETRY_DELAY_SECS: u64 = 3600;
const MAX_WINDOW_MINUTES: u32 = 7 * 24 * 60;

/// Fatal configuration problems, reported before the scheduler starts
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
    #[error("failed to load settings file: {0:#}")]
    File(anyhow::Error),
}

/// Where one source's log files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub dir: PathBuf,
    pub base_name: String,
}

/// Engine limits that rarely need changing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Records per legacy page (API maximum is 100)
    pub legacy_page_size: u32,
    /// Records per organization events page
    pub org_page_size: u32,
    /// Token pages walked before re-anchoring on `beforeDate`
    pub page_budget: u32,
    /// Seconds added to legacy `beforeDate` bounds
    pub overlap_secs: u64,
    /// Seconds subtracted from the newest record when advancing organization windows
    pub org_overlap_secs: u64,
    /// Total attempts per request
    pub max_retries: u32,
    /// Base delay of the linear retry backoff
    pub retry_delay_secs: u64,
    pub legacy_window_minutes: u32,
    pub org_window_minutes: u32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            legacy_page_size: 100,
            org_page_size: 100,
            page_budget: 10,
            overlap_secs: 2,
            org_overlap_secs: 1,
            max_retries: 3,
            retry_delay_secs: 2,
            legacy_window_minutes: 180,
            org_window_minutes: 180,
        }
    }
}

impl Tuning {
    pub fn overlap(&self) -> chrono::Duration {
        seconds(self.overlap_secs)
    }

    pub fn org_overlap(&self) -> chrono::Duration {
        seconds(self.org_overlap_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Largest window fetched in one step for a source
    pub fn max_window(&self, kind: SourceKind) -> chrono::Duration {
        let minutes = if kind.is_legacy() {
            self.legacy_window_minutes
        } else {
            self.org_window_minutes
        };
        chrono::Duration::minutes(i64::from(minutes))
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(1..=100).contains(&self.legacy_page_size) {
            problems.push("tuning.legacy_page_size must be between 1 and 100".to_string());
        }
        if self.org_page_size == 0 {
            problems.push("tuning.org_page_size must be positive".to_string());
        }
        if self.max_retries == 0 {
            problems.push("tuning.max_retries must be positive".to_string());
        }
        for (name, minutes) in [
            ("legacy_window_minutes", self.legacy_window_minutes),
            ("org_window_minutes", self.org_window_minutes),
        ] {
            if !(1..=MAX_WINDOW_MINUTES).contains(&minutes) {
                problems.push(format!(
                    "tuning.{name} must be between 1 and {MAX_WINDOW_MINUTES}"
                ));
            }
        }
        for (name, secs) in [
            ("overlap_secs", self.overlap_secs),
            ("org_overlap_secs", self.org_overlap_secs),
        ] {
            if secs > MAX_OVERLAP_SECS {
                problems.push(format!("tuning.{name} must be at most {MAX_OVERLAP_SECS}"));
            }
        }
        if self.retry_delay_secs > MAX_RETRY_DELAY_SECS {
            problems.push(format!(
                "tuning.retry_delay_secs must be at most {MAX_RETRY_DELAY_SECS}"
            ));
        }
        problems
    }
}

/// Saturating conversion for settings that skipped validation
fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

/// Validated harvester settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub oauth_token: OAuthToken,
    pub organization_id: u64,
    /// Sources in processing order
    pub sources: Vec<SourceSettings>,
    /// Log file extension, without the leading dot
    pub extension: String,
    /// Host wall-clock offset from UTC, strictly between -12 and 12
    pub utc_offset_hours: i32,
    pub poll_interval: Duration,
    pub lookback_days: u32,
    pub legacy_api_url: Url,
    pub org_api_url: Url,
    pub tuning: Tuning,
}

/// Unvalidated settings as they come from a file or the environment
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawSettings {
    pub oauth_token: Option<String>,
    pub organization_id: Option<u64>,
    pub mail_dir: Option<PathBuf>,
    pub disk_dir: Option<PathBuf>,
    pub all_dir: Option<PathBuf>,
    pub mail_base_name: Option<String>,
    pub disk_base_name: Option<String>,
    pub all_base_name: Option<String>,
    pub extension: Option<String>,
    pub utc_offset_hours: Option<i32>,
    pub poll_interval_minutes: Option<u64>,
    pub lookback_days: Option<u32>,
    pub legacy_api_url: Option<String>,
    pub org_api_url: Option<String>,
    #[serde(default)]
    pub tuning: Tuning,
}

impl Settings {
    /// Load settings using the following priority:
    /// 1. `explicit` JSON file, when given
    /// 2. JSON file (~/.config/audit-harvester/settings.json)
    /// 3. Environment variables
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = config::find(SETTINGS_FILE) {
            return Self::from_file(&path);
        }

        Self::from_env()
    }

    /// Load settings from a specific JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawSettings = config::load_json_file(path).map_err(ConfigError::File)?;
        raw.validate()
    }

    /// Load settings from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings from any key/value lookup using the environment variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mut parse = |key: &str, what: &str| -> Option<i64> {
            let value = get(key)?;
            match value.parse::<i64>() {
                Ok(n) => Some(n),
                Err(_) => {
                    problems.push(format!("{key} must be {what}, got '{value}'"));
                    None
                }
            }
        };

        let organization_id = parse("ORGANIZATION_ID_ARG", "an integer");
        let utc_offset_hours = parse("TIMEZONE_SHIFT_IN_HOURS", "an integer");
        let poll_interval_minutes = parse("POLL_INTERVAL_MINUTES", "an integer");
        let lookback_days = parse("MAX_LOOKBACK_DAYS", "an integer");

        let raw = RawSettings {
            oauth_token: get("OAUTH_TOKEN_ARG"),
            organization_id: organization_id.map(|n| n.max(0) as u64),
            mail_dir: get("MAIL_LOG_CATALOG_LOCATION").map(PathBuf::from),
            disk_dir: get("DISK_LOG_CATALOG_LOCATION").map(PathBuf::from),
            all_dir: get("NEW_LOG_CATALOG_LOCATION").map(PathBuf::from),
            mail_base_name: get("MAIL_LOG_FILE_BASE_NAME"),
            disk_base_name: get("DISK_LOG_FILE_BASE_NAME"),
            all_base_name: get("NEW_LOG_FILE_BASE_NAME"),
            extension: get("LOG_FILE_EXTENSION"),
            utc_offset_hours: utc_offset_hours.map(|n| n.clamp(i32::MIN as i64, i32::MAX as i64) as i32),
            poll_interval_minutes: poll_interval_minutes.map(|n| n.max(0) as u64),
            lookback_days: lookback_days.map(|n| n.clamp(0, u32::MAX as i64) as u32),
            legacy_api_url: get("LEGACY_API_URL"),
            org_api_url: get("ORG_EVENTS_API_URL"),
            tuning: Tuning::default(),
        };

        raw.validate_with(problems)
    }

    /// Settings for one source, if configured
    pub fn source(&self, kind: SourceKind) -> Option<&SourceSettings> {
        self.sources.iter().find(|s| s.kind == kind)
    }

    /// Keep only the given sources, preserving processing order
    pub fn restrict_sources(&mut self, kinds: &[SourceKind]) {
        if !kinds.is_empty() {
            self.sources.retain(|s| kinds.contains(&s.kind));
        }
    }

    /// One line per setting, for the startup log. Never includes the token.
    pub fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!("organization id: {}", self.organization_id)];
        for source in &self.sources {
            lines.push(format!(
                "{} logs: {} ({}_YYYY-MM-DD.{})",
                source.kind,
                source.dir.display(),
                source.base_name,
                self.extension
            ));
        }
        lines.push(format!("timezone shift: {} hours", self.utc_offset_hours));
        lines.push(format!(
            "poll interval: {} minutes",
            self.poll_interval.as_secs() / 60
        ));
        lines.push(format!("lookback: {} days", self.lookback_days));
        lines.push(format!("tuning: {:?}", self.tuning));
        lines
    }
}

impl RawSettings {
    /// Validate into [`Settings`]
    pub fn validate(self) -> Result<Settings, ConfigError> {
        self.validate_with(Vec::new())
    }

    fn validate_with(self, mut problems: Vec<String>) -> Result<Settings, ConfigError> {
        let oauth_token = match self.oauth_token.filter(|t| !t.trim().is_empty()) {
            Some(token) => Some(OAuthToken::new(token.trim())),
            None => {
                problems.push("OAUTH_TOKEN_ARG is not set".to_string());
                None
            }
        };

        let organization_id = match self.organization_id {
            Some(id) if id > 0 => Some(id),
            Some(_) => {
                problems.push("ORGANIZATION_ID_ARG must be a positive integer".to_string());
                None
            }
            None => {
                problems.push("ORGANIZATION_ID_ARG is not set".to_string());
                None
            }
        };

        let extension = match self.extension.as_deref().map(|e| e.trim().trim_start_matches('.')) {
            Some(ext) if !ext.is_empty() && is_plain_name(ext) => Some(ext.to_string()),
            Some(ext) => {
                problems.push(format!("LOG_FILE_EXTENSION '{ext}' is not a valid extension"));
                None
            }
            None => {
                problems.push("LOG_FILE_EXTENSION is not set".to_string());
                None
            }
        };

        let utc_offset_hours = match self.utc_offset_hours {
            Some(shift) if shift > -12 && shift < 12 => Some(shift),
            Some(shift) => {
                problems.push(format!(
                    "TIMEZONE_SHIFT_IN_HOURS must be between -11 and 11, got {shift}"
                ));
                None
            }
            None => {
                problems.push("TIMEZONE_SHIFT_IN_HOURS is not set".to_string());
                None
            }
        };

        let mut sources = Vec::new();
        let layout = [
            (SourceKind::Mail, self.mail_dir, self.mail_base_name, "MAIL"),
            (SourceKind::Disk, self.disk_dir, self.disk_base_name, "DISK"),
            (SourceKind::Organization, self.all_dir, self.all_base_name, "NEW"),
        ];
        for (kind, dir, base_name, var) in layout {
            if let Some(source) = validate_source(kind, dir, base_name, var, &mut problems) {
                sources.push(source);
            }
        }

        let poll_minutes = self
            .poll_interval_minutes
            .unwrap_or(DEFAULT_POLL_INTERVAL_MINUTES);
        if !(1..=MAX_POLL_INTERVAL_MINUTES).contains(&poll_minutes) {
            problems.push(format!(
                "POLL_INTERVAL_MINUTES must be between 1 and {MAX_POLL_INTERVAL_MINUTES}, got {poll_minutes}"
            ));
        }

        let lookback_days = self.lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS);
        if !(1..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
            problems.push(format!(
                "MAX_LOOKBACK_DAYS must be between 1 and {MAX_LOOKBACK_DAYS}, got {lookback_days}"
            ));
        }

        let legacy_api_url = parse_url(
            "LEGACY_API_URL",
            self.legacy_api_url.as_deref().unwrap_or(DEFAULT_LEGACY_API_URL),
            &mut problems,
        );
        let org_api_url = parse_url(
            "ORG_EVENTS_API_URL",
            self.org_api_url.as_deref().unwrap_or(DEFAULT_ORG_API_URL),
            &mut problems,
        );

        problems.extend(self.tuning.problems());

        if !problems.is_empty() {
            return Err(ConfigError::Invalid(problems));
        }

        // Every field below is Some once no problems were recorded.
        match (
            oauth_token,
            organization_id,
            extension,
            utc_offset_hours,
            legacy_api_url,
            org_api_url,
        ) {
            (Some(oauth_token), Some(organization_id), Some(extension), Some(utc_offset_hours), Some(legacy_api_url), Some(org_api_url)) => {
                Ok(Settings {
                    oauth_token,
                    organization_id,
                    sources,
                    extension,
                    utc_offset_hours,
                    poll_interval: Duration::from_secs(poll_minutes.saturating_mul(60)),
                    lookback_days,
                    legacy_api_url,
                    org_api_url,
                    tuning: self.tuning,
                })
            }
            _ => Err(ConfigError::Invalid(vec![
                "incomplete configuration".to_string(),
            ])),
        }
    }
}

fn validate_source(
    kind: SourceKind,
    dir: Option<PathBuf>,
    base_name: Option<String>,
    var: &str,
    problems: &mut Vec<String>,
) -> Option<SourceSettings> {
    let dir = match dir {
        Some(dir) if !dir.exists() => {
            problems.push(format!(
                "{var}_LOG_CATALOG_LOCATION '{}' does not exist",
                dir.display()
            ));
            None
        }
        Some(dir) if !dir.is_dir() => {
            problems.push(format!(
                "{var}_LOG_CATALOG_LOCATION '{}' is not a directory",
                dir.display()
            ));
            None
        }
        Some(dir) => Some(dir),
        None => {
            problems.push(format!("{var}_LOG_CATALOG_LOCATION is not set"));
            None
        }
    };

    let base_name = match base_name.map(|b| b.trim().to_string()) {
        Some(name) if !name.is_empty() && is_plain_name(&name) => Some(name),
        Some(name) => {
            problems.push(format!(
                "{var}_LOG_FILE_BASE_NAME '{name}' must be a plain file name"
            ));
            None
        }
        None => {
            problems.push(format!("{var}_LOG_FILE_BASE_NAME is not set"));
            None
        }
    };

    Some(SourceSettings {
        kind,
        dir: dir?,
        base_name: base_name?,
    })
}

fn is_plain_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && name != "." && name != ".."
}

fn parse_url(var: &str, value: &str, problems: &mut Vec<String>) -> Option<Url> {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(url),
        Ok(_) => {
            problems.push(format!("{var} '{value}' must be an http(s) URL"));
            None
        }
        Err(e) => {
            problems.push(format!("{var} '{value}' is not a valid URL: {e}"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_for(dir: &TempDir) -> HashMap<String, String> {
        let root = dir.path();
        for name in ["mail", "disk", "all"] {
            std::fs::create_dir_all(root.join(name)).unwrap();
        }
        [
            ("OAUTH_TOKEN_ARG", "secret-token".to_string()),
            ("ORGANIZATION_ID_ARG", "42".to_string()),
            ("MAIL_LOG_CATALOG_LOCATION", root.join("mail").display().to_string()),
            ("DISK_LOG_CATALOG_LOCATION", root.join("disk").display().to_string()),
            ("NEW_LOG_CATALOG_LOCATION", root.join("all").display().to_string()),
            ("MAIL_LOG_FILE_BASE_NAME", "mail_audit".to_string()),
            ("DISK_LOG_FILE_BASE_NAME", "disk_audit".to_string()),
            ("NEW_LOG_FILE_BASE_NAME", "org_audit".to_string()),
            ("LOG_FILE_EXTENSION", "json".to_string()),
            ("TIMEZONE_SHIFT_IN_HOURS", "3".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn load(env: &HashMap<String, String>) -> Result<Settings, ConfigError> {
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_from_lookup_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(&env_for(&dir)).unwrap();

        assert_eq!(settings.organization_id, 42);
        assert_eq!(settings.extension, "json");
        assert_eq!(settings.utc_offset_hours, 3);
        assert_eq!(settings.poll_interval, Duration::from_secs(600));
        assert_eq!(settings.lookback_days, 90);
        assert_eq!(settings.oauth_token.header_value(), "OAuth secret-token");
        assert_eq!(settings.legacy_api_url.as_str(), "https://api360.yandex.net/");

        let kinds: Vec<SourceKind> = settings.sources.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
        assert_eq!(
            settings.source(SourceKind::Organization).unwrap().base_name,
            "org_audit"
        );
    }

    #[test]
    fn test_missing_values_are_all_reported() {
        let err = Settings::from_lookup(|_| None).unwrap_err();
        let ConfigError::Invalid(problems) = err else {
            panic!("expected validation error");
        };
        assert!(problems.iter().any(|p| p.contains("OAUTH_TOKEN_ARG")));
        assert!(problems.iter().any(|p| p.contains("ORGANIZATION_ID_ARG")));
        assert!(problems.iter().any(|p| p.contains("MAIL_LOG_CATALOG_LOCATION")));
        assert!(problems.iter().any(|p| p.contains("TIMEZONE_SHIFT_IN_HOURS")));
        assert!(problems.len() >= 10);
    }

    #[test]
    fn test_timezone_bounds_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_for(&dir);

        for shift in ["12", "-12", "15"] {
            env.insert("TIMEZONE_SHIFT_IN_HOURS".into(), shift.into());
            assert!(load(&env).is_err(), "shift {shift} should be rejected");
        }
        for shift in ["11", "-11", "0"] {
            env.insert("TIMEZONE_SHIFT_IN_HOURS".into(), shift.into());
            assert!(load(&env).is_ok(), "shift {shift} should be accepted");
        }
    }

    #[test]
    fn test_time_settings_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_for(&dir);

        env.insert("MAX_LOOKBACK_DAYS".into(), "200000000".into());
        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("MAX_LOOKBACK_DAYS must be between 1 and 3650"));

        env.insert("MAX_LOOKBACK_DAYS".into(), "3650".into());
        env.insert("POLL_INTERVAL_MINUTES".into(), "9223372036854775807".into());
        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("POLL_INTERVAL_MINUTES must be between 1"));
        assert!(!err.contains("MAX_LOOKBACK_DAYS"));

        env.insert("POLL_INTERVAL_MINUTES".into(), "60".into());
        let settings = load(&env).unwrap();
        assert_eq!(settings.lookback_days, 3650);
        assert_eq!(settings.poll_interval, Duration::from_secs(3600));
    }

    #[test]
    fn test_tuning_bounds() {
        let tuning = Tuning {
            overlap_secs: u64::MAX,
            org_overlap_secs: 3601,
            retry_delay_secs: u64::MAX,
            org_window_minutes: u32::MAX,
            ..Tuning::default()
        };
        let problems = tuning.problems();
        assert_eq!(problems.len(), 4);
        assert!(problems.iter().any(|p| p.contains("tuning.overlap_secs")));
        assert!(problems.iter().any(|p| p.contains("tuning.org_window_minutes")));

        // Unvalidated values saturate instead of panicking
        assert_eq!(tuning.overlap(), chrono::Duration::MAX);
        assert!(Tuning::default().problems().is_empty());
    }

    #[test]
    fn test_non_integer_organization() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_for(&dir);
        env.insert("ORGANIZATION_ID_ARG".into(), "acme".into());

        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("ORGANIZATION_ID_ARG must be an integer"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_for(&dir);
        env.insert(
            "DISK_LOG_CATALOG_LOCATION".into(),
            dir.path().join("nope").display().to_string(),
        );

        let err = load(&env).unwrap_err().to_string();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_extension_leading_dot_is_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = env_for(&dir);
        env.insert("LOG_FILE_EXTENSION".into(), ".log".into());
        assert_eq!(load(&env).unwrap().extension, "log");
    }

    #[test]
    fn test_from_file_with_tuning() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("logs")).unwrap();
        let logs = dir.path().join("logs").display().to_string();
        let json = serde_json::json!({
            "oauth_token": "t",
            "organization_id": 7,
            "mail_dir": logs,
            "disk_dir": logs,
            "all_dir": logs,
            "mail_base_name": "mail",
            "disk_base_name": "disk",
            "all_base_name": "all",
            "extension": "ndjson",
            "utc_offset_hours": 0,
            "tuning": { "page_budget": 4, "max_retries": 5 }
        });
        let path = dir.path().join("settings.json");
        std::fs::write(&path, json.to_string()).unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.tuning.page_budget, 4);
        assert_eq!(settings.tuning.max_retries, 5);
        assert_eq!(settings.tuning.legacy_page_size, 100);
        assert_eq!(settings.extension, "ndjson");
    }

    #[test]
    fn test_restrict_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = load(&env_for(&dir)).unwrap();
        settings.restrict_sources(&[SourceKind::Organization, SourceKind::Mail]);

        let kinds: Vec<SourceKind> = settings.sources.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SourceKind::Mail, SourceKind::Organization]);
    }

    #[test]
    fn test_summary_hides_token() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load(&env_for(&dir)).unwrap();
        let summary = settings.summary().join("\n");
        assert!(!summary.contains("secret-token"));
        assert!(format!("{:?}", settings).contains("OAuthToken(***)"));
    }
}
