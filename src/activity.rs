//! Structured activity log.
//!
//! Every backend call and every failed best-effort task is appended as one
//! JSON line to `~/.deckgen/activity.jsonl` (configurable). Logging is
//! best-effort: a write failure never fails the flow that triggered it.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::DeckgenConfig;

/// Which error channel an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// A call whose outcome is shown to the user.
    Primary,
    /// A best-effort follow-up (learning, recommendation refresh, metrics).
    Background,
}

/// A single line in the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub timestamp: String,
    pub channel: Channel,
    /// HTTP method, or `"task"` for background task failures.
    pub method: String,
    /// Endpoint path or task name.
    pub target: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Handle to the activity log file. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that drops every entry.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn from_config(config: &DeckgenConfig) -> Self {
        Self {
            path: config.log_path(),
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    /// Record the outcome of one backend request.
    pub fn record_request(
        &self,
        method: &str,
        endpoint: &str,
        status: Option<u16>,
        latency_ms: u64,
        error: Option<&str>,
    ) {
        self.record(&ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            channel: Channel::Primary,
            method: method.to_string(),
            target: endpoint.to_string(),
            success: error.is_none(),
            status,
            latency_ms: Some(latency_ms),
            error: error.map(str::to_string),
        });
    }

    /// Record a failed best-effort task.
    pub fn record_background_failure(&self, task: &str, message: &str) {
        self.record(&ActivityEntry {
            timestamp: Utc::now().to_rfc3339(),
            channel: Channel::Background,
            method: "task".to_string(),
            target: task.to_string(),
            success: false,
            status: None,
            latency_ms: None,
            error: Some(message.to_string()),
        });
    }

    pub fn record(&self, entry: &ActivityEntry) {
        let _ = self.append(entry);
    }

    /// Read the last `limit` entries, oldest first. Malformed lines are skipped.
    pub fn read_recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        let entries: Vec<ActivityEntry> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();
        let skip = entries.len().saturating_sub(limit);
        entries.into_iter().skip(skip).collect()
    }

    fn append(&self, entry: &ActivityEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("nested").join("activity.jsonl"));

        log.record_request("POST", "/api/generate", Some(200), 42, None);
        log.record_request("POST", "/api/upload", Some(500), 7, Some("boom"));
        log.record_background_failure("learn-feedback", "timed out");

        let entries = log.read_recent(10);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].success);
        assert_eq!(entries[0].latency_ms, Some(42));
        assert_eq!(entries[1].error.as_deref(), Some("boom"));
        assert_eq!(entries[2].channel, Channel::Background);
    }

    #[test]
    fn read_recent_keeps_the_tail() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("activity.jsonl"));
        for i in 0..5 {
            log.record_request("GET", &format!("/api/{i}"), Some(200), 1, None);
        }
        let entries = log.read_recent(2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].target, "/api/3");
        assert_eq!(entries[1].target, "/api/4");
    }

    #[test]
    fn skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");
        fs::write(&path, "not json\n").unwrap();
        let log = ActivityLog::new(&path);
        log.record_request("GET", "/api/batch/jobs", Some(200), 3, None);
        assert_eq!(log.read_recent(10).len(), 1);
    }

    #[test]
    fn disabled_log_is_silent() {
        let log = ActivityLog::disabled();
        log.record_request("GET", "/api/x", None, 0, Some("nope"));
        assert!(log.read_recent(10).is_empty());
        assert!(log.path().is_none());
    }
}
