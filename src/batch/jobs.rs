//! Batch job snapshots and status polling.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::types::null_as_default;
use crate::api::{ApiError, Backend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// No further updates are expected.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// A server-side job snapshot. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    /// Fraction in `0.0..=1.0`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tasks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed_tasks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed_tasks: u64,
    /// ISO string or unix seconds, depending on the backend version.
    #[serde(default)]
    pub created_at: Value,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn created_at_display(&self) -> String {
        match &self.created_at {
            Value::String(s) => s.clone(),
            Value::Number(n) => n
                .as_f64()
                .and_then(|secs| chrono::DateTime::from_timestamp(secs as i64, 0))
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| n.to_string()),
            _ => String::new(),
        }
    }
}

/// Result of a polling run.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub rounds: u32,
    /// Every tracked job reached a terminal status.
    pub settled: bool,
    /// Latest snapshot per job id.
    pub jobs: BTreeMap<String, Job>,
    /// Latest error per job id whose status could not be fetched.
    pub errors: BTreeMap<String, ApiError>,
}

/// Poll `GET /api/batch/job-status/{id}` for every id until all are
/// terminal or `max_rounds` is reached.
///
/// `sleep` is called between rounds (not after the last one); `on_round`
/// sees the report after each round.
pub fn poll_jobs<B: Backend + ?Sized>(
    backend: &B,
    job_ids: &[String],
    interval: Duration,
    max_rounds: u32,
    mut sleep: impl FnMut(Duration),
    mut on_round: impl FnMut(&PollReport),
) -> PollReport {
    let mut report = PollReport {
        rounds: 0,
        settled: job_ids.is_empty(),
        jobs: BTreeMap::new(),
        errors: BTreeMap::new(),
    };

    while !report.settled && report.rounds < max_rounds {
        if report.rounds > 0 {
            sleep(interval);
        }
        report.rounds += 1;

        for id in job_ids {
            if report.jobs.get(id).is_some_and(Job::is_terminal) {
                continue;
            }
            match backend.job_status(id) {
                Ok(job) => {
                    report.errors.remove(id);
                    report.jobs.insert(id.clone(), job);
                }
                Err(e) => {
                    report.errors.insert(id.clone(), e);
                }
            }
        }

        report.settled = job_ids
            .iter()
            .all(|id| report.jobs.get(id).is_some_and(Job::is_terminal));
        on_round(&report);
    }

    report
}
