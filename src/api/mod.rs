//! Backend API seam.
//!
//! Every flow in the crate talks to the generation backend through the
//! [`Backend`] trait, one method per endpoint. [`http::HttpBackend`] is the
//! real implementation over `ureq`; tests substitute an in-memory fake.
use std::fmt;
use std::time::Duration;

use serde_json::Value;

pub mod http;
pub mod multipart;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use crate::batch::jobs::Job;
use crate::upload::FileHandle;
use types::*;

/// Endpoint paths, relative to the configured base URL.
pub mod endpoints {
    pub const UPLOAD: &str = "/api/upload";
    pub const CONTENT_SUGGESTIONS: &str = "/api/content-suggestions";
    pub const GENERATE: &str = "/api/generate";
    pub const GENERATE_FROM_TEMPLATE: &str = "/api/generate_from_template";
    pub const FEEDBACK: &str = "/api/feedback";
    pub const LEARN_FEEDBACK: &str = "/api/learn-feedback";
    pub const RECOMMENDATIONS: &str = "/api/personalized-recommendations";
    pub const USER_PROFILE: &str = "/api/user-profile";
    pub const GENERATE_CHART: &str = "/api/generate-chart";
    pub const GENERATE_ICON: &str = "/api/generate-icon";
    pub const CHART_RECOMMENDATIONS: &str = "/api/chart-recommendations";
    pub const CREATE_JOB: &str = "/api/batch/create-job";
    pub const PROCESS_QUEUE: &str = "/api/batch/process-queue";
    pub const JOBS: &str = "/api/batch/jobs";
    pub const JOB_STATUS: &str = "/api/batch/job-status";
    pub const METRICS: &str = "/api/performance/metrics";
    pub const BATCH_STATS: &str = "/api/performance/batch-stats";
    pub const CACHE_STATS: &str = "/api/performance/cache-stats";
    pub const SYSTEM_STATS: &str = "/api/performance/system-stats";
    pub const CACHE_INVALIDATE: &str = "/api/performance/cache/invalidate";
}

/// Failure of a single backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum ApiError {
    /// Connection refused, DNS failure, broken body, ...
    Transport(String),
    /// The request did not complete within the configured timeout.
    Timeout(Duration),
    /// Non-2xx status. `message` is the server's `error`/`message` field or a
    /// generic status line.
    Status { code: u16, message: String },
    /// The server answered `success: false`.
    Rejected(String),
    /// The body was not the JSON shape we expected.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(s) => write!(f, "network error: {s}"),
            Self::Timeout(d) => write!(f, "request timed out after {}s", d.as_secs()),
            Self::Status { message, .. } => write!(f, "{message}"),
            Self::Rejected(s) => write!(f, "{s}"),
            Self::Decode(s) => write!(f, "unexpected response from server: {s}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One method per backend endpoint.
pub trait Backend {
    /// `POST /api/upload` (multipart, field `file`).
    fn upload_template(&self, file: &FileHandle) -> ApiResult<UploadResponse>;

    /// `POST /api/content-suggestions`.
    fn content_suggestions(&self, req: &GenerateRequest) -> ApiResult<ContentSuggestionsResponse>;

    /// `POST /api/generate`.
    fn generate(&self, req: &GenerateRequest) -> ApiResult<GenerateResponse>;

    /// `POST /api/generate_from_template` (multipart). Returns the deck bytes.
    fn generate_from_template(&self, template: &FileHandle, content: &str) -> ApiResult<Vec<u8>>;

    fn submit_feedback(&self, req: &FeedbackRequest) -> ApiResult<()>;

    fn learn_feedback(&self, req: &LearnFeedbackRequest) -> ApiResult<LearnFeedbackResponse>;

    /// `GET /api/personalized-recommendations/{user_id}?type=`.
    fn personalized_recommendations(
        &self,
        user_id: &str,
        kind: Option<&str>,
    ) -> ApiResult<Personalization>;

    fn user_profile(&self, user_id: &str) -> ApiResult<UserProfile>;

    fn generate_chart(&self, req: &ChartRequest) -> ApiResult<Chart>;

    fn generate_icon(&self, req: &IconRequest) -> ApiResult<Icon>;

    fn chart_recommendations(&self, data_sample: &Value) -> ApiResult<ChartRecommendations>;

    /// `POST /api/batch/create-job`. Returns the server job id.
    fn create_batch_job(&self, req: &CreateJobRequest) -> ApiResult<String>;

    fn process_queue(&self) -> ApiResult<()>;

    fn batch_jobs(&self) -> ApiResult<Vec<Job>>;

    fn job_status(&self, job_id: &str) -> ApiResult<Job>;

    fn performance_metrics(&self) -> ApiResult<GlobalMetrics>;

    fn batch_stats(&self) -> ApiResult<BatchStats>;

    fn cache_stats(&self) -> ApiResult<CacheStats>;

    fn system_stats(&self) -> ApiResult<SystemStats>;

    /// `POST /api/performance/cache/invalidate`. Returns the number of
    /// invalidated entries.
    fn invalidate_cache(&self) -> ApiResult<u64>;
}

/// Decode a JSON body wrapped in the backend's `success` envelope.
///
/// A body without `success: true` becomes [`ApiError::Rejected`] carrying the
/// server's `error` or `message` field.
pub fn decode_envelope<T: serde::de::DeserializeOwned>(body: &str) -> ApiResult<T> {
    let value: Value = serde_json::from_str(body)?;
    let success = value
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        return Err(ApiError::Rejected(
            error_message(&value).unwrap_or_else(|| "the server reported a failure".to_string()),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

/// Extract `error` or `message` from a JSON error body.
pub fn error_message(value: &Value) -> Option<String> {
    value
        .get("error")
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Message for a non-2xx response, falling back to the status code.
pub fn status_message(code: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| error_message(&v))
        .unwrap_or_else(|| format!("server error, status code {code}"))
}
