//! HTTP implementation of [`Backend`] over the synchronous `ureq` client.
//!
//! Each call:
//!
//! - carries the configured timeout, so a hung backend surfaces as
//!   [`ApiError::Timeout`] instead of blocking forever;
//! - checks the status code and the `success` envelope;
//! - appends one entry to the activity log.
use std::io::Read;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::multipart::MultipartForm;
use super::types::*;
use super::{ApiError, ApiResult, Backend, decode_envelope, endpoints, status_message};
use crate::activity::ActivityLog;
use crate::batch::jobs::Job;
use crate::config::schema::ApiConfig;
use crate::upload::FileHandle;

/// Upper bound for a downloaded deck.
const MAX_DOWNLOAD_BYTES: u64 = 200 * 1024 * 1024;

pub struct HttpBackend {
    base_url: String,
    agent: ureq::Agent,
    timeout: Duration,
    log: ActivityLog,
}

impl HttpBackend {
    /// Build a backend client from the resolved `[api]` config.
    pub fn from_config(config: &ApiConfig, log: ActivityLog) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(&config.user_agent)
            .build();
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            agent,
            timeout,
            log,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, map transport/status failures, decode the body and
    /// log the outcome.
    fn call<T>(
        &self,
        method: &str,
        path: &str,
        send: impl FnOnce(&ureq::Agent, &str) -> Result<ureq::Response, ureq::Error>,
        decode: impl FnOnce(ureq::Response) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let start = Instant::now();
        let url = self.url(path);

        let (status, result) = match send(&self.agent, &url) {
            Ok(resp) => (Some(resp.status()), decode(resp)),
            Err(err) => {
                let status = match &err {
                    ureq::Error::Status(code, _) => Some(*code),
                    ureq::Error::Transport(_) => None,
                };
                (status, Err(self.map_error(err)))
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        let error = result.as_ref().err().map(ToString::to_string);
        self.log
            .record_request(method, path, status, latency_ms, error.as_deref());

        result
    }

    fn map_error(&self, err: ureq::Error) -> ApiError {
        match err {
            ureq::Error::Status(code, resp) => {
                let body = resp.into_string().unwrap_or_default();
                ApiError::Status {
                    code,
                    message: status_message(code, &body),
                }
            }
            ureq::Error::Transport(transport) => {
                let text = transport.to_string();
                if is_timeout(&text) {
                    ApiError::Timeout(self.timeout)
                } else {
                    ApiError::Transport(text)
                }
            }
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<T> {
        self.call(
            "GET",
            path,
            |agent, url| {
                let mut req = agent.get(url);
                for (k, v) in query {
                    req = req.query(k, v);
                }
                req.call()
            },
            read_json,
        )
    }

    fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        self.call(
            "POST",
            path,
            |agent, url| agent.post(url).send_json(body),
            read_json,
        )
    }

    fn post_multipart<T>(
        &self,
        path: &str,
        form: &MultipartForm,
        decode: impl FnOnce(ureq::Response) -> ApiResult<T>,
    ) -> ApiResult<T> {
        let body = form.to_bytes();
        self.call(
            "POST",
            path,
            |agent, url| {
                agent
                    .post(url)
                    .set("Content-Type", &form.content_type())
                    .send_bytes(&body)
            },
            decode,
        )
    }
}

fn is_timeout(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("timed out") || lower.contains("timeout")
}

fn read_json<T: DeserializeOwned>(resp: ureq::Response) -> ApiResult<T> {
    let text = resp
        .into_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    decode_envelope(&text)
}

/// Read a binary deck. A JSON body on a 2xx response is an error envelope.
fn read_binary(resp: ureq::Response) -> ApiResult<Vec<u8>> {
    let is_json = resp
        .header("Content-Type")
        .is_some_and(|ct| ct.starts_with("application/json"));
    if is_json {
        let text = resp
            .into_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let _: Ack = decode_envelope(&text)?;
        return Err(ApiError::Decode(
            "expected a presentation file, got JSON".to_string(),
        ));
    }

    let mut data = Vec::new();
    resp.into_reader()
        .take(MAX_DOWNLOAD_BYTES)
        .read_to_end(&mut data)
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    Ok(data)
}

impl Backend for HttpBackend {
    fn upload_template(&self, file: &FileHandle) -> ApiResult<UploadResponse> {
        let form = MultipartForm::new().file("file", &file.name, file.content_type(), &file.data);
        self.post_multipart(endpoints::UPLOAD, &form, read_json)
    }

    fn content_suggestions(&self, req: &GenerateRequest) -> ApiResult<ContentSuggestionsResponse> {
        self.post_json(endpoints::CONTENT_SUGGESTIONS, &req.suggestions_request())
    }

    fn generate(&self, req: &GenerateRequest) -> ApiResult<GenerateResponse> {
        self.post_json(endpoints::GENERATE, req)
    }

    fn generate_from_template(&self, template: &FileHandle, content: &str) -> ApiResult<Vec<u8>> {
        let form = MultipartForm::new()
            .file(
                "template_file",
                &template.name,
                template.content_type(),
                &template.data,
            )
            .text("presentation_content", content);
        self.post_multipart(endpoints::GENERATE_FROM_TEMPLATE, &form, read_binary)
    }

    fn submit_feedback(&self, req: &FeedbackRequest) -> ApiResult<()> {
        let _: Ack = self.post_json(endpoints::FEEDBACK, req)?;
        Ok(())
    }

    fn learn_feedback(&self, req: &LearnFeedbackRequest) -> ApiResult<LearnFeedbackResponse> {
        self.post_json(endpoints::LEARN_FEEDBACK, req)
    }

    fn personalized_recommendations(
        &self,
        user_id: &str,
        kind: Option<&str>,
    ) -> ApiResult<Personalization> {
        let path = format!("{}/{}", endpoints::RECOMMENDATIONS, user_id);
        let query: Vec<(&str, &str)> = kind.map(|k| ("type", k)).into_iter().collect();
        let resp: RecommendationsResponse = self.get(&path, &query)?;
        Ok(resp.recommendations)
    }

    fn user_profile(&self, user_id: &str) -> ApiResult<UserProfile> {
        let path = format!("{}/{}", endpoints::USER_PROFILE, user_id);
        let resp: UserProfileResponse = self.get(&path, &[])?;
        Ok(resp.profile)
    }

    fn generate_chart(&self, req: &ChartRequest) -> ApiResult<Chart> {
        let resp: ChartResponse = self.post_json(endpoints::GENERATE_CHART, req)?;
        Ok(resp.chart)
    }

    fn generate_icon(&self, req: &IconRequest) -> ApiResult<Icon> {
        let resp: IconResponse = self.post_json(endpoints::GENERATE_ICON, req)?;
        Ok(resp.icon)
    }

    fn chart_recommendations(&self, data_sample: &Value) -> ApiResult<ChartRecommendations> {
        self.post_json(
            endpoints::CHART_RECOMMENDATIONS,
            &json!({ "data_sample": data_sample }),
        )
    }

    fn create_batch_job(&self, req: &CreateJobRequest) -> ApiResult<String> {
        let resp: CreateJobResponse = self.post_json(endpoints::CREATE_JOB, req)?;
        Ok(resp.job_id)
    }

    fn process_queue(&self) -> ApiResult<()> {
        let _: Ack = self.post_json(endpoints::PROCESS_QUEUE, &json!({}))?;
        Ok(())
    }

    fn batch_jobs(&self) -> ApiResult<Vec<Job>> {
        let resp: JobsResponse = self.get(endpoints::JOBS, &[])?;
        Ok(resp.jobs)
    }

    fn job_status(&self, job_id: &str) -> ApiResult<Job> {
        let path = format!("{}/{}", endpoints::JOB_STATUS, job_id);
        let resp: JobStatusResponse = self.get(&path, &[])?;
        Ok(resp.job)
    }

    fn performance_metrics(&self) -> ApiResult<GlobalMetrics> {
        let resp: PerformanceMetricsResponse = self.get(endpoints::METRICS, &[])?;
        Ok(resp.metrics.global)
    }

    fn batch_stats(&self) -> ApiResult<BatchStats> {
        let resp: BatchStatsResponse = self.get(endpoints::BATCH_STATS, &[])?;
        Ok(resp.stats)
    }

    fn cache_stats(&self) -> ApiResult<CacheStats> {
        let resp: CacheStatsResponse = self.get(endpoints::CACHE_STATS, &[])?;
        Ok(resp.stats)
    }

    fn system_stats(&self) -> ApiResult<SystemStats> {
        let resp: SystemStatsResponse = self.get(endpoints::SYSTEM_STATS, &[])?;
        Ok(resp.stats)
    }

    fn invalidate_cache(&self) -> ApiResult<u64> {
        let resp: InvalidateResponse = self.post_json(endpoints::CACHE_INVALIDATE, &json!({}))?;
        Ok(resp.invalidated_count)
    }
}
