//! In-memory [`Backend`] for unit tests.
//!
//! Records every call (with its request serialized to JSON), returns
//! configurable responses and can fail the next N calls of an endpoint.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use serde_json::{Value, json};

use super::types::*;
use super::{ApiError, ApiResult, Backend};
use crate::activity::ActivityLog;
use crate::batch::jobs::Job;
use crate::config::DeckgenConfig;
use crate::identity::IdentityStore;
use crate::session::Session;
use crate::upload::FileHandle;

/// Canned responses, one per endpoint.
#[derive(Debug, Clone, Default)]
pub(crate) struct Responses {
    pub template_id: String,
    pub content_analysis: Option<ContentAnalysis>,
    pub generate: GenerateResponse,
    pub deck: Vec<u8>,
    pub learning: Value,
    pub personalization: Personalization,
    pub profile: UserProfile,
    pub chart: Chart,
    pub icon: Icon,
    pub recommendation: ChartRecommendations,
    pub job_id: String,
    pub jobs: Vec<Job>,
    pub metrics: GlobalMetrics,
    pub batch_stats: BatchStats,
    pub cache_stats: CacheStats,
    pub system_stats: SystemStats,
    pub invalidated: u64,
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    calls: RefCell<Vec<(&'static str, Value)>>,
    failures: RefCell<HashMap<&'static str, VecDeque<ApiError>>>,
    job_statuses: RefCell<HashMap<String, VecDeque<Job>>>,
    responses: RefCell<Responses>,
}

impl FakeBackend {
    pub fn respond(&self, f: impl FnOnce(&mut Responses)) {
        f(&mut self.responses.borrow_mut());
    }

    /// Fail the next call of `endpoint` with `err`. Queues up.
    pub fn fail_next(&self, endpoint: &'static str, err: ApiError) {
        self.failures
            .borrow_mut()
            .entry(endpoint)
            .or_default()
            .push_back(err);
    }

    /// Queue a job-status snapshot. The last snapshot per id repeats.
    pub fn push_job_status(&self, job: Job) {
        self.job_statuses
            .borrow_mut()
            .entry(job.job_id.clone())
            .or_default()
            .push_back(job);
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Request bodies sent to `endpoint`, in call order.
    pub fn requests(&self, endpoint: &str) -> Vec<Value> {
        self.calls
            .borrow()
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }

    fn record(&self, endpoint: &'static str, body: &impl Serialize) -> ApiResult<()> {
        let value = serde_json::to_value(body).unwrap_or(Value::Null);
        self.calls.borrow_mut().push((endpoint, value));
        match self
            .failures
            .borrow_mut()
            .get_mut(endpoint)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn canned<T>(&self, f: impl FnOnce(&Responses) -> T) -> T {
        f(&self.responses.borrow())
    }
}

impl Backend for FakeBackend {
    fn upload_template(&self, file: &FileHandle) -> ApiResult<UploadResponse> {
        self.record("upload", &json!({ "name": file.name, "size": file.size() }))?;
        let id = self.canned(|r| r.template_id.clone());
        Ok(UploadResponse {
            template_id: if id.is_empty() {
                format!("tpl-{}", self.calls("upload"))
            } else {
                id
            },
            template: json!({ "name": file.name }),
        })
    }

    fn content_suggestions(&self, req: &GenerateRequest) -> ApiResult<ContentSuggestionsResponse> {
        self.record("content_suggestions", &req.suggestions_request())?;
        Ok(ContentSuggestionsResponse {
            suggestions: ContentSuggestions {
                content_analysis: self.canned(|r| r.content_analysis.clone()),
            },
        })
    }

    fn generate(&self, req: &GenerateRequest) -> ApiResult<GenerateResponse> {
        self.record("generate", req)?;
        Ok(self.canned(|r| r.generate.clone()))
    }

    fn generate_from_template(&self, template: &FileHandle, content: &str) -> ApiResult<Vec<u8>> {
        self.record(
            "generate_from_template",
            &json!({ "template": template.name, "content": content }),
        )?;
        Ok(self.canned(|r| r.deck.clone()))
    }

    fn submit_feedback(&self, req: &FeedbackRequest) -> ApiResult<()> {
        self.record("submit_feedback", req)
    }

    fn learn_feedback(&self, req: &LearnFeedbackRequest) -> ApiResult<LearnFeedbackResponse> {
        self.record("learn_feedback", req)?;
        Ok(LearnFeedbackResponse {
            learning_result: self.canned(|r| r.learning.clone()),
        })
    }

    fn personalized_recommendations(
        &self,
        user_id: &str,
        kind: Option<&str>,
    ) -> ApiResult<Personalization> {
        self.record(
            "personalized_recommendations",
            &json!({ "user_id": user_id, "kind": kind }),
        )?;
        Ok(self.canned(|r| r.personalization.clone()))
    }

    fn user_profile(&self, user_id: &str) -> ApiResult<UserProfile> {
        self.record("user_profile", &json!({ "user_id": user_id }))?;
        Ok(self.canned(|r| r.profile.clone()))
    }

    fn generate_chart(&self, req: &ChartRequest) -> ApiResult<Chart> {
        self.record("generate_chart", req)?;
        Ok(self.canned(|r| r.chart.clone()))
    }

    fn generate_icon(&self, req: &IconRequest) -> ApiResult<Icon> {
        self.record("generate_icon", req)?;
        Ok(self.canned(|r| r.icon.clone()))
    }

    fn chart_recommendations(&self, data_sample: &Value) -> ApiResult<ChartRecommendations> {
        self.record("chart_recommendations", data_sample)?;
        Ok(self.canned(|r| r.recommendation.clone()))
    }

    fn create_batch_job(&self, req: &CreateJobRequest) -> ApiResult<String> {
        self.record("create_batch_job", req)?;
        Ok(self.canned(|r| r.job_id.clone()))
    }

    fn process_queue(&self) -> ApiResult<()> {
        self.record("process_queue", &json!({}))
    }

    fn batch_jobs(&self) -> ApiResult<Vec<Job>> {
        self.record("batch_jobs", &Value::Null)?;
        Ok(self.canned(|r| r.jobs.clone()))
    }

    fn job_status(&self, job_id: &str) -> ApiResult<Job> {
        self.record("job_status", &json!({ "job_id": job_id }))?;
        let mut statuses = self.job_statuses.borrow_mut();
        let queue = statuses
            .get_mut(job_id)
            .ok_or_else(|| ApiError::Rejected(format!("job {job_id} not found")))?;
        let job = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        job.ok_or_else(|| ApiError::Rejected(format!("job {job_id} not found")))
    }

    fn performance_metrics(&self) -> ApiResult<GlobalMetrics> {
        self.record("performance_metrics", &Value::Null)?;
        Ok(self.canned(|r| r.metrics.clone()))
    }

    fn batch_stats(&self) -> ApiResult<BatchStats> {
        self.record("batch_stats", &Value::Null)?;
        Ok(self.canned(|r| r.batch_stats.clone()))
    }

    fn cache_stats(&self) -> ApiResult<CacheStats> {
        self.record("cache_stats", &Value::Null)?;
        Ok(self.canned(|r| r.cache_stats.clone()))
    }

    fn system_stats(&self) -> ApiResult<SystemStats> {
        self.record("system_stats", &Value::Null)?;
        Ok(self.canned(|r| r.system_stats.clone()))
    }

    fn invalidate_cache(&self) -> ApiResult<u64> {
        self.record("invalidate_cache", &json!({}))?;
        Ok(self.canned(|r| r.invalidated))
    }
}

/// A session over `backend` with no files touched: ephemeral identity and
/// a disabled activity log.
pub(crate) fn test_session(backend: FakeBackend) -> Session<FakeBackend> {
    Session::new(backend, DeckgenConfig::default())
        .with_identity(IdentityStore::ephemeral())
        .with_activity_log(ActivityLog::disabled())
}
