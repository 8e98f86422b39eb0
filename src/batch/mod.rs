//! Batch panel: a local file queue, job submission, job polling and the
//! performance dashboard.

pub mod jobs;
pub mod metrics;

use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::api::Backend;
use crate::api::types::{BatchFileRef, CreateJobRequest, JobParameters};
use crate::session::{Outcome, Session};
use jobs::{Job, PollReport, poll_jobs};
use metrics::{MetricsDashboard, load_dashboard};

/// A file waiting in the local queue. `id` is local only, unrelated to
/// server job ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFileEntry {
    pub id: String,
    pub name: String,
    pub size: u64,
}

/// Files picked for the next batch job, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchQueue {
    entries: Vec<BatchFileEntry>,
}

impl BatchQueue {
    /// Queue a file. Returns `None` if the same name and size is already
    /// queued.
    pub fn add(&mut self, name: impl Into<String>, size: u64) -> Option<String> {
        let name = name.into();
        if self.entries.iter().any(|e| e.name == name && e.size == size) {
            return None;
        }
        let id = Uuid::new_v4().to_string();
        self.entries.push(BatchFileEntry {
            id: id.clone(),
            name,
            size,
        });
        Some(id)
    }

    /// Drop the entry with local id `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Queued files in insertion order.
    pub fn entries(&self) -> &[BatchFileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the queued file sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

/// Which tab of the batch panel is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchView {
    #[default]
    Queue,
    Jobs,
    Metrics,
}

/// Client-side state of the batch panel: the local queue, the last job
/// snapshots and the last metrics dashboard.
#[derive(Debug, Default)]
pub struct BatchPanel {
    queue: BatchQueue,
    view: BatchView,
    jobs: Vec<Job>,
    tracked: Vec<String>,
    metrics: Option<MetricsDashboard>,
}

impl BatchPanel {
    /// The local queue. Emptied after a successful submit.
    pub fn queue(&self) -> &BatchQueue {
        &self.queue
    }

    pub fn view(&self) -> BatchView {
        self.view
    }

    /// Switch tabs without loading anything.
    pub fn set_view(&mut self, view: BatchView) {
        self.view = view;
    }

    /// Job snapshots from the last refresh or poll.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Server job ids created by this session.
    pub fn tracked_jobs(&self) -> &[String] {
        &self.tracked
    }

    /// Add a job id to the watch list. Ids already tracked are ignored.
    pub fn track(&mut self, job_id: impl Into<String>) {
        let id = job_id.into();
        if !self.tracked.contains(&id) {
            self.tracked.push(id);
        }
    }

    /// The dashboard from the last [`Session::load_metrics`], if any.
    pub fn metrics(&self) -> Option<&MetricsDashboard> {
        self.metrics.as_ref()
    }

    /// Replace the snapshot of one job, or append it.
    fn upsert(&mut self, job: Job) {
        match self.jobs.iter_mut().find(|j| j.job_id == job.job_id) {
            Some(slot) => *slot = job,
            None => self.jobs.push(job),
        }
    }
}

impl<B: Backend> Session<B> {
    /// Queue a file for the next batch job. Duplicates (same name and size)
    /// are refused with a warning and return `None`.
    pub fn add_batch_file(&mut self, name: impl Into<String>, size: u64) -> Option<String> {
        let name = name.into();
        let id = self.batch.queue.add(name.clone(), size);
        if id.is_none() {
            self.notifier
                .warning(format!("\"{name}\" is already in the queue"));
        }
        id
    }

    pub fn remove_batch_file(&mut self, id: &str) -> bool {
        self.batch.queue.remove(id)
    }

    pub fn clear_batch_queue(&mut self) {
        self.batch.queue.clear();
    }

    /// Submit every queued file as one job. Defaults come from `[batch]`.
    pub fn submit_batch(&mut self, job_type: Option<&str>, priority: Option<&str>) -> Outcome<String> {
        if self.batch.queue.is_empty() {
            self.notifier.warning("Add files to the batch queue first");
            return Outcome::Invalid;
        }
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => {
                self.notifier
                    .error(format!("Could not load user id: {e:#}"));
                return Outcome::Invalid;
            }
        };

        let request = CreateJobRequest {
            files: self
                .batch
                .queue
                .entries()
                .iter()
                .map(|e| BatchFileRef {
                    name: e.name.clone(),
                    size: e.size,
                })
                .collect(),
            job_type: job_type
                .unwrap_or(&self.config.batch.job_type)
                .to_string(),
            parameters: JobParameters {
                priority: priority
                    .unwrap_or(&self.config.batch.priority)
                    .to_string(),
                user_id: user_id.to_string(),
                timestamp: Utc::now().to_rfc3339(),
            },
        };

        match self.backend.create_batch_job(&request) {
            Ok(job_id) => {
                let count = self.batch.queue.len();
                self.batch.queue.clear();
                self.batch.track(job_id.clone());
                self.batch.view = BatchView::Jobs;
                self.notifier.success(format!(
                    "Batch job {job_id} created with {count} file(s)"
                ));
                self.refresh_jobs();
                Outcome::Done(job_id)
            }
            Err(e) => {
                self.notifier
                    .error(format!("Failed to create batch job: {e}"));
                Outcome::Failed(e)
            }
        }
    }

    /// Replace the job list. A failed refresh keeps the previous snapshot.
    pub fn refresh_jobs(&mut self) -> bool {
        match self.backend.batch_jobs() {
            Ok(jobs) => {
                self.batch.jobs = jobs;
                true
            }
            Err(e) => {
                self.background_failure("batch-jobs", &e.to_string());
                false
            }
        }
    }

    /// Poll the tracked jobs on the configured interval until they settle.
    pub fn watch_jobs(&mut self, on_round: impl FnMut(&PollReport)) -> PollReport {
        let ids = self.batch.tracked.clone();
        self.watch_jobs_with(&ids, std::thread::sleep, on_round)
    }

    /// [`Session::watch_jobs`] with explicit ids and sleep function.
    pub fn watch_jobs_with(
        &mut self,
        job_ids: &[String],
        sleep: impl FnMut(Duration),
        on_round: impl FnMut(&PollReport),
    ) -> PollReport {
        let interval = Duration::from_millis(self.config.batch.poll_interval_ms);
        let report = poll_jobs(
            &self.backend,
            job_ids,
            interval,
            self.config.batch.max_polls,
            sleep,
            on_round,
        );

        for job in report.jobs.values() {
            self.batch.upsert(job.clone());
        }
        for (id, err) in &report.errors {
            self.background_failure("job-status", &format!("{id}: {err}"));
        }
        self.batch.view = BatchView::Jobs;

        if !report.settled && report.rounds > 0 {
            self.notifier.warning(format!(
                "Stopped watching after {} checks; jobs are still running",
                report.rounds
            ));
        }
        report
    }

    /// Ask the server to start working through its job queue.
    pub fn process_batch_queue(&mut self) -> Outcome<()> {
        match self.backend.process_queue() {
            Ok(()) => {
                self.notifier.success("Queue processing started");
                Outcome::Done(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Failed to process queue: {e}"));
                Outcome::Failed(e)
            }
        }
    }

    /// Load all four dashboard sections and switch to the metrics view.
    ///
    /// Failed sections are recorded as background failures and never
    /// notified.
    pub fn load_metrics(&mut self) -> &MetricsDashboard {
        let dashboard = load_dashboard(&self.backend);
        for (task, message) in dashboard.failures() {
            self.background_failure(task, message);
        }
        self.batch.view = BatchView::Metrics;
        self.batch.metrics.insert(dashboard)
    }

    /// Returns the number of cache entries the server dropped.
    pub fn invalidate_cache(&mut self) -> Outcome<u64> {
        match self.backend.invalidate_cache() {
            Ok(count) => {
                self.notifier
                    .success(format!("Invalidated {count} cache entries"));
                Outcome::Done(count)
            }
            Err(e) => {
                self.notifier
                    .error(format!("Failed to invalidate cache: {e}"));
                Outcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::api::fake::{FakeBackend, test_session};
    use crate::notify::NotificationKind;
    use jobs::JobStatus;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            job_id: id.to_string(),
            status,
            progress: 0.0,
            total_tasks: 1,
            completed_tasks: 0,
            failed_tasks: 0,
            created_at: serde_json::Value::Null,
        }
    }

    #[test]
    fn queue_dedups_by_name_and_size() {
        let mut q = BatchQueue::default();
        assert!(q.add("a.pptx", 10).is_some());
        assert!(q.add("a.pptx", 10).is_none());
        assert!(q.add("a.pptx", 11).is_some());
        assert_eq!(q.len(), 2);
        assert_eq!(q.total_size(), 21);
    }

    #[test]
    fn queue_remove_by_id() {
        let mut q = BatchQueue::default();
        let id = q.add("a.pptx", 10).unwrap();
        q.add("b.pptx", 10);
        assert!(q.remove(&id));
        assert!(!q.remove(&id));
        assert_eq!(q.entries()[0].name, "b.pptx");
    }

    #[test]
    fn duplicate_add_warns() {
        let mut session = test_session(FakeBackend::default());
        session.add_batch_file("a.pptx", 5);
        assert!(session.add_batch_file("a.pptx", 5).is_none());
        assert_eq!(
            session.notifier().last().unwrap().kind,
            NotificationKind::Warning
        );
    }

    #[test]
    fn empty_queue_is_not_submitted() {
        let mut session = test_session(FakeBackend::default());
        assert_eq!(session.submit_batch(None, None), Outcome::Invalid);
        assert_eq!(session.backend().total_calls(), 0);
    }

    #[test]
    fn submit_clears_queue_and_switches_view() {
        let backend = FakeBackend::default();
        backend.respond(|r| {
            r.job_id = "job-42".to_string();
            r.jobs = vec![job("job-42", JobStatus::Pending)];
        });
        let mut session = test_session(backend);
        session.add_batch_file("a.pptx", 100);
        session.add_batch_file("b.pptx", 200);

        let outcome = session.submit_batch(None, Some("high"));

        assert_eq!(outcome, Outcome::Done("job-42".to_string()));
        assert!(session.batch().queue().is_empty());
        assert_eq!(session.batch().view(), BatchView::Jobs);
        assert_eq!(session.batch().tracked_jobs(), ["job-42".to_string()]);
        assert_eq!(session.batch().jobs().len(), 1);

        let sent = &session.backend().requests("create_batch_job")[0];
        assert_eq!(sent["files"][1]["size"], 200);
        assert_eq!(sent["job_type"], "template_analysis");
        assert_eq!(sent["parameters"]["priority"], "high");
        assert!(
            sent["parameters"]["user_id"]
                .as_str()
                .unwrap()
                .starts_with("user_")
        );
    }

    #[test]
    fn failed_submit_keeps_queue() {
        let backend = FakeBackend::default();
        backend.fail_next("create_batch_job", ApiError::Rejected("queue full".to_string()));
        let mut session = test_session(backend);
        session.add_batch_file("a.pptx", 1);
        assert!(matches!(session.submit_batch(None, None), Outcome::Failed(_)));
        assert_eq!(session.batch().queue().len(), 1);
        assert_eq!(session.batch().view(), BatchView::Queue);
    }

    #[test]
    fn failed_refresh_keeps_snapshot() {
        let backend = FakeBackend::default();
        backend.respond(|r| r.jobs = vec![job("j1", JobStatus::Processing)]);
        let mut session = test_session(backend);
        assert!(session.refresh_jobs());
        session
            .backend()
            .fail_next("batch_jobs", ApiError::Transport("down".to_string()));
        assert!(!session.refresh_jobs());
        assert_eq!(session.batch().jobs().len(), 1);
        assert_eq!(session.state().background_failures().len(), 1);
    }

    #[test]
    fn watch_updates_job_snapshots() {
        let backend = FakeBackend::default();
        backend.push_job_status(job("j1", JobStatus::Processing));
        backend.push_job_status(job("j1", JobStatus::Completed));
        let mut session = test_session(backend);
        session.batch_mut().track("j1");

        let ids = session.batch().tracked_jobs().to_vec();
        let report = session.watch_jobs_with(&ids, |_| {}, |_| {});

        assert!(report.settled);
        assert_eq!(session.batch().jobs()[0].status, JobStatus::Completed);
        assert!(session.notifier().last().is_none());
    }

    #[test]
    fn load_metrics_switches_view() {
        let backend = FakeBackend::default();
        backend.fail_next("batch_stats", ApiError::Transport("down".to_string()));
        let mut session = test_session(backend);
        assert_eq!(session.load_metrics().failed_sections(), 1);
        assert_eq!(session.batch().view(), BatchView::Metrics);
        assert!(session.notifier().last().is_none());
    }

    #[test]
    fn metrics_failures_are_background_failures() {
        let backend = FakeBackend::default();
        backend.fail_next("cache_stats", ApiError::Transport("down".to_string()));
        let mut session = test_session(backend);

        session.load_metrics();

        let failures = session.state().background_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].task, "cache-stats");
        assert_eq!(failures[0].message, "network error: down");
    }

    #[test]
    fn invalidate_cache_reports_count() {
        let backend = FakeBackend::default();
        backend.respond(|r| r.invalidated = 7);
        let mut session = test_session(backend);
        assert_eq!(session.invalidate_cache(), Outcome::Done(7));
        assert!(session.notifier().last().unwrap().message.contains('7'));
    }
}
