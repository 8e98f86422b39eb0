//! The session controller.
//!
//! A [`Session`] owns the application state, the notifier, the backend
//! client and the panels. Every user action is a method on it (implemented
//! in the flow modules: `upload`, `generation`, `feedback`, `batch`,
//! `charts`), so all state mutation funnels through one place.

use std::time::Duration;

use anyhow::Result;

use crate::activity::ActivityLog;
use crate::api::{ApiError, Backend};
use crate::batch::BatchPanel;
use crate::charts::ChartPanel;
use crate::config::DeckgenConfig;
use crate::identity::{IdentityStore, UserId};
use crate::notify::Notifier;
use crate::render;
use crate::state::{AppState, Progress};

/// Result of a user action that talks to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    /// Input validation failed; a warning was shown and nothing was sent.
    Invalid,
    /// Another generation is in flight; the request was ignored.
    Busy,
    /// The primary call failed; an error was shown.
    Failed(ApiError),
}

impl<T> Outcome<T> {
    /// Whether the action completed.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// The value of a completed action, discarding every other outcome.
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            _ => None,
        }
    }
}

/// One interactive client session against a single backend.
pub struct Session<B: Backend> {
    pub(crate) state: AppState,
    pub(crate) notifier: Notifier,
    pub(crate) backend: B,
    pub(crate) config: DeckgenConfig,
    pub(crate) identity: IdentityStore,
    pub(crate) user_id: Option<UserId>,
    pub(crate) log: ActivityLog,
    pub(crate) batch: BatchPanel,
    pub(crate) charts: ChartPanel,
    /// Text of the upload area.
    pub(crate) upload_summary: String,
    on_progress: Option<ProgressHook>,
}

type ProgressHook = Box<dyn FnMut(&Progress)>;

impl<B: Backend> Session<B> {
    /// Build a session from loaded configuration. The identity store and
    /// activity log locations come from `config`; the user id itself is
    /// read lazily by [`Session::user_id`].
    pub fn new(backend: B, config: DeckgenConfig) -> Self {
        let notifier = Notifier::new(Duration::from_millis(config.notifications.dismiss_after_ms));
        let identity = config
            .identity_path()
            .map(IdentityStore::new)
            .unwrap_or_else(IdentityStore::ephemeral);
        let log = ActivityLog::from_config(&config);
        let state = AppState::new();
        let upload_summary = state.upload_summary();
        Self {
            state,
            notifier,
            backend,
            config,
            identity,
            user_id: None,
            log,
            batch: BatchPanel::default(),
            charts: ChartPanel::default(),
            upload_summary,
            on_progress: None,
        }
    }

    /// Use a different identity store. Any cached user id is dropped.
    pub fn with_identity(mut self, identity: IdentityStore) -> Self {
        self.identity = identity;
        self.user_id = None;
        self
    }

    pub fn with_activity_log(mut self, log: ActivityLog) -> Self {
        self.log = log;
        self
    }

    /// Replace the notifier, e.g. to install a display hook.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Install a hook called for every progress stage.
    pub fn with_progress_display(mut self, hook: impl FnMut(&Progress) + 'static) -> Self {
        self.on_progress = Some(Box::new(hook));
        self
    }

    /// Read-only view of the application state. Mutation goes through the
    /// flow methods.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The notification slot holding the most recent message.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Used by the front end to dismiss or expire the current notification.
    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &DeckgenConfig {
        &self.config
    }

    /// Batch queue, job snapshots and metrics.
    pub fn batch(&self) -> &BatchPanel {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut BatchPanel {
        &mut self.batch
    }

    /// Last chart, icon and recommendation results.
    pub fn charts(&self) -> &ChartPanel {
        &self.charts
    }

    /// The JSONL log of backend calls and background failures.
    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Text shown in the upload area, rebuilt after every upload.
    pub fn upload_summary(&self) -> &str {
        &self.upload_summary
    }

    /// The persisted client id, loaded or created on first use.
    pub fn user_id(&mut self) -> Result<UserId> {
        if let Some(id) = &self.user_id {
            return Ok(id.clone());
        }
        let id = self.identity.load_or_create()?;
        self.user_id = Some(id.clone());
        Ok(id)
    }

    /// Record a failed best-effort task without telling the user.
    pub(crate) fn background_failure(&mut self, task: &str, message: &str) {
        self.state.record_background_failure(task, message);
        self.log.record_background_failure(task, message);
    }

    pub(crate) fn report_progress(&mut self, message: &str, percent: u8) {
        self.state.set_progress(message, percent);
        if let (Some(hook), Some(progress)) = (self.on_progress.as_mut(), self.state.progress()) {
            hook(progress);
        }
    }

    /// Show the detail of slide `index` as an info notification.
    pub fn open_slide(&mut self, index: usize) -> bool {
        let Some(slide) = self.state.generated_slides().get(index) else {
            return false;
        };
        let detail = render::slide_detail(index, slide);
        self.notifier.info(detail);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeBackend, test_session};
    use crate::api::types::{GenerateResponse, SlidePayload};
    use crate::notify::NotificationKind;

    #[test]
    fn user_id_is_cached() {
        let mut session = test_session(FakeBackend::default());
        let a = session.user_id().unwrap();
        let b = session.user_id().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn user_id_persists_across_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user-id");
        let first = test_session(FakeBackend::default())
            .with_identity(IdentityStore::new(&path))
            .user_id()
            .unwrap();
        let second = test_session(FakeBackend::default())
            .with_identity(IdentityStore::new(&path))
            .user_id()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn background_failures_are_not_notified() {
        let mut session = test_session(FakeBackend::default());
        session.background_failure("learn-feedback", "offline");
        assert_eq!(session.state().background_failures().len(), 1);
        assert!(session.notifier().last().is_none());
    }

    #[test]
    fn open_slide_shows_detail() {
        let mut session = test_session(FakeBackend::default());
        assert!(!session.open_slide(0));
        session.state.apply_generation(
            GenerateResponse {
                slides: vec![SlidePayload {
                    title: "Welcome".to_string(),
                    ..SlidePayload::default()
                }],
                ..GenerateResponse::default()
            },
            5,
        );
        assert!(session.open_slide(0));
        let note = session.notifier().last().unwrap();
        assert_eq!(note.kind, NotificationKind::Info);
        assert!(note.message.contains("Welcome"));
    }

    #[test]
    fn outcome_helpers() {
        assert!(Outcome::Done(1).is_done());
        assert_eq!(Outcome::<u8>::Busy.done(), None);
        assert_eq!(Outcome::Done(3).done(), Some(3));
    }
}
