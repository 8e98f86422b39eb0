//! Rating & feedback flow, plus the personalization calls it feeds.

use crate::api::Backend;
use crate::api::types::{FeedbackRequest, LearnFeedback, LearnFeedbackRequest};
use crate::identity::UserId;
use crate::session::{Outcome, Session};

/// What happened after a feedback submission was accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackReport {
    /// The learning call succeeded.
    pub learned: bool,
    /// Personalized recommendations were refreshed afterwards.
    pub recommendations_refreshed: bool,
}

impl<B: Backend> Session<B> {
    /// Set the star rating (`1..=5`, `0` clears). Out-of-range values warn.
    pub fn set_rating(&mut self, rating: u8) -> bool {
        match self.state.set_rating(rating) {
            Ok(()) => true,
            Err(e) => {
                self.notifier.warning(e.to_string());
                false
            }
        }
    }

    pub fn set_feedback_text(&mut self, text: impl Into<String>) {
        self.state.set_feedback_text(text);
    }

    pub fn set_improvement_suggestions(&mut self, suggestions: Vec<String>) {
        self.state.set_improvement_suggestions(suggestions);
    }

    /// Rate a presentation from an earlier session.
    pub fn set_presentation_id(&mut self, id: impl Into<String>) {
        self.state.set_current_presentation_id(id);
    }

    /// Submit the current rating and feedback text.
    ///
    /// Learning and the recommendation refresh run afterwards on the
    /// background channel: their failures never replace the success message.
    pub fn submit_feedback(&mut self) -> Outcome<FeedbackReport> {
        let rating = self.state.current_rating();
        if rating == 0 {
            self.notifier.warning("Please select a rating first");
            return Outcome::Invalid;
        }
        if self.state.feedback_text().trim().is_empty() {
            self.notifier.warning("Please enter your feedback");
            return Outcome::Invalid;
        }
        let Some(presentation_id) = self.state.current_presentation_id().map(str::to_string)
        else {
            self.notifier
                .warning("Generate a presentation before leaving feedback");
            return Outcome::Invalid;
        };

        let request = FeedbackRequest {
            presentation_id: presentation_id.clone(),
            rating,
            feedback_text: self.state.feedback_text().to_string(),
            improvement_suggestions: self.state.improvement_suggestions().to_vec(),
        };
        if let Err(e) = self.backend.submit_feedback(&request) {
            self.notifier
                .error(format!("Failed to submit feedback: {e}"));
            return Outcome::Failed(e);
        }

        self.notifier.success("Thank you for your feedback!");
        self.state.reset_feedback();

        let mut report = FeedbackReport::default();
        let user_id = match self.user_id() {
            Ok(id) => id,
            Err(e) => {
                self.background_failure("identity", &format!("{e:#}"));
                return Outcome::Done(report);
            }
        };

        report.learned = self.learn_from(&user_id, presentation_id, request);
        if report.learned {
            report.recommendations_refreshed = self.refresh_recommendations(&user_id);
        }
        Outcome::Done(report)
    }

    fn learn_from(&mut self, user_id: &UserId, presentation_id: String, sent: FeedbackRequest) -> bool {
        let request = LearnFeedbackRequest {
            user_id: user_id.to_string(),
            presentation_id,
            feedback: LearnFeedback {
                overall_rating: sent.rating,
                design_rating: sent.rating,
                content_rating: sent.rating,
                comments: sent.feedback_text,
                suggestions: sent.improvement_suggestions,
            },
        };
        match self.backend.learn_feedback(&request) {
            Ok(resp) => {
                self.state.set_learning_result(resp.learning_result);
                true
            }
            Err(e) => {
                self.background_failure("learn-feedback", &e.to_string());
                false
            }
        }
    }

    fn refresh_recommendations(&mut self, user_id: &UserId) -> bool {
        match self
            .backend
            .personalized_recommendations(user_id.as_str(), None)
        {
            Ok(p) => {
                self.state.set_personalization(p);
                true
            }
            Err(e) => {
                self.background_failure("personalized-recommendations", &e.to_string());
                false
            }
        }
    }

    fn require_user_id(&mut self) -> Option<UserId> {
        match self.user_id() {
            Ok(id) => Some(id),
            Err(e) => {
                self.notifier
                    .error(format!("Could not load user id: {e:#}"));
                None
            }
        }
    }

    /// Fetch personalized recommendations, optionally for one kind
    /// (`color_scheme`, `typography`, ...).
    pub fn load_recommendations(&mut self, kind: Option<&str>) -> Outcome<()> {
        let Some(user_id) = self.require_user_id() else {
            return Outcome::Invalid;
        };
        match self
            .backend
            .personalized_recommendations(user_id.as_str(), kind)
        {
            Ok(p) => {
                self.state.set_personalization(p);
                self.notifier.info("Recommendations updated");
                Outcome::Done(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Failed to load recommendations: {e}"));
                Outcome::Failed(e)
            }
        }
    }

    pub fn load_profile(&mut self) -> Outcome<()> {
        let Some(user_id) = self.require_user_id() else {
            return Outcome::Invalid;
        };
        match self.backend.user_profile(user_id.as_str()) {
            Ok(profile) => {
                self.state.set_user_profile(profile);
                Outcome::Done(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Failed to load profile: {e}"));
                Outcome::Failed(e)
            }
        }
    }
}
