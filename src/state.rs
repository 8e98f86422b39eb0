//! Application state container.
//!
//! `AppState` holds everything the front end knows during a session. Fields
//! are private; every mutation goes through one of the action methods below
//! so invariants hold regardless of the caller:
//!
//! - `current_rating` stays in `0..=5` (0 = unset);
//! - `is_generating` is only flipped by [`AppState::try_begin_generation`]
//!   and [`AppState::finish_generation`];
//! - the slide list is replaced wholesale, never merged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::types::{
    ContentAnalysis, GenerateRequest, GenerateResponse, Personalization, SlidePayload,
    UserProfile, VisualSuggestions,
};

pub const MAX_RATING: u8 = 5;

/// A template accepted by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub template_id: String,
    pub template: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideType {
    Title,
    Content,
    Conclusion,
}

impl SlideType {
    /// Unknown tags are treated as content slides.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "title" => Self::Title,
            "conclusion" => Self::Conclusion,
            _ => Self::Content,
        }
    }
}

impl fmt::Display for SlideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Content => write!(f, "content"),
            Self::Conclusion => write!(f, "conclusion"),
        }
    }
}

/// One generated slide, as received (unsanitized).
#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub title: String,
    pub content: String,
    pub slide_type: SlideType,
    pub bullet_points: Vec<String>,
    pub visual_elements: Vec<String>,
}

impl From<SlidePayload> for Slide {
    fn from(p: SlidePayload) -> Self {
        Self {
            title: p.title,
            content: p.content,
            slide_type: SlideType::parse(&p.slide_type),
            bullet_points: p.bullet_points,
            visual_elements: p.visual_elements,
        }
    }
}

/// Staged progress of a long-running request.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub message: String,
    pub percent: u8,
}

/// A failed best-effort task. Never shown as a user-facing error.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundFailure {
    pub task: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    OutOfRange(u8),
}

impl fmt::Display for RatingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange(r) => write!(f, "rating must be between 1 and {MAX_RATING}, got {r}"),
        }
    }
}

impl std::error::Error for RatingError {}

#[derive(Debug, Default)]
pub struct AppState {
    uploaded_files: Vec<UploadedFile>,
    current_rating: u8,
    feedback_text: String,
    improvement_suggestions: Vec<String>,
    generated_slides: Vec<Slide>,
    is_generating: bool,
    current_presentation_id: Option<String>,
    visual_suggestions: Option<VisualSuggestions>,
    content_analysis: Option<ContentAnalysis>,
    quality_score: Option<f64>,
    personalization: Option<Personalization>,
    user_profile: Option<UserProfile>,
    learning_result: Option<Value>,
    progress: Option<Progress>,
    last_request: Option<GenerateRequest>,
    background_failures: Vec<BackgroundFailure>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Uploads --

    pub fn add_uploaded_file(&mut self, file: UploadedFile) {
        self.uploaded_files.push(file);
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.uploaded_files
    }

    /// Server id of the first uploaded template, used for generation.
    pub fn first_template_id(&self) -> Option<&str> {
        self.uploaded_files.first().map(|f| f.template_id.as_str())
    }

    /// Text of the upload area after a round of uploads.
    pub fn upload_summary(&self) -> String {
        match self.uploaded_files.len() {
            0 => "No template uploaded".to_string(),
            1 => format!("1 template uploaded: {}", self.uploaded_files[0].name),
            n => format!("{n} templates uploaded"),
        }
    }

    // -- Rating & feedback --

    /// Set the star rating. `0` clears it.
    pub fn set_rating(&mut self, rating: u8) -> Result<(), RatingError> {
        if rating > MAX_RATING {
            return Err(RatingError::OutOfRange(rating));
        }
        self.current_rating = rating;
        Ok(())
    }

    pub fn current_rating(&self) -> u8 {
        self.current_rating
    }

    pub fn set_feedback_text(&mut self, text: impl Into<String>) {
        self.feedback_text = text.into();
    }

    pub fn feedback_text(&self) -> &str {
        &self.feedback_text
    }

    pub fn set_improvement_suggestions(&mut self, suggestions: Vec<String>) {
        self.improvement_suggestions = suggestions;
    }

    pub fn improvement_suggestions(&self) -> &[String] {
        &self.improvement_suggestions
    }

    /// Clear rating, text and suggestions after a submitted feedback.
    pub fn reset_feedback(&mut self) {
        self.current_rating = 0;
        self.feedback_text.clear();
        self.improvement_suggestions.clear();
    }

    // -- Generation --

    /// Enter the `Generating` state. Returns `false` if a generation is
    /// already in flight.
    pub fn try_begin_generation(&mut self) -> bool {
        if self.is_generating {
            return false;
        }
        self.is_generating = true;
        true
    }

    /// Return to `Idle`. Also clears any progress indicator.
    pub fn finish_generation(&mut self) {
        self.is_generating = false;
        self.progress = None;
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating
    }

    /// Replace every generation-derived field from a successful response.
    ///
    /// Slides beyond `requested` are dropped and the first slide is always
    /// tagged as the title slide.
    pub fn apply_generation(&mut self, response: GenerateResponse, requested: u32) {
        let mut slides: Vec<Slide> = response
            .slides
            .into_iter()
            .take(requested as usize)
            .map(Slide::from)
            .collect();
        if let Some(first) = slides.first_mut() {
            first.slide_type = SlideType::Title;
        }

        self.generated_slides = slides;
        self.current_presentation_id = response.presentation_id;
        self.visual_suggestions = response.visual_suggestions;
        if response.content_analysis.is_some() {
            self.content_analysis = response.content_analysis;
        }
        self.quality_score = response
            .generation_metadata
            .and_then(|m| m.quality_score);
    }

    pub fn set_content_analysis(&mut self, analysis: ContentAnalysis) {
        self.content_analysis = Some(analysis);
    }

    pub fn set_last_request(&mut self, request: GenerateRequest) {
        self.last_request = Some(request);
    }

    pub fn last_request(&self) -> Option<&GenerateRequest> {
        self.last_request.as_ref()
    }

    pub fn generated_slides(&self) -> &[Slide] {
        &self.generated_slides
    }

    pub fn current_presentation_id(&self) -> Option<&str> {
        self.current_presentation_id.as_deref()
    }

    pub fn visual_suggestions(&self) -> Option<&VisualSuggestions> {
        self.visual_suggestions.as_ref()
    }

    pub fn content_analysis(&self) -> Option<&ContentAnalysis> {
        self.content_analysis.as_ref()
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.quality_score
    }

    /// Use an existing presentation id, e.g. when rating a deck generated
    /// in an earlier session.
    pub fn set_current_presentation_id(&mut self, id: impl Into<String>) {
        self.current_presentation_id = Some(id.into());
    }

    // -- Progress --

    pub fn set_progress(&mut self, message: impl Into<String>, percent: u8) {
        self.progress = Some(Progress {
            message: message.into(),
            percent: percent.min(100),
        });
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    // -- Personalization --

    pub fn set_personalization(&mut self, p: Personalization) {
        self.personalization = Some(p);
    }

    pub fn personalization(&self) -> Option<&Personalization> {
        self.personalization.as_ref()
    }

    pub fn set_user_profile(&mut self, profile: UserProfile) {
        self.user_profile = Some(profile);
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        self.user_profile.as_ref()
    }

    pub fn set_learning_result(&mut self, result: Value) {
        self.learning_result = Some(result);
    }

    pub fn learning_result(&self) -> Option<&Value> {
        self.learning_result.as_ref()
    }

    // -- Background channel --

    pub fn record_background_failure(&mut self, task: &str, message: impl Into<String>) {
        self.background_failures.push(BackgroundFailure {
            task: task.to_string(),
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub fn background_failures(&self) -> &[BackgroundFailure] {
        &self.background_failures
    }
}
