//! Generation orchestrator.
//!
//! `Idle -> Generating -> Idle`. Both the analyze-then-generate sequence and
//! the template export share the `is_generating` guard on [`AppState`].

use chrono::Utc;

use crate::api::Backend;
use crate::api::types::{ContentAnalysis, GenerateRequest};
use crate::config::schema::GenerationConfig;
use crate::render::quality_percent;
use crate::session::{Outcome, Session};
use crate::upload::FileHandle;

pub const MAX_SLIDES: u32 = 50;

pub const PRESENTATION_TYPES: [&str; 4] = ["business", "educational", "creative", "technical"];

/// User inputs for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub outline: String,
    pub presentation_type: String,
    pub slide_count: u32,
}

impl GenerationParams {
    /// Params for `outline` using the configured type and slide count.
    pub fn from_config(outline: impl Into<String>, config: &GenerationConfig) -> Self {
        Self {
            outline: outline.into(),
            presentation_type: config.presentation_type.clone(),
            slide_count: config.slide_count,
        }
    }
}

/// `generated_<unix millis>.pptx`
pub fn export_file_name() -> String {
    format!("generated_{}.pptx", Utc::now().timestamp_millis())
}

impl<B: Backend> Session<B> {
    /// Analyze the outline, then generate slides.
    ///
    /// Returns the number of slides kept on success.
    pub fn generate(&mut self, params: GenerationParams) -> Outcome<usize> {
        if self.state.is_generating() {
            return Outcome::Busy;
        }
        if params.outline.trim().is_empty() {
            self.notifier.warning("Please enter presentation content");
            return Outcome::Invalid;
        }
        if !(1..=MAX_SLIDES).contains(&params.slide_count) {
            self.notifier
                .warning(format!("Slide count must be between 1 and {MAX_SLIDES}"));
            return Outcome::Invalid;
        }

        let request = GenerateRequest {
            content_text: params.outline,
            presentation_type: params.presentation_type,
            slide_count: params.slide_count,
            target_audience: self.config.generation.target_audience.clone(),
            template_id: self.state.first_template_id().map(str::to_string),
        };
        self.run_generation(request)
    }

    /// Re-run the full sequence with the last request.
    pub fn regenerate(&mut self) -> Outcome<usize> {
        if self.state.is_generating() {
            return Outcome::Busy;
        }
        let Some(request) = self.state.last_request().cloned() else {
            self.notifier.warning("Nothing to regenerate yet");
            return Outcome::Invalid;
        };
        self.notifier.info("Regenerating presentation...");
        self.run_generation(request)
    }

    fn run_generation(&mut self, request: GenerateRequest) -> Outcome<usize> {
        if !self.state.try_begin_generation() {
            return Outcome::Busy;
        }
        self.state.set_last_request(request.clone());

        self.report_progress("Analyzing content...", 10);
        let analysis = if self.config.generation.content_suggestions {
            self.fetch_content_analysis(&request)
        } else {
            None
        };

        self.report_progress("Generating slides...", 40);
        let outcome = match self.backend.generate(&request) {
            Ok(response) => {
                let response_has_analysis = response.content_analysis.is_some();
                self.state.apply_generation(response, request.slide_count);
                if !response_has_analysis && let Some(a) = analysis {
                    self.state.set_content_analysis(a);
                }

                let count = self.state.generated_slides().len();
                let message = match self.state.quality_score() {
                    Some(score) => format!(
                        "Generated {count} slides (quality score: {}%)",
                        quality_percent(score)
                    ),
                    None => format!("Generated {count} slides"),
                };
                self.notifier.success(message);
                Outcome::Done(count)
            }
            Err(e) => {
                self.notifier.error(format!("Generation failed: {e}"));
                Outcome::Failed(e)
            }
        };

        self.state.finish_generation();
        outcome
    }

    /// Best-effort content analysis; failures go to the background channel.
    fn fetch_content_analysis(&mut self, request: &GenerateRequest) -> Option<ContentAnalysis> {
        match self.backend.content_suggestions(request) {
            Ok(resp) => resp.suggestions.content_analysis,
            Err(e) => {
                self.background_failure("content-suggestions", &e.to_string());
                None
            }
        }
    }

    /// Build a deck from a `.pptx` template and an outline, returning the
    /// file bytes.
    pub fn export_presentation(&mut self, template: &FileHandle, outline: &str) -> Outcome<Vec<u8>> {
        if self.state.is_generating() {
            return Outcome::Busy;
        }
        if !template.is_pptx() {
            self.notifier.warning("Please upload a .pptx template file");
            return Outcome::Invalid;
        }
        if outline.trim().is_empty() {
            self.notifier.warning("Please enter the presentation outline");
            return Outcome::Invalid;
        }
        if !self.state.try_begin_generation() {
            return Outcome::Busy;
        }

        self.report_progress("Preparing upload...", 0);
        self.report_progress("Uploading template and generating...", 30);
        let result = self.backend.generate_from_template(template, outline);
        self.report_progress("Backend processing, please wait...", 70);

        let outcome = match result {
            Ok(bytes) => {
                self.report_progress("Presentation ready", 100);
                self.notifier.success(format!(
                    "Presentation generated ({} KB)",
                    bytes.len().div_ceil(1024)
                ));
                Outcome::Done(bytes)
            }
            Err(e) => {
                self.notifier.error(format!("Export failed: {e}"));
                Outcome::Failed(e)
            }
        };

        self.state.finish_generation();
        outcome
    }
}
