//! Preview rendering: pure state → view-model functions.
//!
//! Nothing here touches the network or a terminal. Every backend-sourced
//! string is converted to [`SafeText`] on the way in; [`html`] escapes it on
//! the way out. The CLI prints the same view models as colored text.

pub mod html;
pub mod sanitize;

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::api::types::{
    Chart, ChartRecommendations, ContentAnalysis, Icon, Personalization, UserProfile,
    VisualSuggestions,
};
use crate::batch::jobs::Job;
use crate::batch::metrics::{MetricsDashboard, Section};
use crate::state::{AppState, Slide, SlideType};
use sanitize::{SafeText, clean, clean_all};

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("color regex must compile")
});

// ---------------------------------------------------------------------------
// Slides
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SlideThumbnail {
    /// Zero-based position, used to open the detail view.
    pub index: usize,
    pub title: SafeText,
    pub slide_type: SlideType,
    pub bullet_count: usize,
}

pub fn slide_thumbnails(state: &AppState) -> Vec<SlideThumbnail> {
    state
        .generated_slides()
        .iter()
        .enumerate()
        .map(|(index, slide)| SlideThumbnail {
            index,
            title: clean(&slide.title),
            slide_type: slide.slide_type,
            bullet_count: slide.bullet_points.len(),
        })
        .collect()
}

/// Plain-text summary of one slide, shown when a thumbnail is opened.
pub fn slide_detail(index: usize, slide: &Slide) -> String {
    let mut out = format!(
        "Slide {} ({}): {}",
        index + 1,
        slide.slide_type,
        clean(&slide.title)
    );
    let content = clean(&slide.content);
    if !content.is_empty() {
        out.push_str(&format!("\n{content}"));
    }
    for bullet in clean_all(&slide.bullet_points) {
        out.push_str(&format!("\n  • {bullet}"));
    }
    let visuals = clean_all(&slide.visual_elements);
    if !visuals.is_empty() {
        let joined: Vec<&str> = visuals.iter().map(SafeText::as_str).collect();
        out.push_str(&format!("\nVisual elements: {}", joined.join(", ")));
    }
    out
}

// ---------------------------------------------------------------------------
// AI insights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Swatch {
    pub label: SafeText,
    /// Validated `#rgb` / `#rrggbb`, safe for style attributes.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsightsPanel {
    pub quality_percent: Option<u32>,
    pub palette: Vec<Swatch>,
    pub fonts: Vec<SafeText>,
    pub principles: Vec<SafeText>,
}

/// `0.82` → `82`. Scores are clamped to `0.0..=1.0` first.
pub fn quality_percent(score: f64) -> u32 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u32
}

/// `None` when the last generation carried no design metadata.
pub fn insights_panel(state: &AppState) -> Option<InsightsPanel> {
    let quality_percent = state.quality_score().map(quality_percent);
    let visuals = state.visual_suggestions();
    if quality_percent.is_none() && visuals.is_none() {
        return None;
    }

    let mut panel = InsightsPanel {
        quality_percent,
        ..InsightsPanel::default()
    };
    if let Some(v) = visuals {
        fill_visuals(&mut panel, v);
    }
    Some(panel)
}

fn fill_visuals(panel: &mut InsightsPanel, v: &VisualSuggestions) {
    panel.palette = swatches(&v.color_scheme);
    panel.fonts = labelled_values(&v.typography)
        .into_iter()
        .map(|(label, value)| match label {
            Some(l) => clean(&format!("{l}: {value}")),
            None => clean(&value),
        })
        .filter(|s| !s.is_empty())
        .collect();
    panel.principles = clean_all(&v.design_principles);
}

/// Color swatches from either `["#fff", ...]` or `{"primary": "#fff"}`.
pub fn swatches(scheme: &Value) -> Vec<Swatch> {
    labelled_values(scheme)
        .into_iter()
        .enumerate()
        .filter(|(_, (_, color))| HEX_COLOR_RE.is_match(color.trim()))
        .map(|(i, (label, color))| Swatch {
            label: clean(&label.unwrap_or_else(|| format!("color {}", i + 1))),
            color: color.trim().to_string(),
        })
        .collect()
}

/// Flatten an array or object of scalars into `(label, value)` pairs.
fn labelled_values(value: &Value) -> Vec<(Option<String>, String)> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(scalar_text)
            .map(|v| (None, v))
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(k, v)| scalar_text(v).map(|t| (Some(k.clone()), t)))
            .collect(),
        other => scalar_text(other).map(|v| vec![(None, v)]).unwrap_or_default(),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Content analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisPanel {
    pub content_type: SafeText,
    pub complexity_level: SafeText,
    pub word_count: u64,
    pub main_themes: Vec<SafeText>,
}

pub fn analysis_panel(state: &AppState) -> Option<AnalysisPanel> {
    state.content_analysis().map(analysis_view)
}

pub fn analysis_view(a: &ContentAnalysis) -> AnalysisPanel {
    AnalysisPanel {
        content_type: clean(&a.content_type),
        complexity_level: clean(&a.complexity_level),
        word_count: a.word_count,
        main_themes: clean_all(&a.main_themes),
    }
}

// ---------------------------------------------------------------------------
// Personalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PersonalizationPanel {
    pub level: SafeText,
    /// `(name, value)` for color scheme, typography, layout and complexity.
    pub recommendations: Vec<(String, SafeText)>,
    pub palette: Vec<Swatch>,
    /// `(name, percent)`.
    pub confidence: Vec<(SafeText, u32)>,
    pub suggestions: Vec<SafeText>,
}

pub fn personalization_panel(p: &Personalization) -> PersonalizationPanel {
    let r = &p.recommendations;
    let recommendations = [
        ("Color scheme", &r.color_scheme),
        ("Typography", &r.typography),
        ("Layout", &r.layout_style),
        ("Complexity", &r.complexity_level),
    ]
    .into_iter()
    .filter_map(|(name, value)| {
        let text = summarize_value(value);
        let safe = clean(&text);
        (!safe.is_empty()).then(|| (name.to_string(), safe))
    })
    .collect();

    PersonalizationPanel {
        level: clean(&p.personalization_level),
        recommendations,
        palette: swatches(&r.color_scheme),
        confidence: p
            .confidence_scores
            .iter()
            .map(|(k, v)| (clean(k), quality_percent(*v)))
            .collect(),
        suggestions: clean_all(&p.adaptive_suggestions),
    }
}

/// One-line summary of an arbitrary recommendation value.
fn summarize_value(value: &Value) -> String {
    let pairs = labelled_values(value);
    pairs
        .into_iter()
        .map(|(label, v)| match label {
            Some(l) => format!("{l}: {v}"),
            None => v,
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub feedback_count: u64,
    pub level: SafeText,
    pub confidence_percent: u32,
}

pub fn profile_view(profile: &UserProfile) -> ProfileView {
    ProfileView {
        feedback_count: profile.feedback_count,
        level: clean(&profile.personalization_level),
        confidence_percent: quality_percent(profile.confidence_score),
    }
}

// ---------------------------------------------------------------------------
// Batch jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub job_id: SafeText,
    pub status: String,
    pub progress_percent: u32,
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub created_at: SafeText,
}

/// `round(progress * 100)`, clamped to `0..=100`.
pub fn progress_percent(progress: f64) -> u32 {
    if !progress.is_finite() {
        return 0;
    }
    (progress * 100.0).round().clamp(0.0, 100.0) as u32
}

pub fn job_rows(jobs: &[Job]) -> Vec<JobRow> {
    jobs.iter()
        .map(|job| JobRow {
            job_id: clean(&job.job_id),
            status: job.status.to_string(),
            progress_percent: progress_percent(job.progress),
            total_tasks: job.total_tasks,
            completed_tasks: job.completed_tasks,
            failed_tasks: job.failed_tasks,
            created_at: clean(&job.created_at_display()),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SectionBody {
    Rows(Vec<(String, String)>),
    /// Placeholder shown when this section's endpoint failed.
    LoadFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSection {
    pub title: &'static str,
    pub body: SectionBody,
}

fn section<T>(
    title: &'static str,
    s: &Section<T>,
    rows: impl FnOnce(&T) -> Vec<(String, String)>,
) -> MetricsSection {
    MetricsSection {
        title,
        body: match s {
            Section::Loaded(v) => SectionBody::Rows(rows(v)),
            Section::Failed(_) => SectionBody::LoadFailed,
        },
    }
}

fn row(label: &str, value: String) -> (String, String) {
    (label.to_string(), value)
}

pub fn metrics_view(d: &MetricsDashboard) -> Vec<MetricsSection> {
    vec![
        section("API performance", &d.api, |m| {
            vec![
                row("Total requests", m.total_requests.to_string()),
                row(
                    "Avg response time",
                    format!("{:.0} ms", m.average_response_time * 1000.0),
                ),
                row("Error rate", format!("{:.1}%", m.error_rate * 100.0)),
            ]
        }),
        section("Batch throughput", &d.batch, |s| {
            vec![
                row("Processed", s.total_processed.to_string()),
                row("Failed", s.total_failed.to_string()),
                row(
                    "Avg processing time",
                    format!("{:.2} s", s.average_processing_time),
                ),
            ]
        }),
        section("Cache", &d.cache, |c| {
            vec![
                row("Hit rate", format!("{:.1}%", c.hit_rate * 100.0)),
                row("Hits", c.hits.to_string()),
                row("Misses", c.misses.to_string()),
                row("Entries", c.size.to_string()),
            ]
        }),
        section("System", &d.system, |s| {
            vec![
                row("CPU", format!("{:.1}%", s.cpu_percent)),
                row("Memory", format!("{:.1}%", s.memory_percent)),
                row("Active jobs", s.active_jobs.to_string()),
                row("Queue length", s.queue_length.to_string()),
            ]
        }),
    ]
}

// ---------------------------------------------------------------------------
// Charts & icons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pub caption: SafeText,
    /// `data:image/png;base64,...`, built only from validated base64.
    pub data_url: Option<String>,
    pub suggestions: Vec<SafeText>,
}

pub fn chart_view(chart: &Chart) -> ImageView {
    ImageView {
        caption: clean(&chart.chart_type),
        data_url: image_data_url(&chart.chart_data.chart_base64),
        suggestions: clean_all(&chart.suggestions),
    }
}

pub fn icon_view(icon: &Icon) -> ImageView {
    ImageView {
        caption: clean(&format!("{} ({})", icon.concept, icon.style)),
        data_url: image_data_url(&icon.icon_data.icon_base64),
        suggestions: Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationView {
    pub recommended: SafeText,
    pub alternatives: Vec<SafeText>,
    pub suggestions: Vec<SafeText>,
}

pub fn recommendation_view(r: &ChartRecommendations) -> RecommendationView {
    RecommendationView {
        recommended: clean(&r.recommended_chart_type),
        alternatives: clean_all(&r.alternative_types),
        suggestions: clean_all(&r.suggestions),
    }
}

/// A `data:` URL for embedding, or `None` if the payload is not base64.
fn image_data_url(raw: &str) -> Option<String> {
    let bytes = crate::charts::decode_image(raw).ok()?;
    if bytes.is_empty() {
        return None;
    }
    let payload = crate::charts::strip_data_url(raw);
    Some(format!("data:image/png;base64,{payload}"))
}
