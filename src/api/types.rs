//! Request and response payloads for the generation backend.
//!
//! Response structs only describe the payload fields; the `success` /
//! `error` envelope is checked by the transport before decoding.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads an explicit `null` as the field's default, the same as a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    pub template_id: String,
    /// Server-side template metadata, kept opaque.
    #[serde(default)]
    pub template: Value,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Body of `/api/generate`. `template_id` is sent as `null` when no
/// template was uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub content_text: String,
    pub presentation_type: String,
    pub slide_count: u32,
    pub target_audience: String,
    pub template_id: Option<String>,
}

impl GenerateRequest {
    /// The `/api/content-suggestions` body for the same outline.
    pub fn suggestions_request(&self) -> ContentSuggestionsRequest<'_> {
        ContentSuggestionsRequest {
            content_text: &self.content_text,
            presentation_type: &self.presentation_type,
            slide_count: self.slide_count,
            target_audience: &self.target_audience,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentSuggestionsRequest<'a> {
    pub content_text: &'a str,
    pub presentation_type: &'a str,
    pub slide_count: u32,
    pub target_audience: &'a str,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSuggestionsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: ContentSuggestions,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSuggestions {
    #[serde(default)]
    pub content_analysis: Option<ContentAnalysis>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub complexity_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub word_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub main_themes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub slides: Vec<SlidePayload>,
    #[serde(default)]
    pub presentation_id: Option<String>,
    #[serde(default)]
    pub visual_suggestions: Option<VisualSuggestions>,
    #[serde(default)]
    pub content_analysis: Option<ContentAnalysis>,
    #[serde(default)]
    pub generation_metadata: Option<GenerationMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlidePayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default", rename = "type")]
    pub slide_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bullet_points: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visual_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualSuggestions {
    /// Either a list of colors or an object of named colors.
    #[serde(default)]
    pub color_scheme: Value,
    /// Either a list of font names or an object of role → font.
    #[serde(default)]
    pub typography: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub design_principles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationMetadata {
    #[serde(default)]
    pub quality_score: Option<f64>,
}

// ---------------------------------------------------------------------------
// Feedback & personalization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub presentation_id: String,
    pub rating: u8,
    pub feedback_text: String,
    pub improvement_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnFeedbackRequest {
    pub user_id: String,
    pub presentation_id: String,
    pub feedback: LearnFeedback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnFeedback {
    pub overall_rating: u8,
    pub design_rating: u8,
    pub content_rating: u8,
    pub comments: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearnFeedbackResponse {
    #[serde(default)]
    pub learning_result: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Personalization,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personalization {
    #[serde(default, deserialize_with = "null_as_default")]
    pub personalization_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: DesignRecommendations,
    /// Keyed by recommendation name, values in `0.0..=1.0`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence_scores: std::collections::BTreeMap<String, f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub adaptive_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignRecommendations {
    #[serde(default)]
    pub color_scheme: Value,
    #[serde(default)]
    pub typography: Value,
    #[serde(default)]
    pub layout_style: Value,
    #[serde(default)]
    pub complexity_level: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfileResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub feedback_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personalization_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence_score: f64,
}

// ---------------------------------------------------------------------------
// Charts & icons
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRequest {
    pub chart_data: Value,
    pub chart_type: Option<String>,
    pub style_preferences: StylePreferences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StylePreferences {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color_scheme: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default, deserialize_with = "null_as_default")]
    pub chart_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chart_data: ChartImage,
    #[serde(default)]
    pub data_analysis: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub chart_base64: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconRequest {
    pub concept: String,
    pub style: String,
    pub color_scheme: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconResponse {
    pub icon: Icon,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Icon {
    #[serde(default, deserialize_with = "null_as_default")]
    pub concept: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon_data: IconImage,
    #[serde(default)]
    pub color_scheme: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variations: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IconImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub icon_base64: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartRecommendations {
    #[serde(default)]
    pub data_analysis: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_chart_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alternative_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub files: Vec<BatchFileRef>,
    pub job_type: String,
    pub parameters: JobParameters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFileRef {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobParameters {
    pub priority: String,
    pub user_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub jobs: Vec<crate::batch::jobs::Job>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job: crate::batch::jobs::Job,
}

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetricsResponse {
    pub metrics: PerformanceMetrics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub global: GlobalMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMetrics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_requests: u64,
    /// Seconds.
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_response_time: f64,
    /// Fraction in `0.0..=1.0`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub error_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStatsResponse {
    pub stats: BatchStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_processed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_failed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub average_processing_time: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cache_hit_rate: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatsResponse {
    pub stats: CacheStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hits: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub misses: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hit_rate: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemStatsResponse {
    pub stats: SystemStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub cpu_percent: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub memory_percent: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_jobs: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub queue_length: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvalidateResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub invalidated_count: u64,
}

/// Payload-less acknowledgement (`{"success": true}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {}
