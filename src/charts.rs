//! Chart and icon generation panel.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use base64::Engine;
use serde_json::Value;

use crate::api::Backend;
use crate::api::types::{Chart, ChartRecommendations, ChartRequest, Icon, IconRequest, StylePreferences};
use crate::session::{Outcome, Session};

/// Style presets used for chart variants.
pub const CHART_STYLES: &[&str] = &["modern", "classic", "minimal"];

/// Drawing style requested from the icon endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IconStyle {
    #[default]
    Flat,
    Outline,
    Filled,
}

impl IconStyle {
    pub const ALL: [IconStyle; 3] = [Self::Flat, Self::Outline, Self::Filled];

    /// Wire name of the style.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Outline => "outline",
            Self::Filled => "filled",
        }
    }
}

impl fmt::Display for IconStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IconStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "outline" => Ok(Self::Outline),
            "filled" => Ok(Self::Filled),
            other => Err(format!(
                "unknown icon style '{other}' (expected flat, outline or filled)"
            )),
        }
    }
}

/// Optional chart parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartOptions {
    pub chart_type: Option<String>,
    pub style: Option<String>,
    pub color_scheme: Option<String>,
}

/// One independently requested variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant<T> {
    pub label: String,
    pub result: Result<T, String>,
}

/// Results of the last chart, icon and recommendation requests.
///
/// A failed single request leaves the previous result in place. Variant
/// lists are replaced on every run.
#[derive(Debug, Default)]
pub struct ChartPanel {
    chart: Option<Chart>,
    chart_variants: Vec<Variant<Chart>>,
    icon: Option<Icon>,
    icon_variants: Vec<Variant<Icon>>,
    recommendation: Option<ChartRecommendations>,
}

impl ChartPanel {
    /// The last successfully generated chart.
    pub fn chart(&self) -> Option<&Chart> {
        self.chart.as_ref()
    }

    /// One entry per style preset from the last variants run, failures included.
    pub fn chart_variants(&self) -> &[Variant<Chart>] {
        &self.chart_variants
    }

    /// The last successfully generated icon.
    pub fn icon(&self) -> Option<&Icon> {
        self.icon.as_ref()
    }

    /// One entry per [`IconStyle`] from the last variants run.
    pub fn icon_variants(&self) -> &[Variant<Icon>] {
        &self.icon_variants
    }

    pub fn recommendation(&self) -> Option<&ChartRecommendations> {
        self.recommendation.as_ref()
    }

    /// Write the current chart image to `path`. Returns the byte count.
    pub fn save_chart_image(&self, path: &Path) -> Result<usize> {
        let Some(chart) = &self.chart else {
            bail!("no chart has been generated yet");
        };
        write_image(&chart.chart_data.chart_base64, path)
    }

    /// Write the current icon image to `path`. Returns the byte count.
    pub fn save_icon_image(&self, path: &Path) -> Result<usize> {
        let Some(icon) = &self.icon else {
            bail!("no icon has been generated yet");
        };
        write_image(&icon.icon_data.icon_base64, path)
    }
}

/// Parse user-entered chart data. Only objects and arrays are accepted.
pub fn parse_chart_data(raw: &str) -> Result<Value, String> {
    let value: Value = serde_json::from_str(raw.trim()).map_err(|e| e.to_string())?;
    match value {
        Value::Object(_) | Value::Array(_) => Ok(value),
        _ => Err("chart data must be a JSON object or array".to_string()),
    }
}

/// Drop a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with("data:")
        && let Some((_, payload)) = trimmed.split_once(',')
    {
        return payload;
    }
    trimmed
}

/// Decode a base64 image, optionally wrapped in a `data:` URL.
pub fn decode_image(raw: &str) -> Result<Vec<u8>, base64::DecodeError> {
    base64::engine::general_purpose::STANDARD.decode(strip_data_url(raw))
}

fn write_image(raw: &str, path: &Path) -> Result<usize> {
    let bytes = decode_image(raw).context("image data is not valid base64")?;
    if bytes.is_empty() {
        bail!("the server returned an empty image");
    }
    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(bytes.len())
}

impl<B: Backend> Session<B> {
    /// Parse `raw_json`, notifying a format error instead of calling the
    /// backend when it is not valid.
    fn chart_data_or_warn(&mut self, raw_json: &str) -> Option<Value> {
        match parse_chart_data(raw_json) {
            Ok(v) => Some(v),
            Err(e) => {
                self.notifier
                    .error(format!("Invalid chart data format: {e}"));
                None
            }
        }
    }

    fn chart_request(data: Value, options: &ChartOptions, style: Option<&str>) -> ChartRequest {
        ChartRequest {
            chart_data: data,
            chart_type: options.chart_type.clone(),
            style_preferences: StylePreferences {
                style: style.map(str::to_string),
                color_scheme: options.color_scheme.clone(),
            },
        }
    }

    /// Render `raw_json` as a chart. Input that is not a JSON object or
    /// array is refused locally with a warning.
    pub fn generate_chart(&mut self, raw_json: &str, options: &ChartOptions) -> Outcome<()> {
        let Some(data) = self.chart_data_or_warn(raw_json) else {
            return Outcome::Invalid;
        };
        let request = Self::chart_request(data, options, options.style.as_deref());
        match self.backend.generate_chart(&request) {
            Ok(chart) => {
                self.notifier
                    .success(format!("Generated {} chart", chart.chart_type));
                self.charts.chart = Some(chart);
                Outcome::Done(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Chart generation failed: {e}"));
                Outcome::Failed(e)
            }
        }
    }

    /// One request per style preset. Returns how many succeeded.
    pub fn generate_chart_variants(&mut self, raw_json: &str, options: &ChartOptions) -> Outcome<usize> {
        let Some(data) = self.chart_data_or_warn(raw_json) else {
            return Outcome::Invalid;
        };

        let variants: Vec<Variant<Chart>> = CHART_STYLES
            .iter()
            .map(|style| {
                let request = Self::chart_request(data.clone(), options, Some(style));
                Variant {
                    label: style.to_string(),
                    result: self.backend.generate_chart(&request).map_err(|e| e.to_string()),
                }
            })
            .collect();

        let ok = self.report_variants("chart", &variants);
        self.charts.chart_variants = variants;
        Outcome::Done(ok)
    }

    /// Generate one icon for `concept`. An empty concept is refused locally.
    pub fn generate_icon(&mut self, concept: &str, style: IconStyle, color_scheme: Option<&str>) -> Outcome<()> {
        let concept = concept.trim();
        if concept.is_empty() {
            self.notifier.warning("Please enter an icon concept");
            return Outcome::Invalid;
        }
        let request = IconRequest {
            concept: concept.to_string(),
            style: style.to_string(),
            color_scheme: color_scheme.map(str::to_string),
        };
        match self.backend.generate_icon(&request) {
            Ok(icon) => {
                self.notifier
                    .success(format!("Generated {style} icon for \"{concept}\""));
                self.charts.icon = Some(icon);
                Outcome::Done(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Icon generation failed: {e}"));
                Outcome::Failed(e)
            }
        }
    }

    /// One request per icon style. Returns how many succeeded.
    pub fn generate_icon_variants(&mut self, concept: &str, color_scheme: Option<&str>) -> Outcome<usize> {
        let concept = concept.trim();
        if concept.is_empty() {
            self.notifier.warning("Please enter an icon concept");
            return Outcome::Invalid;
        }

        let variants: Vec<Variant<Icon>> = IconStyle::ALL
            .iter()
            .map(|style| {
                let request = IconRequest {
                    concept: concept.to_string(),
                    style: style.to_string(),
                    color_scheme: color_scheme.map(str::to_string),
                };
                Variant {
                    label: style.to_string(),
                    result: self.backend.generate_icon(&request).map_err(|e| e.to_string()),
                }
            })
            .collect();

        let ok = self.report_variants("icon", &variants);
        self.charts.icon_variants = variants;
        Outcome::Done(ok)
    }

    fn report_variants<T>(&mut self, what: &str, variants: &[Variant<T>]) -> usize {
        let failed: Vec<String> = variants
            .iter()
            .filter_map(|v| v.result.as_ref().err().map(|e| format!("{}: {e}", v.label)))
            .collect();
        let ok = variants.len() - failed.len();
        if failed.is_empty() {
            self.notifier
                .success(format!("Generated {ok} {what} variants"));
        } else if ok == 0 {
            self.notifier.error(format!(
                "All {what} variants failed ({})",
                failed.join("; ")
            ));
        } else {
            self.notifier.warning(format!(
                "Generated {ok} of {} {what} variants ({})",
                variants.len(),
                failed.join("; ")
            ));
        }
        ok
    }

    /// Ask which chart type suits `raw_json` best.
    pub fn recommend_chart(&mut self, raw_json: &str) -> Outcome<()> {
        let Some(data) = self.chart_data_or_warn(raw_json) else {
            return Outcome::Invalid;
        };
        match self.backend.chart_recommendations(&data) {
            Ok(rec) => {
                self.notifier.info(format!(
                    "Recommended chart type: {}",
                    rec.recommended_chart_type
                ));
                self.charts.recommendation = Some(rec);
                Outcome::Done(())
            }
            Err(e) => {
                self.notifier
                    .error(format!("Chart recommendation failed: {e}"));
                Outcome::Failed(e)
            }
        }
    }
}
