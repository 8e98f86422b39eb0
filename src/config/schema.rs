/// Configuration schema and defaults for deckgen.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[api]`, `[generation]`, `[notifications]`, `[batch]`, `[identity]` and
/// `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values they
/// want to override.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level deckgen configuration.
///
/// Maps directly to the `~/.deckgen/config.toml` and `.deckgen.toml` file
/// schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckgenConfig {
    pub api: ApiConfig,
    pub generation: GenerationConfig,
    pub notifications: NotificationConfig,
    pub batch: BatchConfig,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the generation backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout (milliseconds). Applies to every backend call.
    pub timeout_ms: u64,
    /// User-Agent header sent with each request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 60_000,
            user_agent: format!("deckgen/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ---------------------------------------------------------------------------
// [generation]
// ---------------------------------------------------------------------------

/// Defaults for slide generation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Presentation type sent when none is given on the command line.
    pub presentation_type: String,
    /// Requested number of slides.
    pub slide_count: u32,
    /// Target audience. The front end never exposes this as an input.
    pub target_audience: String,
    /// Ask the backend for content-analysis suggestions before generating.
    pub content_suggestions: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            presentation_type: "business".to_string(),
            slide_count: 10,
            target_audience: "general".to_string(),
            content_suggestions: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [notifications]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Auto-dismiss delay for a shown notification (milliseconds).
    pub dismiss_after_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [batch]
// ---------------------------------------------------------------------------

/// Batch job submission and polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Job type sent with `create-job`.
    pub job_type: String,
    /// Priority sent in the job parameters: `low`, `normal` or `high`.
    pub priority: String,
    /// Delay between two job-status polls (milliseconds).
    pub poll_interval_ms: u64,
    /// Maximum number of polling rounds before giving up.
    pub max_polls: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            job_type: "template_analysis".to_string(),
            priority: "normal".to_string(),
            poll_interval_ms: 2_000,
            max_polls: 150,
        }
    }
}

// ---------------------------------------------------------------------------
// [identity]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// File holding the pseudo-anonymous user id. `~` expands to the home
    /// directory.
    pub path: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            path: "~/.deckgen/user-id".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether backend calls are recorded in the activity log.
    pub enabled: bool,
    /// Path to the JSONL activity log. `~` expands to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.deckgen/activity.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl DeckgenConfig {
    /// Resolved identity file path, with `~` expanded.
    pub fn identity_path(&self) -> Option<std::path::PathBuf> {
        expand_home(&self.identity.path)
    }

    /// Resolved activity log path, or `None` when logging is disabled.
    pub fn log_path(&self) -> Option<std::path::PathBuf> {
        if !self.logging.enabled {
            return None;
        }
        expand_home(&self.logging.path)
    }

    /// Annotated default config, written by `deckgen config init`.
    pub fn default_toml() -> String {
        let d = Self::default();
        format!(
            r#"# deckgen configuration
#
# Layers (later wins): built-in defaults, ~/.deckgen/config.toml,
# ./.deckgen.toml, DECKGEN_* environment variables.

[api]
# Backend base URL
base_url = "{base_url}"
# Per-request timeout in milliseconds
timeout_ms = {timeout_ms}
user_agent = "{user_agent}"

[generation]
# business, academic, marketing, technical, creative, educational
presentation_type = "{presentation_type}"
slide_count = {slide_count}
target_audience = "{target_audience}"
# Request content-analysis suggestions before each generation
content_suggestions = {content_suggestions}

[notifications]
dismiss_after_ms = {dismiss_after_ms}

[batch]
job_type = "{job_type}"
# low, normal, high
priority = "{priority}"
poll_interval_ms = {poll_interval_ms}
max_polls = {max_polls}

[identity]
path = "{identity_path}"

[logging]
enabled = {logging_enabled}
path = "{logging_path}"
"#,
            base_url = d.api.base_url,
            timeout_ms = d.api.timeout_ms,
            user_agent = d.api.user_agent,
            presentation_type = d.generation.presentation_type,
            slide_count = d.generation.slide_count,
            target_audience = d.generation.target_audience,
            content_suggestions = d.generation.content_suggestions,
            dismiss_after_ms = d.notifications.dismiss_after_ms,
            job_type = d.batch.job_type,
            priority = d.batch.priority,
            poll_interval_ms = d.batch.poll_interval_ms,
            max_polls = d.batch.max_polls,
            identity_path = d.identity.path,
            logging_enabled = d.logging.enabled,
            logging_path = d.logging.path,
        )
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> Option<std::path::PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else if raw == "~" {
        dirs::home_dir()
    } else {
        Some(std::path::PathBuf::from(raw))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = DeckgenConfig::default();
        assert_eq!(config.api.timeout_ms, 60_000);
        assert_eq!(config.generation.target_audience, "general");
        assert_eq!(config.notifications.dismiss_after_ms, 5_000);
        assert_eq!(config.batch.priority, "normal");
        assert!(config.logging.enabled);
    }

    #[test]
    fn deserialize_minimal_toml() {
        let toml_str = r#"
[api]
base_url = "https://decks.example.com"
"#;
        let config: DeckgenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://decks.example.com");
        assert_eq!(config.api.timeout_ms, 60_000);
        assert_eq!(config.generation.slide_count, 10);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let config: DeckgenConfig = toml::from_str("").unwrap();
        assert_eq!(config.batch.poll_interval_ms, 2_000);
        assert!(config.generation.content_suggestions);
    }

    #[test]
    fn default_toml_parses_back() {
        let config: DeckgenConfig = toml::from_str(&DeckgenConfig::default_toml()).unwrap();
        assert_eq!(config.api.base_url, DeckgenConfig::default().api.base_url);
        assert_eq!(config.batch.max_polls, 150);
    }

    #[test]
    fn log_path_none_when_disabled() {
        let mut config = DeckgenConfig::default();
        config.logging.enabled = false;
        assert!(config.log_path().is_none());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(
            expand_home("/tmp/id"),
            Some(std::path::PathBuf::from("/tmp/id"))
        );
    }
}
