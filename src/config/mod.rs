/// Configuration system for deckgen.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::DeckgenConfig::default()`]
/// 2. **User global config**: `~/.deckgen/config.toml`
/// 3. **Project local config**: `.deckgen.toml` in the current working directory
/// 4. **Environment variables**: `DECKGEN_*` overrides (highest precedence)
///
/// Each file layer is merged key by key onto the layers below it; keys a
/// file does not mention keep their previous value.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DeckgenConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> DeckgenConfig {
    load_layers(
        &[global_config_path(), project_config_path()],
        |name| std::env::var(name).ok(),
    )
}

/// Resolve defaults, then each file in `files` in order, then `env`.
///
/// Each file is merged key by key onto the layers below it, so a project
/// file that only sets `[generation]` keeps the global `[api]` section.
fn load_layers(
    files: &[Option<PathBuf>],
    env: impl Fn(&str) -> Option<String>,
) -> DeckgenConfig {
    let mut config = DeckgenConfig::default();

    for path in files.iter().flatten() {
        if let Some(layered) = merge_file(&config, path) {
            config = layered;
        }
    }

    apply_env_overrides(&mut config, env);

    config
}

/// Merge the TOML file at `path` onto `base`.
///
/// Returns `None` when the file is missing, malformed, or would not
/// deserialize into the schema, so a broken file never blocks a command.
fn merge_file(base: &DeckgenConfig, path: &Path) -> Option<DeckgenConfig> {
    let content = fs::read_to_string(path).ok()?;
    let overlay: toml::Value = toml::from_str(&content).ok()?;
    let mut root = toml::Value::try_from(base).ok()?;
    merge_toml(&mut root, overlay);
    root.try_into().ok()
}

/// Deep-merge `overlay` into `base`: tables merge recursively, every other
/// value replaces.
fn merge_toml(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".deckgen").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".deckgen.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Supported variables:
/// - `DECKGEN_API_URL`: backend base URL
/// - `DECKGEN_TIMEOUT_MS`: request timeout
/// - `DECKGEN_PRESENTATION_TYPE`: default presentation type
/// - `DECKGEN_SLIDE_COUNT`: default slide count
/// - `DECKGEN_LOG`: activity log on/off (`1`/`true`/`yes`/`on`)
///
/// `env` looks a variable up by name; [`load`] passes the process environment.
fn apply_env_overrides(config: &mut DeckgenConfig, env: impl Fn(&str) -> Option<String>) {
    if let Some(val) = env("DECKGEN_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Some(val) = env("DECKGEN_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Some(val) = env("DECKGEN_PRESENTATION_TYPE")
        && !val.is_empty()
    {
        config.generation.presentation_type = val;
    }
    if let Some(val) = env("DECKGEN_SLIDE_COUNT")
        && let Ok(count) = val.parse::<u32>()
    {
        config.generation.slide_count = count;
    }
    if let Some(val) = env("DECKGEN_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.deckgen/config.toml`.
///
/// Returns an error if the file already exists and `force` is false.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.deckgen/ directory")?;
    }

    fs::write(&path, DeckgenConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `api.base_url`) in the global config file.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DeckgenConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer deserialize into the schema.
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<DeckgenConfig>(&updated)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML value tree using a dotted key path.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table for '{key}'"))?;

    let new_value = match table.get(*leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key: '{key}'"),
    };

    table.insert((*leaf).to_string(), new_value);
    Ok(())
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(is_truthy("yes"));
        assert!(is_truthy("On"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str(
            r#"
[api]
base_url = "http://127.0.0.1:5000"
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "api.base_url", "https://decks.example.com").unwrap();
        assert_eq!(
            root["api"]["base_url"].as_str(),
            Some("https://decks.example.com")
        );
    }

    #[test]
    fn set_toml_value_updates_integer_and_bool() {
        let mut root: toml::Value = toml::from_str(
            r#"
[generation]
slide_count = 10
content_suggestions = true
"#,
        )
        .unwrap();
        set_toml_value(&mut root, "generation.slide_count", "7").unwrap();
        set_toml_value(&mut root, "generation.content_suggestions", "off").unwrap();
        assert_eq!(root["generation"]["slide_count"].as_integer(), Some(7));
        assert_eq!(
            root["generation"]["content_suggestions"].as_bool(),
            Some(false)
        );
    }

    #[test]
    fn set_toml_value_rejects_bad_integer() {
        let mut root: toml::Value = toml::from_str("[api]\ntimeout_ms = 100\n").unwrap();
        assert!(set_toml_value(&mut root, "api.timeout_ms", "soon").is_err());
    }

    #[test]
    fn set_toml_value_rejects_unknown_key() {
        let mut root: toml::Value = toml::from_str("[api]\ntimeout_ms = 100\n").unwrap();
        assert!(set_toml_value(&mut root, "api.retries", "3").is_err());
        assert!(set_toml_value(&mut root, "nonexistent.key", "3").is_err());
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn write(dir: &Path, name: &str, body: &str) -> Option<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        Some(path)
    }

    #[test]
    fn project_layer_keeps_global_keys() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            dir.path(),
            "config.toml",
            "[api]\nbase_url = \"http://backend.internal:9000\"\ntimeout_ms = 5000\n",
        );
        let project = write(dir.path(), ".deckgen.toml", "[generation]\nslide_count = 8\n");

        let config = load_layers(&[global, project], no_env);

        assert_eq!(config.api.base_url, "http://backend.internal:9000");
        assert_eq!(config.api.timeout_ms, 5000);
        assert_eq!(config.generation.slide_count, 8);
        assert_eq!(
            config.generation.presentation_type,
            DeckgenConfig::default().generation.presentation_type
        );
    }

    #[test]
    fn project_layer_overrides_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(dir.path(), "config.toml", "[generation]\nslide_count = 12\n");
        let project = write(dir.path(), ".deckgen.toml", "[generation]\nslide_count = 4\n");

        let config = load_layers(&[global, project], no_env);

        assert_eq!(config.generation.slide_count, 4);
    }

    #[test]
    fn broken_layers_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(dir.path(), "config.toml", "[api]\nbase_url = \"http://a:1\"\n");
        let malformed = write(dir.path(), "bad.toml", "[api\nbase_url = ");
        let wrong_type = write(dir.path(), "typed.toml", "[api]\ntimeout_ms = \"soon\"\n");
        let missing = Some(dir.path().join("missing.toml"));

        let config = load_layers(&[global, malformed, wrong_type, missing, None], no_env);

        assert_eq!(config.api.base_url, "http://a:1");
        assert_eq!(config.api.timeout_ms, DeckgenConfig::default().api.timeout_ms);
    }

    #[test]
    fn env_overrides_win_over_files() {
        let dir = tempfile::tempdir().unwrap();
        let global = write(
            dir.path(),
            "config.toml",
            "[api]\nbase_url = \"http://file:1\"\n[logging]\nenabled = true\n",
        );
        let env = |name: &str| match name {
            "DECKGEN_API_URL" => Some("http://env:2".to_string()),
            "DECKGEN_TIMEOUT_MS" => Some("750".to_string()),
            "DECKGEN_PRESENTATION_TYPE" => Some("technical".to_string()),
            "DECKGEN_SLIDE_COUNT" => Some("not-a-number".to_string()),
            "DECKGEN_LOG" => Some("off".to_string()),
            _ => None,
        };

        let config = load_layers(&[global], env);

        assert_eq!(config.api.base_url, "http://env:2");
        assert_eq!(config.api.timeout_ms, 750);
        assert_eq!(config.generation.presentation_type, "technical");
        assert_eq!(
            config.generation.slide_count,
            DeckgenConfig::default().generation.slide_count
        );
        assert!(!config.logging.enabled);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = DeckgenConfig::default();
        apply_env_overrides(&mut config, |name| {
            (name == "DECKGEN_API_URL").then(String::new)
        });
        assert_eq!(config.api.base_url, DeckgenConfig::default().api.base_url);
    }

    #[test]
    fn merge_toml_recurses_into_tables() {
        let mut base: toml::Value =
            toml::from_str("[api]\nbase_url = \"a\"\ntimeout_ms = 1\n").unwrap();
        let overlay: toml::Value = toml::from_str("[api]\ntimeout_ms = 2\n").unwrap();
        merge_toml(&mut base, overlay);
        assert_eq!(base["api"]["base_url"].as_str(), Some("a"));
        assert_eq!(base["api"]["timeout_ms"].as_integer(), Some(2));
    }

    #[test]
    fn show_effective_config_round_trips() {
        let toml_str = show_effective_config().unwrap();
        let _: DeckgenConfig = toml::from_str(&toml_str).unwrap();
    }
}
