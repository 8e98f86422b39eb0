//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `deckgen upload` / `generate` / `export`: templates and slide generation
//! - `deckgen feedback` / `recommendations` / `profile`: rating and personalization
//! - `deckgen chart` / `chart-recommend` / `icon`: visual assets
//! - `deckgen batch submit|jobs|watch|process`, `metrics`, `cache-invalidate`
//! - `deckgen config show|init|set|path`, `log`: local configuration and activity
//!
//! Every handler returns `Ok(true)` when the action succeeded, `Ok(false)`
//! when it was reported to the user as a warning or error, and `Err` only for
//! local I/O problems.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;

use crate::activity::{ActivityEntry, ActivityLog};
use crate::api::http::HttpBackend;
use crate::batch::jobs::PollReport;
use crate::charts::{ChartOptions, IconStyle};
use crate::config::{self, DeckgenConfig};
use crate::generation::{GenerationParams, export_file_name};
use crate::notify::{Notification, NotificationKind, Notifier};
use crate::render::{self, SectionBody, html};
use crate::session::{Outcome, Session};
use crate::upload::FileHandle;

type CliSession = Session<HttpBackend>;

/// Session over the HTTP backend that prints every notification and
/// progress stage.
pub fn build_session(config: DeckgenConfig) -> CliSession {
    let log = ActivityLog::from_config(&config);
    let backend = HttpBackend::from_config(&config.api, log);
    let notifier = Notifier::new(std::time::Duration::from_millis(
        config.notifications.dismiss_after_ms,
    ))
    .with_display(print_notification);
    Session::new(backend, config)
        .with_notifier(notifier)
        .with_progress_display(|p| {
            println!("  {} {}", format!("[{:>3}%]", p.percent).dimmed(), p.message);
        })
}

fn print_notification(n: &Notification) {
    match n.kind {
        NotificationKind::Info => println!("{} {}", "·".blue().bold(), n.message),
        NotificationKind::Success => println!("{} {}", "✓".green().bold(), n.message),
        NotificationKind::Warning => eprintln!("{} {}", "!".yellow().bold(), n.message.yellow()),
        NotificationKind::Error => eprintln!("{} {}", "✗".red().bold(), n.message.red()),
    }
}

fn heading(title: &str) {
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(50));
}

/// Read outline text from an argument, a file, or stdin (`-`).
pub fn read_outline(text: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (text, file) {
        (_, Some(path)) if path == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read outline from stdin")?;
            Ok(buf)
        }
        (_, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read outline from {}", path.display())),
        (Some(text), None) => Ok(text.to_string()),
        (None, None) => Ok(String::new()),
    }
}

fn read_files(paths: &[PathBuf]) -> Result<Vec<FileHandle>> {
    paths.iter().map(|p| FileHandle::from_path(p)).collect()
}

/// Read a JSON argument: inline text, or `@path` for a file.
fn read_json_arg(raw: &str) -> Result<String> {
    match raw.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {path}"))
        }
        None => Ok(raw.to_string()),
    }
}

// ---------------------------------------------------------------------------
// deckgen upload
// ---------------------------------------------------------------------------

pub fn run_upload(config: DeckgenConfig, paths: &[PathBuf]) -> Result<bool> {
    let mut session = build_session(config);
    let report = session.accept_files(read_files(paths)?);
    println!("{}", session.upload_summary().dimmed());
    for file in session.state().uploaded_files() {
        println!("  {:<30} {}", file.name, file.template_id.dimmed());
    }
    Ok(report.accepted > 0 && report.failed == 0)
}

// ---------------------------------------------------------------------------
// deckgen generate
// ---------------------------------------------------------------------------

pub struct GenerateArgs {
    pub outline: String,
    pub presentation_type: Option<String>,
    pub slide_count: Option<u32>,
    pub templates: Vec<PathBuf>,
    pub html: Option<PathBuf>,
    pub regenerate: bool,
}

pub fn run_generate(config: DeckgenConfig, args: GenerateArgs) -> Result<bool> {
    let mut params = GenerationParams::from_config(args.outline, &config.generation);
    if let Some(t) = args.presentation_type {
        params.presentation_type = t;
    }
    if let Some(n) = args.slide_count {
        params.slide_count = n;
    }

    let mut session = build_session(config);
    if !args.templates.is_empty() {
        session.accept_files(read_files(&args.templates)?);
    }

    let mut outcome = session.generate(params);
    if args.regenerate && outcome.is_done() {
        outcome = session.regenerate();
    }
    if !outcome.is_done() {
        return Ok(false);
    }

    print_slides(&session);
    if let Some(path) = &args.html {
        write_preview_page(&session, path)?;
        println!("{} Preview written to {}", "✓".green().bold(), path.display());
    }
    Ok(true)
}

fn print_slides(session: &CliSession) {
    let state = session.state();
    if let Some(id) = state.current_presentation_id() {
        println!("  {} {}", "Presentation:".bold(), id);
    }

    heading("Slides");
    for (i, slide) in state.generated_slides().iter().enumerate() {
        println!("{}", render::slide_detail(i, slide));
        println!();
    }

    if let Some(panel) = render::insights_panel(state) {
        heading("AI design insights");
        if let Some(q) = panel.quality_percent {
            println!("  {} {q}%", "Quality score:".bold());
        }
        if !panel.palette.is_empty() {
            let colors: Vec<String> = panel
                .palette
                .iter()
                .map(|s| format!("{} {}", s.label, s.color))
                .collect();
            println!("  {} {}", "Palette:".bold(), colors.join(", "));
        }
        for font in &panel.fonts {
            println!("  {} {font}", "Font:".bold());
        }
        for p in &panel.principles {
            println!("  • {p}");
        }
    }

    if let Some(a) = render::analysis_panel(state) {
        heading("Content analysis");
        println!("  {} {}", "Type:      ".bold(), a.content_type);
        println!("  {} {}", "Complexity:".bold(), a.complexity_level);
        println!("  {} {}", "Words:     ".bold(), a.word_count);
        let themes: Vec<&str> = a.main_themes.iter().map(|t| t.as_str()).collect();
        if !themes.is_empty() {
            println!("  {} {}", "Themes:    ".bold(), themes.join(", "));
        }
    }
}

fn write_preview_page(session: &CliSession, path: &Path) -> Result<()> {
    let state = session.state();
    let mut fragments = vec![html::slide_grid(&render::slide_thumbnails(state))];
    if let Some(panel) = render::insights_panel(state) {
        fragments.push(html::insights(&panel));
    }
    if let Some(panel) = render::analysis_panel(state) {
        fragments.push(html::analysis(&panel));
    }
    fs::write(path, html::page("Presentation preview", &fragments))
        .with_context(|| format!("failed to write {}", path.display()))
}

// ---------------------------------------------------------------------------
// deckgen export
// ---------------------------------------------------------------------------

pub fn run_export(
    config: DeckgenConfig,
    template: &Path,
    outline: &str,
    output: Option<PathBuf>,
) -> Result<bool> {
    let template = FileHandle::from_path(template)?;
    let mut session = build_session(config);
    let Outcome::Done(bytes) = session.export_presentation(&template, outline) else {
        return Ok(false);
    };
    let path = output.unwrap_or_else(|| PathBuf::from(export_file_name()));
    fs::write(&path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    println!("{} Saved {}", "✓".green().bold(), path.display());
    Ok(true)
}

// ---------------------------------------------------------------------------
// deckgen feedback / recommendations / profile
// ---------------------------------------------------------------------------

pub struct FeedbackArgs {
    pub presentation_id: String,
    pub rating: u8,
    pub text: String,
    pub suggestions: Vec<String>,
}

pub fn run_feedback(config: DeckgenConfig, args: FeedbackArgs) -> Result<bool> {
    let mut session = build_session(config);
    session.set_presentation_id(args.presentation_id);
    if !session.set_rating(args.rating) {
        return Ok(false);
    }
    session.set_feedback_text(args.text);
    session.set_improvement_suggestions(args.suggestions);

    let Outcome::Done(report) = session.submit_feedback() else {
        return Ok(false);
    };
    if report.learned {
        println!("  {}", "Your preferences were updated.".dimmed());
    }
    if let Some(p) = session.state().personalization() {
        print_personalization(&render::personalization_panel(p));
    }
    Ok(true)
}

pub fn run_recommendations(config: DeckgenConfig, kind: Option<&str>) -> Result<bool> {
    let mut session = build_session(config);
    if !session.load_recommendations(kind).is_done() {
        return Ok(false);
    }
    if let Some(p) = session.state().personalization() {
        print_personalization(&render::personalization_panel(p));
    }
    Ok(true)
}

fn print_personalization(panel: &render::PersonalizationPanel) {
    heading("Personalized recommendations");
    println!("  {} {}", "Level:".bold(), panel.level);
    for (name, value) in &panel.recommendations {
        println!("  {:<14} {}", format!("{name}:").bold(), value);
    }
    for (name, pct) in &panel.confidence {
        println!("  {:<14} {pct}%", format!("{name}:").dimmed());
    }
    for s in &panel.suggestions {
        println!("  • {s}");
    }
}

pub fn run_profile(config: DeckgenConfig) -> Result<bool> {
    let mut session = build_session(config);
    let user_id = session.user_id()?;
    if !session.load_profile().is_done() {
        return Ok(false);
    }
    heading("User profile");
    println!("  {} {}", "User id:      ".bold(), user_id);
    if let Some(profile) = session.state().user_profile() {
        let view = render::profile_view(profile);
        println!("  {} {}", "Feedback:     ".bold(), view.feedback_count);
        println!("  {} {}", "Level:        ".bold(), view.level);
        println!("  {} {}%", "Confidence:   ".bold(), view.confidence_percent);
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// deckgen chart / chart-recommend / icon
// ---------------------------------------------------------------------------

pub fn run_chart(
    config: DeckgenConfig,
    data: &str,
    options: ChartOptions,
    variants: bool,
    output: Option<PathBuf>,
) -> Result<bool> {
    let raw = read_json_arg(data)?;
    let mut session = build_session(config);

    if variants {
        let Outcome::Done(ok) = session.generate_chart_variants(&raw, &options) else {
            return Ok(false);
        };
        for v in session.charts().chart_variants() {
            match &v.result {
                Ok(chart) => println!("  {:<10} {}", v.label.bold(), chart.chart_type),
                Err(e) => println!("  {:<10} {}", v.label.bold(), e.red()),
            }
        }
        return Ok(ok > 0);
    }

    if !session.generate_chart(&raw, &options).is_done() {
        return Ok(false);
    }
    if let Some(chart) = session.charts().chart() {
        let view = render::chart_view(chart);
        for s in &view.suggestions {
            println!("  • {s}");
        }
    }
    if let Some(path) = output {
        let n = session.charts().save_chart_image(&path)?;
        println!("{} Wrote {n} bytes to {}", "✓".green().bold(), path.display());
    }
    Ok(true)
}

pub fn run_chart_recommend(config: DeckgenConfig, data: &str) -> Result<bool> {
    let raw = read_json_arg(data)?;
    let mut session = build_session(config);
    if !session.recommend_chart(&raw).is_done() {
        return Ok(false);
    }
    if let Some(rec) = session.charts().recommendation() {
        let view = render::recommendation_view(rec);
        if !view.alternatives.is_empty() {
            let alts: Vec<&str> = view.alternatives.iter().map(|a| a.as_str()).collect();
            println!("  {} {}", "Alternatives:".bold(), alts.join(", "));
        }
        for s in &view.suggestions {
            println!("  • {s}");
        }
    }
    Ok(true)
}

pub fn run_icon(
    config: DeckgenConfig,
    concept: &str,
    style: IconStyle,
    color_scheme: Option<&str>,
    variants: bool,
    output: Option<PathBuf>,
) -> Result<bool> {
    let mut session = build_session(config);

    if variants {
        let Outcome::Done(ok) = session.generate_icon_variants(concept, color_scheme) else {
            return Ok(false);
        };
        for v in session.charts().icon_variants() {
            let status = match &v.result {
                Ok(_) => "ok".green(),
                Err(e) => e.as_str().red(),
            };
            println!("  {:<10} {}", v.label.bold(), status);
        }
        return Ok(ok > 0);
    }

    if !session.generate_icon(concept, style, color_scheme).is_done() {
        return Ok(false);
    }
    if let Some(path) = output {
        let n = session.charts().save_icon_image(&path)?;
        println!("{} Wrote {n} bytes to {}", "✓".green().bold(), path.display());
    }
    Ok(true)
}

// ---------------------------------------------------------------------------
// deckgen batch / metrics / cache-invalidate
// ---------------------------------------------------------------------------

pub fn run_batch_submit(
    config: DeckgenConfig,
    files: &[PathBuf],
    job_type: Option<&str>,
    priority: Option<&str>,
    watch: bool,
) -> Result<bool> {
    let mut session = build_session(config);
    for path in files {
        let meta = fs::metadata(path).with_context(|| format!("failed to stat {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        session.add_batch_file(name, meta.len());
    }

    if !session.submit_batch(job_type, priority).is_done() {
        return Ok(false);
    }
    print_jobs(&session);
    if watch {
        let report = session.watch_jobs(print_poll_round);
        return Ok(report.settled);
    }
    Ok(true)
}

pub fn run_batch_jobs(config: DeckgenConfig) -> Result<bool> {
    let mut session = build_session(config);
    if !session.refresh_jobs() {
        eprintln!("{} {}", "✗".red().bold(), "Failed to load batch jobs".red());
        return Ok(false);
    }
    print_jobs(&session);
    Ok(true)
}

pub fn run_batch_watch(config: DeckgenConfig, job_ids: &[String]) -> Result<bool> {
    if job_ids.is_empty() {
        bail!("give at least one job id to watch");
    }
    let mut session = build_session(config);
    for id in job_ids {
        session.batch_mut().track(id.clone());
    }
    let report = session.watch_jobs(print_poll_round);
    print_jobs(&session);
    Ok(report.settled)
}

fn print_poll_round(report: &PollReport) {
    let done = report.jobs.values().filter(|j| j.is_terminal()).count();
    println!(
        "  {} {done}/{} jobs finished",
        format!("[check {}]", report.rounds).dimmed(),
        report.jobs.len().max(report.errors.len())
    );
}

pub fn run_batch_process(config: DeckgenConfig) -> Result<bool> {
    let mut session = build_session(config);
    Ok(session.process_batch_queue().is_done())
}

fn print_jobs(session: &CliSession) {
    let rows = render::job_rows(session.batch().jobs());
    heading("Batch jobs");
    if rows.is_empty() {
        println!("  {}", "No batch jobs".dimmed());
        return;
    }
    println!(
        "  {:<38} {:<11} {:>5} {:>9}  Created",
        "Job", "Status", "Prog", "Tasks"
    );
    println!("  {}", "-".repeat(80));
    for r in rows {
        let status = match r.status.as_str() {
            "completed" => r.status.green(),
            "failed" | "cancelled" => r.status.red(),
            "processing" => r.status.blue(),
            _ => r.status.normal(),
        };
        println!(
            "  {:<38} {:<11} {:>4}% {:>4}/{:<4}  {}",
            r.job_id.as_str(),
            status,
            r.progress_percent,
            r.completed_tasks,
            r.total_tasks,
            r.created_at.as_str().dimmed()
        );
    }
}

pub fn run_metrics(config: DeckgenConfig) -> Result<bool> {
    let mut session = build_session(config);
    let sections = render::metrics_view(session.load_metrics());
    heading("Performance metrics");
    for s in &sections {
        println!("{}", s.title.bold());
        match &s.body {
            SectionBody::Rows(rows) => {
                for (k, v) in rows {
                    println!("  {:<22} {v}", k);
                }
            }
            SectionBody::LoadFailed => println!("  {}", "Failed to load".red()),
        }
    }
    Ok(sections
        .iter()
        .any(|s| matches!(s.body, SectionBody::Rows(_))))
}

pub fn run_cache_invalidate(config: DeckgenConfig) -> Result<bool> {
    let mut session = build_session(config);
    Ok(session.invalidate_cache().is_done())
}

// ---------------------------------------------------------------------------
// deckgen config show | init | set | path
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective deckgen Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    let mark = |exists: bool| if exists { "✓".green() } else { "·".dimmed() };
    println!(
        "  {} {}",
        mark(global_exists),
        "~/.deckgen/config.toml".dimmed()
    );
    println!("  {} {}", mark(project_exists), ".deckgen.toml".dimmed());
    println!(
        "  {} {}",
        "·".dimmed(),
        "DECKGEN_* environment variables".dimmed()
    );
    Ok(())
}

/// Initialize a default config file at `~/.deckgen/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_path() -> Result<()> {
    let Some(global) = config::global_config_file() else {
        bail!("could not determine the home directory");
    };
    println!("{}", global.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// deckgen log
// ---------------------------------------------------------------------------

pub fn run_log(config: &DeckgenConfig, limit: usize) -> Result<()> {
    let log = ActivityLog::from_config(config);
    let entries = log.read_recent(limit);
    if entries.is_empty() {
        println!("{}", "No activity recorded yet.".yellow());
        return Ok(());
    }
    for e in &entries {
        println!("{}", format_entry(e));
    }
    Ok(())
}

fn format_entry(e: &ActivityEntry) -> String {
    let status = if e.success { "ok".green() } else { "fail".red() };
    let mut line = format!(
        "{} {:<6} {:<44} {:<4}",
        e.timestamp.dimmed(),
        e.method,
        truncate(&e.target, 44),
        status
    );
    if let Some(code) = e.status {
        line.push_str(&format!(" {code}"));
    }
    if let Some(ms) = e.latency_ms {
        line.push_str(&format!(" {ms}ms"));
    }
    if let Some(err) = &e.error {
        line.push_str(&format!(" {}", err.dimmed()));
    }
    line
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}
