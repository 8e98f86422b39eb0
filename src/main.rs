use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use deckgen::charts::{ChartOptions, IconStyle};
use deckgen::cli;
use deckgen::config;
use deckgen::generation::PRESENTATION_TYPES;

#[derive(Debug, Parser)]
#[command(name = "deckgen")]
#[command(about = "AI presentation generator client")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload PowerPoint templates (.ppt / .pptx)
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Generate slides from an outline
    Generate {
        /// Outline text (or use --file)
        outline: Option<String>,
        /// Read the outline from a file, or `-` for stdin
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Presentation type
        #[arg(long = "type", value_parser = clap::builder::PossibleValuesParser::new(PRESENTATION_TYPES))]
        presentation_type: Option<String>,
        /// Number of slides (1-50)
        #[arg(long, short = 'n')]
        slides: Option<u32>,
        /// Template to upload and use for this generation
        #[arg(long)]
        template: Vec<PathBuf>,
        /// Write an HTML preview page
        #[arg(long)]
        html: Option<PathBuf>,
        /// Generate once more with the same parameters
        #[arg(long)]
        regenerate: bool,
    },
    /// Build a .pptx file from a template and an outline
    Export {
        /// The .pptx template
        template: PathBuf,
        /// Outline text (or use --file)
        outline: Option<String>,
        #[arg(long, short)]
        file: Option<PathBuf>,
        /// Output path (default: generated_<timestamp>.pptx)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Rate a generated presentation
    Feedback {
        /// Presentation id returned by `generate`
        presentation_id: String,
        /// Star rating, 1-5
        #[arg(long, short)]
        rating: u8,
        /// Feedback text
        #[arg(long, short)]
        text: String,
        /// Improvement suggestion (repeatable)
        #[arg(long = "suggest")]
        suggestions: Vec<String>,
    },
    /// Show personalized design recommendations
    Recommendations {
        /// Only one kind, e.g. color_scheme or typography
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Show the learned user profile
    Profile,
    /// Generate a chart from JSON data (inline or @file)
    Chart {
        data: String,
        #[arg(long = "type")]
        chart_type: Option<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        colors: Option<String>,
        /// Generate one chart per style preset
        #[arg(long)]
        variants: bool,
        /// Save the chart image
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Recommend a chart type for JSON data (inline or @file)
    ChartRecommend { data: String },
    /// Generate an icon for a concept
    Icon {
        concept: String,
        #[arg(long, default_value = "flat")]
        style: IconStyle,
        #[arg(long)]
        colors: Option<String>,
        /// Generate one icon per style
        #[arg(long)]
        variants: bool,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Batch processing
    Batch {
        #[command(subcommand)]
        action: BatchAction,
    },
    /// Show performance metrics
    Metrics,
    /// Invalidate the backend cache
    CacheInvalidate,
    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show recent backend activity
    Log {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Debug, Subcommand)]
enum BatchAction {
    /// Queue files and submit them as one job
    Submit {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        job_type: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Poll the job until it finishes
        #[arg(long)]
        watch: bool,
    },
    /// List batch jobs
    Jobs,
    /// Poll jobs until they finish
    Watch {
        #[arg(required = true)]
        job_ids: Vec<String>,
    },
    /// Ask the backend to process its queue
    Process,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Set a value, e.g. `api.base_url http://host:5000`
    Set { key: String, value: String },
    /// Print the global config file path
    Path,
}

fn main() -> Result<ExitCode> {
    let app = App::parse();

    let ok = match app.command {
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => cli::run_config_show()?,
                ConfigAction::Init { force } => cli::run_config_init(force)?,
                ConfigAction::Set { key, value } => cli::run_config_set(&key, &value)?,
                ConfigAction::Path => cli::run_config_path()?,
            }
            true
        }
        command => run(command, config::load())?,
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(command: Commands, config: config::DeckgenConfig) -> Result<bool> {
    match command {
        Commands::Upload { files } => cli::run_upload(config, &files),
        Commands::Generate {
            outline,
            file,
            presentation_type,
            slides,
            template,
            html,
            regenerate,
        } => {
            let outline = cli::read_outline(outline.as_deref(), file.as_deref())?;
            cli::run_generate(
                config,
                cli::GenerateArgs {
                    outline,
                    presentation_type,
                    slide_count: slides,
                    templates: template,
                    html,
                    regenerate,
                },
            )
        }
        Commands::Export {
            template,
            outline,
            file,
            output,
        } => {
            let outline = cli::read_outline(outline.as_deref(), file.as_deref())?;
            cli::run_export(config, &template, &outline, output)
        }
        Commands::Feedback {
            presentation_id,
            rating,
            text,
            suggestions,
        } => cli::run_feedback(
            config,
            cli::FeedbackArgs {
                presentation_id,
                rating,
                text,
                suggestions,
            },
        ),
        Commands::Recommendations { kind } => cli::run_recommendations(config, kind.as_deref()),
        Commands::Profile => cli::run_profile(config),
        Commands::Chart {
            data,
            chart_type,
            style,
            colors,
            variants,
            output,
        } => cli::run_chart(
            config,
            &data,
            ChartOptions {
                chart_type,
                style,
                color_scheme: colors,
            },
            variants,
            output,
        ),
        Commands::ChartRecommend { data } => cli::run_chart_recommend(config, &data),
        Commands::Icon {
            concept,
            style,
            colors,
            variants,
            output,
        } => cli::run_icon(config, &concept, style, colors.as_deref(), variants, output),
        Commands::Batch { action } => match action {
            BatchAction::Submit {
                files,
                job_type,
                priority,
                watch,
            } => cli::run_batch_submit(
                config,
                &files,
                job_type.as_deref(),
                priority.as_deref(),
                watch,
            ),
            BatchAction::Jobs => cli::run_batch_jobs(config),
            BatchAction::Watch { job_ids } => cli::run_batch_watch(config, &job_ids),
            BatchAction::Process => cli::run_batch_process(config),
        },
        Commands::Metrics => cli::run_metrics(config),
        Commands::CacheInvalidate => cli::run_cache_invalidate(config),
        Commands::Log { limit } => {
            cli::run_log(&config, limit)?;
            Ok(true)
        }
        Commands::Config { .. } => Ok(true),
    }
}
