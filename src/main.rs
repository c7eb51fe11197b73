use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use intro_score::config::{self, Config};
use intro_score::output;
use intro_score::providers::{grammar_from_config, VaderSentiment};
use intro_score::rubric::{self, LoadError, Rubric};
use intro_score::scoring::Engine;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a transcript against the rubric
    Score {
        /// Transcript file, or "-" for stdin (defaults to stdin)
        #[arg(conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Transcript given inline
        #[arg(short, long)]
        text: Option<String>,

        /// Length of the recording in seconds (enables speech rate)
        #[arg(short, long)]
        duration: Option<f64>,

        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },
    /// Validate and print the rubric
    Rubric {
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },
}

#[derive(Parser, Debug)]
#[command(name = "intro-score")]
#[command(about = "Score spoken self-introduction transcripts against a rubric", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/intro-score/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Rubric file (overrides the config; defaults to the built-in rubric)
    #[arg(short, long, global = true)]
    rubric: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    intro_score::logging::init(cli.verbose);
    let start_time = Instant::now();

    let config = match config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    if let Err(errors) = config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let rubric_path = cli.rubric.or_else(|| config.rubric.clone());
    let rubric = match rubric::load_rubric(rubric_path.as_deref()) {
        Ok(r) => r,
        Err(e) => {
            report_rubric_error(&e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    match cli.command {
        Commands::Score {
            file,
            text,
            duration,
            format,
        } => {
            let transcript = match read_transcript(file, text) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Input error: {:#}", e);
                    std::process::exit(EXIT_INPUT);
                }
            };

            let engine = build_engine(rubric, &config);
            let breakdown = engine.score(&transcript, duration).await;
            tracing::debug!(
                overall = breakdown.overall_score,
                words = breakdown.total_words,
                elapsed = ?start_time.elapsed(),
                "transcript scored"
            );

            match format {
                Format::Text => {
                    let use_colors = output::should_use_colors();
                    println!("{}", output::format_report(&breakdown, use_colors));
                }
                Format::Json => print_json(&breakdown),
            }
        }
        Commands::Rubric { format } => match format {
            Format::Text => {
                let use_colors = output::should_use_colors();
                println!("{}", output::format_rubric(&rubric, use_colors));
            }
            Format::Json => print_json(&rubric),
        },
    }

    std::process::exit(EXIT_SUCCESS);
}

fn build_engine(rubric: Rubric, config: &Config) -> Engine {
    let sentiment = Arc::new(VaderSentiment::new());
    let grammar = grammar_from_config(&config.providers.grammar);
    Engine::new(rubric, sentiment, grammar).with_timeout(config::provider_timeout(config))
}

fn report_rubric_error(error: &LoadError) {
    eprintln!("Rubric error: {}", error);
    for problem in error.validation_errors() {
        eprintln!("  - {}", problem);
    }
}

/// Read the transcript from `--text`, a file, or stdin (no file or "-")
fn read_transcript(file: Option<PathBuf>, text: Option<String>) -> anyhow::Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read transcript at {}", path.display())),
        _ => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read transcript from stdin")?;
            Ok(buffer)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match output::to_json(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_INPUT);
        }
    }
}
