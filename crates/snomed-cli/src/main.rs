//! SNOMED CLI - Command-line interface
//!
//! Usage:
//!   snomed extract [TEXT] [--all] [--json]
//!   snomed request [TEXT]
//!   snomed schema

mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use output::{Labels, MISSING_KEY_HELP};
use snomed_core::{AppConfig, EntityExtractor, ErrorKind};
use snomed_extractor::{build_request, filter_coded_unique, response_schema, GeminiExtractor};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "snomed")]
#[command(about = "SNOMED CT clinical entity extraction CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract clinical entities from a narrative
    Extract {
        /// Clinical narrative (prompted for when omitted)
        text: Option<String>,
        /// Keep uncoded and duplicate entities
        #[arg(long)]
        all: bool,
        /// Print entities as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the request body without sending it
    Request {
        /// Clinical narrative (the built-in example when omitted)
        text: Option<String>,
    },
    /// Print the response schema sent to the model
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config).context("Failed to load configuration")?;

    match cli.command {
        Commands::Extract { text, all, json } => run_extract(&config, text, all, json).await?,
        Commands::Request { text } => {
            let (text, _) = output::resolve_text(text.as_deref());
            let request = build_request(
                &config.gemini.narrative_language,
                config.gemini.temperature,
                &text,
            );
            println!("{}", serde_json::to_string_pretty(&request)?);
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&response_schema())?);
        }
    }

    Ok(())
}

async fn run_extract(
    config: &AppConfig,
    text: Option<String>,
    all: bool,
    json: bool,
) -> anyhow::Result<()> {
    let locale = config.gemini.locale;
    let labels = Labels::for_locale(locale);

    let extractor = match GeminiExtractor::from_config(&config.gemini) {
        Ok(extractor) => extractor,
        Err(e) if e.kind() == ErrorKind::Config => {
            anyhow::bail!("{}\n{}", e.localized(locale), MISSING_KEY_HELP)
        }
        Err(e) => anyhow::bail!(e.localized(locale)),
    };

    let input = match text {
        Some(text) => text,
        None => prompt_line(labels.prompt)?,
    };
    let (text, is_default) = output::resolve_text(Some(&input));

    let status = if is_default {
        labels.using_default
    } else {
        labels.processing
    };
    eprintln!("\n{status}\n{text}\n");
    eprintln!("{}", labels.analyzing);

    let start = Instant::now();
    let entities = extractor
        .extract(&text)
        .await
        .map_err(|e| anyhow::anyhow!(e.localized(locale)))?;
    let extracted = entities.len();
    let entities = if all {
        entities
    } else {
        filter_coded_unique(entities)
    };
    tracing::debug!(extracted, kept = entities.len(), "Extraction finished");
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    if json {
        println!("{}", serde_json::to_string_pretty(&entities)?);
        eprintln!("{}", output::render_summary(entities.len(), elapsed_ms, labels));
    } else {
        print!("\n{}", output::render_entities(&entities, labels));
        println!("{}", output::render_summary(entities.len(), elapsed_ms, labels));
    }

    Ok(())
}

/// Read one line from stdin after printing a prompt
fn prompt_line(prompt: &str) -> anyhow::Result<String> {
    eprintln!("{prompt}");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read clinical text from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
