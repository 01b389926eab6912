//! # heic2webp - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Costruzione e validazione di `ConversionOptions`
//! - Avvio del `BatchRunner` e mappatura del risultato sull'exit code
//!
//! ## Exit code:
//! - `0`: tutti i file convertiti, batch vuoto, oppure `--help`
//! - `1`: almeno un file fallito, input mancante o inesistente, qualità fuori range
//!
//! ## Esempio di utilizzo:
//! ```bash
//! heic2webp photos/ -r -v -o converted/ -q 90
//! ```

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use heic2webp::{
    error::{EXIT_FAILURE, EXIT_SUCCESS},
    json_output::JsonMessage,
    BatchRunner, BatchSummary, CodecAdapter, ConversionOptions, ConvertError, ExternalToolCodec,
};

#[derive(Parser)]
#[command(name = "heic2webp", version)]
#[command(about = "🖼️  HEIC to WebP Converter")]
#[command(after_help = "Examples:\n  heic2webp photo.heic\n  heic2webp photos/ -r -v\n  heic2webp photos/ -o converted/ -q 90")]
struct Args {
    /// HEIC file or directory containing HEIC files
    input: Option<PathBuf>,

    /// Output directory (default: same as input)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// WebP quality 1-100 (default: 85)
    #[arg(short, long, value_name = "N", allow_negative_numbers = true)]
    quality: Option<i64>,

    /// Process directories recursively
    #[arg(short, long)]
    recursive: bool,

    /// Show detailed progress
    #[arg(short, long)]
    verbose: bool,

    /// Number of parallel workers (default: 4)
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Emit one JSON event per line on stdout
    #[arg(long)]
    json: bool,

    /// Load options from a JSON file; command line flags take precedence
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_error_exit_code(&e));
        }
    };

    let options = build_options(&args).await;
    let (verbose, json) = match options {
        Ok(ref options) => (options.verbose(), options.json_output()),
        Err(_) => (args.verbose, args.json),
    };

    if let Err(e) = init_logging(verbose) {
        eprintln!("❌ Failed to initialize logging: {}", e);
        return ExitCode::from(EXIT_FAILURE);
    }

    let outcome = match options {
        Ok(options) => run(args.input, options).await,
        Err(e) => Err(e),
    };

    let code = match outcome {
        Ok(summary) => summary.exit_code(),
        Err(e) => {
            if json {
                JsonMessage::error(&e).emit();
            } else {
                error!("❌ {}", e);
            }
            e.exit_code()
        }
    };
    ExitCode::from(code)
}

/// `--help`/`--version` succeed, every other argument error fails with 1
fn parse_error_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
        _ => EXIT_FAILURE,
    }
}

/// Initialize logging on stderr: INFO by default, DEBUG with --verbose, RUST_LOG overrides both
fn init_logging(verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Config file values first, then command line flags on top
async fn build_options(args: &Args) -> Result<ConversionOptions, ConvertError> {
    let mut options = match args.config {
        Some(ref path) => ConversionOptions::from_file(path).await?,
        None => ConversionOptions::default(),
    };

    if let Some(quality) = args.quality {
        options = options.with_quality(quality)?;
    }
    if let Some(ref output) = args.output {
        options = options.with_output_directory(output);
    }
    if let Some(workers) = args.workers {
        options = options.with_workers(workers)?;
    }
    if args.recursive {
        options = options.with_recursive(true);
    }
    if args.verbose {
        options = options.with_verbose(true);
    }
    if args.json {
        options = options.with_json_output(true);
    }

    Ok(options)
}

async fn run(input: Option<PathBuf>, options: ConversionOptions) -> Result<BatchSummary, ConvertError> {
    let Some(input) = input else {
        let _ = Args::command().print_help();
        return Err(ConvertError::Config("No input given".to_string()));
    };

    if !input.exists() {
        return Err(ConvertError::NotFound(input));
    }

    let codec = ExternalToolCodec::new();
    if let Err(e) = codec.validate().await {
        warn!("⚠️ {}", e);
    }

    BatchRunner::new(Arc::new(codec)).run(&input, &options).await
}
