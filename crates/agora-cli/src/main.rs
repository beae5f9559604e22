//! Agora CLI: chronological archive of documents
//!
//! Commands: file, show, log, completions

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use agora_core::DocumentRegistry;
use agora_vault::{file_document, load_collection_with, Event, FileOptions, LoadOptions};

#[derive(Parser)]
#[command(name = "agora")]
#[command(version)]
#[command(about = "Chronological archive of documents")]
struct Cli {
    /// Log filesystem steps (overridden by AGORA_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Canonicalize documents and file them as events
    File {
        /// Collection directory to file into
        collection: PathBuf,
        /// Document files to file
        #[arg(required = true)]
        documents: Vec<PathBuf>,
        /// File at this RFC 3339 time instead of the document's own
        #[arg(long, value_parser = parse_rfc3339)]
        at: Option<DateTime<FixedOffset>>,
        /// Build each event in a hidden staging directory first
        #[arg(long)]
        staged: bool,
    },
    /// Show a single event
    Show {
        collection: PathBuf,
        /// Event id, e.g. 2024-01-01-00:00:00
        id: String,
    },
    /// Print the ordered history of a collection
    Log {
        collection: PathBuf,
        /// Skip (and warn about) entries that are not valid events
        #[arg(long)]
        skip_invalid: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// JSON view of an event.
#[derive(Serialize)]
struct EventRecord {
    id: String,
    timestamp: String,
    path: PathBuf,
    document: PathBuf,
    summary: Option<String>,
    metadata: serde_json::Value,
}

impl EventRecord {
    fn new(event: &Event) -> Result<Self> {
        Ok(Self {
            id: event.id(),
            timestamp: event
                .timestamp()
                .and_utc()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            path: event.path(),
            document: event.document().to_path_buf(),
            summary: event.summary().map(str::to_string),
            metadata: serde_json::to_value(event.metadata().as_mapping())
                .context("metadata is not representable as JSON")?,
        })
    }
}

fn parse_rfc3339(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("AGORA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "agora=debug,warn"
        } else {
            "warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(io::stderr))
        .init();
}

fn print_json_line<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run_file(
    collection: &Path,
    documents: &[PathBuf],
    at: Option<DateTime<FixedOffset>>,
    staged: bool,
) -> Result<()> {
    let registry = DocumentRegistry::with_defaults();
    let options = FileOptions { at, staged };
    let mut out = io::stdout().lock();

    for path in documents {
        let event = file_document(&registry, collection, path, &options)
            .with_context(|| format!("cannot file {}", path.display()))?;
        print_json_line(&mut out, &EventRecord::new(&event)?)?;
    }
    Ok(())
}

fn run_show(collection: &Path, id: &str) -> Result<()> {
    let event = Event::from_filesystem(collection, id)
        .with_context(|| format!("cannot load event {id}"))?;
    let mut out = io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, &EventRecord::new(&event)?)?;
    writeln!(out)?;
    Ok(())
}

fn run_log(collection: &Path, skip_invalid: bool) -> Result<()> {
    let options = if skip_invalid {
        LoadOptions::skip_invalid()
    } else {
        LoadOptions::default()
    };
    let loaded = load_collection_with(collection, &options)
        .with_context(|| format!("cannot load {}", collection.display()))?;

    let mut out = io::stdout().lock();
    for event in &loaded.events {
        print_json_line(&mut out, &EventRecord::new(event)?)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::File {
            collection,
            documents,
            at,
            staged,
        }) => run_file(&collection, &documents, at, staged),
        Some(Commands::Show { collection, id }) => run_show(&collection, &id),
        Some(Commands::Log {
            collection,
            skip_invalid,
        }) => run_log(&collection, skip_invalid),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "agora", &mut io::stdout());
            Ok(())
        }
        None => {
            println!(
                "Agora v{}: chronological archive of documents",
                env!("CARGO_PKG_VERSION")
            );
            println!("Run `agora --help` for usage.");
            Ok(())
        }
    }
}
