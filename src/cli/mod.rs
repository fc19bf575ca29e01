//! Command-line interface for voxtract.
//!
//! Provides commands for extracting voice assets, inspecting an index
//! before extraction, and showing the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use crate::config;
use crate::core::{CancelFlag, ExtractEvent, ExtractOptions, ExtractRequest, Filters, TracingSink};

pub mod inspect;

/// voxtract - Extract per-character voice assets from a game audio dump
#[derive(Parser, Debug)]
#[command(name = "voxtract")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Copy matching voice files into per-character folders
    Extract {
        /// Voice index JSON (falls back to the config file)
        #[arg(short, long, env = "VOXTRACT_INDEX")]
        index: Option<PathBuf>,

        /// Root of the audio dump, searched recursively
        #[arg(short, long, env = "VOXTRACT_SOURCE")]
        source: Option<PathBuf>,

        /// Output folder for per-character directories
        #[arg(short, long, env = "VOXTRACT_OUTPUT")]
        output: Option<PathBuf>,

        /// Only this character (case-insensitive)
        #[arg(short, long)]
        character: Option<String>,

        /// Only this quest id (exact match, e.g. XYJEQ005)
        #[arg(short, long)]
        quest: Option<String>,

        /// Audio file extension (default: wem)
        #[arg(long)]
        extension: Option<String>,

        /// Locate files and report what would be copied, without writing
        #[arg(long)]
        dry_run: bool,

        /// Print a line for every copied file
        #[arg(short, long)]
        verbose: bool,

        /// Send progress to the log (RUST_LOG) instead of printing it
        #[arg(long, conflicts_with = "verbose")]
        quiet: bool,
    },

    /// List characters and quest ids found in an index
    Inspect {
        /// Voice index JSON (falls back to the config file)
        #[arg(env = "VOXTRACT_INDEX")]
        index: Option<PathBuf>,

        /// Only this character (case-insensitive)
        #[arg(short, long)]
        character: Option<String>,

        /// Only this quest id (exact match)
        #[arg(short, long)]
        quest: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Extract {
                index,
                source,
                output,
                character,
                quest,
                extension,
                dry_run,
                verbose,
                quiet,
            } => {
                let filters = Filters::new(character.as_deref(), quest.as_deref());
                let output_mode = if quiet {
                    OutputMode::Log
                } else if verbose {
                    OutputMode::Verbose
                } else {
                    OutputMode::Normal
                };
                extract(index, source, output, filters, extension, dry_run, output_mode).await
            }
            Commands::Inspect {
                index,
                character,
                quest,
            } => {
                let filters = Filters::new(character.as_deref(), quest.as_deref());
                inspect::execute(index, filters).await
            }
            Commands::Config => show_config().await,
        }
    }
}

/// How run events reach the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    /// Progress and error lines on stdout
    Normal,
    /// Also one line per copied file
    Verbose,
    /// Everything through `tracing`
    Log,
}

/// Run an extraction on a blocking thread, streaming its log lines
async fn extract(
    index: Option<PathBuf>,
    source: Option<PathBuf>,
    output: Option<PathBuf>,
    filters: Filters,
    extension: Option<String>,
    dry_run: bool,
    output_mode: OutputMode,
) -> Result<()> {
    let cfg = config::config()?;

    let request = ExtractRequest {
        index_path: index.or_else(|| cfg.index.clone()),
        source_dir: source.or_else(|| cfg.source.clone()),
        output_dir: output.or_else(|| cfg.output.clone()),
        filters,
        options: ExtractOptions {
            extension: extension
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or_else(|| cfg.extension.clone()),
            metadata_file: cfg.metadata_file.clone(),
            dry_run,
        },
    };

    let run = request.prepare().context("Cannot start extraction")?;
    if output_mode != OutputMode::Log {
        println!("📄 Index loaded: {} entries", run.index().len());
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<ExtractEvent>();
    let cancel = CancelFlag::new();

    // Ctrl+C stops the run between files
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let worker = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            if output_mode == OutputMode::Log {
                run.run(&mut TracingSink, &cancel)
            } else {
                let mut sink = tx;
                run.run(&mut sink, &cancel)
            }
        })
    };

    while let Some(event) = rx.recv().await {
        if event.is_verbose() && output_mode != OutputMode::Verbose {
            continue;
        }
        if matches!(
            event,
            ExtractEvent::Locating { .. } | ExtractEvent::Copying | ExtractEvent::Completed { .. }
        ) {
            println!();
        }
        println!("{}", event);
    }

    let report = worker.await.context("Extraction worker failed")?;
    interrupt.abort();

    println!();
    if report.dry_run {
        println!("ℹ️  Dry run: nothing was written to the output folder");
    }
    if report.has_failures() {
        println!("⚠️  {}", report.failure_summary());
    }
    if report.cancelled {
        eprintln!("\n[Extraction cancelled after {} files]", report.total_copied);
        std::process::exit(1);
    }

    let elapsed = report.finished_at - report.started_at;
    println!(
        "✅ Done in {:.1}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    );

    Ok(())
}

/// Show resolved configuration
async fn show_config() -> Result<()> {
    let cfg = config::config()?;
    let show = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not set)".to_string())
    };

    println!("══════════════════════════════════════════════════════════════");
    println!("  voxtract Configuration");
    println!("══════════════════════════════════════════════════════════════");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Index:  {}", show(&cfg.index));
    println!("  Source: {}", show(&cfg.source));
    println!("  Output: {}", show(&cfg.output));
    println!();
    println!("Extraction:");
    println!("  Asset extension: .{}", cfg.extension);
    println!("  Metadata file:   {}", cfg.metadata_file);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_paths_from_flags() {
        let cli = Cli::try_parse_from([
            "voxtract", "extract", "-i", "/data/index.json", "-s", "/dump", "-o", "/out",
        ])
        .unwrap();

        match cli.command {
            Commands::Extract {
                index,
                source,
                output,
                ..
            } => {
                assert_eq!(index, Some(PathBuf::from("/data/index.json")));
                assert_eq!(source, Some(PathBuf::from("/dump")));
                assert_eq!(output, Some(PathBuf::from("/out")));
            }
            other => panic!("Expected Extract, got {:?}", other),
        }
    }

    #[test]
    fn test_paths_read_from_env() {
        let command = <Cli as clap::CommandFactory>::command();
        let extract = command.find_subcommand("extract").unwrap();

        let env_of = |id: &str| {
            extract
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .map(|name| name.to_string_lossy().into_owned())
        };
        assert_eq!(env_of("index").as_deref(), Some("VOXTRACT_INDEX"));
        assert_eq!(env_of("source").as_deref(), Some("VOXTRACT_SOURCE"));
        assert_eq!(env_of("output").as_deref(), Some("VOXTRACT_OUTPUT"));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["voxtract", "extract", "--quiet", "--verbose"]);
        assert!(result.is_err());
    }
}
