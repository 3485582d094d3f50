//! Video Pair Manager - command-line entry point
//!
//! Each invocation loads the configuration, initializes logging, opens the
//! persisted collections and runs one coordinator operation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};

use vpm_core::config::ConfigManager;
use vpm_core::coordinator::Coordinator;
use vpm_core::events::{CallbackSink, PipelineEvent};
use vpm_core::extraction::FfprobeProber;
use vpm_core::logging::{init_tracing, init_tracing_with_file, LogLevel};
use vpm_core::models::{Collections, MediaItem};
use vpm_core::processing::FfmpegAudioExtractor;
use vpm_core::store::JsonFileStore;

/// Default config path: .config/settings.toml (relative to current working directory)
fn default_config_path() -> PathBuf {
    PathBuf::from(".config").join("settings.toml")
}

#[derive(Parser)]
#[command(
    name = "vpm",
    version,
    about = "Pair recordings of the same event and batch-process them",
    after_help = "EXAMPLES:\n  \
                  vpm ingest --auto-match cams/left/*.MP4 cams/right/*.MP4\n  \
                  vpm list\n  \
                  vpm pair GX010042.MP4 VID_20240501.mp4\n  \
                  vpm process --all"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the settings file
    #[arg(short, long, global = true, env = "VPM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Probe video files and add them to the working set
    Ingest {
        /// Files or directories (directories are scanned one level deep)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Pair new files automatically (overrides matching.auto_match)
        #[arg(long)]
        auto_match: bool,

        /// Never pair new files automatically
        #[arg(long, conflicts_with = "auto_match")]
        no_auto_match: bool,
    },

    /// Pair two unpaired items by id
    Pair { first: String, second: String },

    /// Dissolve a pair
    Unpair { pair_id: String },

    /// Extract audio from the given items
    Process {
        /// Item ids
        ids: Vec<String>,

        /// Process every tracked item
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },

    /// Show pairs and unpaired items
    List {
        /// Print the full snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Clear all pairs, unpaired items and extracted audio records
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logs directory path)
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = ConfigManager::new(&config_path);
    config
        .load_or_create()
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;

    let settings = config.settings().clone();
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        settings.logging.level
    };
    let _log_guard = if settings.logging.log_to_file {
        init_tracing_with_file(level, &config.logs_folder())
    } else {
        init_tracing(level);
        None
    };

    tracing::debug!("Config: {}", config_path.display());
    tracing::debug!("Core version: {}", vpm_core::version());

    config
        .ensure_dirs_exist()
        .context("Failed to create configured directories")?;

    let sink = CallbackSink::new(|event: PipelineEvent| match &event {
        PipelineEvent::ProcessingError { message } => tracing::error!("Processing error: {}", message),
        other => tracing::debug!("Event: {}", other.name()),
    });

    let coordinator = Coordinator::from_settings(
        &settings,
        Arc::new(FfprobeProber::new(&settings.extraction.ffprobe_path)),
        Arc::new(FfmpegAudioExtractor::from_settings(
            &settings.paths,
            &settings.processing,
        )),
        Arc::new(JsonFileStore::new(&config.data_folder())),
        Arc::new(sink),
    )
    .context("Failed to open collections")?;

    match cli.command {
        Commands::Ingest {
            paths,
            auto_match,
            no_auto_match,
        } => {
            let auto_match = auto_match || (settings.matching.auto_match && !no_auto_match);
            let files = expand_paths(&paths)?;
            let summary = coordinator.ingest(&files, auto_match).await?;

            println!(
                "Added {} items ({} probe failures), skipped {}, formed {} pairs",
                summary.added.len(),
                summary.probe_failures,
                summary.skipped.len(),
                summary.pairs_formed
            );
        }
        Commands::Pair { first, second } => {
            let pair = coordinator.pair(&first, &second).await?;
            println!("Paired {}", pair.id);
        }
        Commands::Unpair { pair_id } => {
            let (a, b) = coordinator.unpair(&pair_id).await?;
            println!("Unpaired {} and {}", a.id, b.id);
        }
        Commands::Process { ids, all } => {
            let ids = if all {
                all_item_ids(&coordinator.snapshot())
            } else {
                ids
            };
            if ids.is_empty() {
                bail!("No items to process");
            }

            let report = coordinator.process(&ids).await?;
            for result in report.results.values() {
                match (&result.output_path, &result.error) {
                    (Some(path), _) => println!("{:<40} processed  {}", result.id, path.display()),
                    (None, Some(error)) => println!("{:<40} error      {}", result.id, error),
                    (None, None) => println!("{:<40} {}", result.id, result.status),
                }
            }
            println!(
                "{} processed, {} failed",
                report.len() - report.failed_count(),
                report.failed_count()
            );
        }
        Commands::List { json } => {
            let snapshot = coordinator.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&*snapshot)?);
            } else {
                print_collections(&snapshot);
            }
        }
        Commands::Reset => {
            coordinator.reset().await?;
            println!("Cleared all collections");
        }
    }

    Ok(())
}

/// Replace directories with the files directly inside them.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn all_item_ids(collections: &Collections) -> Vec<String> {
    collections
        .pairs
        .iter()
        .flat_map(|p| p.members())
        .chain(collections.unpaired.iter())
        .map(|m| m.id.clone())
        .collect()
}

fn print_collections(collections: &Collections) {
    println!("Pairs ({}):", collections.pairs.len());
    for pair in &collections.pairs {
        println!("  {}", pair.id);
        for member in pair.members() {
            print_item(member, "    ");
        }
    }

    println!("Unpaired ({}):", collections.unpaired.len());
    for item in &collections.unpaired {
        print_item(item, "  ");
    }

    if !collections.extracted_audios.is_empty() {
        println!("Extracted audio ({}):", collections.extracted_audios.len());
        for audio in &collections.extracted_audios {
            println!("  {:<40} {}", audio.source_id, audio.path.display());
        }
    }
}

fn print_item(item: &MediaItem, indent: &str) {
    let created = item
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    let duration = item
        .duration_secs
        .map(|d| format!("{:.1}s", d))
        .unwrap_or_else(|| "-".to_string());

    println!(
        "{}{:<40} {:<10} {}  {:>8}",
        indent, item.id, item.status, created, duration
    );
    if let Some(error) = &item.error {
        println!("{}  ! {}", indent, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_ingest_flags() {
        let cli = Cli::parse_from(["vpm", "ingest", "--auto-match", "a.mp4", "b.mp4"]);
        match cli.command {
            Commands::Ingest {
                paths, auto_match, ..
            } => {
                assert!(auto_match);
                assert_eq!(paths.len(), 2);
            }
            _ => panic!("expected ingest"),
        }

        assert!(Cli::try_parse_from(["vpm", "ingest", "--auto-match", "--no-auto-match", "a.mp4"]).is_err());
    }

    #[test]
    fn expands_directories_one_level() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"").unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.mp4"), b"").unwrap();

        let single = PathBuf::from("/elsewhere/x.mov");
        let files = expand_paths(&[dir.path().to_path_buf(), single.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.mp4"), dir.path().join("b.mp4"), single]
        );
    }

    #[test]
    fn all_ids_cover_pairs_and_unpaired() {
        let pair = vpm_core::models::Pair::new(
            MediaItem::new("a.mp4", "/v/a.mp4"),
            MediaItem::new("b.mp4", "/v/b.mp4"),
            std::time::SystemTime::now().into(),
        )
        .unwrap();
        let collections = Collections {
            pairs: vec![pair],
            unpaired: vec![MediaItem::new("c.mp4", "/v/c.mp4")],
            extracted_audios: Vec::new(),
        };
        assert_eq!(all_item_ids(&collections), vec!["a.mp4", "b.mp4", "c.mp4"]);
    }
}
