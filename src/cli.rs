use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::warn;

use crate::archive::{ArchiveEvent, ArchiveTask};
use crate::config::AppConfig;
use crate::contract::{LocalStore, OfflineSource, RemoteFileRecord, RemoteSource};
use crate::drive::DriveClient;
use crate::eligibility::total_size;
use crate::load_config::{load_access_token, load_config};
use crate::organize::format_size;
use crate::scan::{ScanEvent, ScanTask};
use crate::store::DiskStore;
use crate::task::{TaskRunner, TaskState};

/// CLI for drive-archiver: scan a Drive account and archive bulky files into
/// a dated local folder layout.
#[derive(Parser)]
#[clap(
    name = "drive-archiver",
    version,
    about = "Scan Google Drive for bulky files and archive them locally"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan Drive for files matching the configured rules
    Scan {
        /// Path to the JSON config file
        #[clap(long)]
        config: PathBuf,
        /// Write the eligible file set as a JSON manifest for `archive`
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Archive the files listed in a scan manifest
    Archive {
        /// Path to the JSON config file
        #[clap(long)]
        config: PathBuf,
        /// Manifest produced by `scan --output`
        #[clap(long)]
        manifest: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan { config, output } => {
            let config = load_config(config)?;
            run_scan(&config, output.as_deref()).await
        }
        Commands::Archive { config, manifest } => {
            let config = load_config(config)?;
            run_archive(&config, &manifest).await
        }
    }
}

async fn run_scan(config: &AppConfig, output: Option<&std::path::Path>) -> Result<()> {
    let token = load_access_token()?;
    let source = Arc::new(DriveClient::new(token));

    let runner = TaskRunner::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = runner.spawn(ScanTask::new(source, config.rules.clone(), tx));

    let mut eligible: Option<Vec<RemoteFileRecord>> = None;
    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    ScanEvent::Status(text) => println!("{text}"),
                    ScanEvent::Progress { found } => println!("  {found} files so far..."),
                    ScanEvent::Completed { files } => eligible = Some(files),
                    ScanEvent::Failed { message } => eprintln!("[ERROR] {message}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Cancellation requested, finishing current page...");
                handle.cancel();
            }
        }
    }

    let state = handle.wait().await;
    let Some(files) = eligible else {
        anyhow::bail!("Scan did not complete (terminal state: {state:?})");
    };

    println!(
        "Eligible: {} files, {}",
        files.len(),
        format_size(total_size(&files))
    );
    for file in &files {
        println!("  {}  {}", format_size(file.size), file.name);
    }

    if let Some(path) = output {
        let json = serde_json::to_vec_pretty(&files)?;
        DiskStore::new()
            .atomic_write(path, &json)
            .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
        println!("Manifest written to {}", path.display());
    }
    Ok(())
}

async fn run_archive(config: &AppConfig, manifest: &std::path::Path) -> Result<()> {
    let content = std::fs::read_to_string(manifest)
        .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
    let files: Vec<RemoteFileRecord> =
        serde_json::from_str(&content).context("Failed to parse manifest JSON")?;

    let store = DiskStore::new();

    // Preflight: the core task assumes a valid destination; catch an obviously
    // full volume before touching the network.
    if !config.dry_run {
        let needed = total_size(&files);
        let free = store.free_space(&config.archive_root)?;
        if needed > free {
            anyhow::bail!(
                "Not enough free space at {}: need {}, have {}",
                config.archive_root.display(),
                format_size(needed),
                format_size(free)
            );
        }
    }

    // A dry run never touches the network: no token, no client.
    let source: Arc<dyn RemoteSource> = if config.dry_run {
        Arc::new(OfflineSource)
    } else {
        Arc::new(DriveClient::new(load_access_token()?))
    };

    let runner = TaskRunner::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = runner.spawn(ArchiveTask::new(
        source,
        Arc::new(store),
        files,
        config.archive_root.clone(),
        config.dry_run,
        config.trash_after,
        tx,
    ));

    let mut summary: Option<(usize, usize)> = None;
    loop {
        tokio::select! {
            maybe_event = rx.recv() => {
                let Some(event) = maybe_event else { break };
                match event {
                    ArchiveEvent::Status(text) => println!("{text}"),
                    ArchiveEvent::Progress { current, total, name } => {
                        println!("[{current}/{total}] {name}");
                    }
                    ArchiveEvent::FileProgress { .. } => {}
                    ArchiveEvent::FileResult { name, success, detail } => {
                        let marker = if success { "ok" } else { "FAILED" };
                        println!("  {marker}: {name} - {detail}");
                    }
                    ArchiveEvent::Completed { succeeded, failed } => {
                        summary = Some((succeeded, failed));
                    }
                    ArchiveEvent::Failed { message } => eprintln!("[ERROR] {message}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Cancellation requested, finishing current file...");
                handle.cancel();
            }
        }
    }

    let state = handle.wait().await;
    match (state, summary) {
        (TaskState::Completed, Some((succeeded, failed))) if failed > 0 => {
            warn!(succeeded, failed, "Archive finished with failures");
            anyhow::bail!("Archive finished with {failed} failed files ({succeeded} succeeded)");
        }
        (TaskState::Completed, _) => Ok(()),
        (TaskState::Cancelled, Some((succeeded, failed))) => {
            println!("Cancelled after {} files ({failed} failed)", succeeded + failed);
            Ok(())
        }
        (state, _) => anyhow::bail!("Archive did not complete (terminal state: {state:?})"),
    }
}
