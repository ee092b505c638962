//! Command-line interface for vodsync.
//!
//! Provides commands for running a sync cycle, inspecting the catalog,
//! showing the resolved configuration, and word-count reporting over
//! downloaded transcripts.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::catalog::{CatalogStore, StreamKind};
use crate::config::SyncConfig;
use crate::sync::{ArchiveClient, Reconciler, SyncOrchestrator, TranscriptStore};

pub mod words;

/// vodsync - incremental stream-transcript archive synchronizer
#[derive(Parser, Debug)]
#[command(name = "vodsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one full synchronization cycle against the archive
    Sync {
        /// Re-download transcripts even when a local artifact exists
        #[arg(long)]
        overwrite: bool,
    },

    /// Summarize the catalog: downloaded and pending counts per category
    Status,

    /// Show resolved configuration
    Config,

    /// Count words spoken across a user's downloaded transcripts
    Words(words::WordsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Sync { overwrite } => run_sync(overwrite).await,
            Commands::Status => show_status(),
            Commands::Config => show_config(),
            Commands::Words(args) => words::execute(args),
        }
    }
}

/// Run one sync cycle end to end.
async fn run_sync(overwrite: bool) -> Result<()> {
    let config = SyncConfig::load()?;

    // An unreadable catalog aborts the run before any network activity
    let store = CatalogStore::new(&config.catalog_path);
    let catalog = store.load()?;

    let fetcher = ArchiveClient::new(&config)?;
    let reconciler = Reconciler::new(catalog, store);
    let transcripts = TranscriptStore::new(&config.transcript_dir);

    let mut orchestrator =
        SyncOrchestrator::new(Box::new(fetcher), reconciler, transcripts, overwrite);
    let report = orchestrator.run().await?;

    info!(
        merged = report.merged(),
        failed = report.failed(),
        discovered = report.discovered,
        "Sync cycle finished"
    );

    println!(
        "Discovered {} new transcript candidate(s)",
        report.discovered
    );
    for category in &report.categories {
        println!(
            "  {:<8} merged: {:<4} failed: {}",
            category.kind.to_string(),
            category.merged,
            category.failed
        );
    }
    println!(
        "Done in {}s ({} merged, {} failed)",
        (report.finished_at - report.started_at).num_seconds(),
        report.merged(),
        report.failed()
    );

    Ok(())
}

/// Print per-category downloaded/pending counts.
fn show_status() -> Result<()> {
    let config = SyncConfig::load()?;
    let catalog = CatalogStore::new(&config.catalog_path).load()?;

    println!("Catalog: {}", config.catalog_path.display());
    println!("Records: {}", catalog.len());

    for kind in StreamKind::CATEGORIES {
        let total = catalog.records().iter().filter(|r| r.kind == kind).count();
        let downloaded = catalog
            .records()
            .iter()
            .filter(|r| r.kind == kind && r.downloaded)
            .count();
        println!(
            "  {:<8} {} downloaded, {} pending",
            kind.to_string(),
            downloaded,
            total - downloaded
        );
    }

    Ok(())
}

/// Print the resolved configuration.
fn show_config() -> Result<()> {
    let config = SyncConfig::load()?;

    println!("Resolved configuration:");
    println!("  home:            {}", config.home.display());
    println!("  catalog:         {}", config.catalog_path.display());
    println!("  transcripts:     {}", config.transcript_dir.display());
    println!("  archive base:    {}", config.archive_base_url);
    println!("  index url:       {}", config.index_url);
    println!("  ratelimit:       {:?}", config.ratelimit);
    println!("  request timeout: {:?}", config.request_timeout);
    match &config.config_file {
        Some(path) => println!("  config file:     {}", path.display()),
        None => println!("  config file:     (none found)"),
    }

    Ok(())
}
