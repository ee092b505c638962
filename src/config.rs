//! Configuration for a sync run.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (VODSYNC_HOME, VODSYNC_ARCHIVE_URL, VODSYNC_INDEX_URL)
//! 2. Config file (.vodsync/config.yaml)
//! 3. Defaults (~/.vodsync, public archive endpoints)
//!
//! Config file discovery:
//! - Searches current directory and parents for .vodsync/config.yaml
//! - Paths in the config file are relative to the config file's parent directory
//!
//! Resolution produces an explicit [`SyncConfig`] handed to the
//! orchestrator at construction; there is no process-global state, so the
//! configuration's lifecycle is scoped to one run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Default archive base for metadata/transcript endpoints.
pub const DEFAULT_ARCHIVE_URL: &str = "https://archive.dokiscripts.com";

/// Default external index document listing candidate ids.
pub const DEFAULT_INDEX_URL: &str =
    "https://raw.githubusercontent.com/duckautomata/dokiscripts-data/refs/heads/master/yt-dlp-archive-regular.txt";

/// Minimum seconds between requests to the same domain. Be kind to the
/// archive.
pub const DEFAULT_RATELIMIT_SECONDS: f64 = 0.05;

/// Per-request deadline; a timeout is handled like a non-200.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub archive: Option<ArchiveConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
    /// Catalog CSV path (relative to home)
    pub catalog: Option<String>,
    /// Transcript artifact directory (relative to home)
    pub transcripts: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    pub base_url: Option<String>,
    pub index_url: Option<String>,
    pub ratelimit_seconds: Option<f64>,
    pub request_timeout_seconds: Option<u64>,
}

/// Resolved configuration for one sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Absolute path to the vodsync state directory
    pub home: PathBuf,
    /// Path to the persisted catalog CSV
    pub catalog_path: PathBuf,
    /// Directory holding transcript artifacts
    pub transcript_dir: PathBuf,
    /// Base URL for metadata/transcript endpoints
    pub archive_base_url: String,
    /// URL of the external index document
    pub index_url: String,
    /// Minimum interval between requests to one domain
    pub ratelimit: Duration,
    /// Per-request deadline
    pub request_timeout: Duration,
    /// Path to the config file (if found)
    pub config_file: Option<PathBuf>,
}

impl SyncConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self> {
        let default_home = dirs::home_dir()
            .context("Failed to determine home directory")?
            .join(".vodsync");

        let config_file = find_config_file();

        let (home, file) = if let Some(ref config_path) = config_file {
            let file = load_config_file(config_path)?;

            let home = if let Ok(env_home) = std::env::var("VODSYNC_HOME") {
                PathBuf::from(env_home)
            } else if let Some(ref home_path) = file.paths.home {
                // home is relative to the .vodsync/ directory
                let vodsync_dir = config_path.parent().unwrap_or(Path::new("."));
                resolve_path(vodsync_dir, home_path)
            } else {
                default_home
            };

            (home, Some(file))
        } else {
            let home = std::env::var("VODSYNC_HOME")
                .map(PathBuf::from)
                .unwrap_or(default_home);
            (home, None)
        };

        let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();
        let archive = file.as_ref().and_then(|f| f.archive.clone());

        let catalog_path = home.join(paths.catalog.as_deref().unwrap_or("catalog.csv"));
        let transcript_dir = home.join(paths.transcripts.as_deref().unwrap_or("transcripts"));

        let archive_base_url = std::env::var("VODSYNC_ARCHIVE_URL").unwrap_or_else(|_| {
            archive
                .as_ref()
                .and_then(|a| a.base_url.clone())
                .unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string())
        });
        let index_url = std::env::var("VODSYNC_INDEX_URL").unwrap_or_else(|_| {
            archive
                .as_ref()
                .and_then(|a| a.index_url.clone())
                .unwrap_or_else(|| DEFAULT_INDEX_URL.to_string())
        });

        let ratelimit_seconds = archive
            .as_ref()
            .and_then(|a| a.ratelimit_seconds)
            .unwrap_or(DEFAULT_RATELIMIT_SECONDS);
        let request_timeout_seconds = archive
            .as_ref()
            .and_then(|a| a.request_timeout_seconds)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS);

        Ok(SyncConfig {
            home,
            catalog_path,
            transcript_dir,
            archive_base_url,
            index_url,
            ratelimit: Duration::from_secs_f64(ratelimit_seconds),
            request_timeout: Duration::from_secs(request_timeout_seconds),
            config_file,
        })
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".vodsync").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}
