//! CSV persistence for the catalog.
//!
//! The catalog lives in a single CSV file with columns
//! `date,user,type,title,downloaded,id_path`. An absent file is an empty
//! catalog, not an error. Saves take an exclusive lock on the file so the
//! single-writer discipline holds even if two processes race.

use std::fs::{File, OpenOptions};
use std::io::Seek;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use tracing::info;

use super::{Catalog, Record};

/// Handle to the on-disk catalog file.
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    /// Create a store for the given catalog path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the catalog file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the catalog from disk.
    ///
    /// A missing file yields an empty catalog.
    pub fn load(&self) -> Result<Catalog> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No catalog file found, starting empty");
            return Ok(Catalog::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("Failed to open catalog: {}", self.path.display()))?;

        let mut records = Vec::new();
        for result in reader.deserialize::<Record>() {
            let record = result
                .with_context(|| format!("Failed to parse catalog: {}", self.path.display()))?;
            records.push(record);
        }

        info!(
            records = records.len(),
            path = %self.path.display(),
            "Loaded catalog"
        );
        Ok(Catalog::from_records(records))
    }

    /// Persist the full catalog to disk, synchronously.
    ///
    /// Called after every merge batch so the file is never more than one
    /// batch behind memory.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create catalog directory: {}", parent.display())
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open catalog for write: {}", self.path.display()))?;

        file.lock_exclusive()
            .with_context(|| format!("Failed to lock catalog: {}", self.path.display()))?;

        let result = self.write_records(&mut file, catalog);
        // Release the lock regardless of write outcome
        let _ = fs2::FileExt::unlock(&file);
        result
    }

    fn write_records(&self, file: &mut File, catalog: &Catalog) -> Result<()> {
        file.set_len(0)?;
        file.rewind()?;

        let mut writer = csv::Writer::from_writer(file);
        for record in catalog.records() {
            writer
                .serialize(record)
                .with_context(|| format!("Failed to write catalog: {}", self.path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush catalog: {}", self.path.display()))?;

        Ok(())
    }
}
