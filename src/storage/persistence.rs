//! Deployment persistence layer
//!
//! Provides save/load functionality for a vault deployment.

use crate::deployment::Deployment;
use serde_json::error::Category;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub state_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".vault_data"),
            state_file: "vault.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Deployment storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn state_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.state_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.state_file, index))
    }

    /// Save the deployment to disk
    pub fn save(&self, deployment: &Deployment) -> Result<(), StorageError> {
        let path = self.state_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to temporary file first
        let temp_path = self.config.data_dir.join("vault.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, deployment)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;

        log::debug!("Deployment saved to {}", path.display());
        Ok(())
    }

    /// Load the deployment from disk
    pub fn load(&self) -> Result<Deployment, StorageError> {
        let path = self.state_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Vault state file not found".to_string(),
            ));
        }

        read_deployment(&path)
    }

    /// Check if a saved deployment exists
    pub fn exists(&self) -> bool {
        self.state_path().exists()
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup (0 is the most recent)
    pub fn restore_backup(&self, backup_index: usize) -> Result<Deployment, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_deployment(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|&i| self.backup_path(i).exists())
            .collect()
    }

    /// Get storage statistics
    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let path = self.state_path();

        let file_size = if path.exists() {
            fs::metadata(&path)?.len()
        } else {
            0
        };

        Ok(StorageStats {
            file_size,
            backup_count: self.list_backups().len(),
            data_dir: self.config.data_dir.clone(),
        })
    }
}

/// Storage statistics
#[derive(Debug)]
pub struct StorageStats {
    pub file_size: u64,
    pub backup_count: usize,
    pub data_dir: PathBuf,
}

/// Read and re-validate a deployment
///
/// Owner and threshold rules are enforced while deserializing; the ledger is
/// checked against the confirmation record afterwards.
fn read_deployment(path: &Path) -> Result<Deployment, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);

    let deployment: Deployment =
        serde_json::from_reader(reader).map_err(|e| match e.classify() {
            Category::Data => StorageError::InvalidData(e.to_string()),
            _ => StorageError::SerializationError(e),
        })?;

    deployment
        .vault
        .check_integrity()
        .map_err(|e| StorageError::InvalidData(e.to_string()))?;

    Ok(deployment)
}

/// Save a deployment to a specific file path
pub fn save_to_file(deployment: &Deployment, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, deployment)?;
    Ok(())
}

/// Load a deployment from a specific file path
pub fn load_from_file(path: &Path) -> Result<Deployment, StorageError> {
    read_deployment(path)
}
