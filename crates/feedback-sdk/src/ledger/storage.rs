//! Blob storage behind the vote ledger

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{FeedbackError, Result};

/// Durable home of the serialized ledger.
///
/// Stores one opaque blob. `load` returns `None` when nothing was saved yet.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    async fn load(&self) -> Result<Option<Vec<u8>>>;

    async fn save(&self, data: &[u8]) -> Result<()>;

    async fn remove(&self) -> Result<()>;
}

/// Ledger blob in a single file.
///
/// Writes go to a sibling temp file and are renamed into place, so a crash
/// mid-write leaves either the old or the new ledger.
#[derive(Debug, Clone)]
pub struct FileLedgerStorage {
    path: PathBuf,
}

impl FileLedgerStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl LedgerStorage for FileLedgerStorage {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FeedbackError::Ledger(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save(&self, data: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, data).await?;
        tokio::fs::rename(&temp, &self.path).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process ledger blob, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryLedgerStorage {
    data: Mutex<Option<Vec<u8>>>,
}

impl MemoryLedgerStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blob (possibly garbage)
    pub fn with_data(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Mutex::new(Some(data.into())),
        }
    }

    /// Current blob contents
    pub fn snapshot(&self) -> Option<Vec<u8>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl LedgerStorage for MemoryLedgerStorage {
    async fn load(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.snapshot())
    }

    async fn save(&self, data: &[u8]) -> Result<()> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(data.to_vec());
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
