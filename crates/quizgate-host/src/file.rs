//! File-backed host record.
//!
//! The whole record lives in one JSON document. Setters stage values in
//! memory; `commit` writes a temporary file next to the target and renames
//! it into place, so a reader never sees a half-written record. A commit
//! that cannot be written drops the staged values.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use quizgate_core::codec::ENTRY_DELIMITER;
use quizgate_core::error::HostError;
use quizgate_core::model::{CompletionStatus, RecordValues, SuccessStatus};
use quizgate_core::traits::{HostRecord, SuspendData, SuspendStore};

use crate::error::StoreError;

/// The on-disk document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(default)]
    pub record: RecordValues,
    #[serde(default)]
    pub suspend: SuspendData,
    /// Persisted incorrect-question set, entries joined by the codec's
    /// entry delimiter.
    #[serde(default)]
    pub inc_question_list: String,
    /// Time of the last commit.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredRecord {
    /// Read a record file. A missing file is an empty record.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write the record atomically.
    pub async fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(write_err)?;
        Ok(())
    }

    /// The incorrect set split into entries.
    pub fn incorrect_entries(&self) -> Vec<String> {
        self.inc_question_list
            .split(ENTRY_DELIMITER)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// A host record and suspend store persisted to a JSON file.
pub struct FileHost {
    path: PathBuf,
    staged: Mutex<StoredRecord>,
    /// What the file holds.
    durable: Mutex<StoredRecord>,
}

impl FileHost {
    /// Open the record at `path`, creating nothing until the first commit.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, HostError> {
        let path = path.into();
        let stored = StoredRecord::load(&path).await?;
        tracing::debug!(
            path = %path.display(),
            score = ?stored.record.score,
            "opened host record"
        );
        Ok(Self {
            path,
            staged: Mutex::new(stored.clone()),
            durable: Mutex::new(stored),
        })
    }
}

#[async_trait]
impl HostRecord for FileHost {
    async fn score(&self) -> Result<Option<u8>, HostError> {
        Ok(self.staged.lock().await.record.score)
    }

    async fn set_score(&self, score: u8) -> Result<(), HostError> {
        self.staged.lock().await.record.score = Some(score);
        Ok(())
    }

    async fn completion_status(&self) -> Result<Option<CompletionStatus>, HostError> {
        Ok(self.staged.lock().await.record.completion_status.clone())
    }

    async fn set_completion_status(&self, status: CompletionStatus) -> Result<(), HostError> {
        self.staged.lock().await.record.completion_status = Some(status);
        Ok(())
    }

    async fn success_status(&self) -> Result<Option<SuccessStatus>, HostError> {
        Ok(self.staged.lock().await.record.success_status.clone())
    }

    async fn set_success_status(&self, status: SuccessStatus) -> Result<(), HostError> {
        self.staged.lock().await.record.success_status = Some(status);
        Ok(())
    }

    async fn commit(&self) -> Result<(), HostError> {
        let mut staged = self.staged.lock().await;
        let mut durable = self.durable.lock().await;

        let mut next = staged.clone();
        next.updated_at = Some(Utc::now());
        match next.save(&self.path).await {
            Ok(()) => {
                *staged = next.clone();
                *durable = next;
                tracing::debug!(path = %self.path.display(), "host record committed");
                Ok(())
            }
            Err(e) => {
                *staged = durable.clone();
                tracing::debug!(path = %self.path.display(), "commit failed, staged values dropped");
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl SuspendStore for FileHost {
    async fn inc_question_list(&self) -> Result<Vec<String>, HostError> {
        Ok(self.staged.lock().await.incorrect_entries())
    }

    async fn set_inc_question_list(&self, entries: Vec<String>) -> Result<(), HostError> {
        self.staged.lock().await.inc_question_list = entries.join(ENTRY_DELIMITER);
        Ok(())
    }

    async fn clear_inc_question_list(&self) -> Result<(), HostError> {
        self.staged.lock().await.inc_question_list.clear();
        Ok(())
    }

    async fn suspend_data(&self) -> Result<SuspendData, HostError> {
        Ok(self.staged.lock().await.suspend)
    }

    async fn set_suspend_data(&self, data: SuspendData) -> Result<(), HostError> {
        self.staged.lock().await.suspend = data;
        Ok(())
    }
}
