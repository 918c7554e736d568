//! Collaborator traits for the host learning record and course persistence.
//!
//! Implemented by the `quizgate-host` crate. An assessment reads these at
//! session start and writes them once, at the end of an attempt.
//!
//! Setters on both traits only stage values. [`HostRecord::commit`] makes
//! everything staged through either trait durable together; a failed commit
//! discards it, leaving the last committed values in place.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::model::{CompletionStatus, RecordValues, SuccessStatus};

// ---------------------------------------------------------------------------
// Host record
// ---------------------------------------------------------------------------

/// The learning-management record an assessment reports to.
#[async_trait]
pub trait HostRecord: Send + Sync {
    async fn score(&self) -> Result<Option<u8>, HostError>;

    async fn set_score(&self, score: u8) -> Result<(), HostError>;

    async fn completion_status(&self) -> Result<Option<CompletionStatus>, HostError>;

    async fn set_completion_status(&self, status: CompletionStatus) -> Result<(), HostError>;

    async fn success_status(&self) -> Result<Option<SuccessStatus>, HostError>;

    async fn set_success_status(&self, status: SuccessStatus) -> Result<(), HostError>;

    /// Make all values set since the last commit durable, suspend data
    /// included. On failure the staged values are dropped.
    async fn commit(&self) -> Result<(), HostError>;

    /// Read the three result-bearing values.
    async fn snapshot(&self) -> Result<RecordValues, HostError> {
        Ok(RecordValues {
            completion_status: self.completion_status().await?,
            success_status: self.success_status().await?,
            score: self.score().await?,
        })
    }
}

// ---------------------------------------------------------------------------
// Course persistence
// ---------------------------------------------------------------------------

/// Course state kept between sessions (suspend data).
///
/// Writes become durable with the next [`HostRecord::commit`] of the same
/// host.
#[async_trait]
pub trait SuspendStore: Send + Sync {
    /// The persisted incorrect-question entries, already split on the entry delimiter.
    async fn inc_question_list(&self) -> Result<Vec<String>, HostError>;

    async fn set_inc_question_list(&self, entries: Vec<String>) -> Result<(), HostError>;

    async fn clear_inc_question_list(&self) -> Result<(), HostError>;

    async fn suspend_data(&self) -> Result<SuspendData, HostError>;

    async fn set_suspend_data(&self, data: SuspendData) -> Result<(), HostError>;
}

/// Per-assessment course state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendData {
    /// An earlier attempt ran to the end.
    #[serde(default)]
    pub assessment_completed: bool,
    /// That attempt passed.
    #[serde(default)]
    pub passed: bool,
}
