//! In-memory host record for tests and dry runs.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use quizgate_core::error::HostError;
use quizgate_core::model::{CompletionStatus, RecordValues, SuccessStatus};
use quizgate_core::traits::{HostRecord, SuspendData, SuspendStore};

/// Everything one commit makes durable.
#[derive(Debug, Clone, Default)]
struct Values {
    record: RecordValues,
    suspend: SuspendData,
    incorrect: Vec<String>,
}

/// A host record and suspend store held in memory.
///
/// Reads see every value set so far, as a live LMS session would; a commit
/// copies the staged values to the committed set and a failed commit resets
/// them to it. Failures can be injected to exercise the commit path.
#[derive(Debug, Default)]
pub struct MemoryHost {
    staged: Mutex<Values>,
    committed: Mutex<Values>,
    /// Number of commits that succeeded.
    commit_count: AtomicU32,
    /// Commits still to fail before one succeeds.
    failing_commits: AtomicU32,
    unavailable: AtomicBool,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from values left by an earlier, committed attempt.
    pub fn with_record(self, record: RecordValues) -> Self {
        lock(&self.staged).record = record.clone();
        lock(&self.committed).record = record;
        self
    }

    pub fn with_suspend_data(self, data: SuspendData) -> Self {
        lock(&self.staged).suspend = data;
        lock(&self.committed).suspend = data;
        self
    }

    pub fn with_incorrect(self, entries: Vec<String>) -> Self {
        lock(&self.staged).incorrect = entries.clone();
        lock(&self.committed).incorrect = entries;
        self
    }

    /// Make the next `n` commits fail with a write error.
    pub fn fail_next_commits(&self, n: u32) {
        self.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Make every call fail as if the host could not be reached.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Record values as of the last successful commit.
    pub fn committed(&self) -> RecordValues {
        lock(&self.committed).record.clone()
    }

    /// Suspend data as of the last successful commit.
    pub fn committed_suspend(&self) -> SuspendData {
        lock(&self.committed).suspend
    }

    /// Incorrect-question entries as of the last successful commit.
    pub fn incorrect(&self) -> Vec<String> {
        lock(&self.committed).incorrect.clone()
    }

    pub fn commit_count(&self) -> u32 {
        self.commit_count.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), HostError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(HostError::Unavailable("memory host switched off".into()))
        } else {
            Ok(())
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl HostRecord for MemoryHost {
    async fn score(&self) -> Result<Option<u8>, HostError> {
        self.check()?;
        Ok(lock(&self.staged).record.score)
    }

    async fn set_score(&self, score: u8) -> Result<(), HostError> {
        self.check()?;
        lock(&self.staged).record.score = Some(score);
        Ok(())
    }

    async fn completion_status(&self) -> Result<Option<CompletionStatus>, HostError> {
        self.check()?;
        Ok(lock(&self.staged).record.completion_status.clone())
    }

    async fn set_completion_status(&self, status: CompletionStatus) -> Result<(), HostError> {
        self.check()?;
        lock(&self.staged).record.completion_status = Some(status);
        Ok(())
    }

    async fn success_status(&self) -> Result<Option<SuccessStatus>, HostError> {
        self.check()?;
        Ok(lock(&self.staged).record.success_status.clone())
    }

    async fn set_success_status(&self, status: SuccessStatus) -> Result<(), HostError> {
        self.check()?;
        lock(&self.staged).record.success_status = Some(status);
        Ok(())
    }

    async fn commit(&self) -> Result<(), HostError> {
        self.check()?;
        let failing = self.failing_commits.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_commits.store(failing - 1, Ordering::SeqCst);
            *lock(&self.staged) = lock(&self.committed).clone();
            return Err(HostError::WriteFailed("injected commit failure".into()));
        }
        let staged = lock(&self.staged).clone();
        *lock(&self.committed) = staged;
        self.commit_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[async_trait]
impl SuspendStore for MemoryHost {
    async fn inc_question_list(&self) -> Result<Vec<String>, HostError> {
        self.check()?;
        Ok(lock(&self.staged).incorrect.clone())
    }

    async fn set_inc_question_list(&self, entries: Vec<String>) -> Result<(), HostError> {
        self.check()?;
        lock(&self.staged).incorrect = entries;
        Ok(())
    }

    async fn clear_inc_question_list(&self) -> Result<(), HostError> {
        self.check()?;
        lock(&self.staged).incorrect.clear();
        Ok(())
    }

    async fn suspend_data(&self) -> Result<SuspendData, HostError> {
        self.check()?;
        Ok(lock(&self.staged).suspend)
    }

    async fn set_suspend_data(&self, data: SuspendData) -> Result<(), HostError> {
        self.check()?;
        lock(&self.staged).suspend = data;
        Ok(())
    }
}
