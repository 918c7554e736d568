//! Assessment engine: wires a session to the host record.
//!
//! Reads earlier-attempt state when a session begins and performs the single
//! writeback when a post-assessment ends, with retries on transient host
//! failures and a timeout on each commit attempt.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::error::{CommitError, EngineError, HostError};
use crate::model::RecordValues;
use crate::pool::PriorAttempt;
use crate::reconcile::IncorrectSetAction;
use crate::session::{Assessment, AssessmentResult, SessionObserver, Writeback};
use crate::traits::{HostRecord, SuspendStore};

/// Configuration for the assessment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on one commit attempt, writes included.
    pub commit_timeout: Duration,
    /// Retries on transient host errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles each time.
    pub retry_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commit_timeout: Duration::from_millis(5000),
            max_retries: 2,
            retry_delay: Duration::from_millis(200),
        }
    }
}

/// Runs assessments against a host record and course persistence.
pub struct AssessmentEngine {
    host: Arc<dyn HostRecord>,
    suspend: Arc<dyn SuspendStore>,
    config: EngineConfig,
}

impl AssessmentEngine {
    pub fn new(
        host: Arc<dyn HostRecord>,
        suspend: Arc<dyn SuspendStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            host,
            suspend,
            config,
        }
    }

    /// What the host and course state say about earlier attempts.
    pub async fn prior_attempt(&self) -> Result<PriorAttempt, HostError> {
        let suspend = self.suspend.suspend_data().await?;
        let record = self.host.snapshot().await?;
        Ok(PriorAttempt::from_host(&suspend, record))
    }

    /// Initialize `assessment` from host state.
    ///
    /// A host that cannot be reached is treated as having no earlier
    /// attempt; a corrupt record is an error.
    pub async fn begin<R: Rng + ?Sized>(
        &self,
        assessment: &mut Assessment,
        rng: &mut R,
        observer: &mut dyn SessionObserver,
    ) -> Result<(), EngineError> {
        let prior = match self.prior_attempt().await {
            Ok(prior) => prior,
            Err(e) if e.is_permanent() => return Err(e.into()),
            Err(e) => {
                tracing::warn!("reading earlier attempt failed, starting fresh: {e}");
                PriorAttempt::fresh()
            }
        };

        let persisted = if assessment.config().only_retake_incorrect {
            match self.suspend.inc_question_list().await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("reading incorrect-question list failed: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        tracing::debug!(
            completed = prior.completed,
            score = ?prior.score(),
            persisted = persisted.len(),
            "beginning assessment"
        );
        assessment.initialize(prior, &persisted, rng, observer)?;
        Ok(())
    }

    /// Write a finished result to the host.
    ///
    /// Each attempt reads the host record as it stands and merges the result
    /// into it, so a value committed since [`AssessmentEngine::begin`] is
    /// never regressed. Returns the committed record values, or `None` when
    /// the result owes no writeback. On failure the error carries the result.
    pub async fn commit(
        &self,
        result: &AssessmentResult,
    ) -> Result<Option<RecordValues>, CommitError> {
        let Some(writeback) = &result.writeback else {
            return Ok(None);
        };

        let mut last_error = None;
        let mut retry_delay = self.config.retry_delay;
        for retry in 0..=self.config.max_retries {
            if retry > 0 {
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(Duration::from_secs(10));
            }

            let attempt = tokio::time::timeout(self.config.commit_timeout, self.write(writeback));
            let error = match attempt.await {
                Ok(Ok(record)) => {
                    tracing::info!(
                        score = ?record.score,
                        completion = ?record.completion_status,
                        success = ?record.success_status,
                        "result committed"
                    );
                    return Ok(Some(record));
                }
                Ok(Err(e)) => e,
                Err(_) => HostError::Timeout(self.config.commit_timeout.as_millis() as u64),
            };

            tracing::warn!(retry, "commit failed: {error}");
            let permanent = error.is_permanent();
            last_error = Some(error);
            if permanent {
                break;
            }
        }

        let source =
            last_error.unwrap_or_else(|| HostError::WriteFailed("no commit attempted".into()));
        tracing::error!(score = result.score, "result commit failed: {source}");
        Err(CommitError {
            result: Box::new(result.clone()),
            source,
        })
    }

    async fn write(&self, writeback: &Writeback) -> Result<RecordValues, HostError> {
        let previous = self.host.snapshot().await?;
        let record = writeback.merged(&previous);
        tracing::debug!(?previous, merged = ?record, "reconciled with host record");

        match &writeback.incorrect {
            IncorrectSetAction::Keep => {}
            IncorrectSetAction::Clear => self.suspend.clear_inc_question_list().await?,
            IncorrectSetAction::Store(entries) => {
                self.suspend.set_inc_question_list(entries.clone()).await?
            }
        }
        self.suspend.set_suspend_data(writeback.suspend).await?;

        if let Some(status) = &record.completion_status {
            self.host.set_completion_status(status.clone()).await?;
        }
        if let Some(status) = &record.success_status {
            self.host.set_success_status(status.clone()).await?;
        }
        if let Some(score) = record.score {
            self.host.set_score(score).await?;
        }
        self.host.commit().await?;
        Ok(record)
    }
}
