//! Merging a fresh result into the host record without regressing it.

use serde::{Deserialize, Serialize};

use crate::codec::IncorrectSet;
use crate::model::{AssessmentConfig, OverwritePolicy, RecordValues};

/// Merge `current` into `previous`.
///
/// - Completion status: a previous value starting with `c` or `p` is kept
///   unless `policy.completion_status` is set; anything else is replaced.
/// - Success status: a previous value starting with `p` is kept unless
///   `policy.success_status` is set; anything else is replaced.
/// - Score: a previous score higher than the current one is kept unless
///   `policy.higher_score` is set; otherwise the current score wins.
///
/// Fields absent from `previous` always take the current value.
pub fn reconcile(
    previous: Option<&RecordValues>,
    current: &RecordValues,
    policy: OverwritePolicy,
) -> RecordValues {
    let Some(previous) = previous else {
        return current.clone();
    };

    let completion_status = match &previous.completion_status {
        Some(prev) if prev.is_finalized() && !policy.completion_status => {
            tracing::debug!(previous = %prev, "keeping finalized completion status");
            Some(prev.clone())
        }
        _ => current.completion_status.clone(),
    };

    let success_status = match &previous.success_status {
        Some(prev) if prev.is_passed() && !policy.success_status => {
            tracing::debug!(previous = %prev, "keeping passed success status");
            Some(prev.clone())
        }
        _ => current.success_status.clone(),
    };

    let score = match (previous.score, current.score) {
        (Some(prev), Some(cur)) if prev > cur && !policy.higher_score => {
            tracing::debug!(previous = prev, current = cur, "keeping higher previous score");
            Some(prev)
        }
        (prev, None) => prev,
        (_, cur) => cur,
    };

    RecordValues {
        completion_status,
        success_status,
        score,
    }
}

/// What to do with the persisted incorrect set after an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action", content = "entries")]
pub enum IncorrectSetAction {
    /// Leave whatever is stored.
    Keep,
    /// The attempt passed: nothing left to retake.
    Clear,
    /// The attempt failed: store the questions to retake.
    Store(Vec<String>),
}

impl IncorrectSetAction {
    pub fn for_attempt(config: &AssessmentConfig, passed: bool, incorrect: &IncorrectSet) -> Self {
        if !config.only_retake_incorrect {
            IncorrectSetAction::Keep
        } else if passed {
            IncorrectSetAction::Clear
        } else {
            IncorrectSetAction::Store(incorrect.to_entries())
        }
    }
}
