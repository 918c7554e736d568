//! Error types for assessment sessions and their collaborators.
//!
//! Precondition failures and malformed persisted state are recovered locally;
//! only a failed host commit is surfaced to the caller as terminal, and it
//! still carries the locally computed result.

use thiserror::Error;

use crate::session::AssessmentResult;

/// A configuration combination that cannot work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("passing score must be between 0 and 100, got {0}")]
    PassingScoreOutOfRange(u8),

    #[error("only_retake_incorrect requires is_post_assessment")]
    RetakeIncorrectRequiresPostAssessment,

    #[error("pool is enabled but pool_total is 0")]
    PoolTotalZero,
}

/// A session transition that was refused. The session state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The current question must be answered before it can be submitted.
    #[error("the current question must be answered first")]
    NotAnswered,

    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("the question list is empty")]
    NoQuestions,

    #[error("skipping is not enabled for this assessment")]
    SkipDisabled,

    #[error("retry is not permitted here")]
    RetryNotPermitted,
}

/// Why a persisted incorrect-question set could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("incorrect-question set is empty")]
    Empty,

    #[error("malformed incorrect-question entry: {0:?}")]
    Malformed(String),

    #[error("incorrect-question entry refers to unknown question {0}")]
    UnknownQuestion(usize),

    #[error("question {0} appears more than once")]
    Duplicate(usize),

    #[error("{count} incorrect questions exceed the {total} questions in the assessment")]
    TooMany { count: usize, total: usize },
}

/// Errors from the host-record and persistence collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host record could not be reached.
    #[error("host record unavailable: {0}")]
    Unavailable(String),

    /// A write or commit was rejected.
    #[error("host record write failed: {0}")]
    WriteFailed(String),

    /// The stored record could not be understood.
    #[error("host record is corrupt: {0}")]
    Corrupt(String),

    /// The writeback did not finish in time.
    #[error("host record timed out after {0}ms")]
    Timeout(u64),
}

impl HostError {
    /// Returns `true` if retrying the same operation cannot succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, HostError::Corrupt(_))
    }
}

/// The result could not be committed to the host record.
///
/// The local result stays authoritative for display.
#[derive(Debug, Error)]
#[error("result commit failed: {source}")]
pub struct CommitError {
    pub result: Box<AssessmentResult>,
    #[source]
    pub source: HostError,
}

/// Errors from [`crate::engine::AssessmentEngine`] outside the commit step.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_corrupt_records_are_permanent() {
        assert!(HostError::Corrupt("bad json".into()).is_permanent());
        assert!(!HostError::Timeout(5000).is_permanent());
        assert!(!HostError::WriteFailed("disk full".into()).is_permanent());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = SessionError::InvalidTransition {
            action: "submit",
            state: "completed",
        };
        assert_eq!(err.to_string(), "cannot submit while completed");
        assert_eq!(
            CodecError::TooMany { count: 6, total: 5 }.to_string(),
            "6 incorrect questions exceed the 5 questions in the assessment"
        );
    }
}
