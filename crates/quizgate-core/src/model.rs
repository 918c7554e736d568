//! Core data model types for quizgate.
//!
//! These are the fundamental types the whole system shares: authored
//! questions and their per-session state, the question bank, assessment
//! configuration, and the host-record values an assessment reads and writes.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use crate::error::ConfigError;

/// Passing threshold used when a bank does not specify one.
pub const DEFAULT_PASSING_SCORE: u8 = 80;

/// A question as authored in a bank file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Unique identifier within the bank.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// The question text shown to the learner.
    #[serde(default)]
    pub stem: String,
    /// Interaction style.
    #[serde(default)]
    pub kind: QuestionKind,
    /// Expected response, used by scripted learners to decide correctness.
    #[serde(default)]
    pub correct_response: Option<String>,
    /// Feedback texts.
    #[serde(default)]
    pub feedback: FeedbackText,
}

/// Feedback texts for a question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackText {
    #[serde(default)]
    pub correct: String,
    /// Shown on the first incorrect attempt.
    #[serde(default)]
    pub incorrect: String,
    /// Shown on later incorrect attempts; falls back to `incorrect`.
    #[serde(default)]
    pub retry: Option<String>,
}

impl FeedbackText {
    /// Pick the incorrect-answer text for the given attempt count.
    pub fn incorrect_for(&self, attempts: u32) -> &str {
        match &self.retry {
            Some(text) if attempts > 1 => text,
            _ => &self.incorrect,
        }
    }
}

/// Supported question interaction styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    #[default]
    Standard,
    /// A software simulation that signals its own completion via [`SimMode`].
    Simulation,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::Standard => write!(f, "standard"),
            QuestionKind::Simulation => write!(f, "simulation"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(QuestionKind::Standard),
            "simulation" | "sim" => Ok(QuestionKind::Simulation),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// Simulation progress reported by the presentation layer (modes 0 through 3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimMode {
    #[default]
    Demo,
    Practice,
    Test,
    Complete,
}

impl TryFrom<u8> for SimMode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SimMode::Demo),
            1 => Ok(SimMode::Practice),
            2 => Ok(SimMode::Test),
            3 => Ok(SimMode::Complete),
            other => Err(format!("invalid simulation mode: {other}")),
        }
    }
}

/// Outcome captured when a response is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionOutcome {
    Correct,
    Incorrect,
    Skipped,
}

/// A question in a bank, with its stable identity and current-session state.
#[derive(Debug, Clone)]
pub struct Question {
    spec: QuestionSpec,
    org_index: usize,
    ques_no: u32,
    pub(crate) index: usize,
    /// Incorrect submissions this session.
    pub attempts: u32,
    pub answered: bool,
    pub correct: bool,
    pub skipped: bool,
    pub student_response: Option<String>,
    pub interaction_result: Option<InteractionOutcome>,
}

impl Question {
    fn new(spec: QuestionSpec, position: usize) -> Self {
        Self {
            spec,
            org_index: position,
            ques_no: position as u32 + 1,
            index: position,
            attempts: 0,
            answered: false,
            correct: false,
            skipped: false,
            student_response: None,
            interaction_result: None,
        }
    }

    pub fn spec(&self) -> &QuestionSpec {
        &self.spec
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn kind(&self) -> QuestionKind {
        self.spec.kind
    }

    /// Position in the original bank. Never changes.
    pub fn org_index(&self) -> usize {
        self.org_index
    }

    /// Position in the currently active ordering.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based sequence number assigned when the bank was built.
    pub fn ques_no(&self) -> u32 {
        self.ques_no
    }

    /// Record the learner's response.
    pub fn respond(&mut self, correct: bool, response: impl Into<String>) {
        self.answered = true;
        self.correct = correct;
        self.skipped = false;
        self.student_response = Some(response.into());
    }

    /// Clear the interaction state. `attempts` is kept.
    pub fn reset(&mut self) {
        self.answered = false;
        self.correct = false;
        self.skipped = false;
        self.student_response = None;
        self.interaction_result = None;
    }

    /// Check a response against the authored correct response.
    ///
    /// Returns `None` when the question has no correct response on file.
    pub fn matches_response(&self, response: &str) -> Option<bool> {
        self.spec
            .correct_response
            .as_deref()
            .map(|expected| expected.trim().eq_ignore_ascii_case(response.trim()))
    }
}

/// The fixed, ordered collection of all authored questions for an assessment.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a question, assigning its original position and sequence number.
    pub fn push(&mut self, spec: QuestionSpec) -> &Question {
        let position = self.questions.len();
        self.questions.push(Question::new(spec, position));
        &self.questions[position]
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, org_index: usize) -> Option<&Question> {
        self.questions.get(org_index)
    }

    pub fn get_mut(&mut self, org_index: usize) -> Option<&mut Question> {
        self.questions.get_mut(org_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    /// Reset every question for a fresh session.
    pub(crate) fn reset_all(&mut self) {
        for q in &mut self.questions {
            q.reset();
            q.attempts = 0;
        }
    }

    /// Set each question's `index` to its position in `order`.
    pub(crate) fn assign_positions(&mut self, order: &[usize]) {
        for (position, &org_index) in order.iter().enumerate() {
            if let Some(q) = self.questions.get_mut(org_index) {
                q.index = position;
            }
        }
    }
}

impl FromIterator<QuestionSpec> for QuestionBank {
    fn from_iter<T: IntoIterator<Item = QuestionSpec>>(iter: T) -> Self {
        let mut bank = QuestionBank::new();
        for spec in iter {
            bank.push(spec);
        }
        bank
    }
}

impl Index<usize> for QuestionBank {
    type Output = Question;

    fn index(&self, org_index: usize) -> &Question {
        &self.questions[org_index]
    }
}

/// Configuration recognized by an assessment. Immutable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Draw a random subset of `pool_total` questions.
    #[serde(default)]
    pub pool: bool,
    #[serde(default)]
    pub pool_total: usize,
    /// Shuffle the question order.
    #[serde(default)]
    pub random_questions: bool,
    /// Gating assessment whose result is written to the host record.
    #[serde(default)]
    pub is_post_assessment: bool,
    #[serde(default = "default_true")]
    pub retake_allowed: bool,
    /// Retakes only present previously incorrect questions.
    #[serde(default)]
    pub only_retake_incorrect: bool,
    #[serde(default = "default_true")]
    pub feedback_enabled: bool,
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,
    /// Allow the learner to skip a question (scored as incorrect).
    #[serde(default)]
    pub skip_enabled: bool,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            pool: false,
            pool_total: 0,
            random_questions: false,
            is_post_assessment: false,
            retake_allowed: true,
            only_retake_incorrect: false,
            feedback_enabled: true,
            passing_score: DEFAULT_PASSING_SCORE,
            skip_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_passing_score() -> u8 {
    DEFAULT_PASSING_SCORE
}

impl AssessmentConfig {
    /// Check option combinations that cannot work together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.passing_score > 100 {
            return Err(ConfigError::PassingScoreOutOfRange(self.passing_score));
        }
        if self.only_retake_incorrect && !self.is_post_assessment {
            return Err(ConfigError::RetakeIncorrectRequiresPostAssessment);
        }
        if self.pool && self.pool_total == 0 {
            return Err(ConfigError::PoolTotalZero);
        }
        Ok(())
    }
}

/// Which previously-superior host values may be overwritten by a new attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwritePolicy {
    /// Overwrite a completion status that is already completed/passed.
    #[serde(default)]
    pub completion_status: bool,
    /// Overwrite a success status that is already passed.
    #[serde(default)]
    pub success_status: bool,
    /// Overwrite a previous score that is higher than the new one.
    #[serde(default)]
    pub higher_score: bool,
}

/// Host-record completion status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CompletionStatus {
    NotAttempted,
    Incomplete,
    Completed,
    /// Any vocabulary the host uses that is not modeled above (e.g. "passed").
    Other(String),
}

impl CompletionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CompletionStatus::NotAttempted => "not attempted",
            CompletionStatus::Incomplete => "incomplete",
            CompletionStatus::Completed => "completed",
            CompletionStatus::Other(s) => s,
        }
    }

    /// A status beginning with `c` or `p` is treated as already finalized.
    pub fn is_finalized(&self) -> bool {
        matches!(first_char(self.as_str()), Some('c') | Some('p'))
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Ok(match normalized.as_str() {
            "not attempted" => CompletionStatus::NotAttempted,
            "incomplete" => CompletionStatus::Incomplete,
            "completed" => CompletionStatus::Completed,
            _ => CompletionStatus::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for CompletionStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<CompletionStatus> for String {
    fn from(status: CompletionStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Host-record success status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SuccessStatus {
    Unknown,
    Passed,
    Failed,
    Other(String),
}

impl SuccessStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SuccessStatus::Unknown => "unknown",
            SuccessStatus::Passed => "passed",
            SuccessStatus::Failed => "failed",
            SuccessStatus::Other(s) => s,
        }
    }

    /// A status beginning with `p` counts as a pass.
    pub fn is_passed(&self) -> bool {
        first_char(self.as_str()) == Some('p')
    }
}

impl fmt::Display for SuccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SuccessStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "unknown" => SuccessStatus::Unknown,
            "passed" => SuccessStatus::Passed,
            "failed" => SuccessStatus::Failed,
            _ => SuccessStatus::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for SuccessStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<SuccessStatus> for String {
    fn from(status: SuccessStatus) -> Self {
        status.as_str().to_string()
    }
}

fn first_char(s: &str) -> Option<char> {
    s.trim().chars().next().map(|c| c.to_ascii_lowercase())
}

/// The result-bearing values of a host record. `None` means "no value recorded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordValues {
    #[serde(default)]
    pub completion_status: Option<CompletionStatus>,
    #[serde(default)]
    pub success_status: Option<SuccessStatus>,
    #[serde(default)]
    pub score: Option<u8>,
}
