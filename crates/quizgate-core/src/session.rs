//! The assessment session state machine.
//!
//! ```text
//! NotStarted ──start──▶ InProgress ──submit──▶ Feedback ──acknowledge──┐
//!     │                    ▲   │                  │                    │
//!     │                    │   └──(no feedback)───┼──────▶ Completed ◀─┘
//!     │                    └──────retry───────────┘
//!     └──initialize (rules 1–2)──▶ Bypassed
//! ```
//!
//! Every transition takes `&mut self`, so a new request can only arrive once
//! the previous one has settled. Events go to the caller's
//! [`SessionObserver`]; the session keeps no reference to its owner.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::codec::IncorrectSet;
use crate::error::{ConfigError, SessionError};
use crate::model::{
    AssessmentConfig, CompletionStatus, InteractionOutcome, OverwritePolicy, Question,
    QuestionBank, QuestionKind, RecordValues, SimMode, SuccessStatus,
};
use crate::pool::{
    effective_total, select_questions, BypassReason, ListSource, PriorAttempt, Selection,
};
use crate::reconcile::{reconcile, IncorrectSetAction};
use crate::scoring::{is_passing, score_questions};
use crate::traits::SuspendData;

/// Where a session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress {
        current: usize,
    },
    /// Feedback for the question at `current` is showing.
    Feedback {
        current: usize,
        correct: bool,
        completed: bool,
    },
    Completed,
    Bypassed {
        reason: BypassReason,
        previous_score: Option<u8>,
    },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::NotStarted => "not started",
            SessionState::InProgress { .. } => "in progress",
            SessionState::Feedback { .. } => "showing feedback",
            SessionState::Completed => "completed",
            SessionState::Bypassed { .. } => "bypassed",
        }
    }
}

/// What a submission or acknowledgment led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Feedback is showing; call [`Assessment::acknowledge`] to continue.
    Feedback(FeedbackEvent),
    /// The question at `position` is now current.
    Next { position: usize },
    /// The session completed; see [`Assessment::result`].
    Finished,
}

/// Feedback for one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub position: usize,
    pub ques_no: u32,
    pub correct: bool,
    pub skipped: bool,
    /// Incorrect submissions so far, including this one.
    pub attempts: u32,
    /// This was the last question.
    pub completed: bool,
    /// [`Assessment::retry`] is available.
    pub retry_permitted: bool,
    pub message: String,
}

/// Host and course-state writes owed at the end of a post-assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Writeback {
    /// This attempt's own values, before merging with the host record.
    pub record: RecordValues,
    /// Which superior host values `record` may replace.
    pub overwrite: OverwritePolicy,
    pub incorrect: IncorrectSetAction,
    pub suspend: SuspendData,
}

impl Writeback {
    /// The values to write over a host record currently holding `previous`.
    pub fn merged(&self, previous: &RecordValues) -> RecordValues {
        reconcile(Some(previous), &self.record, self.overwrite)
    }
}

/// The outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentResult {
    pub score: u8,
    pub passed: bool,
    pub total_incorrect: usize,
    /// `quesNo` of each incorrect question, ascending.
    pub inc_number_list: Vec<u32>,
    pub ques_total: usize,
    pub real_ques_total: usize,
    pub correct_questions_remaining: usize,
    pub incorrect: IncorrectSet,
    /// Present for post-assessments only.
    pub writeback: Option<Writeback>,
}

/// Receives session events. The owner of an [`Assessment`] passes one to
/// every transition.
pub trait SessionObserver {
    fn on_question(&mut self, position: usize, total: usize, question: &Question);
    fn on_feedback(&mut self, feedback: &FeedbackEvent);
    fn on_bypassed(&mut self, reason: BypassReason, previous_score: Option<u8>);
    fn on_finished(&mut self, result: &AssessmentResult);
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_question(&mut self, _: usize, _: usize, _: &Question) {}
    fn on_feedback(&mut self, _: &FeedbackEvent) {}
    fn on_bypassed(&mut self, _: BypassReason, _: Option<u8>) {}
    fn on_finished(&mut self, _: &AssessmentResult) {}
}

/// One assessment: its bank, configuration and the current session.
#[derive(Debug, Clone)]
pub struct Assessment {
    bank: QuestionBank,
    config: AssessmentConfig,
    overwrite: OverwritePolicy,
    interaction: bool,
    state: SessionState,
    question_list: Vec<usize>,
    list_source: ListSource,
    ques_total: usize,
    real_ques_total: usize,
    correct_questions_remaining: usize,
    prior: PriorAttempt,
    sim_mode: SimMode,
    result: Option<AssessmentResult>,
}

impl Assessment {
    /// Build an assessment over `bank`.
    ///
    /// A bank of at most one question that is not a post-assessment is an
    /// interaction: feedback and retakes are always on and the session
    /// starts as soon as it is initialized.
    pub fn new(bank: QuestionBank, mut config: AssessmentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let interaction = bank.len() <= 1 && !config.is_post_assessment;
        if interaction {
            config.feedback_enabled = true;
            config.retake_allowed = true;
        }
        let total = bank.len();
        Ok(Self {
            bank,
            config,
            overwrite: OverwritePolicy::default(),
            interaction,
            state: SessionState::NotStarted,
            question_list: Vec::new(),
            list_source: ListSource::AllQuestions,
            ques_total: total,
            real_ques_total: total,
            correct_questions_remaining: 0,
            prior: PriorAttempt::fresh(),
            sim_mode: SimMode::default(),
            result: None,
        })
    }

    pub fn with_overwrite_policy(mut self, policy: OverwritePolicy) -> Self {
        self.overwrite = policy;
        self
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_interaction(&self) -> bool {
        self.interaction
    }

    pub fn ques_total(&self) -> usize {
        self.ques_total
    }

    pub fn real_ques_total(&self) -> usize {
        self.real_ques_total
    }

    pub fn correct_questions_remaining(&self) -> usize {
        self.correct_questions_remaining
    }

    pub fn list_source(&self) -> ListSource {
        self.list_source
    }

    /// Questions of the active list in presentation order.
    pub fn question_list(&self) -> impl Iterator<Item = &Question> + '_ {
        self.question_list.iter().map(|&i| &self.bank[i])
    }

    /// Position of the current question in the active list.
    pub fn current_position(&self) -> Option<usize> {
        match self.state {
            SessionState::InProgress { current } | SessionState::Feedback { current, .. } => {
                Some(current)
            }
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        let position = self.current_position()?;
        self.bank.get(*self.question_list.get(position)?)
    }

    /// The current question, for the presentation layer to update.
    pub fn current_question_mut(&mut self) -> Option<&mut Question> {
        let position = self.current_position()?;
        let org_index = *self.question_list.get(position)?;
        self.bank.get_mut(org_index)
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// The latest score: the computed one after completion, the recorded
    /// one after a bypass, otherwise 0.
    pub fn score(&self) -> u8 {
        match (&self.result, &self.state) {
            (Some(result), _) => result.score,
            (None, SessionState::Bypassed { previous_score, .. }) => previous_score.unwrap_or(0),
            _ => 0,
        }
    }

    pub fn passed(&self) -> bool {
        match (&self.result, &self.state) {
            (Some(result), _) => result.passed,
            (None, SessionState::Bypassed { previous_score, .. }) => {
                self.prior.passed()
                    || previous_score.is_some_and(|s| is_passing(s, self.config.passing_score))
            }
            _ => false,
        }
    }

    pub fn total_incorrect(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.total_incorrect)
    }

    pub fn inc_number_list(&self) -> &[u32] {
        self.result
            .as_ref()
            .map_or(&[][..], |r| r.inc_number_list.as_slice())
    }

    /// Set up a session: reset every question and choose the question list.
    ///
    /// Allowed before the first start and after a session ended. May bypass
    /// the assessment outright; an interaction starts immediately.
    pub fn initialize<R: Rng + ?Sized>(
        &mut self,
        prior: PriorAttempt,
        persisted_incorrect: &[String],
        rng: &mut R,
        observer: &mut dyn SessionObserver,
    ) -> Result<(), SessionError> {
        if matches!(
            self.state,
            SessionState::InProgress { .. } | SessionState::Feedback { .. }
        ) {
            return Err(self.invalid("initialize"));
        }

        self.bank.reset_all();
        self.result = None;
        self.sim_mode = SimMode::default();
        self.prior = prior;

        match select_questions(
            &mut self.bank,
            &self.config,
            &self.prior,
            persisted_incorrect,
            rng,
        ) {
            Selection::Bypass {
                reason,
                previous_score,
            } => {
                self.question_list.clear();
                self.list_source = ListSource::AllQuestions;
                self.ques_total = 0;
                self.real_ques_total = effective_total(self.bank.len(), &self.config);
                self.correct_questions_remaining = 0;
                self.state = SessionState::Bypassed {
                    reason,
                    previous_score,
                };
                observer.on_bypassed(reason, previous_score);
                Ok(())
            }
            Selection::Active(list) => {
                self.question_list = list.order;
                self.list_source = list.source;
                self.ques_total = list.ques_total;
                self.real_ques_total = list.real_ques_total;
                self.correct_questions_remaining = list.correct_questions_remaining;
                self.state = SessionState::NotStarted;
                if self.interaction {
                    self.start(observer)?;
                }
                Ok(())
            }
        }
    }

    /// Present the first question.
    pub fn start(&mut self, observer: &mut dyn SessionObserver) -> Result<(), SessionError> {
        if self.state != SessionState::NotStarted {
            return Err(self.invalid("start"));
        }
        if self.ques_total == 0 {
            return Err(SessionError::NoQuestions);
        }
        self.state = SessionState::InProgress { current: 0 };
        self.present(0, observer);
        Ok(())
    }

    /// Record the learner's response to the current question.
    pub fn answer(
        &mut self,
        correct: bool,
        response: impl Into<String>,
    ) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::InProgress { .. }) {
            return Err(self.invalid("answer"));
        }
        let question = self
            .current_question_mut()
            .ok_or(SessionError::NoQuestions)?;
        question.respond(correct, response);
        Ok(())
    }

    /// Submit the current question.
    ///
    /// Fails with [`SessionError::NotAnswered`] without changing anything if
    /// the question has no response yet.
    pub fn submit_answer(
        &mut self,
        observer: &mut dyn SessionObserver,
    ) -> Result<Step, SessionError> {
        let SessionState::InProgress { current } = self.state else {
            return Err(self.invalid("submit"));
        };
        let feedback_enabled = self.config.feedback_enabled;
        let retry_allowed = self.interaction || !self.config.is_post_assessment;
        let completed = current + 1 >= self.ques_total;

        let question = self
            .current_question_mut()
            .ok_or(SessionError::NoQuestions)?;
        if !question.answered {
            return Err(SessionError::NotAnswered);
        }

        question.interaction_result = Some(if question.skipped {
            InteractionOutcome::Skipped
        } else if question.correct {
            InteractionOutcome::Correct
        } else {
            InteractionOutcome::Incorrect
        });
        if !question.correct {
            question.attempts += 1;
        }

        tracing::debug!(
            position = current + 1,
            index = question.index(),
            correct = question.correct,
            response = ?question.student_response,
            "submitted answer"
        );

        if !feedback_enabled {
            return Ok(self.advance(current, completed, observer));
        }

        let correct = question.correct;
        let feedback = FeedbackEvent {
            position: current,
            ques_no: question.ques_no(),
            correct,
            skipped: question.skipped,
            attempts: question.attempts,
            completed,
            retry_permitted: !correct && retry_allowed,
            message: if correct {
                question.spec().feedback.correct.clone()
            } else {
                question
                    .spec()
                    .feedback
                    .incorrect_for(question.attempts)
                    .to_string()
            },
        };
        self.state = SessionState::Feedback {
            current,
            correct,
            completed,
        };
        observer.on_feedback(&feedback);
        Ok(Step::Feedback(feedback))
    }

    /// Continue past the feedback that is showing.
    pub fn acknowledge(
        &mut self,
        observer: &mut dyn SessionObserver,
    ) -> Result<Step, SessionError> {
        let SessionState::Feedback {
            current, completed, ..
        } = self.state
        else {
            return Err(self.invalid("acknowledge"));
        };
        Ok(self.advance(current, completed, observer))
    }

    /// Clear an incorrect answer and present the same question again.
    ///
    /// Only offered outside multi-question post-assessments. The question's
    /// `attempts` counter is kept.
    pub fn retry(&mut self, observer: &mut dyn SessionObserver) -> Result<(), SessionError> {
        let SessionState::Feedback {
            current, correct, ..
        } = self.state
        else {
            return Err(self.invalid("retry"));
        };
        if correct || !(self.interaction || !self.config.is_post_assessment) {
            return Err(SessionError::RetryNotPermitted);
        }
        if let Some(question) = self.current_question_mut() {
            question.reset();
        }
        self.sim_mode = SimMode::default();
        self.state = SessionState::InProgress { current };
        self.present(current, observer);
        Ok(())
    }

    /// Give up on the current question; it is scored as incorrect.
    pub fn skip(&mut self, observer: &mut dyn SessionObserver) -> Result<Step, SessionError> {
        if !self.config.skip_enabled {
            return Err(SessionError::SkipDisabled);
        }
        if !matches!(self.state, SessionState::InProgress { .. }) {
            return Err(self.invalid("skip"));
        }
        if let Some(question) = self.current_question_mut() {
            question.answered = true;
            question.correct = false;
            question.skipped = true;
        }
        self.submit_answer(observer)
    }

    /// Progress reported by a simulation on the current question.
    pub fn set_sim_mode(&mut self, mode: SimMode) {
        self.sim_mode = mode;
    }

    /// Submit on behalf of the presentation layer.
    ///
    /// In an interaction, a simulation only submits once it reports
    /// [`SimMode::Complete`]; until then this returns `Ok(None)`.
    pub fn auto_advance(
        &mut self,
        observer: &mut dyn SessionObserver,
    ) -> Result<Option<Step>, SessionError> {
        let waiting_on_sim = self.interaction
            && self
                .current_question()
                .is_some_and(|q| q.kind() == QuestionKind::Simulation)
            && self.sim_mode != SimMode::Complete;
        if waiting_on_sim {
            tracing::trace!(mode = ?self.sim_mode, "simulation still running");
            return Ok(None);
        }
        self.submit_answer(observer).map(Some)
    }

    fn advance(
        &mut self,
        current: usize,
        completed: bool,
        observer: &mut dyn SessionObserver,
    ) -> Step {
        if completed {
            self.finish(observer);
            return Step::Finished;
        }
        let next = current + 1;
        self.sim_mode = SimMode::default();
        self.state = SessionState::InProgress { current: next };
        self.present(next, observer);
        Step::Next { position: next }
    }

    fn finish(&mut self, observer: &mut dyn SessionObserver) {
        let summary = score_questions(
            self.question_list(),
            self.ques_total,
            self.correct_questions_remaining,
        );
        let passed = is_passing(summary.score, self.config.passing_score);
        let incorrect = IncorrectSet::from_questions(self.question_list().take(self.ques_total));

        let writeback = self.config.is_post_assessment.then(|| {
            let current = RecordValues {
                completion_status: Some(if passed {
                    CompletionStatus::Completed
                } else {
                    CompletionStatus::Incomplete
                }),
                success_status: Some(if passed {
                    SuccessStatus::Passed
                } else {
                    SuccessStatus::Failed
                }),
                score: Some(summary.score),
            };
            Writeback {
                record: current,
                overwrite: self.overwrite,
                incorrect: IncorrectSetAction::for_attempt(&self.config, passed, &incorrect),
                suspend: SuspendData {
                    assessment_completed: true,
                    passed,
                },
            }
        });

        tracing::info!(
            score = summary.score,
            passed,
            total_incorrect = summary.total_incorrect,
            "assessment finished"
        );

        let result = AssessmentResult {
            score: summary.score,
            passed,
            total_incorrect: summary.total_incorrect,
            inc_number_list: summary.inc_number_list,
            ques_total: self.ques_total,
            real_ques_total: self.real_ques_total,
            correct_questions_remaining: self.correct_questions_remaining,
            incorrect,
            writeback,
        };
        self.state = SessionState::Completed;
        observer.on_finished(&result);
        self.result = Some(result);
    }

    fn present(&self, position: usize, observer: &mut dyn SessionObserver) {
        if let Some(question) = self
            .question_list
            .get(position)
            .and_then(|&i| self.bank.get(i))
        {
            observer.on_question(position, self.ques_total, question);
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}
