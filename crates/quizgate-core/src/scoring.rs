//! Percentage scoring of an active question list.

use serde::{Deserialize, Serialize};

use crate::model::Question;

/// Outcome of one scoring pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Percentage in 0..=100.
    pub score: u8,
    pub total_incorrect: usize,
    /// `quesNo` of each incorrect question, ascending.
    pub inc_number_list: Vec<u32>,
}

/// Score the first `ques_total` questions of the active list.
///
/// Previously-correct questions excluded from a retake
/// (`correct_questions_remaining`) count toward the denominator as correct,
/// so the score reflects the whole original assessment.
pub fn score_questions<'a, I>(
    questions: I,
    ques_total: usize,
    correct_questions_remaining: usize,
) -> ScoreSummary
where
    I: IntoIterator<Item = &'a Question>,
{
    let mut inc_number_list: Vec<u32> = questions
        .into_iter()
        .take(ques_total)
        .filter(|q| !q.correct)
        .map(Question::ques_no)
        .collect();
    inc_number_list.sort_unstable();

    let total_incorrect = inc_number_list.len();
    let denominator = ques_total + correct_questions_remaining;
    let total_correct = denominator.saturating_sub(total_incorrect);
    let score = percentage(total_correct, denominator);

    tracing::debug!(
        ques_total,
        correct_questions_remaining,
        denominator,
        total_incorrect,
        score,
        "scored assessment"
    );

    ScoreSummary {
        score,
        total_incorrect,
        inc_number_list,
    }
}

/// `round(100 * part / whole)` with halves rounded up; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u64;
    let whole = whole as u64;
    ((200 * part + whole) / (2 * whole)) as u8
}

/// Whether a score meets the passing threshold.
pub fn is_passing(score: u8, passing_score: u8) -> bool {
    score >= passing_score
}
