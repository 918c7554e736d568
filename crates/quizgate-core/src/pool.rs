//! Question list selection: pooling, randomization and retake reconstruction.
//!
//! Rules, evaluated in order for a post-assessment that was completed before:
//! 1. retake not allowed: bypass;
//! 2. previous score already passing: bypass;
//! 3. previous score strictly between 0 and 100 with `only_retake_incorrect`:
//!    rebuild from the persisted incorrect set (bypass if already passed,
//!    fall through to the default on a bad set);
//! 4. anything else uses the default.
//!
//! The default draws `pool_total` questions from a shuffled copy of the bank
//! when pooling applies, otherwise takes the whole bank, shuffled only when
//! `random_questions` is set.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::codec::IncorrectSet;
use crate::model::{AssessmentConfig, QuestionBank, RecordValues};
use crate::traits::SuspendData;

/// What is known about earlier attempts when a session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorAttempt {
    /// An earlier attempt ran to the end.
    pub completed: bool,
    /// Host values left by earlier attempts.
    pub record: RecordValues,
}

impl PriorAttempt {
    /// No earlier attempt.
    pub fn fresh() -> Self {
        Self::default()
    }

    pub fn from_host(suspend: &SuspendData, record: RecordValues) -> Self {
        Self {
            completed: suspend.assessment_completed,
            record,
        }
    }

    pub fn score(&self) -> Option<u8> {
        self.record.score
    }

    /// The host success status records a pass.
    pub fn passed(&self) -> bool {
        self.record
            .success_status
            .as_ref()
            .is_some_and(|s| s.is_passed())
    }
}

/// Why presentation was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BypassReason {
    RetakeNotAllowed,
    AlreadyPassed,
}

/// Where an active list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    AllQuestions,
    Pooled,
    RetakeIncorrect,
}

/// The ordered questions for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveList {
    /// Bank positions (`org_index`) in presentation order.
    pub order: Vec<usize>,
    pub ques_total: usize,
    pub real_ques_total: usize,
    pub correct_questions_remaining: usize,
    pub source: ListSource,
}

/// Outcome of question selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Skip presentation and report the previously recorded score.
    Bypass {
        reason: BypassReason,
        previous_score: Option<u8>,
    },
    Active(ActiveList),
}

/// Build the question list for a session.
///
/// `persisted_incorrect` is the incorrect set saved by an earlier attempt, as
/// returned by [`crate::traits::SuspendStore::inc_question_list`]. `index` is
/// rewritten on the bank entries to match the chosen ordering.
pub fn select_questions<R: Rng + ?Sized>(
    bank: &mut QuestionBank,
    config: &AssessmentConfig,
    prior: &PriorAttempt,
    persisted_incorrect: &[String],
    rng: &mut R,
) -> Selection {
    if config.is_post_assessment && prior.completed {
        let previous_score = prior.score();

        if !config.retake_allowed {
            tracing::info!("retake not allowed, bypassing assessment");
            return Selection::Bypass {
                reason: BypassReason::RetakeNotAllowed,
                previous_score,
            };
        }

        if previous_score.is_some_and(|s| s >= config.passing_score) {
            tracing::info!(?previous_score, "already passed, bypassing assessment");
            return Selection::Bypass {
                reason: BypassReason::AlreadyPassed,
                previous_score,
            };
        }

        let partial_score = previous_score.is_some_and(|s| s > 0 && s < 100);
        if partial_score && config.only_retake_incorrect {
            if prior.passed() {
                tracing::info!("retake limited to incorrect questions but already passed, bypassing");
                return Selection::Bypass {
                    reason: BypassReason::AlreadyPassed,
                    previous_score,
                };
            }
            if let Some(list) = retake_incorrect(bank, config, persisted_incorrect) {
                return Selection::Active(list);
            }
        }
    }

    Selection::Active(all_questions(bank, config, rng))
}

/// Number of questions one full attempt consists of.
pub fn effective_total(bank_len: usize, config: &AssessmentConfig) -> usize {
    if config.pool && config.pool_total < bank_len {
        config.pool_total
    } else {
        bank_len
    }
}

fn retake_incorrect(
    bank: &mut QuestionBank,
    config: &AssessmentConfig,
    persisted: &[String],
) -> Option<ActiveList> {
    let real_ques_total = effective_total(bank.len(), config);
    let resolved = IncorrectSet::from_entries(persisted).and_then(|set| {
        let order = set.resolve(&*bank, real_ques_total)?;
        Ok((set, order))
    });

    match resolved {
        Ok((set, order)) => {
            for entry in set.entries() {
                if let Some(q) = bank.get_mut(entry.org_index) {
                    q.index = entry.index;
                }
            }
            let ques_total = order.len();
            tracing::info!(
                real_ques_total,
                incorrect = ques_total,
                remaining_correct = real_ques_total - ques_total,
                "retaking previously incorrect questions"
            );
            Some(ActiveList {
                order,
                ques_total,
                real_ques_total,
                correct_questions_remaining: real_ques_total - ques_total,
                source: ListSource::RetakeIncorrect,
            })
        }
        Err(e) => {
            tracing::warn!("unusable incorrect-question set, using all questions: {e}");
            None
        }
    }
}

fn all_questions<R: Rng + ?Sized>(
    bank: &mut QuestionBank,
    config: &AssessmentConfig,
    rng: &mut R,
) -> ActiveList {
    let bank_len = bank.len();
    let mut order: Vec<usize> = (0..bank_len).collect();

    if config.pool && config.pool_total < bank_len {
        order.shuffle(rng);
        bank.assign_positions(&order);
        order.truncate(config.pool_total);
        tracing::info!(
            pool_total = config.pool_total,
            bank = bank_len,
            "drew question pool"
        );
        for (position, org_index) in order.iter().enumerate() {
            tracing::debug!(
                "pooled question {} (original index {org_index})",
                position + 1
            );
        }
        return ActiveList {
            order,
            ques_total: config.pool_total,
            real_ques_total: config.pool_total,
            correct_questions_remaining: 0,
            source: ListSource::Pooled,
        };
    }

    if config.random_questions {
        order.shuffle(rng);
    }
    bank.assign_positions(&order);

    ActiveList {
        order,
        ques_total: bank_len,
        real_ques_total: bank_len,
        correct_questions_remaining: 0,
        source: ListSource::AllQuestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionSpec, SuccessStatus};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn bank(n: usize) -> QuestionBank {
        (0..n)
            .map(|i| QuestionSpec {
                id: format!("q{i}"),
                name: format!("Q{i}"),
                stem: String::new(),
                kind: Default::default(),
                correct_response: None,
                feedback: Default::default(),
            })
            .collect()
    }

    fn post_config() -> AssessmentConfig {
        AssessmentConfig {
            is_post_assessment: true,
            passing_score: 70,
            ..Default::default()
        }
    }

    fn completed_with(score: u8, success: SuccessStatus) -> PriorAttempt {
        PriorAttempt {
            completed: true,
            record: RecordValues {
                completion_status: None,
                success_status: Some(success),
                score: Some(score),
            },
        }
    }

    fn active(selection: Selection) -> ActiveList {
        match selection {
            Selection::Active(list) => list,
            other => panic!("expected an active list, got {other:?}"),
        }
    }

    #[test]
    fn default_keeps_bank_order() {
        let mut bank = bank(5);
        let mut rng = StdRng::seed_from_u64(7);
        let list = active(select_questions(
            &mut bank,
            &AssessmentConfig::default(),
            &PriorAttempt::fresh(),
            &[],
            &mut rng,
        ));
        assert_eq!(list.order, vec![0, 1, 2, 3, 4]);
        assert_eq!(list.ques_total, 5);
        assert_eq!(list.real_ques_total, 5);
        assert_eq!(list.correct_questions_remaining, 0);
        assert_eq!(list.source, ListSource::AllQuestions);
    }

    #[test]
    fn pooling_draws_unique_questions() {
        for (n, p) in [(10, 3), (10, 9), (4, 1), (25, 10)] {
            let mut bank = bank(n);
            let mut rng = StdRng::seed_from_u64(n as u64 * 31 + p as u64);
            let config = AssessmentConfig {
                pool: true,
                pool_total: p,
                ..Default::default()
            };
            let list = active(select_questions(
                &mut bank,
                &config,
                &PriorAttempt::fresh(),
                &[],
                &mut rng,
            ));
            assert_eq!(list.order.len(), p);
            assert_eq!(list.ques_total, p);
            assert_eq!(list.real_ques_total, p);
            let unique: HashSet<_> = list.order.iter().collect();
            assert_eq!(unique.len(), p);
            assert!(list.order.iter().all(|&i| i < n));
            for (position, &org_index) in list.order.iter().enumerate() {
                assert_eq!(bank[org_index].index(), position);
            }
        }
    }

    #[test]
    fn pool_not_smaller_than_bank_uses_everything() {
        for pool_total in [4, 9] {
            let mut bank = bank(4);
            let mut rng = StdRng::seed_from_u64(1);
            let config = AssessmentConfig {
                pool: true,
                pool_total,
                ..Default::default()
            };
            let list = active(select_questions(
                &mut bank,
                &config,
                &PriorAttempt::fresh(),
                &[],
                &mut rng,
            ));
            assert_eq!(list.order, vec![0, 1, 2, 3]);
            assert_eq!(list.ques_total, 4);
            assert_eq!(list.real_ques_total, 4);
            assert_eq!(list.source, ListSource::AllQuestions);
            assert_eq!(effective_total(4, &config), 4);
        }
    }

    #[test]
    fn pooled_retake_counts_against_pool_size() {
        let mut bank = bank(12);
        let mut rng = StdRng::seed_from_u64(5);
        let config = AssessmentConfig {
            pool: true,
            pool_total: 5,
            only_retake_incorrect: true,
            ..post_config()
        };
        let persisted = vec!["0|11".to_string(), "2|4".to_string()];
        let list = active(select_questions(
            &mut bank,
            &config,
            &completed_with(60, SuccessStatus::Failed),
            &persisted,
            &mut rng,
        ));
        assert_eq!(list.source, ListSource::RetakeIncorrect);
        assert_eq!(list.order, vec![11, 4]);
        assert_eq!(list.real_ques_total, 5);
        assert_eq!(list.correct_questions_remaining, 3);
        assert_eq!(
            list.ques_total + list.correct_questions_remaining,
            list.real_ques_total
        );

        // More entries than one pooled attempt can hold is not a usable set.
        let too_many: Vec<String> = (0..6).map(|i| format!("{i}|{i}")).collect();
        let list = active(select_questions(
            &mut bank,
            &config,
            &completed_with(60, SuccessStatus::Failed),
            &too_many,
            &mut rng,
        ));
        assert_eq!(list.source, ListSource::Pooled);
        assert_eq!(list.ques_total, 5);
        assert_eq!(list.correct_questions_remaining, 0);
    }

    #[test]
    fn randomization_is_a_permutation() {
        let mut bank = bank(20);
        let mut rng = StdRng::seed_from_u64(99);
        let config = AssessmentConfig {
            random_questions: true,
            ..Default::default()
        };
        let list = active(select_questions(
            &mut bank,
            &config,
            &PriorAttempt::fresh(),
            &[],
            &mut rng,
        ));
        let mut sorted = list.order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
        for (position, &org_index) in list.order.iter().enumerate() {
            assert_eq!(bank[org_index].index(), position);
            assert_eq!(bank[org_index].org_index(), org_index);
            assert_eq!(bank[org_index].ques_no(), org_index as u32 + 1);
        }
    }

    #[test]
    fn bypass_when_retake_not_allowed() {
        let mut bank = bank(3);
        let mut rng = StdRng::seed_from_u64(0);
        let config = AssessmentConfig {
            retake_allowed: false,
            ..post_config()
        };
        let selection = select_questions(
            &mut bank,
            &config,
            &completed_with(40, SuccessStatus::Failed),
            &[],
            &mut rng,
        );
        assert_eq!(
            selection,
            Selection::Bypass {
                reason: BypassReason::RetakeNotAllowed,
                previous_score: Some(40),
            }
        );
    }

    #[test]
    fn bypass_when_previous_score_passes() {
        let mut bank = bank(3);
        let mut rng = StdRng::seed_from_u64(0);
        let selection = select_questions(
            &mut bank,
            &post_config(),
            &completed_with(85, SuccessStatus::Passed),
            &[],
            &mut rng,
        );
        assert_eq!(
            selection,
            Selection::Bypass {
                reason: BypassReason::AlreadyPassed,
                previous_score: Some(85),
            }
        );
    }

    #[test]
    fn not_previously_completed_never_bypasses() {
        let mut bank = bank(3);
        let mut rng = StdRng::seed_from_u64(0);
        let prior = PriorAttempt {
            completed: false,
            ..completed_with(85, SuccessStatus::Passed)
        };
        let config = AssessmentConfig {
            retake_allowed: false,
            ..post_config()
        };
        assert!(matches!(
            select_questions(&mut bank, &config, &prior, &[], &mut rng),
            Selection::Active(_)
        ));
    }

    #[test]
    fn retake_rebuilds_from_incorrect_set() {
        let mut bank = bank(10);
        let mut rng = StdRng::seed_from_u64(0);
        let config = AssessmentConfig {
            only_retake_incorrect: true,
            ..post_config()
        };
        let persisted = vec!["3|7".to_string(), "5|2".to_string()];
        let list = active(select_questions(
            &mut bank,
            &config,
            &completed_with(60, SuccessStatus::Failed),
            &persisted,
            &mut rng,
        ));
        assert_eq!(list.order, vec![7, 2]);
        assert_eq!(list.ques_total, 2);
        assert_eq!(list.correct_questions_remaining, 8);
        assert_eq!(list.ques_total + list.correct_questions_remaining, list.real_ques_total);
        assert_eq!(list.source, ListSource::RetakeIncorrect);
        assert_eq!(bank[7].index(), 3);
    }

    #[test]
    fn malformed_incorrect_set_falls_back_to_all_questions() {
        let mut bank = bank(4);
        let mut rng = StdRng::seed_from_u64(0);
        let config = AssessmentConfig {
            only_retake_incorrect: true,
            ..post_config()
        };
        for persisted in [vec![], vec!["garbage".to_string()], vec!["0|40".to_string()]] {
            let list = active(select_questions(
                &mut bank,
                &config,
                &completed_with(50, SuccessStatus::Failed),
                &persisted,
                &mut rng,
            ));
            assert_eq!(list.source, ListSource::AllQuestions);
            assert_eq!(list.ques_total, 4);
            assert_eq!(list.correct_questions_remaining, 0);
        }
    }

    #[test]
    fn boundary_scores_retake_everything() {
        let mut bank = bank(4);
        let mut rng = StdRng::seed_from_u64(0);
        let config = AssessmentConfig {
            only_retake_incorrect: true,
            passing_score: 100,
            ..post_config()
        };
        let persisted = vec!["0|0".to_string()];
        let list = active(select_questions(
            &mut bank,
            &config,
            &completed_with(0, SuccessStatus::Failed),
            &persisted,
            &mut rng,
        ));
        assert_eq!(list.source, ListSource::AllQuestions);
    }

    #[test]
    fn retake_incorrect_bypasses_when_host_says_passed() {
        let mut bank = bank(4);
        let mut rng = StdRng::seed_from_u64(0);
        let config = AssessmentConfig {
            only_retake_incorrect: true,
            passing_score: 90,
            ..post_config()
        };
        let selection = select_questions(
            &mut bank,
            &config,
            &completed_with(75, SuccessStatus::Passed),
            &["0|0".to_string()],
            &mut rng,
        );
        assert!(matches!(
            selection,
            Selection::Bypass {
                reason: BypassReason::AlreadyPassed,
                ..
            }
        ));
    }
}
