//! The `quizgate play` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use quizgate_core::engine::AssessmentEngine;
use quizgate_core::model::{Question, QuestionKind, SimMode};
use quizgate_core::parser;
use quizgate_core::pool::BypassReason;
use quizgate_core::report::{AssessmentSummary, AttemptReport};
use quizgate_core::session::{
    Assessment, AssessmentResult, FeedbackEvent, SessionObserver, SessionState, Step,
};
use quizgate_host::{load_config_from, FileHost};

/// Console session observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_question(&mut self, position: usize, total: usize, question: &Question) {
        eprintln!(
            "  [{}/{}] {} (question {})",
            position + 1,
            total,
            question.spec().name,
            question.ques_no()
        );
    }

    fn on_feedback(&mut self, feedback: &FeedbackEvent) {
        let verdict = match (feedback.correct, feedback.skipped) {
            (true, _) => "correct",
            (false, true) => "skipped",
            (false, false) => "incorrect",
        };
        if feedback.message.is_empty() {
            eprintln!("        {verdict}");
        } else {
            eprintln!("        {verdict}: {}", feedback.message);
        }
    }

    fn on_bypassed(&mut self, reason: BypassReason, previous_score: Option<u8>) {
        eprintln!("  Bypassed ({reason:?}), recorded score {previous_score:?}");
    }

    fn on_finished(&mut self, result: &AssessmentResult) {
        eprintln!(
            "\nFinished: {}% ({})",
            result.score,
            if result.passed { "passed" } else { "failed" }
        );
    }
}

pub async fn execute(
    bank_path: PathBuf,
    answers: String,
    record_path: Option<PathBuf>,
    seed: Option<u64>,
    report_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let definition = parser::parse_bank(&bank_path)?;
    let assessment_config =
        definition.assessment_config(config.default_passing_score, config.enable_skip);

    let mut assessment = Assessment::new(definition.bank(), assessment_config)
        .with_context(|| format!("invalid assessment settings in {}", bank_path.display()))?
        .with_overwrite_policy(config.overwrite);

    let record_path = record_path.unwrap_or_else(|| config.record_path.clone());
    let host = Arc::new(FileHost::open(&record_path).await?);
    let engine = AssessmentEngine::new(host.clone(), host.clone(), config.engine_config());

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut observer = ConsoleObserver;
    let start = Instant::now();

    eprintln!(
        "quizgate v{} — {} ({} questions)",
        env!("CARGO_PKG_VERSION"),
        definition.name,
        definition.questions.len()
    );

    engine.begin(&mut assessment, &mut rng, &mut observer).await?;

    if let SessionState::Bypassed {
        reason,
        previous_score,
    } = assessment.state()
    {
        let score = previous_score.map_or_else(|| "none".to_string(), |s| format!("{s}%"));
        let why = match reason {
            BypassReason::RetakeNotAllowed => "retake not allowed",
            BypassReason::AlreadyPassed => "already passed",
        };
        println!("Assessment bypassed ({why}); recorded score: {score}");
        return Ok(());
    }

    if assessment.state() == &SessionState::NotStarted {
        assessment.start(&mut observer)?;
    }

    let mut answers = answers.split(',').map(str::trim);
    let mut answered = 0usize;
    while matches!(assessment.state(), SessionState::InProgress { .. }) {
        let Some(answer) = answers.next().filter(|a| !a.is_empty()) else {
            anyhow::bail!(
                "ran out of answers after {answered} of {} questions",
                assessment.ques_total()
            );
        };
        answered += 1;

        let step = if answer == "-" {
            assessment.skip(&mut observer)?
        } else {
            let question = assessment
                .current_question()
                .context("no current question")?;
            let correct = question
                .matches_response(answer)
                .unwrap_or_else(|| answer.eq_ignore_ascii_case("pass"));
            let simulation = question.kind() == QuestionKind::Simulation;

            assessment.answer(correct, answer)?;
            if simulation {
                assessment.set_sim_mode(SimMode::Complete);
                assessment
                    .auto_advance(&mut observer)?
                    .context("simulation did not advance")?
            } else {
                assessment.submit_answer(&mut observer)?
            }
        };

        if let Step::Feedback(_) = step {
            assessment.acknowledge(&mut observer)?;
        }
    }

    let result = assessment
        .result()
        .context("assessment did not finish")?
        .clone();

    let mut report = AttemptReport::new(
        AssessmentSummary {
            id: definition.id.clone(),
            name: definition.name.clone(),
            question_count: definition.questions.len(),
            is_post_assessment: assessment.config().is_post_assessment,
        },
        assessment.list_source(),
        &result,
        start.elapsed().as_millis() as u64,
    );

    let outcome = engine.commit(&result).await;
    if let Err(e) = &outcome {
        tracing::warn!(score = result.score, error = %e, "result not committed");
    }
    match &outcome {
        Ok(committed) => report.committed = committed.clone(),
        Err(e) => report.commit_error = Some(e.to_string()),
    }

    print_summary(&report, &record_path);

    if let Some(path) = report_path {
        report.save_json(&path)?;
        eprintln!("Report saved to: {}", path.display());
    }

    outcome?;
    Ok(())
}

fn print_summary(report: &AttemptReport, record_path: &std::path::Path) {
    use comfy_table::{Cell, Table};

    let results = &report.results;
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Score"), Cell::new(format!("{}%", results.score))]);
    table.add_row(vec![
        Cell::new("Result"),
        Cell::new(if results.passed { "passed" } else { "failed" }),
    ]);
    table.add_row(vec![
        Cell::new("Questions presented"),
        Cell::new(report.ques_total),
    ]);
    table.add_row(vec![
        Cell::new("Questions in assessment"),
        Cell::new(results.total_to_include),
    ]);
    table.add_row(vec![
        Cell::new("Incorrect questions"),
        Cell::new(if results.inc_number_list.is_empty() {
            "-".to_string()
        } else {
            results.inc_number_list.clone()
        }),
    ]);

    let host = match (&report.committed, &report.commit_error) {
        (Some(values), _) => format!(
            "{} / {} / {}",
            values
                .completion_status
                .as_ref()
                .map_or("-", |s| s.as_str()),
            values.success_status.as_ref().map_or("-", |s| s.as_str()),
            values.score.map_or_else(|| "-".to_string(), |s| s.to_string())
        ),
        (None, Some(error)) => format!("commit failed: {error}"),
        (None, None) => "not written (practice assessment)".to_string(),
    };
    table.add_row(vec![Cell::new("Host record"), Cell::new(host)]);

    println!("{table}");
    if report.committed.is_some() {
        println!("Record: {}", record_path.display());
    }
}
