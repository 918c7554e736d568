//! TOML question bank parser.
//!
//! Loads assessment definitions from TOML files and directories, and
//! validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    AssessmentConfig, FeedbackText, QuestionBank, QuestionKind, QuestionSpec,
};

/// Intermediate TOML structure for parsing bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    assessment: TomlAssessmentHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlAssessmentHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    pool: bool,
    #[serde(default)]
    pool_total: usize,
    #[serde(default)]
    random_questions: bool,
    #[serde(default)]
    is_post_assessment: bool,
    #[serde(default = "default_true")]
    retake_allowed: bool,
    #[serde(default)]
    only_retake_incorrect: bool,
    #[serde(default = "default_true")]
    feedback_enabled: bool,
    #[serde(default)]
    passing_score: Option<u8>,
    #[serde(default)]
    skip_enabled: Option<bool>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    name: String,
    #[serde(default)]
    stem: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    correct_response: Option<String>,
    #[serde(default)]
    correct_feedback: String,
    #[serde(default)]
    incorrect_feedback: String,
    #[serde(default)]
    retry_feedback: Option<String>,
}

/// An assessment as authored: header settings plus its questions.
#[derive(Debug, Clone)]
pub struct AssessmentDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Settings from the header. `passing_score` here is a placeholder when
    /// the header leaves it out; use [`AssessmentDefinition::assessment_config`].
    pub config: AssessmentConfig,
    /// Passing score from the header, if it set one.
    pub passing_score: Option<u8>,
    /// Skip switch from the header, if it set one.
    pub skip_enabled: Option<bool>,
    pub questions: Vec<QuestionSpec>,
}

impl AssessmentDefinition {
    /// The effective configuration, filling unset header values from the
    /// given defaults.
    pub fn assessment_config(&self, default_passing: u8, default_skip: bool) -> AssessmentConfig {
        AssessmentConfig {
            passing_score: self.passing_score.unwrap_or(default_passing),
            skip_enabled: self.skip_enabled.unwrap_or(default_skip),
            ..self.config.clone()
        }
    }

    /// Build a fresh question bank in authoring order.
    pub fn bank(&self) -> QuestionBank {
        self.questions.iter().cloned().collect()
    }
}

/// Parse a single TOML bank file.
pub fn parse_bank(path: &Path) -> Result<AssessmentDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read bank file: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse a TOML string into an [`AssessmentDefinition`].
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<AssessmentDefinition> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(|q| {
            let kind = q
                .kind
                .map(|k| k.parse::<QuestionKind>().map_err(|e| anyhow::anyhow!("{}", e)))
                .transpose()
                .with_context(|| format!("question {}", q.id))?
                .unwrap_or_default();

            Ok(QuestionSpec {
                id: q.id,
                name: q.name,
                stem: q.stem,
                kind,
                correct_response: q.correct_response,
                feedback: FeedbackText {
                    correct: q.correct_feedback,
                    incorrect: q.incorrect_feedback,
                    retry: q.retry_feedback,
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let header = parsed.assessment;
    let config = AssessmentConfig {
        pool: header.pool,
        pool_total: header.pool_total,
        random_questions: header.random_questions,
        is_post_assessment: header.is_post_assessment,
        retake_allowed: header.retake_allowed,
        only_retake_incorrect: header.only_retake_incorrect,
        feedback_enabled: header.feedback_enabled,
        skip_enabled: header.skip_enabled.unwrap_or(false),
        ..AssessmentConfig::default()
    };

    Ok(AssessmentDefinition {
        id: header.id,
        name: header.name,
        description: header.description,
        config,
        passing_score: header.passing_score,
        skip_enabled: header.skip_enabled,
        questions,
    })
}

/// Recursively load all `.toml` bank files from a directory.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<AssessmentDefinition>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// A warning from bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    pub message: String,
}

/// Validate a bank for common authoring issues.
pub fn validate_bank(def: &AssessmentDefinition) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let effective = def.assessment_config(def.config.passing_score, def.config.skip_enabled);
    if let Err(e) = effective.validate() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!("invalid configuration: {e}"),
        });
    }

    if def.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "bank has no questions".into(),
        });
    }

    if def.config.pool && def.config.pool_total > def.questions.len() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "pool_total {} exceeds the {} questions in the bank; all questions will be used",
                def.config.pool_total,
                def.questions.len()
            ),
        });
    }

    let mut seen_ids = std::collections::HashSet::new();
    for q in &def.questions {
        if !seen_ids.insert(&q.id) {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: format!("duplicate question ID: {}", q.id),
            });
        }
    }

    for q in &def.questions {
        if q.stem.trim().is_empty() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "stem is empty".into(),
            });
        }
        if q.kind == QuestionKind::Standard && q.correct_response.is_none() {
            warnings.push(ValidationWarning {
                question_id: Some(q.id.clone()),
                message: "no correct_response; scripted answers cannot be scored".into(),
            });
        }
    }

    warnings
}
