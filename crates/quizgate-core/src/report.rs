//! Attempt reports with JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::RecordValues;
use crate::pool::ListSource;
use crate::session::AssessmentResult;

/// The results sent to the presentation layer when an assessment finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultsPayload {
    pub score: u8,
    pub passed: bool,
    /// Questions one full attempt consists of.
    pub total_to_include: usize,
    pub total_incorrect: usize,
    /// Ascending `quesNo` values of incorrect questions, comma-separated.
    pub inc_number_list: String,
}

impl ResultsPayload {
    pub fn from_result(result: &AssessmentResult) -> Self {
        Self {
            score: result.score,
            passed: result.passed,
            total_to_include: result.real_ques_total,
            total_incorrect: result.total_incorrect,
            inc_number_list: result
                .inc_number_list
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// A record of one completed attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub assessment: AssessmentSummary,
    pub source: ListSource,
    /// Questions presented this attempt.
    pub ques_total: usize,
    pub results: ResultsPayload,
    /// Values written to the host, if the attempt owed a writeback and it
    /// succeeded.
    pub committed: Option<RecordValues>,
    /// Why the writeback failed, if it did.
    pub commit_error: Option<String>,
    /// Wall-clock duration of the attempt in milliseconds.
    pub duration_ms: u64,
}

/// Summary of the assessment (without its questions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub id: String,
    pub name: String,
    pub question_count: usize,
    pub is_post_assessment: bool,
}

impl AttemptReport {
    pub fn new(
        assessment: AssessmentSummary,
        source: ListSource,
        result: &AssessmentResult,
        duration_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            assessment,
            source,
            ques_total: result.ques_total,
            results: ResultsPayload::from_result(result),
            committed: None,
            commit_error: None,
            duration_ms,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        serde_json::from_str(&content).context("failed to parse report JSON")
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.assessment.name));
        md.push_str(&format!(
            "**Score:** {}% ({})\n\n",
            self.results.score,
            if self.results.passed { "passed" } else { "failed" }
        ));

        md.push_str("| Field | Value |\n");
        md.push_str("|-------|-------|\n");
        md.push_str(&format!("| Questions presented | {} |\n", self.ques_total));
        md.push_str(&format!(
            "| Questions in assessment | {} |\n",
            self.results.total_to_include
        ));
        md.push_str(&format!(
            "| Incorrect | {} |\n",
            self.results.total_incorrect
        ));
        if !self.results.inc_number_list.is_empty() {
            md.push_str(&format!(
                "| Incorrect questions | {} |\n",
                self.results.inc_number_list
            ));
        }
        md.push('\n');

        if let Some(record) = &self.committed {
            md.push_str("### Host record\n\n");
            md.push_str(&format!(
                "completion `{}`, success `{}`, score `{}`\n",
                record
                    .completion_status
                    .as_ref()
                    .map_or("-", |s| s.as_str()),
                record.success_status.as_ref().map_or("-", |s| s.as_str()),
                record
                    .score
                    .map_or_else(|| "-".to_string(), |s| s.to_string())
            ));
        }
        if let Some(error) = &self.commit_error {
            md.push_str(&format!("**Commit failed:** {error}\n"));
        }

        md
    }
}
