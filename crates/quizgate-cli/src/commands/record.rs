//! The `quizgate record` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizgate_host::{load_config_from, StoredRecord};

pub async fn execute(record_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let record_path = match record_path {
        Some(path) => path,
        None => load_config_from(config_path.as_deref())?.record_path,
    };

    if !record_path.exists() {
        println!("No record at {}", record_path.display());
        return Ok(());
    }

    let stored = StoredRecord::load(&record_path).await?;
    let record = &stored.record;

    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);
    table.add_row(vec![
        Cell::new("Completion status"),
        Cell::new(record.completion_status.as_ref().map_or("-", |s| s.as_str())),
    ]);
    table.add_row(vec![
        Cell::new("Success status"),
        Cell::new(record.success_status.as_ref().map_or("-", |s| s.as_str())),
    ]);
    table.add_row(vec![
        Cell::new("Score"),
        Cell::new(record.score.map_or_else(|| "-".to_string(), |s| s.to_string())),
    ]);
    table.add_row(vec![
        Cell::new("Previously completed"),
        Cell::new(stored.suspend.assessment_completed),
    ]);
    table.add_row(vec![
        Cell::new("Incorrect set"),
        Cell::new(if stored.inc_question_list.is_empty() {
            "-"
        } else {
            stored.inc_question_list.as_str()
        }),
    ]);
    table.add_row(vec![
        Cell::new("Updated"),
        Cell::new(
            stored
                .updated_at
                .map_or_else(|| "-".to_string(), |t| t.to_rfc3339()),
        ),
    ]);

    println!("Record: {}", record_path.display());
    println!("{table}");
    Ok(())
}
