//! The `quizgate decode` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizgate_core::codec::IncorrectSet;
use quizgate_core::parser;
use quizgate_core::pool::effective_total;

pub fn execute(bank_path: PathBuf, encoded: String) -> Result<()> {
    let definition = parser::parse_bank(&bank_path)?;
    let bank = definition.bank();
    let total = effective_total(bank.len(), &definition.config);

    let set = IncorrectSet::decode(&encoded)
        .with_context(|| format!("cannot decode incorrect set {encoded:?}"))?;
    let order = set
        .resolve(&bank, total)
        .with_context(|| format!("incorrect set does not fit {}", definition.name))?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Index", "Original index", "Question", "Name"]);
    for ((position, entry), &org_index) in set.entries().iter().enumerate().zip(&order) {
        let question = &bank[org_index];
        table.add_row(vec![
            Cell::new(position + 1),
            Cell::new(entry.index),
            Cell::new(org_index),
            Cell::new(question.id()),
            Cell::new(&question.spec().name),
        ]);
    }

    println!("{table}");
    println!(
        "{} question(s) to retake, {} counted as correct.",
        order.len(),
        total - order.len()
    );

    Ok(())
}
