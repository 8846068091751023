//! Read-only views over a batch: parse errors, summary line, table order.

use crate::{batch::Batch, candidate::Candidate};

/// Rows the parser could not turn into candidates.
///
/// These are never linked to a candidate; the only fix is to correct the file
/// and upload it again.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorReport {
    errors: Vec<String>,
}

impl ErrorReport {
    pub fn new(errors: &[String]) -> Self {
        Self {
            errors: errors.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn messages(&self) -> &[String] {
        &self.errors
    }

    pub fn title(&self) -> String {
        format!("Parsing Errors ({})", self.errors.len())
    }

    /// Short warning shown above the tables.
    pub fn warning(&self) -> String {
        format!("{} row(s) failed to parse", self.errors.len())
    }

    pub fn notice(&self) -> &'static str {
        "These rows could not be parsed. They will not be imported. You may need to add them manually."
    }
}

pub fn summary(batch: &Batch) -> String {
    let mut line = format!(
        "Format detected: {} | Found {} confident transactions and {} needing review",
        batch.format_detected(),
        batch.confident().len(),
        batch.uncertain().len()
    );
    if !batch.errors().is_empty() {
        line.push_str(&format!(" | {} parsing errors", batch.errors().len()));
    }
    line
}

/// Display order of a table: newest first, ties in staging order.
pub fn newest_first(candidates: &[Candidate]) -> Vec<&Candidate> {
    let mut rows: Vec<&Candidate> = candidates.iter().collect();
    rows.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
    rows
}
