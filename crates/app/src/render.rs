//! Plain-text views of a staged batch.

use staging::{Batch, Candidate, Directory, ErrorReport, Partition, newest_first, summary};

fn row(directory: &Directory, candidate: &Candidate) -> String {
    let mut amount = candidate.amount.to_string();
    if let Some(issue) = candidate.amount.issue() {
        amount.push_str(&format!(" [{issue}]"));
    }
    let target = match candidate.transfer_to_account_id {
        Some(id) => format!(" -> {}", directory.account_label(Some(id))),
        None => String::new(),
    };

    format!(
        "{:>5}  {}  {:<8} {:>12} {:<3}  {}{}  | {} | {} | {} | {}%",
        candidate.row_id,
        candidate.transaction_date,
        candidate.transaction_type.as_str(),
        amount,
        candidate.currency,
        candidate.label(),
        target,
        directory.account_label(candidate.account_id),
        candidate.category.as_deref().unwrap_or("-"),
        directory.trip_label(candidate.trip_id),
        candidate.confidence_percent(),
    )
}

pub fn table(directory: &Directory, batch: &Batch, partition: Partition) -> String {
    let candidates = batch.partition(partition);
    let mut out = format!("{} ({})\n", heading(partition), candidates.len());
    for candidate in newest_first(candidates) {
        out.push_str(&row(directory, candidate));
        out.push('\n');
    }
    out
}

fn heading(partition: Partition) -> &'static str {
    match partition {
        Partition::Confident => "Ready to import",
        Partition::Uncertain => "Needs review",
    }
}

pub fn errors(report: &ErrorReport) -> String {
    if report.is_empty() {
        return String::new();
    }
    let mut out = format!("{}\n{}\n", report.title(), report.notice());
    for message in report.messages() {
        out.push_str(&format!("  {message}\n"));
    }
    out
}

pub fn batch(directory: &Directory, batch: &Batch) -> String {
    let report = ErrorReport::new(batch.errors());
    let mut out = summary(batch);
    out.push('\n');
    if !report.is_empty() {
        out.push_str(&format!("Warning: {}\n", report.warning()));
    }
    for partition in Partition::ALL {
        out.push('\n');
        out.push_str(&table(directory, batch, partition));
    }
    if !report.is_empty() {
        out.push('\n');
        out.push_str(&errors(&report));
    }
    out
}
