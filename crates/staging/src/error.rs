//! Errors raised by the staging pipeline.
//!
//! Row edits never fail: unknown rows are ignored and bad amounts are kept as
//! invalid entries on the row. Errors only come out of the network-bound
//! steps (upload, category creation, commit) and out of the local checks that
//! guard them.
use thiserror::Error;

use crate::{batch::Partition, candidate::RowId, commit::RowIssue};

pub type Result<T> = std::result::Result<T, StagingError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum StagingError {
    #[error("Please select an account first")]
    NoAccountSelected,
    #[error("\"{0}\" is not a CSV file")]
    NotCsv(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Row {0} not found")]
    UnknownRow(RowId),
    #[error("Row {0} is a transfer: categories can only be created for expense or income rows")]
    CategoryNotAllowed(RowId),
    #[error("Row {0} is not composing a new category")]
    NotComposing(RowId),
    #[error("Nothing to import in the {0} partition")]
    EmptyPartition(Partition),
    #[error("An import of the {0} partition is already in progress")]
    CommitInProgress(Partition),
    #[error("{} row(s) need attention before import", .0.len())]
    InvalidRows(Vec<RowIssue>),
    #[error("{0}")]
    Backend(String),
    #[error("Failed to import transactions: {0}")]
    Commit(String),
}
