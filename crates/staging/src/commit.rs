//! Turning a partition into one bulk ledger call.
//!
//! Commit is split in two so the in-flight window is visible to the caller:
//! [`ImportSession::begin_commit`] validates and snapshots the partition into
//! a [`CommitTicket`], and [`ImportSession::finish_commit`] applies the
//! backend's answer. Whatever happens to the rows in between, the payload that
//! was sent is the snapshot.
//!
//! [`ImportSession::begin_commit`]: crate::ImportSession::begin_commit
//! [`ImportSession::finish_commit`]: crate::ImportSession::finish_commit

use std::{collections::HashMap, fmt};

use api_types::csv_import::ImportTransaction;
use uuid::Uuid;

use crate::{
    batch::Partition,
    candidate::{Candidate, RowId},
};

/// Why a row blocks the commit of its partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowIssue {
    pub row_id: RowId,
    pub reason: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row_id, self.reason)
    }
}

/// Body and idempotency key of one bulk-commit call.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitRequest {
    /// Same value on every retry of the same partition of the same batch.
    pub idempotency_key: String,
    pub transactions: Vec<ImportTransaction>,
}

/// An in-flight commit of one partition.
#[derive(Debug)]
pub struct CommitTicket {
    pub(crate) partition: Partition,
    pub(crate) generation: u64,
    pub(crate) rows: Vec<RowId>,
    pub(crate) request: CommitRequest,
}

impl CommitTicket {
    pub fn partition(&self) -> Partition {
        self.partition
    }

    pub fn request(&self) -> &CommitRequest {
        &self.request
    }

    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }
}

/// Converts staged rows into ledger payloads, or lists every row that cannot
/// be sent yet.
pub(crate) fn payload_for(
    candidates: &[Candidate],
) -> Result<Vec<ImportTransaction>, Vec<RowIssue>> {
    let mut payload = Vec::with_capacity(candidates.len());
    let mut issues = Vec::new();

    for candidate in candidates {
        match to_import(candidate) {
            Ok(transaction) => payload.push(transaction),
            Err(reason) => issues.push(RowIssue {
                row_id: candidate.row_id,
                reason,
            }),
        }
    }

    if issues.is_empty() {
        Ok(payload)
    } else {
        Err(issues)
    }
}

fn to_import(candidate: &Candidate) -> Result<ImportTransaction, String> {
    let amount = match candidate.amount.amount() {
        Some(amount) => amount,
        None => {
            let reason = candidate.amount.issue().unwrap_or("invalid amount");
            return Err(reason.to_string());
        }
    };
    let account_id = candidate
        .account_id
        .ok_or_else(|| "no account selected".to_string())?;

    Ok(ImportTransaction {
        account_id,
        amount: amount.to_major(),
        transaction_type: candidate.transaction_type,
        category: candidate.category.clone(),
        transaction_date: candidate.transaction_date,
        description: Some(candidate.description.clone()),
        merchant: candidate.merchant.clone(),
        trip_id: candidate.trip_id,
    })
}

/// In-flight flags and idempotency keys of one batch generation.
#[derive(Debug, Default)]
pub(crate) struct CommitGate {
    in_flight: HashMap<Partition, bool>,
    keys: HashMap<Partition, String>,
}

impl CommitGate {
    pub(crate) fn is_in_flight(&self, partition: Partition) -> bool {
        self.in_flight.get(&partition).copied().unwrap_or(false)
    }

    pub(crate) fn set_in_flight(&mut self, partition: Partition, in_flight: bool) {
        self.in_flight.insert(partition, in_flight);
    }

    pub(crate) fn key(&mut self, partition: Partition) -> String {
        self.keys
            .entry(partition)
            .or_insert_with(|| Uuid::new_v4().to_string())
            .clone()
    }

    /// Forgets the key once the partition is committed.
    pub(crate) fn retire(&mut self, partition: Partition) {
        self.keys.remove(&partition);
    }
}
