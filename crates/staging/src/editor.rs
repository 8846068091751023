//! Per-row corrections.
//!
//! Every edit produces a new candidate that replaces the old one at the same
//! position. Two couplings are applied inside the same edit:
//!
//! - leaving `transfer` clears the transfer target;
//! - editing the merchant rewrites the description with the same text.
//!
//! Nothing here is validated beyond keeping bad amounts visible on the row;
//! the commit step decides what can be sent.

use api_types::csv_import::TransactionType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    batch::{Batch, Partition},
    candidate::{AmountEntry, Candidate, RowId},
};

/// A single-field correction, as emitted by the review table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    TransactionType(TransactionType),
    Account(Option<i64>),
    TransferTo(Option<i64>),
    /// Raw text from the amount input.
    Amount(String),
    Date(NaiveDate),
    Time(Option<String>),
    Merchant(String),
    Description(String),
    Category(Option<String>),
    Trip(Option<i64>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    Applied(Partition),
    /// The row is not staged (never was, or already deleted/committed).
    Ignored,
}

impl FieldEdit {
    fn apply(self, current: &Candidate) -> Candidate {
        let mut next = current.clone();
        match self {
            Self::TransactionType(kind) => {
                next.transaction_type = kind;
                if kind != TransactionType::Transfer {
                    next.transfer_to_account_id = None;
                }
            }
            Self::Account(account_id) => next.account_id = account_id,
            Self::TransferTo(account_id) => next.transfer_to_account_id = account_id,
            Self::Amount(input) => next.amount = AmountEntry::parse(&input),
            Self::Date(date) => next.transaction_date = date,
            Self::Time(time) => next.transaction_time = non_empty(time),
            Self::Merchant(merchant) => {
                next.description = merchant.clone();
                next.merchant = non_empty(Some(merchant));
            }
            Self::Description(description) => next.description = description,
            Self::Category(category) => next.category = non_empty(category),
            Self::Trip(trip_id) => next.trip_id = trip_id,
        }
        next
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn update_field(batch: &mut Batch, row_id: RowId, edit: FieldEdit) -> EditOutcome {
    let Some((partition, index)) = batch.locate(row_id) else {
        tracing::debug!("ignoring edit for unknown row {row_id}");
        return EditOutcome::Ignored;
    };

    let list = batch.partition_mut(partition);
    let updated = edit.apply(&list[index]);
    list[index] = updated;
    EditOutcome::Applied(partition)
}
