//! A staged transaction and its provenance.

use std::fmt;

use api_types::csv_import::{ParsedTransaction, TransactionType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// Stable row identifier, unique across both partitions of a batch.
///
/// Matches the source file's row number whenever the parser supplied a usable
/// one, so messages can point the user at the original CSV line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(u32);

impl RowId {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Amount as last entered on the row.
///
/// Invalid input is kept verbatim together with the reason, and blocks the
/// commit of its partition until corrected.
#[derive(Clone, Debug, PartialEq)]
pub enum AmountEntry {
    Valid(Amount),
    Invalid { input: String, reason: String },
}

impl AmountEntry {
    pub fn parse(input: &str) -> Self {
        match input.parse::<Amount>() {
            Ok(amount) => Self::Valid(amount),
            Err(err) => Self::Invalid {
                input: input.to_string(),
                reason: err.to_string(),
            },
        }
    }

    pub fn amount(&self) -> Option<Amount> {
        match self {
            Self::Valid(amount) => Some(*amount),
            Self::Invalid { .. } => None,
        }
    }

    /// Validation message shown next to the amount, if any.
    pub fn issue(&self) -> Option<&str> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid { reason, .. } => Some(reason),
        }
    }
}

impl fmt::Display for AmountEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(amount) => write!(f, "{amount}"),
            Self::Invalid { input, .. } => f.write_str(input),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub row_id: RowId,
    pub transaction_type: TransactionType,
    pub account_id: Option<i64>,
    /// Informational; placement is decided by `confidence` alone.
    pub account_confidence: f64,
    pub amount: AmountEntry,
    pub currency: String,
    pub transaction_date: NaiveDate,
    pub transaction_time: Option<String>,
    pub description: String,
    pub merchant: Option<String>,
    pub category: Option<String>,
    /// Only meaningful for expense rows.
    pub trip_id: Option<i64>,
    pub trip_name: Option<String>,
    /// Only meaningful for transfer rows.
    pub transfer_to_account_id: Option<i64>,
    pub confidence: f64,
    pub raw_data: serde_json::Value,
}

impl Candidate {
    pub(crate) fn from_parsed(row_id: RowId, parsed: ParsedTransaction) -> Self {
        let amount = match Amount::from_major(parsed.amount) {
            Some(amount) => AmountEntry::Valid(amount),
            None => AmountEntry::Invalid {
                input: parsed.amount.to_string(),
                reason: "amount out of range".to_string(),
            },
        };

        Self {
            row_id,
            transaction_type: parsed.transaction_type,
            account_id: parsed.account_id,
            account_confidence: parsed.account_confidence,
            amount,
            currency: parsed.currency,
            transaction_date: parsed.transaction_date,
            transaction_time: parsed.transaction_time,
            description: parsed.description,
            merchant: parsed.merchant,
            category: parsed.category,
            trip_id: parsed.trip_id,
            trip_name: parsed.trip_name,
            transfer_to_account_id: parsed.transfer_to_account_id,
            confidence: parsed.confidence,
            raw_data: parsed.raw_data,
        }
    }

    /// Merchant when known, otherwise the bank description.
    pub fn label(&self) -> &str {
        match self.merchant.as_deref() {
            Some(merchant) if !merchant.is_empty() => merchant,
            _ => &self.description,
        }
    }

    /// Confidence as a whole percentage, as shown in the review table.
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}


#[cfg(test)]
mod tests {
    use super::{fixtures::parsed, *};

    #[test]
    fn amount_entry_keeps_bad_input() {
        let entry = AmountEntry::parse("12.5x");
        assert_eq!(entry.amount(), None);
        assert_eq!(entry.issue(), Some("Invalid amount: not a number"));
        assert_eq!(entry.to_string(), "12.5x");
    }

    #[test]
    fn non_finite_parser_amount_is_flagged() {
        let candidate = Candidate::from_parsed(
            RowId::new(2),
            parsed(Some(2), TransactionType::Expense, f64::INFINITY),
        );
        assert!(candidate.amount.issue().is_some());
    }

    #[test]
    fn label_prefers_merchant() {
        let mut candidate =
            Candidate::from_parsed(RowId::new(2), parsed(Some(2), TransactionType::Expense, -3.0));
        assert_eq!(candidate.label(), "CARD PAYMENT");
        candidate.merchant = Some("Tesco".to_string());
        assert_eq!(candidate.label(), "Tesco");
    }

    #[test]
    fn confidence_rounds_to_percent() {
        let mut candidate =
            Candidate::from_parsed(RowId::new(2), parsed(Some(2), TransactionType::Income, 1.0));
        candidate.confidence = 0.404;
        assert_eq!(candidate.confidence_percent(), 40);
        candidate.confidence = 0.656;
        assert_eq!(candidate.confidence_percent(), 66);
    }
}
