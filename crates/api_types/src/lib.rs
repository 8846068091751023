use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod account {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Account {
        pub account_id: i64,
        pub account_name: String,
        #[serde(default)]
        pub account_type: String,
        #[serde(default)]
        pub institution: String,
        #[serde(default)]
        pub currency_code: String,
    }
}

pub mod trip {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Trip {
        pub trip_id: i64,
        pub trip_name: String,
        #[serde(default)]
        pub start_date: Option<NaiveDate>,
        #[serde(default)]
        pub end_date: Option<NaiveDate>,
        #[serde(default)]
        pub location: Option<String>,
        #[serde(default)]
        pub description: Option<String>,
    }
}

pub mod category {
    use super::*;

    /// Category families. Expense and income categories are disjoint sets.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CategoryKind {
        Expense,
        Income,
    }

    impl CategoryKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Expense => "expense",
                Self::Income => "income",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Category {
        pub category_id: i64,
        pub category_name: String,
        pub category_type: CategoryKind,
        #[serde(default)]
        pub created_at: Option<String>,
        #[serde(default)]
        pub updated_at: Option<String>,
    }

    /// Request body for creating a category.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryCreate {
        pub category_name: String,
        pub category_type: CategoryKind,
    }
}

pub mod csv_import {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionType {
        Income,
        Expense,
        Transfer,
    }

    impl TransactionType {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Income => "income",
                Self::Expense => "expense",
                Self::Transfer => "transfer",
            }
        }

        /// Category family for this type; transfers have none.
        pub fn category_kind(self) -> Option<category::CategoryKind> {
            match self {
                Self::Income => Some(category::CategoryKind::Income),
                Self::Expense => Some(category::CategoryKind::Expense),
                Self::Transfer => None,
            }
        }
    }

    /// One transaction as produced by the CSV parser.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ParsedTransaction {
        pub transaction_type: TransactionType,
        pub account_id: Option<i64>,
        #[serde(default)]
        pub account_confidence: f64,
        pub amount: f64,
        #[serde(default)]
        pub currency: String,
        pub transaction_date: NaiveDate,
        /// `HH:MM` when the bank export carries a time of day.
        #[serde(default)]
        pub transaction_time: Option<String>,
        #[serde(default)]
        pub description: String,
        #[serde(default)]
        pub merchant: Option<String>,
        #[serde(default)]
        pub category: Option<String>,
        #[serde(default)]
        pub trip_id: Option<i64>,
        #[serde(default)]
        pub trip_name: Option<String>,
        #[serde(default)]
        pub transfer_to_account_id: Option<i64>,
        #[serde(default)]
        pub confidence: f64,
        #[serde(default)]
        pub row_number: Option<u32>,
        #[serde(default)]
        pub raw_data: serde_json::Value,
    }

    /// Response body of the upload endpoint.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub struct UploadResponse {
        #[serde(default)]
        pub transactions: Vec<ParsedTransaction>,
        #[serde(default)]
        pub uncertain: Vec<ParsedTransaction>,
        #[serde(default)]
        pub errors: Vec<String>,
        #[serde(default)]
        pub total_parsed: Option<u64>,
        #[serde(default)]
        pub format_detected: String,
        #[serde(default)]
        pub default_account_id: Option<i64>,
    }

    /// Ledger-creation payload, one per committed row.
    ///
    /// Staging-only fields (transfer target, confidence, raw data, time of
    /// day) never cross this boundary.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ImportTransaction {
        pub account_id: i64,
        pub amount: f64,
        pub transaction_type: TransactionType,
        pub category: Option<String>,
        pub transaction_date: NaiveDate,
        pub description: Option<String>,
        pub merchant: Option<String>,
        pub trip_id: Option<i64>,
    }

    /// Response body of the bulk confirm endpoint.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct ImportConfirmed {
        pub message: String,
        #[serde(default)]
        pub imported: u64,
    }
}
