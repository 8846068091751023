//! The staging unit produced by one upload, and its split into partitions.
//!
//! The parser already decided which rows are confident and which need review;
//! the batch only keeps that decision. Row ids are assigned here, once, and are
//! unique across both partitions, so a row can never be found in both.

use std::{collections::HashSet, fmt};

use api_types::csv_import::{ParsedTransaction, UploadResponse};
use serde::{Deserialize, Serialize};

use crate::candidate::{Candidate, RowId};

/// One of the two confidence tiers of a batch. Each is committed on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Confident,
    Uncertain,
}

impl Partition {
    /// Lookup order used by the row editor.
    pub const ALL: [Partition; 2] = [Partition::Confident, Partition::Uncertain];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confident => "confident",
            Self::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Batch {
    confident: Vec<Candidate>,
    uncertain: Vec<Candidate>,
    errors: Vec<String>,
    format_detected: String,
    total_parsed: Option<u64>,
    default_account_id: Option<i64>,
}

impl Batch {
    /// Builds a batch from the parser's response.
    pub fn from_upload(response: UploadResponse) -> Self {
        let mut ids = RowIdAllocator::new(
            response
                .transactions
                .iter()
                .chain(response.uncertain.iter()),
        );

        let confident = response
            .transactions
            .into_iter()
            .map(|parsed| ids.candidate(parsed))
            .collect();
        let uncertain = response
            .uncertain
            .into_iter()
            .map(|parsed| ids.candidate(parsed))
            .collect();

        Self {
            confident,
            uncertain,
            errors: response.errors,
            format_detected: response.format_detected,
            total_parsed: response.total_parsed,
            default_account_id: response.default_account_id,
        }
    }

    /// Error-only batch shown when the upload itself failed.
    pub(crate) fn failed(message: String) -> Self {
        Self {
            errors: vec![message],
            format_detected: "unknown".to_string(),
            ..Self::default()
        }
    }

    pub fn partition(&self, partition: Partition) -> &[Candidate] {
        match partition {
            Partition::Confident => &self.confident,
            Partition::Uncertain => &self.uncertain,
        }
    }

    pub(crate) fn partition_mut(&mut self, partition: Partition) -> &mut Vec<Candidate> {
        match partition {
            Partition::Confident => &mut self.confident,
            Partition::Uncertain => &mut self.uncertain,
        }
    }

    pub fn confident(&self) -> &[Candidate] {
        &self.confident
    }

    pub fn uncertain(&self) -> &[Candidate] {
        &self.uncertain
    }

    /// Row-level failures reported by the parser.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn format_detected(&self) -> &str {
        &self.format_detected
    }

    pub fn total_parsed(&self) -> Option<u64> {
        self.total_parsed
    }

    pub fn default_account_id(&self) -> Option<i64> {
        self.default_account_id
    }

    /// `true` once no candidate is left in either partition.
    pub fn is_drained(&self) -> bool {
        self.confident.is_empty() && self.uncertain.is_empty()
    }

    /// Finds a row, searching the confident partition first.
    pub fn locate(&self, row_id: RowId) -> Option<(Partition, usize)> {
        Partition::ALL.into_iter().find_map(|partition| {
            self.partition(partition)
                .iter()
                .position(|candidate| candidate.row_id == row_id)
                .map(|index| (partition, index))
        })
    }

    pub fn get(&self, row_id: RowId) -> Option<&Candidate> {
        self.locate(row_id)
            .map(|(partition, index)| &self.partition(partition)[index])
    }

    pub(crate) fn remove(&mut self, row_id: RowId) -> Option<(Partition, Candidate)> {
        let (partition, index) = self.locate(row_id)?;
        let candidate = self.partition_mut(partition).remove(index);
        Some((partition, candidate))
    }

    /// Drops the given rows from one partition, keeping the order of the rest.
    pub(crate) fn remove_rows(&mut self, partition: Partition, rows: &[RowId]) -> usize {
        let list = self.partition_mut(partition);
        let before = list.len();
        list.retain(|candidate| !rows.contains(&candidate.row_id));
        before - list.len()
    }
}

/// Hands out row ids: the parser's row number when it is present and unused,
/// otherwise the next free number above every parser-supplied one. Once the
/// id space runs out above, synthetic ids wrap around to the lowest free
/// number.
struct RowIdAllocator {
    used: HashSet<u32>,
    next: u32,
}

impl RowIdAllocator {
    fn new<'a>(rows: impl Iterator<Item = &'a ParsedTransaction>) -> Self {
        let highest = rows.filter_map(|parsed| parsed.row_number).max();
        Self {
            used: HashSet::new(),
            next: highest.and_then(|n| n.checked_add(1)).unwrap_or(1),
        }
    }

    fn candidate(&mut self, parsed: ParsedTransaction) -> Candidate {
        let row_id = self.assign(parsed.row_number);
        Candidate::from_parsed(row_id, parsed)
    }

    fn assign(&mut self, row_number: Option<u32>) -> RowId {
        if let Some(number) = row_number {
            if self.used.insert(number) {
                return RowId::new(number);
            }
            tracing::warn!("parser reported row {number} twice; assigning a synthetic id");
        }

        while !self.used.insert(self.next) {
            self.next = self.next.checked_add(1).unwrap_or(1);
        }
        RowId::new(self.next)
    }
}
