//! Shared category list and the per-row "add new category" drafts.

use std::collections::HashMap;

use api_types::{category::Category, csv_import::TransactionType};

use crate::candidate::RowId;

/// Categories offered by both review tables. Append-only for the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryBook {
    categories: Vec<Category>,
}

impl CategoryBook {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn all(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Choices for a row of the given type. Transfer rows see every category.
    pub fn for_type(&self, transaction_type: TransactionType) -> Vec<&Category> {
        match transaction_type.category_kind() {
            Some(kind) => self
                .categories
                .iter()
                .filter(|category| category.category_type == kind)
                .collect(),
            None => self.categories.iter().collect(),
        }
    }

    pub(crate) fn push(&mut self, category: Category) {
        self.categories.push(category);
    }
}

/// Draft names of categories being composed, keyed by the row that asked.
///
/// Two rows can compose at the same time without seeing each other's text.
#[derive(Clone, Debug, Default)]
pub(crate) struct Composer {
    drafts: HashMap<RowId, String>,
}

impl Composer {
    pub(crate) fn open(&mut self, row_id: RowId) {
        self.drafts.entry(row_id).or_default();
    }

    pub(crate) fn draft(&self, row_id: RowId) -> Option<&str> {
        self.drafts.get(&row_id).map(String::as_str)
    }

    /// Returns `false` when the row is not composing.
    pub(crate) fn set_draft(&mut self, row_id: RowId, name: &str) -> bool {
        match self.drafts.get_mut(&row_id) {
            Some(draft) => {
                name.clone_into(draft);
                true
            }
            None => false,
        }
    }

    pub(crate) fn close(&mut self, row_id: RowId) -> Option<String> {
        self.drafts.remove(&row_id)
    }

    pub(crate) fn clear(&mut self) {
        self.drafts.clear();
    }

    pub(crate) fn composing(&self) -> impl Iterator<Item = RowId> + '_ {
        self.drafts.keys().copied()
    }
}
