use std::fmt;

use api_types::{
    category::{Category, CategoryCreate},
    csv_import::ImportConfirmed,
};

use crate::{
    Result, StagingError,
    backend::{CsvUpload, ImportBackend},
    batch::{Batch, Partition},
    candidate::{Candidate, RowId},
    categories::{CategoryBook, Composer},
    commit::{self, CommitGate, CommitRequest, CommitTicket},
    directory::Directory,
    editor::{self, EditOutcome, FieldEdit},
    report::ErrorReport,
};

/// Staging state between "file processed" and "transactions committed".
///
/// Holds at most one batch. A new upload or a change of source account
/// replaces it and drops every uncommitted edit.
#[derive(Debug)]
pub struct ImportSession {
    directory: Directory,
    categories: CategoryBook,
    account_id: Option<i64>,
    batch: Option<Batch>,
    /// Bumped every time the batch is replaced; scopes idempotency keys and
    /// lets a late commit answer recognise that its batch is gone.
    generation: u64,
    composer: Composer,
    commits: CommitGate,
}

impl ImportSession {
    pub fn new(directory: Directory, categories: CategoryBook) -> Self {
        Self {
            directory,
            categories,
            account_id: None,
            batch: None,
            generation: 0,
            composer: Composer::default(),
            commits: CommitGate::default(),
        }
    }

    /// Fetches accounts, trips and categories together and starts an empty
    /// session.
    pub async fn load<B: ImportBackend>(backend: &B) -> Result<Self> {
        let (accounts, trips, categories) =
            tokio::try_join!(backend.accounts(), backend.trips(), backend.categories())
                .map_err(|err| StagingError::Backend(err.to_string()))?;

        tracing::debug!(
            "loaded {} accounts, {} trips, {} categories",
            accounts.len(),
            trips.len(),
            categories.len()
        );
        Ok(Self::new(
            Directory::new(accounts, trips),
            CategoryBook::new(categories),
        ))
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn categories(&self) -> &CategoryBook {
        &self.categories
    }

    pub fn batch(&self) -> Option<&Batch> {
        self.batch.as_ref()
    }

    pub fn selected_account(&self) -> Option<i64> {
        self.account_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn candidate(&self, row_id: RowId) -> Option<&Candidate> {
        self.batch.as_ref()?.get(row_id)
    }

    pub fn error_report(&self) -> ErrorReport {
        self.batch
            .as_ref()
            .map(|batch| ErrorReport::new(batch.errors()))
            .unwrap_or_default()
    }

    /// Picks the account the next CSV comes from. Always clears staging.
    pub fn select_account(&mut self, account_id: i64) {
        self.account_id = Some(account_id);
        self.replace_batch(None);
    }

    fn replace_batch(&mut self, batch: Option<Batch>) {
        self.batch = batch;
        self.generation += 1;
        self.composer.clear();
        self.commits = CommitGate::default();
    }

    /// Sends a file to the parser and stages the result.
    ///
    /// Staging is cleared before the call. On failure an error-only batch
    /// carrying the message is left in place so it can be shown.
    pub async fn upload<B: ImportBackend>(
        &mut self,
        backend: &B,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<&Batch> {
        let account_id = self.account_id.ok_or(StagingError::NoAccountSelected)?;
        if !file_name.ends_with(".csv") {
            return Err(StagingError::NotCsv(file_name.to_string()));
        }

        self.replace_batch(None);
        let upload = CsvUpload {
            account_id,
            file_name: file_name.to_string(),
            bytes,
        };

        match backend.upload(&upload).await {
            Ok(response) => {
                let batch = Batch::from_upload(response);
                tracing::info!(
                    "staged {file_name}: {} confident, {} uncertain, {} errors",
                    batch.confident().len(),
                    batch.uncertain().len(),
                    batch.errors().len()
                );
                Ok(&*self.batch.insert(batch))
            }
            Err(err) => {
                let message = err.to_string();
                tracing::error!("upload of {file_name} failed: {message}");
                self.batch = Some(Batch::failed(message.clone()));
                Err(StagingError::Backend(message))
            }
        }
    }

    /// Applies one correction to a staged row. Unknown rows are ignored.
    pub fn update_field(&mut self, row_id: RowId, edit: FieldEdit) -> EditOutcome {
        match self.batch.as_mut() {
            Some(batch) => editor::update_field(batch, row_id, edit),
            None => EditOutcome::Ignored,
        }
    }

    /// Removes a row for good.
    pub fn delete(&mut self, row_id: RowId) -> Option<Candidate> {
        let (partition, candidate) = self.batch.as_mut()?.remove(row_id)?;
        self.composer.close(row_id);
        tracing::debug!("deleted row {row_id} from the {partition} partition");
        Some(candidate)
    }

    /// Opens the "new category" input on a row.
    pub fn begin_new_category(&mut self, row_id: RowId) -> Result<()> {
        let candidate = self
            .candidate(row_id)
            .ok_or(StagingError::UnknownRow(row_id))?;
        if candidate.transaction_type.category_kind().is_none() {
            return Err(StagingError::CategoryNotAllowed(row_id));
        }
        self.composer.open(row_id);
        Ok(())
    }

    pub fn set_new_category_name(&mut self, row_id: RowId, name: &str) -> Result<()> {
        if self.composer.set_draft(row_id, name) {
            Ok(())
        } else {
            Err(StagingError::NotComposing(row_id))
        }
    }

    pub fn cancel_new_category(&mut self, row_id: RowId) {
        self.composer.close(row_id);
    }

    pub fn new_category_draft(&self, row_id: RowId) -> Option<&str> {
        self.composer.draft(row_id)
    }

    pub fn composing_rows(&self) -> Vec<RowId> {
        let mut rows: Vec<RowId> = self.composer.composing().collect();
        rows.sort();
        rows
    }

    /// Creates the drafted category and assigns it to the row that asked.
    ///
    /// A blank draft does nothing and returns `Ok(None)`. On failure the row
    /// stays in composing state with its draft.
    pub async fn submit_new_category<B: ImportBackend>(
        &mut self,
        backend: &B,
        row_id: RowId,
    ) -> Result<Option<Category>> {
        let name = self
            .composer
            .draft(row_id)
            .ok_or(StagingError::NotComposing(row_id))?
            .trim()
            .to_string();
        if name.is_empty() {
            return Ok(None);
        }

        let kind = self
            .candidate(row_id)
            .ok_or(StagingError::UnknownRow(row_id))?
            .transaction_type
            .category_kind()
            .ok_or(StagingError::CategoryNotAllowed(row_id))?;

        let payload = CategoryCreate {
            category_name: name,
            category_type: kind,
        };
        let category = backend
            .create_category(&payload)
            .await
            .map_err(|err| {
                tracing::warn!("category creation for row {row_id} failed: {err}");
                StagingError::Backend(err.to_string())
            })?;

        self.categories.push(category.clone());
        self.update_field(
            row_id,
            FieldEdit::Category(Some(category.category_name.clone())),
        );
        self.composer.close(row_id);
        tracing::info!(
            "created {} category \"{}\" from row {row_id}",
            kind.as_str(),
            category.category_name
        );
        Ok(Some(category))
    }

    pub fn is_committing(&self, partition: Partition) -> bool {
        self.commits.is_in_flight(partition)
    }

    /// Validates a partition and snapshots it into a commit request.
    ///
    /// Marks the partition as in flight until [`finish_commit`] is called.
    /// The other partition stays free to commit.
    ///
    /// [`finish_commit`]: Self::finish_commit
    pub fn begin_commit(&mut self, partition: Partition) -> Result<CommitTicket> {
        if self.commits.is_in_flight(partition) {
            return Err(StagingError::CommitInProgress(partition));
        }

        let candidates = self
            .batch
            .as_ref()
            .map(|batch| batch.partition(partition))
            .unwrap_or_default();
        if candidates.is_empty() {
            return Err(StagingError::EmptyPartition(partition));
        }

        let transactions = commit::payload_for(candidates).map_err(StagingError::InvalidRows)?;
        let rows = candidates.iter().map(|c| c.row_id).collect();

        let request = CommitRequest {
            idempotency_key: self.commits.key(partition),
            transactions,
        };
        self.commits.set_in_flight(partition, true);

        Ok(CommitTicket {
            partition,
            generation: self.generation,
            rows,
            request,
        })
    }

    /// Applies the ledger's answer to an in-flight commit.
    ///
    /// Success removes every snapshotted row of the partition; failure leaves
    /// the partition exactly as it is and keeps the idempotency key for the
    /// retry.
    pub fn finish_commit<E: fmt::Display>(
        &mut self,
        ticket: CommitTicket,
        outcome: std::result::Result<ImportConfirmed, E>,
    ) -> Result<ImportConfirmed> {
        if ticket.generation != self.generation {
            tracing::warn!(
                "commit of the {} partition answered after its batch was replaced",
                ticket.partition
            );
            return outcome.map_err(|err| StagingError::Commit(err.to_string()));
        }

        self.commits.set_in_flight(ticket.partition, false);
        match outcome {
            Ok(confirmed) => {
                let removed = match self.batch.as_mut() {
                    Some(batch) => batch.remove_rows(ticket.partition, &ticket.rows),
                    None => 0,
                };
                for row_id in &ticket.rows {
                    self.composer.close(*row_id);
                }
                self.commits.retire(ticket.partition);
                tracing::info!(
                    "committed {removed} rows from the {} partition: {}",
                    ticket.partition,
                    confirmed.message
                );
                Ok(confirmed)
            }
            Err(err) => {
                tracing::error!("commit of the {} partition failed: {err}", ticket.partition);
                Err(StagingError::Commit(err.to_string()))
            }
        }
    }

    /// Commits one partition in a single bulk call. No retry.
    pub async fn commit<B: ImportBackend>(
        &mut self,
        backend: &B,
        partition: Partition,
    ) -> Result<ImportConfirmed> {
        let ticket = self.begin_commit(partition)?;
        let outcome = backend.confirm(ticket.request()).await;
        self.finish_commit(ticket, outcome)
    }
}
