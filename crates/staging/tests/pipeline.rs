use std::sync::Mutex;

use api_types::{
    account::Account,
    category::{Category, CategoryCreate, CategoryKind},
    csv_import::{ImportConfirmed, ParsedTransaction, TransactionType, UploadResponse},
    trip::Trip,
};
use chrono::NaiveDate;
use staging::{
    AmountEntry, CommitRequest, CsvUpload, EditOutcome, FieldEdit, ImportBackend, ImportSession,
    Partition, RowId, StagingError,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FakeError(String);

#[derive(Default)]
struct FakeBackend {
    response: Mutex<Option<UploadResponse>>,
    fail_upload: Mutex<Option<String>>,
    fail_confirm: Mutex<Option<String>>,
    fail_category: Mutex<Option<String>>,
    uploads: Mutex<Vec<CsvUpload>>,
    confirms: Mutex<Vec<CommitRequest>>,
    created: Mutex<Vec<CategoryCreate>>,
}

impl FakeBackend {
    fn with_response(response: UploadResponse) -> Self {
        let backend = Self::default();
        *backend.response.lock().unwrap() = Some(response);
        backend
    }

    fn fail_next_confirm(&self, message: &str) {
        *self.fail_confirm.lock().unwrap() = Some(message.to_string());
    }

    fn confirms(&self) -> Vec<CommitRequest> {
        self.confirms.lock().unwrap().clone()
    }
}

impl ImportBackend for FakeBackend {
    type Error = FakeError;

    async fn upload(&self, upload: &CsvUpload) -> Result<UploadResponse, FakeError> {
        self.uploads.lock().unwrap().push(upload.clone());
        if let Some(message) = self.fail_upload.lock().unwrap().clone() {
            return Err(FakeError(message));
        }
        Ok(self.response.lock().unwrap().clone().unwrap_or_default())
    }

    async fn confirm(&self, request: &CommitRequest) -> Result<ImportConfirmed, FakeError> {
        self.confirms.lock().unwrap().push(request.clone());
        if let Some(message) = self.fail_confirm.lock().unwrap().take() {
            return Err(FakeError(message));
        }
        Ok(ImportConfirmed {
            message: format!("Successfully imported {} transactions", request.transactions.len()),
            imported: request.transactions.len() as u64,
        })
    }

    async fn create_category(&self, payload: &CategoryCreate) -> Result<Category, FakeError> {
        self.created.lock().unwrap().push(payload.clone());
        if let Some(message) = self.fail_category.lock().unwrap().clone() {
            return Err(FakeError(message));
        }
        Ok(Category {
            category_id: 100,
            category_name: payload.category_name.clone(),
            category_type: payload.category_type,
            created_at: None,
            updated_at: None,
        })
    }

    async fn accounts(&self) -> Result<Vec<Account>, FakeError> {
        Ok(vec![Account {
            account_id: 1,
            account_name: "Main".to_string(),
            account_type: "current".to_string(),
            institution: "Monzo".to_string(),
            currency_code: "GBP".to_string(),
        }])
    }

    async fn trips(&self) -> Result<Vec<Trip>, FakeError> {
        Ok(Vec::new())
    }

    async fn categories(&self) -> Result<Vec<Category>, FakeError> {
        Ok(vec![Category {
            category_id: 1,
            category_name: "Eating Out".to_string(),
            category_type: CategoryKind::Expense,
            created_at: None,
            updated_at: None,
        }])
    }
}

fn tx(row: u32, kind: TransactionType, amount: f64, confidence: f64) -> ParsedTransaction {
    ParsedTransaction {
        transaction_type: kind,
        account_id: Some(1),
        account_confidence: 0.9,
        amount,
        currency: "GBP".to_string(),
        transaction_date: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        transaction_time: Some("12:00".to_string()),
        description: format!("ROW {row}"),
        merchant: None,
        category: None,
        trip_id: None,
        trip_name: None,
        transfer_to_account_id: None,
        confidence,
        row_number: Some(row),
        raw_data: serde_json::json!({"row": row}),
    }
}

fn scenario() -> UploadResponse {
    UploadResponse {
        transactions: vec![tx(2, TransactionType::Expense, -20.0, 0.95)],
        uncertain: vec![tx(7, TransactionType::Expense, -12.5, 0.4)],
        errors: vec!["row 3: unparseable date".to_string()],
        total_parsed: Some(2),
        format_detected: "revolut_expense".to_string(),
        default_account_id: Some(1),
    }
}

async fn staged(backend: &FakeBackend) -> ImportSession {
    let mut session = ImportSession::load(backend).await.unwrap();
    session.select_account(1);
    session
        .upload(backend, "statement.csv", b"Date,Amount\n".to_vec())
        .await
        .unwrap();
    session
}

#[tokio::test]
async fn end_to_end_uncertain_commit_leaves_confident_staged() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    let batch = session.batch().unwrap();
    assert_eq!(batch.confident().len(), 1);
    assert_eq!(batch.confident()[0].row_id, RowId::new(2));
    assert_eq!(batch.uncertain().len(), 1);
    assert_eq!(batch.uncertain()[0].row_id, RowId::new(7));
    assert_eq!(session.error_report().len(), 1);

    let confident_before = session.batch().unwrap().confident().to_vec();
    let outcome = session.update_field(RowId::new(7), FieldEdit::Amount("-15.00".to_string()));
    assert_eq!(outcome, EditOutcome::Applied(Partition::Uncertain));
    assert_eq!(session.batch().unwrap().confident(), confident_before.as_slice());

    let confirmed = session.commit(&backend, Partition::Uncertain).await.unwrap();
    assert_eq!(confirmed.imported, 1);

    let batch = session.batch().unwrap();
    assert!(batch.uncertain().is_empty());
    assert_eq!(batch.confident(), confident_before.as_slice());
    assert_eq!(session.error_report().messages(), ["row 3: unparseable date".to_string()]);

    let sent = backend.confirms();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].transactions.len(), 1);
    assert_eq!(sent[0].transactions[0].amount, -15.0);
}

#[tokio::test]
async fn failed_commit_leaves_partition_untouched_and_retry_reuses_key() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;
    let before = session.batch().unwrap().clone();

    backend.fail_next_confirm("ledger unavailable");
    let err = session
        .commit(&backend, Partition::Confident)
        .await
        .unwrap_err();
    assert_eq!(err, StagingError::Commit("ledger unavailable".to_string()));
    assert_eq!(session.batch().unwrap(), &before);
    assert!(!session.is_committing(Partition::Confident));

    session.commit(&backend, Partition::Confident).await.unwrap();

    let sent = backend.confirms();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].idempotency_key, sent[1].idempotency_key);
    assert!(session.batch().unwrap().confident().is_empty());
    assert_eq!(session.batch().unwrap().uncertain().len(), 1);
}

#[tokio::test]
async fn partitions_get_distinct_keys() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    session.commit(&backend, Partition::Confident).await.unwrap();
    session.commit(&backend, Partition::Uncertain).await.unwrap();

    let sent = backend.confirms();
    assert_ne!(sent[0].idempotency_key, sent[1].idempotency_key);
    assert!(session.batch().unwrap().is_drained());
}

#[tokio::test]
async fn in_flight_commit_gates_only_its_partition() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    let ticket = session.begin_commit(Partition::Uncertain).unwrap();
    assert!(session.is_committing(Partition::Uncertain));
    assert_eq!(
        session.begin_commit(Partition::Uncertain).unwrap_err(),
        StagingError::CommitInProgress(Partition::Uncertain)
    );

    // Edits stay live while the commit is in flight; the snapshot is what was sent.
    session.update_field(RowId::new(7), FieldEdit::Amount("-99.00".to_string()));
    assert_eq!(ticket.request().transactions[0].amount, -12.5);

    let other = session.begin_commit(Partition::Confident).unwrap();
    session
        .finish_commit(other, Ok::<_, FakeError>(ImportConfirmed {
            message: "ok".to_string(),
            imported: 1,
        }))
        .unwrap();

    session
        .finish_commit(ticket, Ok::<_, FakeError>(ImportConfirmed {
            message: "ok".to_string(),
            imported: 1,
        }))
        .unwrap();
    assert!(session.batch().unwrap().is_drained());
    assert!(!session.is_committing(Partition::Uncertain));
}

#[tokio::test]
async fn late_answer_for_replaced_batch_is_ignored() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    let ticket = session.begin_commit(Partition::Confident).unwrap();
    session
        .upload(&backend, "statement.csv", Vec::new())
        .await
        .unwrap();
    assert!(!session.is_committing(Partition::Confident));

    session
        .finish_commit(ticket, Ok::<_, FakeError>(ImportConfirmed {
            message: "ok".to_string(),
            imported: 1,
        }))
        .unwrap();
    assert_eq!(session.batch().unwrap().confident().len(), 1);
}

#[tokio::test]
async fn invalid_rows_block_commit_without_calling_backend() {
    let mut response = scenario();
    response.uncertain[0].account_id = None;
    let backend = FakeBackend::with_response(response);
    let mut session = staged(&backend).await;

    session.update_field(RowId::new(2), FieldEdit::Amount("twelve".to_string()));
    assert!(matches!(
        session.candidate(RowId::new(2)).unwrap().amount,
        AmountEntry::Invalid { .. }
    ));

    let err = session
        .commit(&backend, Partition::Confident)
        .await
        .unwrap_err();
    let StagingError::InvalidRows(issues) = err else {
        panic!("expected invalid rows, got {err:?}");
    };
    assert_eq!(issues[0].row_id, RowId::new(2));

    let err = session
        .commit(&backend, Partition::Uncertain)
        .await
        .unwrap_err();
    assert!(matches!(err, StagingError::InvalidRows(_)));
    assert!(backend.confirms().is_empty());
    assert!(!session.is_committing(Partition::Confident));

    session.update_field(RowId::new(7), FieldEdit::Account(Some(1)));
    session.commit(&backend, Partition::Uncertain).await.unwrap();
}

#[tokio::test]
async fn empty_partition_is_not_committed() {
    let mut response = scenario();
    response.uncertain.clear();
    let backend = FakeBackend::with_response(response);
    let mut session = staged(&backend).await;

    assert_eq!(
        session.begin_commit(Partition::Uncertain).unwrap_err(),
        StagingError::EmptyPartition(Partition::Uncertain)
    );
}

#[tokio::test]
async fn category_creation_applies_to_origin_row() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;
    let categories_before = session.categories().len();

    session.begin_new_category(RowId::new(7)).unwrap();
    session.set_new_category_name(RowId::new(7), "  Groceries ").unwrap();
    let created = session
        .submit_new_category(&backend, RowId::new(7))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(created.category_name, "Groceries");
    assert_eq!(
        session.candidate(RowId::new(7)).unwrap().category.as_deref(),
        Some("Groceries")
    );
    assert_eq!(session.candidate(RowId::new(2)).unwrap().category, None);
    assert_eq!(session.categories().len(), categories_before + 1);
    assert_eq!(session.new_category_draft(RowId::new(7)), None);

    let sent = backend.created.lock().unwrap().clone();
    assert_eq!(
        sent,
        vec![CategoryCreate {
            category_name: "Groceries".to_string(),
            category_type: CategoryKind::Expense,
        }]
    );
}

#[tokio::test]
async fn category_type_follows_current_row_type() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    session.begin_new_category(RowId::new(2)).unwrap();
    session.update_field(
        RowId::new(2),
        FieldEdit::TransactionType(TransactionType::Income),
    );
    session.set_new_category_name(RowId::new(2), "Refunds").unwrap();
    session
        .submit_new_category(&backend, RowId::new(2))
        .await
        .unwrap();

    let sent = backend.created.lock().unwrap().clone();
    assert_eq!(sent[0].category_type, CategoryKind::Income);
}

#[tokio::test]
async fn failed_category_creation_keeps_composing() {
    let backend = FakeBackend::with_response(scenario());
    *backend.fail_category.lock().unwrap() = Some("Category 'Pets' already exists".to_string());
    let mut session = staged(&backend).await;
    let categories_before = session.categories().len();

    session.begin_new_category(RowId::new(2)).unwrap();
    session.set_new_category_name(RowId::new(2), "Pets").unwrap();
    let err = session
        .submit_new_category(&backend, RowId::new(2))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        StagingError::Backend("Category 'Pets' already exists".to_string())
    );
    assert_eq!(session.new_category_draft(RowId::new(2)), Some("Pets"));
    assert_eq!(session.categories().len(), categories_before);
    assert_eq!(session.candidate(RowId::new(2)).unwrap().category, None);
}

#[tokio::test]
async fn blank_draft_is_a_no_op() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    session.begin_new_category(RowId::new(2)).unwrap();
    let created = session
        .submit_new_category(&backend, RowId::new(2))
        .await
        .unwrap();
    assert_eq!(created, None);
    assert!(backend.created.lock().unwrap().is_empty());
    assert_eq!(session.composing_rows(), vec![RowId::new(2)]);
}

#[tokio::test]
async fn composing_state_is_per_row() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    session.begin_new_category(RowId::new(2)).unwrap();
    session.begin_new_category(RowId::new(7)).unwrap();
    session.set_new_category_name(RowId::new(2), "Books").unwrap();
    session.cancel_new_category(RowId::new(7));

    assert_eq!(session.new_category_draft(RowId::new(2)), Some("Books"));
    assert_eq!(session.new_category_draft(RowId::new(7)), None);
    assert_eq!(
        session.set_new_category_name(RowId::new(7), "x"),
        Err(StagingError::NotComposing(RowId::new(7)))
    );
}

#[tokio::test]
async fn transfer_rows_cannot_create_categories() {
    let mut response = scenario();
    response.transactions[0].transaction_type = TransactionType::Transfer;
    let backend = FakeBackend::with_response(response);
    let mut session = staged(&backend).await;

    assert_eq!(
        session.begin_new_category(RowId::new(2)),
        Err(StagingError::CategoryNotAllowed(RowId::new(2)))
    );
    assert_eq!(
        session.begin_new_category(RowId::new(40)),
        Err(StagingError::UnknownRow(RowId::new(40)))
    );
}

#[tokio::test]
async fn new_upload_replaces_batch_and_discards_edits() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;
    let first_generation = session.generation();

    session.update_field(RowId::new(2), FieldEdit::Merchant("Edited".to_string()));
    session.delete(RowId::new(7));
    session.begin_new_category(RowId::new(2)).unwrap();

    session
        .upload(&backend, "statement.csv", Vec::new())
        .await
        .unwrap();

    assert!(session.generation() > first_generation);
    assert_eq!(session.candidate(RowId::new(2)).unwrap().merchant, None);
    assert!(session.candidate(RowId::new(7)).is_some());
    assert!(session.composing_rows().is_empty());
}

#[tokio::test]
async fn selecting_an_account_clears_staging() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    session.select_account(1);
    assert!(session.batch().is_none());
    assert_eq!(session.selected_account(), Some(1));
}

#[tokio::test]
async fn deleted_rows_are_gone_for_good() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = staged(&backend).await;

    let removed = session.delete(RowId::new(7)).unwrap();
    assert_eq!(removed.row_id, RowId::new(7));
    assert!(session.delete(RowId::new(7)).is_none());
    assert_eq!(
        session.update_field(RowId::new(7), FieldEdit::Description("x".to_string())),
        EditOutcome::Ignored
    );
    assert!(session.batch().unwrap().uncertain().is_empty());
}

#[tokio::test]
async fn upload_requires_account_and_csv() {
    let backend = FakeBackend::with_response(scenario());
    let mut session = ImportSession::load(&backend).await.unwrap();

    let err = session
        .upload(&backend, "statement.csv", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err, StagingError::NoAccountSelected);

    session.select_account(1);
    let err = session
        .upload(&backend, "statement.xlsx", Vec::new())
        .await
        .unwrap_err();
    assert_eq!(err, StagingError::NotCsv("statement.xlsx".to_string()));
    assert!(backend.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_upload_shows_the_message_as_an_error() {
    let backend = FakeBackend::with_response(scenario());
    *backend.fail_upload.lock().unwrap() = Some("Unknown CSV format. Headers: a, b".to_string());
    let mut session = ImportSession::load(&backend).await.unwrap();
    session.select_account(1);

    let err = session
        .upload(&backend, "statement.csv", b"a,b\n".to_vec())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StagingError::Backend("Unknown CSV format. Headers: a, b".to_string())
    );

    let batch = session.batch().unwrap();
    assert!(batch.is_drained());
    assert_eq!(batch.format_detected(), "unknown");
    assert_eq!(
        session.error_report().messages(),
        ["Unknown CSV format. Headers: a, b".to_string()]
    );

    let uploads = backend.uploads.lock().unwrap();
    assert_eq!(uploads[0].account_id, 1);
    assert_eq!(uploads[0].file_name, "statement.csv");
}

#[tokio::test]
async fn load_fills_directory_and_categories() {
    let backend = FakeBackend::default();
    let session = ImportSession::load(&backend).await.unwrap();

    assert_eq!(session.directory().account_label(Some(1)), "Main (Monzo)");
    assert_eq!(session.categories().len(), 1);
    assert!(session.batch().is_none());
}
