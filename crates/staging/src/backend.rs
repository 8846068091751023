use std::future::Future;

use api_types::{
    account::Account,
    category::{Category, CategoryCreate},
    csv_import::{ImportConfirmed, UploadResponse},
    trip::Trip,
};

use crate::commit::CommitRequest;

/// A CSV file on its way to the parser.
#[derive(Clone, Debug, PartialEq)]
pub struct CsvUpload {
    /// Account the statement was exported from.
    pub account_id: i64,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// The remote services the staging pipeline depends on.
///
/// Parsing, category storage and the ledger all live on the other side of
/// this trait; staging only keeps the in-memory batch between them.
pub trait ImportBackend {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parses and classifies a CSV file.
    fn upload(
        &self,
        upload: &CsvUpload,
    ) -> impl Future<Output = Result<UploadResponse, Self::Error>> + Send;

    /// Creates every transaction of the request in one call.
    fn confirm(
        &self,
        request: &CommitRequest,
    ) -> impl Future<Output = Result<ImportConfirmed, Self::Error>> + Send;

    fn create_category(
        &self,
        payload: &CategoryCreate,
    ) -> impl Future<Output = Result<Category, Self::Error>> + Send;

    fn accounts(&self) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send;

    fn trips(&self) -> impl Future<Output = Result<Vec<Trip>, Self::Error>> + Send;

    fn categories(&self) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send;
}
