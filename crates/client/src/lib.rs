//! HTTP client for the CSV import service.

mod error;

use api_types::{
    account::Account,
    category::{Category, CategoryCreate},
    csv_import::{ImportConfirmed, UploadResponse},
    trip::Trip,
};
use reqwest::{
    Client, RequestBuilder, Url,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use staging::{CommitRequest, CsvUpload, ImportBackend};

pub use error::ClientError;
use error::ErrorBody;

pub type Result<T> = std::result::Result<T, ClientError>;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        Url::parse(base_url).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        Ok(Self {
            client: Client::new(),
            base_url: base_url.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<TResp: DeserializeOwned>(&self, req: RequestBuilder) -> Result<TResp> {
        let resp = self.authorized(req).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<TResp>().await?);
        }

        let body = resp.json::<ErrorBody>().await.ok();
        let err = ClientError::from_status(status, body);
        tracing::debug!("request failed with {status}: {err}");
        Err(err)
    }

    async fn get_json<TResp: DeserializeOwned>(&self, path: &str) -> Result<TResp> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post_json<TReq: Serialize + ?Sized, TResp: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TResp> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }
}

impl ImportBackend for ApiClient {
    type Error = ClientError;

    async fn upload(&self, upload: &CsvUpload) -> Result<UploadResponse> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str("text/csv")?;
        let req = self
            .client
            .post(self.url("/api/csv-import/upload"))
            .query(&[("account_id", upload.account_id)])
            .multipart(Form::new().part("file", part));

        tracing::debug!(
            "uploading {} ({} bytes) for account {}",
            upload.file_name,
            upload.bytes.len(),
            upload.account_id
        );
        self.send(req).await
    }

    async fn confirm(&self, request: &CommitRequest) -> Result<ImportConfirmed> {
        let req = self
            .client
            .post(self.url("/api/csv-import/confirm"))
            .header(IDEMPOTENCY_HEADER, &request.idempotency_key)
            .json(&request.transactions);
        self.send(req).await
    }

    async fn create_category(&self, payload: &CategoryCreate) -> Result<Category> {
        self.post_json("/api/categories", payload).await
    }

    async fn accounts(&self) -> Result<Vec<Account>> {
        self.get_json("/api/accounts").await
    }

    async fn trips(&self) -> Result<Vec<Trip>> {
        self.get_json("/api/trips").await
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.get_json("/api/categories").await
    }
}
