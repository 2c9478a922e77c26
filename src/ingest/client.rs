use crate::config::types::{DeliveryConfig, WorkspaceConfig};
use crate::ingest::signer::{rfc1123_date, RequestSigner, SignerError, SigningInput};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use thiserror::Error;

pub const LOGS_RESOURCE: &str = "/api/logs";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const LOG_TYPE_HEADER: &str = "Log-Type";
pub const DATE_HEADER: &str = "x-ms-date";
pub const RESOURCE_ID_HEADER: &str = "x-ms-AzureResourceId";

/// Failure of a single delivery attempt. Both kinds are recoverable at the
/// pipeline level: the chunk is skipped and delivery continues.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("ingestion rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("failed to sign request: {0}")]
    Signing(#[from] SignerError),
}

impl From<reqwest::Error> for DeliveryError {
    fn from(err: reqwest::Error) -> Self {
        DeliveryError::Transport(err.to_string())
    }
}

/// Destination for serialized log chunks
#[async_trait]
pub trait LogSink: Send + Sync {
    async fn post(&self, body: Vec<u8>) -> Result<(), DeliveryError>;
}

/// Authenticated client for the HTTP data collector API
#[derive(Debug)]
pub struct IngestionClient {
    url: String,
    api_version: String,
    log_type: String,
    resource_id: Option<String>,
    signer: RequestSigner,
    client: reqwest::Client,
}

impl IngestionClient {
    pub fn new(workspace: &WorkspaceConfig, delivery: &DeliveryConfig) -> Result<Self, ClientError> {
        let signer = RequestSigner::new(workspace.id.clone(), &workspace.shared_key)?;
        let client = reqwest::Client::builder()
            .timeout(delivery.timeout)
            .build()?;

        Ok(Self {
            url: format!("{}{}", workspace.base_url(), LOGS_RESOURCE),
            api_version: workspace.api_version.clone(),
            log_type: workspace.log_type.clone(),
            resource_id: workspace.resource_id.clone(),
            signer,
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn workspace_id(&self) -> &str {
        self.signer.workspace_id()
    }
}

/// Errors building an [`IngestionClient`]. These are configuration problems.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid shared key: {0}")]
    Signer(#[from] SignerError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
impl LogSink for IngestionClient {
    async fn post(&self, body: Vec<u8>) -> Result<(), DeliveryError> {
        // One date for both the signature and the header
        let date = rfc1123_date(Utc::now());
        let authorization = self.signer.sign(&SigningInput {
            method: "POST",
            content_length: body.len(),
            content_type: CONTENT_TYPE_JSON,
            date: &date,
            resource: LOGS_RESOURCE,
        })?;

        let mut request = self
            .client
            .post(&self.url)
            .query(&[("api-version", self.api_version.as_str())])
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_JSON)
            .header(LOG_TYPE_HEADER, &self.log_type)
            .header(DATE_HEADER, &date)
            .header(reqwest::header::AUTHORIZATION, authorization);

        if let Some(resource_id) = &self.resource_id {
            request = request.header(RESOURCE_ID_HEADER, resource_id);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if is_accepted(status) {
            return Ok(());
        }

        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

fn is_accepted(status: StatusCode) -> bool {
    status == StatusCode::OK || status == StatusCode::ACCEPTED
}
