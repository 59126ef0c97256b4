//! HTTP access to the local bridge backend.

use std::time::Duration;

use async_trait::async_trait;
use gridchat_protocol::{
    DataQuery, ErrorBody, HealthReport, SheetData, WriteRequest, WriteResponse, EXCEL_DATA_PATH,
    HEALTH_PATH, WRITE_EXCEL_PATH,
};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};

/// The three bridge endpoints the client depends on.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Probe `GET /health`. An unhealthy bridge is a successful probe that
    /// returns an unhealthy report; only transport failures are errors.
    async fn health(&self) -> Result<HealthReport>;

    /// Fetch the targeted sheet from `GET /api/excel-data`.
    async fn excel_data(&self, query: &DataQuery) -> Result<SheetData>;

    /// Submit a batch to `POST /api/write-excel`.
    async fn write(&self, request: &WriteRequest) -> Result<WriteResponse>;
}

/// `BackendApi` over reqwest.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        Url::parse(base_url).map_err(|e| ClientError::Url(format!("{base_url}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let raw = format!("{}{}", self.base_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| ClientError::Url(format!("{raw}: {e}")))
    }
}

#[async_trait]
impl BackendApi for HttpBackend {
    async fn health(&self) -> Result<HealthReport> {
        let response = self.client.get(self.url(HEALTH_PATH, &[])?).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        // Unhealthy reports come back with 404/503 but keep the same body shape.
        match serde_json::from_slice::<HealthReport>(&body) {
            Ok(report) => Ok(report),
            Err(_) if status.is_success() => Err(ClientError::InvalidResponse(format!(
                "unexpected health body: {}",
                String::from_utf8_lossy(&body)
            ))),
            Err(_) => Err(backend_error(status, &body)),
        }
    }

    async fn excel_data(&self, query: &DataQuery) -> Result<SheetData> {
        let url = self.url(EXCEL_DATA_PATH, &query.to_pairs())?;
        tracing::debug!(%url, "fetching sheet data");
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn write(&self, request: &WriteRequest) -> Result<WriteResponse> {
        let response = self
            .client
            .post(self.url(WRITE_EXCEL_PATH, &[])?)
            .json(request)
            .send()
            .await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(backend_error(status, &body));
    }
    serde_json::from_slice(&body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Prefer the bridge's own `error` message, else the status line.
fn backend_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| status.to_string());
    ClientError::Backend {
        status: status.as_u16(),
        message,
    }
}
