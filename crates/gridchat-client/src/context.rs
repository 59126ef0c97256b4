//! Fetches spreadsheet context for the prompt, with bounded retry.

use std::sync::Arc;
use std::time::Duration;

use gridchat_protocol::{DataQuery, SheetData, SheetTarget};

use crate::backend::BackendApi;
use crate::error::{ClientError, Result};

/// Reads the targeted sheet, probing health before every attempt.
///
/// Attempt `n` that fails is followed by a `2^n` second wait (2 s, 4 s, ...)
/// unless it was the last one.
pub struct ContextFetcher {
    backend: Arc<dyn BackendApi>,
    attempts: u32,
}

impl ContextFetcher {
    pub fn new(backend: Arc<dyn BackendApi>, attempts: u32) -> Self {
        Self {
            backend,
            attempts: attempts.max(1),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Fetch the sheet or fail with `ContextUnavailable` carrying the last cause.
    pub async fn fetch(&self, target: &SheetTarget) -> Result<SheetData> {
        let query = DataQuery::for_target(target);
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.try_once(&query).await {
                Ok(data) => {
                    tracing::debug!(attempt, sheet = %data.sheet, rows = data.shape[0], "fetched context");
                    return Ok(data);
                }
                Err(e) => {
                    tracing::debug!(attempt, "context attempt failed: {e}");
                    last_error = Some(e);
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(backoff(attempt)).await;
            }
        }

        let cause = last_error.unwrap_or_else(|| ClientError::Unhealthy("no attempt made".into()));
        tracing::warn!(attempts = self.attempts, "spreadsheet context unavailable: {cause}");
        Err(ClientError::ContextUnavailable(Box::new(cause)))
    }

    async fn try_once(&self, query: &DataQuery) -> Result<SheetData> {
        let report = self.backend.health().await?;
        if !report.is_healthy() {
            return Err(ClientError::Unhealthy(
                report.error.unwrap_or_else(|| "bridge reported unhealthy".into()),
            ));
        }
        self.backend.excel_data(query).await
    }
}

fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt.min(16))
}
