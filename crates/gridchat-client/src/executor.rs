//! Submits extracted operation batches to the bridge.

use std::sync::Arc;
use std::time::Duration;

use gridchat_protocol::{OperationResult, SheetTarget, WriteRequest};
use serde_json::Value;

use crate::backend::BackendApi;
use crate::error::Result;
use crate::extract::OperationBatch;
use crate::health::PauseHandle;

/// One operation paired with what the bridge said about it.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    pub operation: Value,
    pub result: OperationResult,
}

/// Outcome of a submitted batch, in batch order.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub target: SheetTarget,
    pub outcomes: Vec<OperationOutcome>,
    pub succeeded: usize,
    pub failed: usize,
}

impl WriteReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| !o.result.success)
    }
}

pub struct WriteExecutor {
    backend: Arc<dyn BackendApi>,
    target: SheetTarget,
    monitor: Option<PauseHandle>,
    quiescence: Duration,
}

impl WriteExecutor {
    /// `target` is the explicit workbook/sheet targeting; it wins over
    /// whatever the payload names.
    pub fn new(backend: Arc<dyn BackendApi>, target: SheetTarget) -> Self {
        Self {
            backend,
            target,
            monitor: None,
            quiescence: Duration::from_secs(2),
        }
    }

    /// Pause this health monitor while a batch is in flight.
    pub fn with_monitor(mut self, monitor: PauseHandle, quiescence: Duration) -> Self {
        self.monitor = Some(monitor);
        self.quiescence = quiescence;
        self
    }

    /// Send the batch in one request and pair each operation with its result.
    ///
    /// Failed operations are counted, not raised; only a failed request is an
    /// error.
    pub async fn execute(&self, batch: &OperationBatch) -> Result<WriteReport> {
        let target = self.target.clone().or(&batch.target);
        let request = WriteRequest {
            operations: batch.operations.clone(),
            target: target.clone(),
        };
        tracing::info!(operations = batch.len(), ?target, "submitting write batch");

        if let Some(monitor) = &self.monitor {
            monitor.pause();
        }
        let response = self.backend.write(&request).await;
        self.schedule_resume();
        let response = response?;

        if response.results.len() > batch.len() {
            tracing::debug!(
                extra = response.results.len() - batch.len(),
                "ignoring results without a matching operation"
            );
        }
        let mut results = response.results.into_iter();
        let outcomes: Vec<OperationOutcome> = batch
            .operations
            .iter()
            .map(|operation| OperationOutcome {
                operation: operation.clone(),
                result: results
                    .next()
                    .unwrap_or_else(|| OperationResult::failed("No result returned for operation")),
            })
            .collect();

        let succeeded = outcomes.iter().filter(|o| o.result.success).count();
        let failed = outcomes.len() - succeeded;
        if failed > 0 {
            tracing::warn!(succeeded, failed, "write batch partially failed");
            for outcome in outcomes.iter().filter(|o| !o.result.success) {
                tracing::debug!(
                    operation = %outcome.operation,
                    error = outcome.result.error.as_deref().unwrap_or("unknown error"),
                    "operation failed"
                );
            }
        } else {
            tracing::info!(succeeded, "write batch applied");
        }

        Ok(WriteReport {
            target,
            outcomes,
            succeeded,
            failed,
        })
    }

    fn schedule_resume(&self) {
        let Some(monitor) = self.monitor.clone() else {
            return;
        };
        let delay = self.quiescence;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            monitor.resume();
        });
    }
}
