//! Scripted fakes for the client's collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use gridchat_protocol::{
    DataQuery, HealthReport, OperationResult, SheetData, WriteRequest, WriteResponse,
};
use serde_json::{json, Map, Value};
use tokio::sync::Notify;

use crate::backend::BackendApi;
use crate::completion::{ChatMessage, CompletionApi};
use crate::error::{ClientError, Result};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn sample_sheet() -> SheetData {
    let rows = [("North", 120.0), ("South", 95.5)];
    let data = rows
        .iter()
        .map(|(region, total)| {
            let mut row = Map::new();
            row.insert("Region".into(), json!(region));
            row.insert("Total".into(), json!(total));
            row
        })
        .collect();
    SheetData {
        workbook: "Sales.xlsx".into(),
        sheet: "Data".into(),
        shape: [2, 2],
        data,
        cell_mapping: None,
    }
}

pub struct FakeBackend {
    scripted_health: Mutex<VecDeque<HealthReport>>,
    health_error: Mutex<Option<String>>,
    data: Mutex<Option<SheetData>>,
    write_results: Mutex<Option<Vec<OperationResult>>>,
    write_error: Mutex<Option<(u16, String)>>,
    writes: Mutex<Vec<WriteRequest>>,
    health_calls: AtomicUsize,
    data_calls: AtomicUsize,
}

impl FakeBackend {
    /// Always healthy, serving `sample_sheet()`; every write succeeds.
    pub fn healthy() -> Self {
        Self {
            scripted_health: Mutex::new(VecDeque::new()),
            health_error: Mutex::new(None),
            data: Mutex::new(Some(sample_sheet())),
            write_results: Mutex::new(None),
            write_error: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            health_calls: AtomicUsize::new(0),
            data_calls: AtomicUsize::new(0),
        }
    }

    /// Reports returned by the next health probes, before falling back to healthy.
    pub fn script_health(&self, reports: impl IntoIterator<Item = HealthReport>) {
        lock(&self.scripted_health).extend(reports);
    }

    pub fn fail_health(&self, message: &str) {
        *lock(&self.health_error) = Some(message.to_string());
    }

    pub fn set_write_results(&self, results: Vec<OperationResult>) {
        *lock(&self.write_results) = Some(results);
    }

    pub fn fail_write(&self, status: u16, message: &str) {
        *lock(&self.write_error) = Some((status, message.to_string()));
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn data_calls(&self) -> usize {
        self.data_calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> Vec<WriteRequest> {
        lock(&self.writes).clone()
    }
}

#[async_trait]
impl BackendApi for FakeBackend {
    async fn health(&self) -> Result<HealthReport> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = lock(&self.health_error).clone() {
            return Err(ClientError::InvalidResponse(message));
        }
        Ok(lock(&self.scripted_health)
            .pop_front()
            .unwrap_or_else(|| HealthReport::healthy("Sales.xlsx")))
    }

    async fn excel_data(&self, _query: &DataQuery) -> Result<SheetData> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.data).clone().ok_or(ClientError::Backend {
            status: 404,
            message: "No data found in worksheet".into(),
        })
    }

    async fn write(&self, request: &WriteRequest) -> Result<WriteResponse> {
        lock(&self.writes).push(request.clone());
        if let Some((status, message)) = lock(&self.write_error).clone() {
            return Err(ClientError::Backend { status, message });
        }
        let results = lock(&self.write_results).clone().unwrap_or_else(|| {
            request
                .operations
                .iter()
                .map(|_| OperationResult::ok("done"))
                .collect()
        });
        Ok(WriteResponse { results })
    }
}

/// Replies with queued texts; can be made to wait for a release signal.
pub struct FakeCompletion {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    gate: Mutex<Option<std::sync::Arc<Notify>>>,
}

impl FakeCompletion {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        }
    }

    /// Make the next completion wait until the returned notify fires.
    pub fn hold_next(&self) -> std::sync::Arc<Notify> {
        let notify = std::sync::Arc::new(Notify::new());
        *lock(&self.gate) = Some(notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl CompletionApi for FakeCompletion {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        lock(&self.requests).push(messages.to_vec());
        let reply = lock(&self.replies)
            .pop_front()
            .ok_or_else(|| ClientError::InvalidResponse("no reply queued".into()))?;
        let gate = lock(&self.gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(reply)
    }
}

pub fn op(cell: &str, value: Value) -> Value {
    json!({"type": "write_cell", "cell": cell, "value": value})
}
