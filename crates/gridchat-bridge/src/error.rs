//! Error types for the bridge backend.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gridchat_protocol::ErrorBody;
use thiserror::Error;

/// Errors a spreadsheet host reports while resolving a request.
///
/// The display text is what the client sees in the `error` field, so it is
/// phrased for the user rather than for a log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("No Excel application running")]
    NotRunning,

    #[error("No active workbook found")]
    NoActiveWorkbook,

    #[error("Workbook '{0}' not found")]
    WorkbookNotFound(String),

    #[error("Sheet '{sheet}' not found in workbook '{workbook}'")]
    SheetNotFound { sheet: String, workbook: String },

    #[error("No active worksheet found")]
    NoActiveSheet,

    #[error("No data found in worksheet")]
    NoData,

    #[error("No operations provided")]
    NoOperations,

    #[error("{0}")]
    Internal(String),
}

impl HostError {
    pub fn status(&self) -> StatusCode {
        match self {
            HostError::NotRunning => StatusCode::SERVICE_UNAVAILABLE,
            HostError::NoOperations => StatusCode::BAD_REQUEST,
            HostError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HostError::NoActiveWorkbook
            | HostError::WorkbookNotFound(_)
            | HostError::SheetNotFound { .. }
            | HostError::NoActiveSheet
            | HostError::NoData => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for HostError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, "bridge request failed: {self}");
        } else {
            tracing::debug!(%status, "bridge request rejected: {self}");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors starting or running the bridge server.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid allowed origin '{0}'")]
    InvalidOrigin(String),

    #[error("Failed to load workbook: {0}")]
    Load(#[from] gridchat_core::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
