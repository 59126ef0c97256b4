//! HTTP routes of the bridge.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gridchat_protocol::{
    DataQuery, HealthReport, SheetData, SheetTarget, WriteResponse, DEFAULT_PORT, EXCEL_DATA_PATH,
    HEALTH_PATH, WRITE_EXCEL_PATH,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{BridgeError, HostError, Result};
use crate::host::SpreadsheetHost;
use crate::table;

/// Origin of the add-in pane served by the Office dev server.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://localhost:3000";

/// Where the bridge listens and who may call it.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

type SharedHost = Arc<dyn SpreadsheetHost>;

/// Build the bridge router around a host.
pub fn router(host: SharedHost, allowed_origin: &str) -> Result<Router> {
    let origin = HeaderValue::from_str(allowed_origin)
        .map_err(|_| BridgeError::InvalidOrigin(allowed_origin.to_string()))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Ok(Router::new()
        .route(HEALTH_PATH, get(health))
        .route(EXCEL_DATA_PATH, get(excel_data))
        .route(WRITE_EXCEL_PATH, post(write_excel))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(host))
}

/// Bind `config.host:config.port` and serve until Ctrl-C.
pub async fn serve(config: &BridgeConfig, host: SharedHost) -> Result<()> {
    let app = router(host, &config.allowed_origin)?;
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        origin = %config.allowed_origin,
        "bridge listening"
    );
    run(listener, app, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("shutting down bridge");
    })
    .await
}

/// Serve `app` on an already bound listener until `shutdown` resolves.
pub async fn run(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind an ephemeral local port, returning the listener and its address.
pub async fn bind_local() -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

/// Run a host call off the async runtime.
async fn blocking<T, F>(host: SharedHost, f: F) -> std::result::Result<T, HostError>
where
    T: Send + 'static,
    F: FnOnce(&dyn SpreadsheetHost) -> std::result::Result<T, HostError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(host.as_ref()))
        .await
        .map_err(|e| HostError::Internal(format!("host task failed: {e}")))?
}

async fn health(State(host): State<SharedHost>) -> Response {
    match blocking(host, |h| h.active_workbook()).await {
        Ok(workbook) => Json(HealthReport::healthy(workbook)).into_response(),
        Err(e) => (e.status(), Json(HealthReport::unhealthy(e.to_string()))).into_response(),
    }
}

async fn excel_data(
    State(host): State<SharedHost>,
    Query(query): Query<DataQuery>,
) -> std::result::Result<Json<SheetData>, HostError> {
    let target = query.target();
    let include_cell_mapping = query.include_cell_mapping.unwrap_or(true);
    tracing::debug!(?target, include_cell_mapping, "reading sheet data");

    let data = blocking(host, move |h| {
        let snapshot = h.snapshot(&target)?;
        table::sheet_data(&snapshot.workbook, &snapshot.worksheet, include_cell_mapping)
    })
    .await?;
    Ok(Json(data))
}

async fn write_excel(
    State(host): State<SharedHost>,
    body: Bytes,
) -> std::result::Result<(StatusCode, Json<WriteResponse>), HostError> {
    let (target, operations) = parse_write_body(&body)?;
    tracing::info!(?target, count = operations.len(), "applying write operations");

    let results = blocking(host, move |h| h.apply(&target, &operations)).await?;

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        tracing::warn!(failed, total = results.len(), "some write operations failed");
    }
    Ok((StatusCode::OK, Json(WriteResponse { results })))
}

/// Pull the target and the raw operations out of a write body.
///
/// Anything without a non-empty `operations` array is rejected as a whole;
/// individual operations are validated later, one result each.
fn parse_write_body(body: &[u8]) -> std::result::Result<(SheetTarget, Vec<Value>), HostError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| HostError::NoOperations)?;
    let operations = match value.get("operations") {
        Some(Value::Array(ops)) => ops.clone(),
        _ => return Err(HostError::NoOperations),
    };
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    Ok((SheetTarget::new(field("workbook"), field("sheet")), operations))
}
