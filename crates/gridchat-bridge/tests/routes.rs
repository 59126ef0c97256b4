//! Route-level tests for the bridge, driven through the router without a socket.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gridchat_bridge::{router, HostError, MemoryHost, SheetSnapshot, SpreadsheetHost};
use gridchat_core::{Workbook, Worksheet};
use gridchat_protocol::{OperationResult, SheetTarget};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

const ORIGIN: &str = "https://localhost:3000";

/// A host standing in for a machine without a running spreadsheet app.
struct UnavailableHost;

impl SpreadsheetHost for UnavailableHost {
    fn active_workbook(&self) -> Result<String, HostError> {
        Err(HostError::NotRunning)
    }

    fn snapshot(&self, _target: &SheetTarget) -> Result<SheetSnapshot, HostError> {
        Err(HostError::NotRunning)
    }

    fn apply(
        &self,
        _target: &SheetTarget,
        _operations: &[Value],
    ) -> Result<Vec<OperationResult>, HostError> {
        Err(HostError::NotRunning)
    }
}

fn sales_host() -> Arc<MemoryHost> {
    let mut data = Worksheet::new("Data");
    for (cell, value) in [("A1", "Region"), ("B1", "Total"), ("A2", "North"), ("A3", "South")] {
        data.set_cell(cell, value).unwrap();
    }
    data.set_cell("B2", 120.0).unwrap();
    data.set_cell("B3", 95.5).unwrap();

    let host = MemoryHost::new();
    host.open(Workbook::with_sheets("Sales.xlsx", vec![data, Worksheet::new("Notes")]).unwrap());
    Arc::new(host)
}

fn app(host: Arc<dyn SpreadsheetHost>) -> Router {
    router(host, ORIGIN).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_active_workbook() {
    let (status, body) = send(app(sales_host()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "workbook": "Sales.xlsx"}));
}

#[tokio::test]
async fn test_health_without_spreadsheet_app() {
    let (status, body) = send(app(Arc::new(UnavailableHost)), get("/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body,
        json!({"status": "unhealthy", "error": "No Excel application running"})
    );
}

#[tokio::test]
async fn test_health_without_workbook() {
    let (status, body) = send(app(Arc::new(MemoryHost::new())), get("/health")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "No active workbook found");
}

#[tokio::test]
async fn test_excel_data_with_cell_mapping() {
    let (status, body) = send(app(sales_host()), get("/api/excel-data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["workbook"], "Sales.xlsx");
    assert_eq!(body["sheet"], "Data");
    assert_eq!(body["shape"], json!([2, 2]));
    assert_eq!(
        body["data"],
        json!([
            {"Region": "North", "Total": 120},
            {"Region": "South", "Total": 95.5},
        ])
    );
    assert_eq!(
        body["cell_mapping"],
        json!({"A2": "North", "B2": 120, "A3": "South", "B3": 95.5})
    );
}

#[tokio::test]
async fn test_excel_data_without_cell_mapping() {
    let (status, body) = send(
        app(sales_host()),
        get("/api/excel-data?include_cell_mapping=false"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("cell_mapping").map_or(true, Value::is_null));
}

#[tokio::test]
async fn test_excel_data_empty_sheet() {
    let (status, body) = send(app(sales_host()), get("/api/excel-data?sheet=Notes")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No data found in worksheet"}));
}

#[tokio::test]
async fn test_excel_data_unknown_workbook() {
    let (status, body) = send(app(sales_host()), get("/api/excel-data?workbook=Other.xlsx")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Workbook 'Other.xlsx' not found");
}

#[tokio::test]
async fn test_excel_data_without_spreadsheet_app() {
    let (status, _) = send(app(Arc::new(UnavailableHost)), get("/api/excel-data")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_write_reports_each_operation() {
    let host = sales_host();
    let request = post_json(
        "/api/write-excel",
        json!({
            "operations": [
                {"type": "write_cell", "cell": "C1", "value": "Target"},
                {"type": "explode"},
                {"type": "insert_formula", "cell": "B4", "formula": "SUM(B2:B3)"},
            ]
        }),
    );
    let (status, body) = send(app(host.clone()), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"results": [
            {"success": true, "message": "Written 'Target' to cell C1"},
            {"success": false, "error": "Unknown operation type: explode"},
            {"success": true, "message": "Inserted formula '=SUM(B2:B3)' into cell B4"},
        ]})
    );

    let snapshot = host.snapshot(&SheetTarget::default()).unwrap();
    assert_eq!(snapshot.worksheet.value_at(0, 2).to_string(), "Target");
}

#[tokio::test]
async fn test_write_targets_named_sheet() {
    let host = sales_host();
    let request = post_json(
        "/api/write-excel",
        json!({
            "sheet": "Notes",
            "operations": [{"type": "write_range", "range": "A1", "values": [["a", "b"]]}],
        }),
    );
    let (status, _) = send(app(host.clone()), request).await;
    assert_eq!(status, StatusCode::OK);

    let notes = host
        .snapshot(&SheetTarget::new(None, Some("Notes".into())))
        .unwrap();
    assert_eq!(notes.worksheet.used_range().unwrap().to_string(), "A1:B1");
}

#[tokio::test]
async fn test_write_without_operations() {
    let (status, body) = send(
        app(sales_host()),
        post_json("/api/write-excel", json!({"sheet": "Data"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No operations provided"}));
}

#[tokio::test]
async fn test_write_empty_batch() {
    let host = sales_host();
    let (status, body) = send(
        app(host.clone()),
        post_json("/api/write-excel", json!({"operations": []})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"results": []}));

    let (status, body) = send(
        app(host),
        post_json(
            "/api/write-excel",
            json!({"operations": [], "sheet": "Missing"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Missing"));
}

#[tokio::test]
async fn test_cors_allows_addin_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/write-excel")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app(sales_host()).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        ORIGIN
    );
}
