//! End-to-end tests of the HTTP client against a real bridge on a local port.

use std::sync::Arc;

use gridchat_bridge::{bind_local, router, MemoryHost, SpreadsheetHost, DEFAULT_ALLOWED_ORIGIN};
use gridchat_client::{
    extract, BackendApi, ClientError, ContextFetcher, HttpBackend, WriteExecutor,
};
use gridchat_core::{Workbook, Worksheet};
use gridchat_protocol::{DataQuery, SheetTarget};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::oneshot;

struct Bridge {
    host: Arc<MemoryHost>,
    backend: HttpBackend,
    _shutdown: oneshot::Sender<()>,
}

async fn start(host: MemoryHost) -> Bridge {
    let host = Arc::new(host);
    let shared: Arc<dyn SpreadsheetHost> = host.clone();
    let app = router(shared, DEFAULT_ALLOWED_ORIGIN).unwrap();
    let (listener, addr) = bind_local().await.unwrap();
    let (tx, rx) = oneshot::channel::<()>();
    tokio::spawn(gridchat_bridge::run(listener, app, async move {
        let _ = rx.await;
    }));
    Bridge {
        host,
        backend: HttpBackend::new(&format!("http://{addr}")).unwrap(),
        _shutdown: tx,
    }
}

fn scores() -> MemoryHost {
    let mut sheet = Worksheet::new("Scores");
    let rows = [
        ["Name", "Age", "Score"],
        ["Alice", "25", "95.5"],
        ["Bob", "30", "87.2"],
    ];
    for (r, row) in rows.iter().enumerate() {
        for (c, field) in row.iter().enumerate() {
            sheet.set_at(r as u32, c as u16, gridchat_core::CellValue::detect(field));
        }
    }
    let host = MemoryHost::new();
    host.open(Workbook::with_sheets("Scores.xlsx", vec![sheet]).unwrap());
    host
}

#[tokio::test]
async fn test_health_and_data() {
    let bridge = start(scores()).await;

    let report = bridge.backend.health().await.unwrap();
    assert!(report.is_healthy());
    assert_eq!(report.workbook.as_deref(), Some("Scores.xlsx"));

    let data = bridge
        .backend
        .excel_data(&DataQuery::default())
        .await
        .unwrap();
    assert_eq!(data.shape, [2, 3]);
    assert_eq!(
        serde_json::Value::Object(data.data[1].clone()),
        json!({"Name": "Bob", "Age": 30, "Score": 87.2})
    );
    assert_eq!(data.cell_mapping.unwrap()["C2"], json!(95.5));
}

#[tokio::test]
async fn test_unhealthy_bridge_is_a_report() {
    let bridge = start(MemoryHost::new()).await;
    let report = bridge.backend.health().await.unwrap();
    assert!(!report.is_healthy());
    assert_eq!(report.error.as_deref(), Some("No active workbook found"));
}

#[tokio::test]
async fn test_backend_error_message_is_surfaced() {
    let bridge = start(scores()).await;
    let query = DataQuery::for_target(&SheetTarget::new(None, Some("Missing".into())));
    let err = bridge.backend.excel_data(&query).await.unwrap_err();
    match err {
        ClientError::Backend { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Sheet 'Missing' not found in workbook 'Scores.xlsx'");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_context_fetch() {
    let bridge = start(scores()).await;
    let fetcher = ContextFetcher::new(Arc::new(bridge.backend.clone()), 3);
    let data = fetcher.fetch(&SheetTarget::default()).await.unwrap();
    assert_eq!(data.sheet, "Scores");
}

#[tokio::test]
async fn test_reply_to_sheet() {
    let bridge = start(scores()).await;
    let reply = r#"I'll add a header and an average.

```json
{
  "operations": [
    {"type": "write_cell", "cell": "D1", "value": "Passed"},
    {"type": "write_range", "range": "D2", "values": [[true], [false]]},
    {"type": "write_cell", "cell": "??", "value": 1},
    {"type": "insert_formula", "cell": "C4", "formula": "AVERAGE(C2:C3)"}
  ]
}
```"#;

    let batch = extract(reply).unwrap();
    let executor = WriteExecutor::new(Arc::new(bridge.backend.clone()), SheetTarget::default());
    let report = executor.execute(&batch).await.unwrap();

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.outcomes[2].operation["cell"], "??");
    assert_eq!(
        report.outcomes[0].result.message.as_deref(),
        Some("Written 'Passed' to cell D1")
    );

    let sheet = bridge
        .host
        .snapshot(&SheetTarget::default())
        .unwrap()
        .worksheet;
    assert_eq!(sheet.used_range().unwrap().to_string(), "A1:D4");
    assert_eq!(sheet.value_at(3, 2).to_string(), "=AVERAGE(C2:C3)");
}

#[tokio::test]
async fn test_empty_batch_is_an_empty_success() {
    let bridge = start(scores()).await;
    let batch = extract("Nothing to change.\n{\"operations\": []}").unwrap();
    assert!(batch.is_empty());

    let executor = WriteExecutor::new(Arc::new(bridge.backend.clone()), SheetTarget::default());
    let report = executor.execute(&batch).await.unwrap();
    assert!(report.all_succeeded());
    assert!(report.outcomes.is_empty());
}
