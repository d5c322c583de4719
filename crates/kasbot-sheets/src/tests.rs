use super::*;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use kasbot_core::amount::Balance;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// What the fake Sheets API saw and how it should answer.
#[derive(Default)]
struct FakeSheets {
    sheets: Vec<(&'static str, i64)>,
    cell: Option<Value>,
    require_token: Option<&'static str>,
    seen_ranges: Mutex<Vec<String>>,
    seen_keys: Mutex<Vec<String>>,
}

type Shared = Arc<FakeSheets>;

fn authorized(state: &FakeSheets, headers: &HeaderMap) -> bool {
    match state.require_token {
        None => true,
        Some(token) => headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == format!("Bearer {token}")),
    }
}

async fn meta(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&state, &headers) {
        return (StatusCode::UNAUTHORIZED, "bad token").into_response();
    }
    if let Some(key) = query.get("key") {
        state.seen_keys.lock().unwrap().push(key.clone());
    }
    let sheets: Vec<Value> = state
        .sheets
        .iter()
        .map(|(title, index)| json!({"properties": {"title": title, "index": index}}))
        .collect();
    Json(json!({ "sheets": sheets })).into_response()
}

async fn values(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((_id, range)): Path<(String, String)>,
) -> Response {
    if !authorized(&state, &headers) {
        return (StatusCode::FORBIDDEN, "denied").into_response();
    }
    state.seen_ranges.lock().unwrap().push(range.clone());
    match &state.cell {
        Some(cell) => Json(json!({ "range": range, "values": [[cell]] })).into_response(),
        None => Json(json!({ "range": range, "majorDimension": "ROWS" })).into_response(),
    }
}

async fn spawn_fake(state: FakeSheets) -> (String, Shared) {
    let shared = Arc::new(state);
    let app = Router::new()
        .route("/spreadsheets/{id}", get(meta))
        .route("/spreadsheets/{id}/values/{range}", get(values))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), shared)
}

fn source(base_url: &str) -> SheetsSource {
    SheetsSource::new(SheetConfig {
        spreadsheet_id: "abc123".to_string(),
        range: "B2".to_string(),
        api_key: None,
        access_token: None,
        base_url: base_url.to_string(),
    })
}

#[test]
fn test_a1_range_quotes_title() {
    assert_eq!(a1_range("Sheet1", "B2"), "'Sheet1'!B2");
    assert_eq!(a1_range("Kas Harian", "A1"), "'Kas Harian'!A1");
    assert_eq!(a1_range("Bob's", "C3"), "'Bob''s'!C3");
}

#[tokio::test]
async fn test_fetch_reads_first_sheet_by_position() {
    let (url, fake) = spawn_fake(FakeSheets {
        sheets: vec![("Arsip", 1), ("Kas Harian", 0)],
        cell: Some(json!("Rp1.234.567")),
        ..Default::default()
    })
    .await;

    let amount = source(&url).fetch_latest_amount().await.unwrap();
    assert_eq!(amount.value, 1_234_567.0);
    assert_eq!(amount.display, "Rp1.234.567");
    assert_eq!(
        fake.seen_ranges.lock().unwrap().as_slice(),
        &["'Kas Harian'!B2".to_string()]
    );
}

#[tokio::test]
async fn test_fetch_negative_amount() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!("-Rp500")),
        ..Default::default()
    })
    .await;

    let amount = source(&url).fetch_latest_amount().await.unwrap();
    assert_eq!(amount.value, -500.0);
}

#[tokio::test]
async fn test_fetch_numeric_cell() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!(2500)),
        ..Default::default()
    })
    .await;

    let amount = source(&url).fetch_latest_amount().await.unwrap();
    assert_eq!(amount.value, 2500.0);
    assert_eq!(amount.display, "2500");
}

#[tokio::test]
async fn test_fetch_fractional_numeric_cell_keeps_scale() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!(1234.5)),
        ..Default::default()
    })
    .await;

    let amount = source(&url).fetch_latest_amount().await.unwrap();
    assert_eq!(amount.value, 1234.5);
    assert_eq!(amount.display, "1234.5");
}

#[tokio::test]
async fn test_fetch_negative_numeric_cell_is_deficit() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!(-20.25)),
        ..Default::default()
    })
    .await;

    let amount = source(&url).fetch_latest_amount().await.unwrap();
    assert_eq!(amount.value, -20.25);
    assert_eq!(amount.balance(), Balance::Deficit);
}

#[test]
fn test_amount_from_cell_rejects_other_types() {
    let err = amount_from_cell("'Sheet1'!A1", json!(true)).unwrap_err();
    assert!(matches!(err, KasbotError::Fetch(ref m) if m.contains("unexpected")));
}

#[tokio::test]
async fn test_fetch_empty_range_fails() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: None,
        ..Default::default()
    })
    .await;

    let err = source(&url).fetch_latest_amount().await.unwrap_err();
    assert!(matches!(err, KasbotError::Fetch(ref m) if m.contains("empty")), "{err}");
}

#[tokio::test]
async fn test_fetch_non_numeric_fails() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!("#REF!")),
        ..Default::default()
    })
    .await;

    let err = source(&url).fetch_latest_amount().await.unwrap_err();
    assert!(matches!(err, KasbotError::Fetch(_)));
}

#[tokio::test]
async fn test_fetch_no_sheets_fails() {
    let (url, _fake) = spawn_fake(FakeSheets::default()).await;

    let err = source(&url).fetch_latest_amount().await.unwrap_err();
    assert!(matches!(err, KasbotError::Fetch(ref m) if m.contains("no sheets")));
}

#[tokio::test]
async fn test_fetch_auth_failure() {
    let (url, _fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!("Rp1")),
        require_token: Some("good"),
        ..Default::default()
    })
    .await;

    let mut src = source(&url);
    src.config.access_token = Some("bad".to_string());
    let err = src.fetch_latest_amount().await.unwrap_err();
    assert!(matches!(err, KasbotError::Fetch(ref m) if m.contains("authentication")));

    src.config.access_token = Some("good".to_string());
    assert_eq!(src.fetch_latest_amount().await.unwrap().value, 1.0);
}

#[tokio::test]
async fn test_fetch_sends_api_key() {
    let (url, fake) = spawn_fake(FakeSheets {
        sheets: vec![("Sheet1", 0)],
        cell: Some(json!("Rp10")),
        ..Default::default()
    })
    .await;

    let mut src = source(&url);
    src.config.api_key = Some("AIza-test".to_string());
    src.fetch_latest_amount().await.unwrap();
    assert_eq!(
        fake.seen_keys.lock().unwrap().as_slice(),
        &["AIza-test".to_string()]
    );
}

#[tokio::test]
async fn test_fetch_unreachable() {
    // Port 9 (discard) on localhost is almost never listening.
    let src = source("http://127.0.0.1:9");
    let err = src.fetch_latest_amount().await.unwrap_err();
    assert!(matches!(err, KasbotError::Fetch(_)));
}
