use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use pos_client::{ClientError, PosApiClient, PosBackend, PurchaseList};
use pos_core::{ApiConfig, Product, PurchaseRequest, PurchaseResponse, TerminalConfig};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Captured = Arc<Mutex<Vec<PurchaseRequest>>>;

fn pen() -> Product {
    Product {
        product_id: 7,
        product_code: "4901681143115".to_string(),
        product_name: "Pen".to_string(),
        product_price: 150,
        color: "black".to_string(),
        item_code: "P-7".to_string(),
        full_name: "Gel ink pen 0.5mm".to_string(),
    }
}

async fn product(Path(code): Path<String>) -> Response {
    match code.as_str() {
        "4901681143115" => Json(pen()).into_response(),
        "00000000" => Json(serde_json::Value::Null).into_response(),
        "11111111" => (StatusCode::OK, "").into_response(),
        "22222222" => (StatusCode::INTERNAL_SERVER_ERROR, "database down").into_response(),
        "33333333" => (StatusCode::OK, "<html>").into_response(),
        "44444444" => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(pen()).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn purchase(
    State(captured): State<Captured>,
    Json(request): Json<PurchaseRequest>,
) -> Json<PurchaseResponse> {
    let total: i64 = request.items.iter().map(|line| line.product_price).sum();
    captured.lock().unwrap().push(request);
    Json(PurchaseResponse {
        success: true,
        total_amount: total,
        total_amount_ex_tax: Some(total * 10 / 11),
        tax_amount: Some(total - total * 10 / 11),
        transaction_id: Some(1001),
        message: None,
    })
}

async fn spawn_server(captured: Captured) -> String {
    let router = Router::new()
        .route("/api/products/{code}", get(product))
        .route("/api/purchase", post(purchase))
        .with_state(captured);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

fn client(base_url: String, timeout_ms: u64) -> PosApiClient {
    PosApiClient::new(&ApiConfig {
        base_url,
        timeout_ms,
    })
    .expect("client")
}

#[tokio::test]
async fn test_lookup_found() {
    let base = spawn_server(Captured::default()).await;
    let client = client(base, 5_000);

    let found = client
        .lookup_product("4901681143115")
        .await
        .expect("lookup")
        .expect("registered");
    assert_eq!(found, pen());
}

#[tokio::test]
async fn test_lookup_not_found_variants() {
    let base = spawn_server(Captured::default()).await;
    let client = client(base, 5_000);

    for code in ["00000000", "11111111", "99999999"] {
        let result = client.lookup_product(code).await.expect("lookup");
        assert!(result.is_none(), "{code} should not be found");
    }
}

#[tokio::test]
async fn test_lookup_server_error() {
    let base = spawn_server(Captured::default()).await;
    let client = client(base, 5_000);

    match client.lookup_product("22222222").await {
        Err(ClientError::ApiError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database down");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lookup_malformed_body() {
    let base = spawn_server(Captured::default()).await;
    let client = client(base, 5_000);

    let err = client.lookup_product("33333333").await.expect_err("bad body");
    assert!(matches!(err, ClientError::ParseError { .. }));
}

#[tokio::test]
async fn test_lookup_times_out() {
    let base = spawn_server(Captured::default()).await;
    let client = client(base, 200);

    let err = client.lookup_product("44444444").await.expect_err("timeout");
    assert!(matches!(err, ClientError::Network(ref e) if e.is_timeout()));
}

#[tokio::test]
async fn test_connection_refused() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = client(format!("http://{addr}"), 1_000);
    let err = client.lookup_product("49016811").await.expect_err("refused");
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn test_submit_purchase_expands_units() {
    let captured = Captured::default();
    let base = spawn_server(Arc::clone(&captured)).await;
    let client = client(base, 5_000);

    let mut list = PurchaseList::new();
    list.add(pen());
    list.add(pen());
    let request = list.build_request(&TerminalConfig::default());

    let response = client.submit_purchase(&request).await.expect("purchase");
    assert!(response.success);
    assert_eq!(response.total_amount, 300);
    assert_eq!(response.transaction_id, Some(1001));

    let received = captured.lock().unwrap().clone();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].items.len(), 2);
    assert_eq!(received[0].items[0].product_name, "Gel ink pen 0.5mm");
    assert_eq!(received[0].store_code.as_deref(), Some("30"));
}
