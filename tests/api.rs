use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use storefront_sales::api::{router, AppState};
use storefront_sales::domain::value_objects::Balance;
use storefront_sales::{MemoryStore, SalesStore};
use tower::ServiceExt;

fn app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    let app = router(AppState::new(store.clone(), None));
    (store, app)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request.header("content-type", "application/json").body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn add_good(app: &Router, name: &str, price: f64, count: i64) {
    let (status, _) = send(app, "POST", "/goods", Some(json!({"name": name, "price": price, "count": count}))).await;
    assert_eq!(status, StatusCode::CREATED);
}

fn fund(store: &MemoryStore, username: &str, amount: i64) {
    store.put_wallet(username, Balance::new(Decimal::new(amount, 0)).unwrap()).unwrap();
}

#[tokio::test]
async fn test_health() {
    let (_, app) = app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_sale_succeeds() {
    let (store, app) = app();
    add_good(&app, "Widget", 10.0, 2).await;
    fund(&store, "alice", 25);

    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "alice", "good_name": "Widget"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Purchase successful", "remaining_balance": 15.0, "purchased_item": "Widget"}));

    let (_, good) = send(&app, "GET", "/goods/Widget", None).await;
    assert_eq!(good["count"], 1);
    let (_, wallet) = send(&app, "GET", "/wallets/alice", None).await;
    assert_eq!(wallet["balance"], 15.0);
    assert_eq!(store.purchases().unwrap().len(), 1);
}

#[tokio::test]
async fn test_sale_of_unknown_good_is_404() {
    let (store, app) = app();
    fund(&store, "alice", 25);
    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "alice", "good_name": "Gizmo"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Good not available");
}

#[tokio::test]
async fn test_sale_out_of_stock_is_400_without_side_effects() {
    let (store, app) = app();
    add_good(&app, "Widget", 10.0, 0).await;
    fund(&store, "alice", 25);

    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "alice", "good_name": "Widget"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Good is out of stock");
    let (_, wallet) = send(&app, "GET", "/wallets/alice", None).await;
    assert_eq!(wallet["balance"], 25.0);
    assert!(store.purchases().unwrap().is_empty());
}

#[tokio::test]
async fn test_sale_insufficient_balance_is_400() {
    let (store, app) = app();
    add_good(&app, "Widget", 10.0, 2).await;
    fund(&store, "alice", 5);

    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "alice", "good_name": "Widget"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Insufficient balance");
    let (_, good) = send(&app, "GET", "/goods/Widget", None).await;
    assert_eq!(good["count"], 2);
}

// Same status as a short balance, different detail.
#[tokio::test]
async fn test_sale_unknown_user_is_400() {
    let (_, app) = app();
    add_good(&app, "Widget", 10.0, 2).await;
    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "ghost", "good_name": "Widget"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "User not found");
}

#[tokio::test]
async fn test_sale_with_empty_fields_is_rejected() {
    let (_, app) = app();
    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "", "good_name": "Widget"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_goods_listing_hides_sold_out() {
    let (store, app) = app();
    add_good(&app, "Widget", 10.0, 1).await;
    add_good(&app, "Gadget", 699.99, 50).await;
    fund(&store, "alice", 100);

    let (status, body) = send(&app, "GET", "/goods", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"name": "Gadget", "price": 699.99}, {"name": "Widget", "price": 10.0}]));

    send(&app, "POST", "/sales", Some(json!({"username": "alice", "good_name": "Widget"}))).await;
    let (_, body) = send(&app, "GET", "/goods", None).await;
    assert_eq!(body, json!([{"name": "Gadget", "price": 699.99}]));
}

#[tokio::test]
async fn test_add_good_twice_is_400() {
    let (store, app) = app();
    add_good(&app, "Widget", 10.0, 1).await;
    let (status, body) = send(&app, "POST", "/goods", Some(json!({"name": "Widget", "price": 12.0, "count": 3}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Good already exists");
    let good = store.find_good("Widget").await.unwrap().unwrap();
    assert_eq!(good.count().value(), 1);
}

#[tokio::test]
async fn test_add_good_validation() {
    let (_, app) = app();
    for body in [
        json!({"name": "", "price": 1.0, "count": 1}),
        json!({"name": "Widget", "price": -1.0, "count": 1}),
        json!({"name": "Widget", "price": 1.0, "count": -1}),
        json!({"name": "   ", "price": 1.0, "count": 1}),
    ] {
        let (status, _) = send(&app, "POST", "/goods", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_good_details() {
    let (_, app) = app();
    let (status, _) = send(&app, "POST", "/goods", Some(json!({"name": "Smartphone", "price": 699.99, "count": 50, "description": "128GB"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "GET", "/goods/Smartphone", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "Smartphone", "price": 699.99, "description": "128GB", "count": 50}));

    let (status, body) = send(&app, "GET", "/goods/Nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Good not found");
}

#[tokio::test]
async fn test_unknown_wallet_is_404() {
    let (_, app) = app();
    let (status, _) = send(&app, "GET", "/wallets/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_for_last_unit() {
    let (store, app) = app();
    add_good(&app, "Widget", 10.0, 1).await;
    for i in 0..16 {
        fund(&store, &format!("buyer{i}"), 50);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..16 {
        let app = app.clone();
        tasks.spawn(async move {
            send(&app, "POST", "/sales", Some(json!({"username": format!("buyer{i}"), "good_name": "Widget"}))).await.0
        });
    }
    let mut ok = 0;
    while let Some(status) = tasks.join_next().await {
        let status = status.unwrap();
        if status == StatusCode::OK {
            ok += 1;
        } else {
            assert!(status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT, "unexpected {status}");
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(store.purchases().unwrap().len(), 1);
    let (_, good) = send(&app, "GET", "/goods/Widget", None).await;
    assert_eq!(good["count"], 0);
}

async fn post_raw(app: &Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder().method("POST").uri(uri).header("content-type", "application/json").body(Body::from(body)).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_missing_field_gets_json_error() {
    let (_, app) = app();
    let (status, body) = send(&app, "POST", "/sales", Some(json!({"username": "alice"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["detail"].as_str().unwrap().contains("good_name"));
}

#[tokio::test]
async fn test_malformed_json_gets_json_error() {
    let (_, app) = app();
    let (status, body) = post_raw(&app, "/goods", r#"{"name": "Widget", "price": "#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn test_price_must_fit_money_column() {
    let (store, app) = app();
    for price in [json!(0.004), json!(1000000000000u64), json!(10.555)] {
        let (status, body) = send(&app, "POST", "/goods", Some(json!({"name": "Widget", "price": price, "count": 1}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "price {price}");
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
    assert!(store.find_good("Widget").await.unwrap().is_none());

    let (status, _) = post_raw(&app, "/goods", r#"{"name": "Yacht", "price": 999999999999.99, "count": 1}"#).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_multibyte_name_within_limit() {
    let (store, app) = app();
    let name = "é".repeat(150);
    let (status, _) = send(&app, "POST", "/goods", Some(json!({"name": name, "price": 1.0, "count": 1}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(store.find_good(&name).await.unwrap().is_some());

    let too_long = "é".repeat(201);
    let (status, _) = send(&app, "POST", "/goods", Some(json!({"name": too_long, "price": 1.0, "count": 1}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_wallet_add_and_deduct() {
    let (store, app) = app();
    fund(&store, "alice", 10);

    let (status, body) = send(&app, "POST", "/wallets/alice/add", Some(json!({"amount": 15.5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"username": "alice", "balance": 25.5}));

    let (status, body) = send(&app, "POST", "/wallets/alice/deduct", Some(json!({"amount": 30}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Insufficient balance");

    let (status, body) = send(&app, "POST", "/wallets/alice/deduct", Some(json!({"amount": 25.5}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], 0.0);
}

#[tokio::test]
async fn test_wallet_transaction_rejections() {
    let (store, app) = app();
    fund(&store, "alice", 10);

    let (status, body) = send(&app, "POST", "/wallets/ghost/add", Some(json!({"amount": 5}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "User not found");
    let (status, _) = send(&app, "POST", "/wallets/ghost/deduct", Some(json!({"amount": 5}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for amount in [json!(0), json!(-5), json!(0.001)] {
        let (status, _) = send(&app, "POST", "/wallets/alice/add", Some(json!({"amount": amount}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "amount {amount}");
    }
    let (status, body) = send(&app, "POST", "/wallets/alice/add", Some(json!({"amount": 999999999999.99}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Balance limit exceeded");

    let (_, wallet) = send(&app, "GET", "/wallets/alice", None).await;
    assert_eq!(wallet["balance"], 10.0);
}
