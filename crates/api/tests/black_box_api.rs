use chrono::{Days, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use fleetstock_infra::{InventoryServices, LedgerConfig};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over fresh in-memory services, on an ephemeral port.
        let app = fleetstock_api::app::router_with(InventoryServices::in_memory(LedgerConfig::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Category + item, returning the item id.
async fn seed_item(srv: &TestServer, client: &reqwest::Client, usable: u32) -> String {
    let (status, category) = post(client, srv.url("/categories"), json!({ "name": "Consumable" })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, item) = post(
        client,
        srv.url("/items"),
        json!({
            "name": "Engine oil 5W-30",
            "unit": "litre",
            "reorder_level": 5,
            "category_id": category["id"],
            "initial_stock": { "total_received": usable, "usable": usable }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{item}");
    item["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn stock_lifecycle_intake_request_query() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let item_id = seed_item(&srv, &client, 10).await;
    assert_eq!(item_id, "ITEM-00001");

    let soon = Utc::now().date_naive() + Days::new(30);
    let (status, batch) = post(
        &client,
        srv.url(&format!("/items/{item_id}/batches")),
        json!({ "total_received": 6, "usable": 4, "defective": 1, "missing": 1, "expiration_date": soon }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{batch}");
    assert_eq!(batch["id"], "BAT-00002");

    let (status, request) = post(
        &client,
        srv.url("/requests"),
        json!({
            "requester": "EMP-001",
            "item_id": item_id,
            "request_type": "CONSUME",
            "quantity": 6,
            "purpose": "oil change, bus 14"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{request}");
    assert_eq!(request["status"], "CONSUMED");

    // The dated batch drains first.
    let (_, batches) = get(&client, srv.url(&format!("/items/{item_id}/batches"))).await;
    let usable: Vec<u64> = batches
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["usable_quantity"].as_u64().unwrap())
        .collect();
    assert_eq!(usable, vec![8, 0]);

    let (status, item) = get(&client, srv.url(&format!("/items/{item_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["current_stock"], 8);
    assert_eq!(item["effective_status"], "AVAILABLE");

    let (status, err) = post(
        &client,
        srv.url(&format!("/items/{item_id}/deduct")),
        json!({ "quantity": 50 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["error"], "insufficient_stock");
    assert_eq!(err["available"], 8);

    let (_, listed) = get(&client, srv.url("/items?status=AVAILABLE&sort=current_stock&order=desc")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn borrow_can_only_be_returned_once() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let item_id = seed_item(&srv, &client, 3).await;

    let (status, request) = post(
        &client,
        srv.url("/requests"),
        json!({
            "requester": "EMP-002",
            "item_id": item_id,
            "request_type": "BORROW",
            "quantity": 1,
            "purpose": "workshop"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "NOT_RETURNED");
    let id = request["id"].as_str().unwrap().to_string();

    let (status, returned) = post(&client, srv.url(&format!("/requests/{id}/return")), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "RETURNED");

    let (status, err) = post(&client, srv.url(&format!("/requests/{id}/return")), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["error"], "invalid_transition");

    let (_, item) = get(&client, srv.url(&format!("/items/{item_id}"))).await;
    assert_eq!(item["current_stock"], 2);
}

#[tokio::test]
async fn malformed_and_unknown_ids() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, err) = get(&client, srv.url("/items/oil")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_id");

    let (status, err) = get(&client, srv.url("/items/BAT-00001")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["error"], "invalid_id");

    let (status, err) = get(&client, srv.url("/items/ITEM-00042")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["error"], "not_found");
}

#[tokio::test]
async fn bulk_intake_reports_partial_failure() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let item_id = seed_item(&srv, &client, 1).await;

    let (status, report) = post(
        &client,
        srv.url("/batches/bulk"),
        json!([
            { "item_id": item_id, "total_received": 5, "usable": 5 },
            { "item_id": item_id, "total_received": 5, "usable": 3 },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(report["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(report["failures"][0]["index"], 1);
    assert!(report["warning"].as_str().unwrap().contains("1 of 2"));
}

#[tokio::test]
async fn maintenance_override_masks_status() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let item_id = seed_item(&srv, &client, 2).await;

    let res = client
        .put(srv.url(&format!("/items/{item_id}/override")))
        .json(&json!({ "status": "UNDER_MAINTENANCE" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["effective_status"], "UNDER_MAINTENANCE");
    assert_eq!(item["status"], "LOW_STOCK");

    let res = client
        .delete(srv.url(&format!("/items/{item_id}/override")))
        .send()
        .await
        .unwrap();
    let item: Value = res.json().await.unwrap();
    assert_eq!(item["effective_status"], "LOW_STOCK");
}
