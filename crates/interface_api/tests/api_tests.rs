//! Router-level tests against the in-memory store

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use core_kernel::{Currency, ProductId, StoreId, TenantId};
use interface_api::{create_router, AppState, MasterData};
use test_utils::{MasterDataFixtures, MemoryPostingStore, TemporalFixtures};

const TENANT: &str = "6b7f1d32-30dc-4a69-b8f7-2a3c70a9c01d";
const USER: &str = "f2b9b7f4-9f07-4d33-9d52-02c40c1a67e8";

fn test_state(store: Arc<MemoryPostingStore>) -> AppState {
    let cash = MasterDataFixtures::cash_payment_type();
    let master = MasterData {
        system_currency: Currency::USD,
        accounts: MasterDataFixtures::accounts(),
        tax_codes: HashMap::new(),
        payment_types: HashMap::from([(cash.id, cash)]),
        loyalty: None,
        period: TemporalFixtures::open_period(),
    };
    AppState::new(store, master)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-tenant-id", TENANT)
        .header("x-user-id", USER)
        .header("x-user-name", "Test Clerk")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn document_body(product_id: Uuid, store_id: Uuid) -> Value {
    json!({
        "customerId": Uuid::new_v4(),
        "storeId": store_id,
        "currency": "USD",
        "exchangeRate": "1",
        "documentDate": "2026-03-10",
        "dueDate": "2099-04-10",
        "lines": [{
            "productId": product_id,
            "description": "Widget",
            "quantity": "10",
            "unitPrice": "100",
            "taxAmount": "100"
        }]
    })
}

#[tokio::test]
async fn health_endpoint_responds() {
    let app = create_router(test_state(Arc::new(MemoryPostingStore::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn missing_identity_headers_are_unauthorized() {
    let app = create_router(test_state(Arc::new(MemoryPostingStore::new())));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/documents")
        .header("content-type", "application/json")
        .body(Body::from(
            document_body(Uuid::new_v4(), Uuid::new_v4()).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_document_issues_reference() {
    let app = create_router(test_state(Arc::new(MemoryPostingStore::new())));

    let response = app
        .oneshot(post(
            "/api/v1/documents",
            document_body(Uuid::new_v4(), Uuid::new_v4()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["reference"], "INV-20260310-0001");
    assert_eq!(body["status"], "draft");
    assert_eq!(body["total"], "1100");
    assert_eq!(body["lines"][0]["line_total"], "1100");
}

#[tokio::test]
async fn approve_posts_ledger_entries() {
    let store = Arc::new(MemoryPostingStore::new());
    let product_id = Uuid::new_v4();
    let store_id = Uuid::new_v4();
    store
        .seed_stock(
            TenantId::from_uuid(TENANT.parse().unwrap()),
            StoreId::from_uuid(store_id),
            ProductId::from_uuid(product_id),
            MasterDataFixtures::plenty_of_stock(),
        )
        .await;

    let app = create_router(test_state(store));

    let created = app
        .clone()
        .oneshot(post(
            "/api/v1/documents",
            document_body(product_id, store_id),
        ))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    let document = body_json(created).await;
    let id = document["id"].as_str().unwrap().to_string();

    let approved = app
        .oneshot(post(&format!("/api/v1/documents/{id}/approve"), json!({})))
        .await
        .unwrap();
    assert_eq!(approved.status(), StatusCode::OK);

    let body = body_json(approved).await;
    assert_eq!(body["document"]["status"], "approved");
    // AR debit, revenue credit, tax credit
    assert_eq!(body["ledger_entries"], 3);
    assert_eq!(body["warnings"], json!([]));
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let app = create_router(test_state(Arc::new(MemoryPostingStore::new())));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/documents/{}", Uuid::new_v4()))
                .header("x-tenant-id", TENANT)
                .header("x-user-id", USER)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
