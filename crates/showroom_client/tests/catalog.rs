use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use showroom_client::{
    ApiError, CatalogApi, ClientConfig, MemorySessionStore, ProductQuery, SessionManager,
    SessionStore, UserRecord,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOW: i64 = 1_700_000_000;

fn catalog(server: &MockServer) -> Arc<CatalogApi> {
    let store = Arc::new(MemorySessionStore::new());
    let user = UserRecord {
        id: 1,
        username: "admin".to_string(),
        role: "admin".to_string(),
    };
    store.put("acc-1", "ref-1", &user, NOW).expect("seed store");

    let now = Arc::new(AtomicI64::new(NOW));
    let config = ClientConfig::default().with_base_url(server.uri());
    let session = SessionManager::with_clock(
        &config,
        store,
        Arc::new(move || now.load(Ordering::SeqCst)),
    )
    .expect("build session manager");
    Arc::new(CatalogApi::new(Arc::new(session)))
}

fn page_body(name: &str) -> serde_json::Value {
    json!({
        "items": [{"id": 1, "name": name, "brand": "Labirint", "price": 45900.0, "is_active": true}],
        "total": 1,
    })
}

#[tokio::test]
async fn filtered_listing_decodes_products() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/catalog/products"))
        .and(query_param("search", "royal"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Royal 4")))
        .mount(&server)
        .await;

    let api = catalog(&server);
    let query = ProductQuery {
        search: Some("royal".to_string()),
        ..ProductQuery::default()
    };
    let page = api.list_products(&query).await.expect("listing ok");

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Royal 4");
    assert!(page.items[0].is_active);
}

#[tokio::test]
async fn newer_request_supersedes_a_slow_one() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/catalog/products"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(400))
                .set_body_json(page_body("Stale")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/catalog/products"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body("Fresh")))
        .mount(&server)
        .await;

    let api = catalog(&server);
    let slow_api = api.clone();
    let slow = tokio::spawn(async move {
        let query = ProductQuery::default();
        slow_api.list_products(&query).await
    });
    // Let the slow fetch get in flight before superseding it.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let query = ProductQuery {
        page: 2,
        ..ProductQuery::default()
    };
    let fresh = api.list_products(&query).await.expect("fresh page");
    assert_eq!(fresh.items[0].name, "Fresh");

    let stale = slow.await.expect("join slow fetch");
    assert_eq!(stale.expect_err("slow fetch dropped"), ApiError::Superseded);
}

#[tokio::test]
async fn teardown_cancels_the_outstanding_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/catalog/products"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(400))
                .set_body_json(page_body("Late")),
        )
        .mount(&server)
        .await;

    let api = catalog(&server);
    let pending_api = api.clone();
    let pending = tokio::spawn(async move {
        let query = ProductQuery::default();
        pending_api.list_products(&query).await
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    api.teardown();

    let result = pending.await.expect("join pending fetch");
    assert_eq!(result.expect_err("cancelled"), ApiError::Superseded);
}
