//! End-to-end behaviour of the gateway against a mock backend

use atelier_gateway::storage::object_path;
use atelier_gateway::{
    ApiClient, Dashboard, HttpTokenRefresher, ListingQuery, ObjectKind, RefreshCoordinator,
    SessionEvent, VariantMatrix, VideoUpload,
};
use atelier_shared::{
    AtelierConfig, AtelierError, CredentialBundle, CredentialField, CredentialStore,
    MemoryCredentialStore, OrderStatus, ProductDraft, ProfileUpdate, ReturnStatus,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, header_exists, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn jwt(exp: i64) -> String {
    encode(
        &Header::default(),
        &json!({ "sub": "u1", "exp": exp }),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

fn config(server: &MockServer) -> AtelierConfig {
    let mut config = AtelierConfig::default();
    config.api.base_url = server.uri();
    config.api.timeout_secs = 5;
    config.storage.upload_url = format!("{}/storage", server.uri());
    config.storage.public_url = "https://cdn.example.com".to_string();
    config
}

fn dashboard(server: &MockServer, store: Arc<MemoryCredentialStore>) -> Dashboard {
    Dashboard::new(&config(server), store).unwrap()
}

/// Session whose access token expired long ago
fn stale_session() -> Arc<MemoryCredentialStore> {
    let store = Arc::new(MemoryCredentialStore::new());
    store.set(CredentialField::AccessToken, &jwt(1000));
    store.set(CredentialField::RefreshToken, "refresh-abc");
    store.set(CredentialField::UserId, "u1");
    store.set(CredentialField::DesignerId, "d1");
    store
}

fn fresh_session() -> Arc<MemoryCredentialStore> {
    let store = stale_session();
    store.set(
        CredentialField::AccessToken,
        &jwt(chrono::Utc::now().timestamp() + 3600),
    );
    store
}

#[tokio::test]
async fn test_concurrent_requests_share_one_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refreshToken": "refresh-abc" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "new123" }))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("Authorization", "Bearer new123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let store = stale_session();
    let dashboard = dashboard(&server, store.clone());
    let api = dashboard.api();

    let (a, b, c) = tokio::join!(
        api.get::<Value>("/products"),
        api.get::<Value>("/products"),
        api.get::<Value>("/products"),
    );

    for result in [a, b, c] {
        assert_eq!(tokio_test::assert_ok!(result), json!([]));
    }
    assert_eq!(api.coordinator().refreshes_started(), 1);
    assert!(!api.coordinator().is_refreshing());
    assert_eq!(
        store.get(CredentialField::AccessToken).as_deref(),
        Some("new123")
    );
    // the refresh response carried no new refresh token
    assert_eq!(
        store.get(CredentialField::RefreshToken).as_deref(),
        Some("refresh-abc")
    );
}

#[tokio::test]
async fn test_rejected_refresh_clears_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Refresh token revoked" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products/designer/d1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let store = stale_session();
    let dashboard = dashboard(&server, store.clone());
    let mut events = dashboard.subscribe();

    let err = tokio_test::assert_err!(dashboard.products().list().await);
    assert!(matches!(err, AtelierError::RefreshFailed(_)));
    assert!(err.to_string().starts_with("Token refresh failed"));

    assert!(!store.is_authenticated());
    assert_eq!(store.bundle(), CredentialBundle::default());
    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::LoginRequired { .. })
    ));
}

#[tokio::test]
async fn test_missing_refresh_token_requires_login() {
    let server = MockServer::start().await;
    let store = stale_session();
    store.remove(CredentialField::RefreshToken);

    let dashboard = dashboard(&server, store.clone());
    let mut events = dashboard.subscribe();

    let err = dashboard.api().get::<Value>("/products").await.unwrap_err();
    assert!(matches!(err, AtelierError::NoRefreshToken));
    assert_eq!(err.to_string(), "No refresh token available");
    assert!(store.get(CredentialField::UserId).is_none());
    assert!(matches!(
        events.try_recv(),
        Ok(SessionEvent::LoginRequired { .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_login_persists_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_json(json!({ "email": "ana@example.com", "password": "s3cret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "accessToken": "acc-1",
                "refreshToken": "ref-1",
                "userId": "u1",
                "designerId": "d1",
                "user": { "email": "ana@example.com" },
                "designer": { "brandName": "Ana Atelier" },
                "is_approved": true
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    let dashboard = dashboard(&server, store.clone());
    let mut events = dashboard.subscribe();

    let data = dashboard
        .session()
        .login(" ana@example.com ", "s3cret")
        .await
        .unwrap();
    assert!(data.is_approved);

    assert!(dashboard.session().is_authenticated());
    let bundle = dashboard.session().credentials();
    assert_eq!(bundle.access_token.as_deref(), Some("acc-1"));
    assert_eq!(bundle.refresh_token.as_deref(), Some("ref-1"));
    assert_eq!(bundle.designer_id.as_deref(), Some("d1"));
    assert_eq!(
        events.try_recv().unwrap(),
        SessionEvent::LoggedIn {
            user_id: "u1".to_string()
        }
    );

    dashboard.session().logout();
    assert!(!dashboard.session().is_authenticated());
    assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn test_failed_login_keeps_store_untouched() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "success": false,
            "message": "Invalid email or password"
        })))
        .mount(&server)
        .await;

    let store = fresh_session();
    let dashboard = dashboard(&server, store.clone());

    let err = dashboard
        .session()
        .login("ana@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid email or password");
    assert_eq!(err.status(), Some(401));
    assert!(store.is_authenticated());
}

#[tokio::test]
async fn test_business_errors_carry_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/order/o404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Order not found" })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/order/o500"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let store = fresh_session();
    let dashboard = dashboard(&server, store.clone());
    let mut events = dashboard.subscribe();

    let err = dashboard.orders().get("o404").await.unwrap_err();
    assert_eq!(err.to_string(), "Order not found");
    assert_eq!(err.status(), Some(404));

    let err = dashboard.orders().get("o500").await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 502");

    // business failures leave the session alone
    assert!(store.is_authenticated());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_valid_token_is_sent_without_refresh() {
    let server = MockServer::start().await;
    let store = fresh_session();
    let token = store.get(CredentialField::AccessToken).unwrap();

    Mock::given(method("GET"))
        .and(path("/products/designer/d1"))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                { "_id": "p1", "name": "Silk Wrap Dress", "price": 180.0 },
                { "_id": "p2", "name": "Linen Shirt", "price": 90.0, "isActive": false },
                { "_id": "p3", "name": "Wrap Skirt", "price": 120.0 }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, store);
    let products = dashboard.products().list().await.unwrap();
    assert_eq!(products.len(), 3);

    let query = ListingQuery {
        search: Some("wrap".to_string()),
        status: Some("active".to_string()),
    };
    let hits = atelier_gateway::filter_items(&products, &query);
    let page = atelier_gateway::paginate(&hits, 1, 1);
    assert_eq!(page.total, 2);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items[0].id, "p1");
}

#[tokio::test]
async fn test_missing_designer_id_makes_no_request() {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let dashboard = dashboard(&server, store);

    let err = dashboard.returns().list().await.unwrap_err();
    assert!(matches!(
        err,
        AtelierError::MissingCredential(CredentialField::DesignerId)
    ));
    assert_eq!(err.to_string(), "No designer ID found, please log in again");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bulk_edit_is_sent_without_authorization() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/storage/designer-dashboard/d1/bulk/[0-9a-f]{12}-catalogue\.xlsx$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/products/bulk-edit"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "updated": 4 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, fresh_session());
    let report = dashboard
        .products()
        .bulk_edit(dashboard.uploader(), "catalogue.xlsx", b"PK\x03\x04sheet".to_vec())
        .await
        .unwrap();
    assert_eq!(report.updated, 4);

    let requests = server.received_requests().await.unwrap();
    let edit = requests
        .iter()
        .find(|r| r.url.path() == "/products/bulk-edit")
        .unwrap();
    assert!(edit.headers.get("authorization").is_none());

    let body: Value = serde_json::from_slice(&edit.body).unwrap();
    assert_eq!(body["designerId"], "d1");
    assert!(body["fileUrl"]
        .as_str()
        .unwrap()
        .starts_with("https://cdn.example.com/designer-dashboard/d1/bulk/"));
}

#[tokio::test]
async fn test_ship_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shipping/create-shipment"))
        .and(body_json(json!({
            "orderId": "o1",
            "designerId": "d1",
            "carrier": "dhl",
            "weightKg": 1.5
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": { "trackingNumber": "TRK-1", "carrier": "dhl" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, fresh_session());
    let shipment = dashboard
        .orders()
        .ship("o1", Some("dhl".to_string()), 1.5)
        .await
        .unwrap();
    assert_eq!(shipment.tracking_number, "TRK-1");

    assert!(dashboard.orders().ship("o1", None, 0.0).await.is_err());
}

/// Store whose next access token read stalls after the value was read
struct SlowReadStore {
    inner: MemoryCredentialStore,
    next_read_delay_ms: AtomicU64,
}

impl SlowReadStore {
    fn stall_next_read(&self, delay: Duration) {
        self.next_read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

impl CredentialStore for SlowReadStore {
    fn set(&self, field: CredentialField, value: &str) {
        self.inner.set(field, value);
    }

    fn get(&self, field: CredentialField) -> Option<String> {
        let value = self.inner.get(field);
        if field == CredentialField::AccessToken {
            let delay = self.next_read_delay_ms.swap(0, Ordering::SeqCst);
            if delay > 0 {
                std::thread::sleep(Duration::from_millis(delay));
            }
        }
        value
    }

    fn remove(&self, field: CredentialField) {
        self.inner.remove(field);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_caller_that_saw_stale_token_after_refresh_completed_reuses_new_token() {
    let server = MockServer::start().await;
    let renewed = jwt(chrono::Utc::now().timestamp() + 3600);

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": renewed }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/products"))
        .and(header("Authorization", format!("Bearer {renewed}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let inner = MemoryCredentialStore::new();
    inner.set(CredentialField::AccessToken, &jwt(1000));
    inner.set(CredentialField::RefreshToken, "refresh-abc");
    inner.set(CredentialField::UserId, "u1");
    let store = Arc::new(SlowReadStore {
        inner,
        next_read_delay_ms: AtomicU64::new(0),
    });

    let client = reqwest::Client::new();
    let refresher = Arc::new(HttpTokenRefresher::new(client.clone(), &server.uri()));
    let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), refresher));
    let api = Arc::new(
        ApiClient::with_coordinator(client, &server.uri(), store.clone(), coordinator).unwrap(),
    );

    let first = tokio::spawn({
        let api = api.clone();
        async move { api.get::<Value>("/products").await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    // the second caller reads the stale token now but only acts on it after
    // the first refresh has finished
    store.stall_next_read(Duration::from_millis(400));
    let second = tokio::spawn({
        let api = api.clone();
        async move { api.get::<Value>("/products").await }
    });

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    assert_eq!(api.coordinator().refreshes_started(), 1);
    assert_eq!(store.get(CredentialField::AccessToken), Some(renewed));
}

fn product_body(id: &str, active: bool) -> Value {
    json!({ "_id": id, "name": "Silk Wrap Dress", "price": 180.0, "isActive": active })
}

#[tokio::test]
async fn test_product_writes() {
    let server = MockServer::start().await;
    let store = fresh_session();
    let bearer = format!("Bearer {}", store.get(CredentialField::AccessToken).unwrap());

    Mock::given(method("POST"))
        .and(path("/products"))
        .and(header("Authorization", bearer.as_str()))
        .and(body_json(json!({
            "designerId": "d1",
            "name": "Silk Wrap Dress",
            "category": "Dresses",
            "price": 180.0,
            "images": [],
            "variants": []
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "data": product_body("p1", true) })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/products/p1"))
        .and(header("Authorization", bearer.as_str()))
        .and(body_json(json!({
            "designerId": "d1",
            "name": "Silk Wrap Dress",
            "description": "Bias cut",
            "price": 195.0,
            "images": ["https://cdn.example.com/a.jpg"],
            "variants": []
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(product_body("p1", true)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/products/p1/toggle-status"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": product_body("p1", false) })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/products/p1"))
        .and(header("Authorization", bearer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, store);
    let products = dashboard.products();

    // a designer id supplied by the caller is replaced by the session's
    let created = products
        .create(ProductDraft {
            designer_id: "someone-else".to_string(),
            name: "Silk Wrap Dress".to_string(),
            category: Some("Dresses".to_string()),
            price: 180.0,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.id, "p1");

    let draft = ProductDraft {
        name: "Silk Wrap Dress".to_string(),
        description: Some("Bias cut".to_string()),
        price: 195.0,
        images: vec!["https://cdn.example.com/a.jpg".to_string()],
        ..Default::default()
    };
    products.update("p1", draft).await.unwrap();

    let toggled = products.toggle_status("p1").await.unwrap();
    assert_eq!(toggled.status(), "inactive");

    let deleted = products.delete("p1").await.unwrap();
    assert_eq!(deleted["success"], true);

    let requests = server.received_requests().await.unwrap();
    let toggle = requests
        .iter()
        .find(|r| r.url.path() == "/products/p1/toggle-status")
        .unwrap();
    assert!(toggle.body.is_empty());
}

#[tokio::test]
async fn test_generated_variants_replace_product_variants() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/products/p1/variants"))
        .and(body_json(json!({
            "variants": [
                { "sku": "SWD-S-ECRU", "size": "S", "color": "Ecru", "price": 180.0, "stock": 3 },
                { "sku": "SWD-S-NAVY-BLUE", "size": "S", "color": "Navy Blue", "price": 180.0, "stock": 3 },
                { "sku": "SWD-M-ECRU", "size": "M", "color": "Ecru", "price": 180.0, "stock": 3 },
                { "sku": "SWD-M-NAVY-BLUE", "size": "M", "color": "Navy Blue", "price": 180.0, "stock": 3 }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "_id": "p1",
                "name": "Silk Wrap Dress",
                "price": 180.0,
                "variants": [
                    { "sku": "SWD-S-ECRU", "size": "S", "color": "Ecru", "price": 180.0, "stock": 3 }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let variants = VariantMatrix::new("swd", 180.0)
        .sizes(["S", "M", "s"])
        .colors(["Ecru", "Navy Blue"])
        .stock(3)
        .generate();

    let dashboard = dashboard(&server, fresh_session());
    let product = dashboard
        .products()
        .replace_variants("p1", &variants)
        .await
        .unwrap();
    assert_eq!(product.total_stock(), 3);
}

#[tokio::test]
async fn test_bulk_import_is_authenticated() {
    let server = MockServer::start().await;
    let store = fresh_session();
    let bearer = format!("Bearer {}", store.get(CredentialField::AccessToken).unwrap());
    let sheet = b"PK\x03\x04sheet".to_vec();
    let file_path = object_path("designer-dashboard", "d1", ObjectKind::Spreadsheet, "catalogue.xlsx", &sheet);

    Mock::given(method("PUT"))
        .and(path(format!("/storage/{file_path}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/products/bulk-upload"))
        .and(header("Authorization", bearer.as_str()))
        .and(body_json(json!({
            "designerId": "d1",
            "fileUrl": format!("https://cdn.example.com/{file_path}")
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": { "created": 12, "failed": 1 } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, store);
    let report = dashboard
        .products()
        .bulk_import(dashboard.uploader(), "catalogue.xlsx", sheet)
        .await
        .unwrap();
    assert_eq!(report.created, 12);
}

#[tokio::test]
async fn test_order_status_update() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/order/o1/status"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({ "status": "shipped" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "o1", "status": "shipped", "total": 42.0 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, fresh_session());
    let order = dashboard
        .orders()
        .update_status("o1", OrderStatus::Shipped)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);

    let err = dashboard
        .orders()
        .update_status("o1", OrderStatus::Unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::InvalidOperation(_)));
}

#[tokio::test]
async fn test_return_decisions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/order/returns/r1/decision"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({ "decision": "approve" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "r1", "orderId": "o1", "status": "approved" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/order/returns/r2/decision"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({ "decision": "reject", "note": "Worn item" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "r2", "orderId": "o2", "status": "rejected"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, fresh_session());
    let returns = dashboard.returns();

    let approved = returns.approve("r1", None).await.unwrap();
    assert_eq!(approved.status, ReturnStatus::Approved);

    let rejected = returns
        .reject("r2", Some("Worn item".to_string()))
        .await
        .unwrap();
    assert_eq!(rejected.status, ReturnStatus::Rejected);
}

#[tokio::test]
async fn test_video_upload_and_delete() {
    let server = MockServer::start().await;
    let clip = b"\x00\x00\x00\x18ftypmp42".to_vec();
    let video_path = object_path("designer-dashboard", "d1", ObjectKind::Video, "lookbook.mp4", &clip);

    Mock::given(method("PUT"))
        .and(path(format!("/storage/{video_path}")))
        .and(header("Content-Type", "video/mp4"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/content-video/create"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({
            "designerId": "d1",
            "title": "Spring lookbook",
            "videoUrl": format!("https://cdn.example.com/{video_path}"),
            "productIds": ["p1", "p2"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {
                "_id": "v1",
                "title": "Spring lookbook",
                "videoUrl": format!("https://cdn.example.com/{video_path}"),
                "productIds": ["p1", "p2"]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/content-video/v1"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, fresh_session());
    let videos = dashboard.videos();

    let meta = VideoUpload {
        title: " Spring lookbook ".to_string(),
        description: None,
        product_ids: vec!["p1".to_string(), "p2".to_string()],
    };
    let video = videos
        .upload(dashboard.uploader(), "lookbook.mp4", clip, meta)
        .await
        .unwrap();
    assert_eq!(video.id, "v1");
    assert_eq!(video.product_ids, ["p1", "p2"]);

    videos.delete("v1").await.unwrap();

    // an untitled video is rejected before anything is uploaded
    let untitled = VideoUpload::default();
    assert!(videos
        .upload(dashboard.uploader(), "lookbook.mp4", b"x".to_vec(), untitled)
        .await
        .is_err());
}

#[tokio::test]
async fn test_profile_read_update_and_logo() {
    let server = MockServer::start().await;
    let logo = b"\x89PNG\r\n".to_vec();
    let logo_path = object_path("designer-dashboard", "d1", ObjectKind::ProfileImage, "logo.png", &logo);
    let logo_url = format!("https://cdn.example.com/{logo_path}");

    Mock::given(method("GET"))
        .and(path("/designer/d1"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "_id": "d1", "brandName": "Ana Atelier", "is_approved": true }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/designer/d1"))
        .and(body_json(json!({ "bio": "Slow fashion from Porto" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "d1", "brandName": "Ana Atelier", "bio": "Slow fashion from Porto"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/storage/{logo_path}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/designer/d1"))
        .and(header_exists("Authorization"))
        .and(body_json(json!({ "logoUrl": logo_url })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_id": "d1", "brandName": "Ana Atelier", "logoUrl": logo_url
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, fresh_session());
    let profile = dashboard.profile();

    let current = profile.get().await.unwrap();
    assert_eq!(current.brand_name, "Ana Atelier");
    assert!(current.is_approved);

    let update = ProfileUpdate {
        bio: Some("Slow fashion from Porto".to_string()),
        ..Default::default()
    };
    let updated = profile.update(&update).await.unwrap();
    assert_eq!(updated.bio.as_deref(), Some("Slow fashion from Porto"));

    let with_logo = profile
        .update_logo(dashboard.uploader(), "logo.png", logo)
        .await
        .unwrap();
    assert_eq!(with_logo.logo_url.as_deref(), Some(logo_url.as_str()));
}
