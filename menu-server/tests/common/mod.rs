#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use chrono::NaiveDate;
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use shared::models::{ProductDraft, ProductKind};
use tower::ServiceExt;

use menu_server::auth::MemoryIdentityProvider;
use menu_server::db::{DocumentStore, MemoryStore, Patch};
use menu_server::storage::MemoryStorage;
use menu_server::utils::time::FixedClock;
use menu_server::{Config, ServerState, build_app};

pub const ADMIN_EMAIL: &str = "admin@restaurante.com";
pub const ADMIN_PASSWORD: &str = "segredo123";
pub const TODAY: &str = "2024-06-01";

pub struct TestApp {
    pub state: ServerState,
    pub store: Arc<MemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

impl TestApp {
    /// Server pinned to 2024-06-01 12:30 local time
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let provider = MemoryIdentityProvider::new();
        provider.add_user(ADMIN_EMAIL, ADMIN_PASSWORD).unwrap();
        let now = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();

        let state = ServerState::build(
            Config::with_overrides("/tmp/menu-server-test", 0),
            store.clone(),
            Arc::new(MemoryStorage::new()),
            Arc::new(provider),
            Arc::new(FixedClock::new(now, 1_717_245_000_123)),
        )
        .await
        .unwrap();

        Self { state, store }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = build_app(self.state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn login(&self) -> String {
        let res = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.body);
        res.json()["data"]["token"].as_str().unwrap().to_string()
    }

    /// Creates an active product and waits until the menu feed shows it
    pub async fn seed_product(&self, name: &str, cents: i64, stock: u32) -> String {
        let draft = ProductDraft {
            name: name.into(),
            description: String::new(),
            price: Decimal::new(cents, 2),
            stock,
            category: "comida".into(),
            is_active: true,
            kind: ProductKind::Normal,
            addon_categories: Vec::new(),
            image_url: None,
        };
        let id = self.state.catalog.repository().create(&draft).await.unwrap();
        let menu = self.state.menu.clone();
        let wanted = id.clone();
        wait_until(move || menu.read().products().iter().any(|p| p.id == wanted)).await;
        id
    }

    pub async fn stock_of(&self, id: &str) -> u32 {
        self.state
            .catalog
            .repository()
            .find_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    /// Writes an order document the way the web client did
    pub async fn seed_order(&self, status: &str, total: f64, items: Value) {
        self.store
            .add(
                "pedidos",
                Patch::new()
                    .set("itens", items)
                    .set("total", total)
                    .set("data", TODAY)
                    .set("hora", "11:00")
                    .set("status", status),
            )
            .await
            .unwrap();
    }

    /// Waits until the dashboard feed has `n` orders in the finalized bucket
    pub async fn wait_finalized(&self, n: usize) {
        let view = self.state.sales.view();
        wait_until(move || view.read().buckets().counts().finalized == n).await;
    }

    pub async fn wait_pending(&self, n: usize) {
        let view = self.state.sales.view();
        wait_until(move || view.read().buckets().counts().pending == n).await;
    }
}

pub async fn wait_until(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
}
