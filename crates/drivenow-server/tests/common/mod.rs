#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use drivenow_auth::password::hash_password_with_cost;
use drivenow_auth::{Account, AccountStorage, AuditEvent};
use drivenow_core::Role;
use drivenow_server::{AppConfig, AppState, Storage, build_app};

pub const PASSWORD: &str = "s3cure-passw0rd";
pub const ADMIN_TOKEN: &str = "test-admin-token";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    /// App over in-memory storage with the admin API enabled.
    pub fn new() -> Self {
        let mut cfg = AppConfig::default();
        cfg.admin.token = Some(ADMIN_TOKEN.into());
        Self::with_config(cfg)
    }

    pub fn with_config(cfg: AppConfig) -> Self {
        let state = AppState::new(Storage::in_memory(), &cfg);
        let app = build_app(state.clone(), &cfg);
        Self { app, state }
    }

    /// Stores an account whose password is [`PASSWORD`].
    pub async fn seed(&self, email: &str, role: Role, verified: bool) -> Account {
        let hash = hash_password_with_cost(PASSWORD, 1024, 1).expect("hash");
        let account = Account::builder(email, hash)
            .name("Test", "User")
            .role(role)
            .verified(verified)
            .build();
        self.state.accounts.create(&account).await.expect("seed account");
        account
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let res = self.app.clone().oneshot(req).await.expect("response");
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), &[]).await
    }

    pub async fn admin_get(&self, uri: &str) -> TestResponse {
        let auth = format!("Bearer {ADMIN_TOKEN}");
        self.request(Method::GET, uri, None, &[("authorization", &auth)])
            .await
    }

    pub async fn admin_post(&self, uri: &str, body: Value) -> TestResponse {
        let auth = format!("Bearer {ADMIN_TOKEN}");
        self.request(Method::POST, uri, Some(body), &[("authorization", &auth)])
            .await
    }

    /// Every stored audit event, newest first.
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.state.audit.flush().await;
        self.state.audit.list_recent(usize::MAX).await.expect("audit log")
    }

    pub async fn account(&self, id: Uuid) -> Option<Account> {
        self.state.accounts.find_by_id(id).await.expect("lookup")
    }
}
