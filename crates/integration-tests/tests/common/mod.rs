//! Shared harness: the full router over the in-memory store, driven with
//! `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::sync::Arc;

use api_adapters::{router, AppState};
use auth_adapters::{Argon2Hasher, JwtIssuer};
use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use storage_adapters::{MemoryStore, WordListFilter};
use tower::ServiceExt;
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse";
pub const JWT_SECRET: &str = "integration-test-secret";
pub const BLOCKED: [&str; 2] = ["idiot", "stupid"];

pub struct TestApp {
    router: Router,
    pub state: Arc<AppState>,
    pub store: MemoryStore,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    /// `Value::Null` when the body is not JSON.
    pub body: Value,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

pub struct Account {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let tokens = issuer();
        let state = Arc::new(AppState::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(WordListFilter::new(BLOCKED)),
            Arc::new(Argon2Hasher::new()),
            Arc::new(tokens),
            false,
        ));
        Self { router: router(state.clone()), state, store }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, headers, text, body }
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
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        self.send(request.unwrap()).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn register(&self, username: &str) -> TestResponse {
        self.post_json("/api/register", None, registration(username)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post_json("/api/login", None, json!({ "email": email, "password": password }))
            .await
    }

    /// Registers `username` and logs in.
    pub async fn signup(&self, username: &str) -> Account {
        let registered = self.register(username).await;
        assert_eq!(registered.status, StatusCode::CREATED, "{}", registered.text);

        let login = self.login(&email(username), PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK, "{}", login.text);
        Account {
            id: login.body["user"]["_id"].as_str().unwrap().parse().unwrap(),
            token: login.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates a post as `author` and returns its id.
    pub async fn create_post(&self, author: &Account, text: &str) -> String {
        let res = self
            .post_json("/api/posts", Some(&author.token), json!({ "text": text }))
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
        res.body["post"]["_id"].as_str().unwrap().to_string()
    }

    pub async fn add_comment(&self, post_id: &str, who: &Account, text: &str) -> TestResponse {
        self.post_json(
            &format!("/api/posts/{post_id}/comments"),
            Some(&who.token),
            json!({ "text": text }),
        )
        .await
    }
}

/// An issuer sharing the app's signing key.
pub fn issuer() -> JwtIssuer {
    JwtIssuer::new(&SecretString::from(JWT_SECRET.to_string()), chrono::Duration::hours(1))
}

pub fn email(username: &str) -> String {
    format!("{username}@campus.edu")
}

pub fn registration(username: &str) -> Value {
    json!({
        "username": username,
        "email": email(username),
        "password": PASSWORD,
        "name": format!("{username} Student"),
        "mobile": "5550100",
        "collegeName": "State College",
        "dob": "2003-04-12",
    })
}
