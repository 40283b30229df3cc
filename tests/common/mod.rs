#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use mailshrimp_api::app::{app, AppState};
use mailshrimp_api::auth::{generate_jwt, Claims};
use mailshrimp_api::config;
use mailshrimp_api::database::MemoryStore;

pub const SECRET: &str = "integration-test-secret";

/// Router over a fresh in-memory store
pub struct TestApp {
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()), SECRET);
        Self {
            router: app(state, config::config()),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let auth = token.map(|t| ("x-access-token", t.to_string()));
        self.send(method, uri, auth, body).await
    }

    /// Same as `get`, but presenting the token as `Authorization: Bearer`
    pub async fn get_bearer(&self, uri: &str, token: &str) -> Result<TestResponse> {
        let auth = Some(("authorization", format!("Bearer {}", token)));
        self.send(Method::GET, uri, auth, None).await
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        auth: Option<(&'static str, String)>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some((name, value)) = auth {
            builder = builder.header(name, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok(TestResponse { status, body })
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::DELETE, uri, token, None).await
    }
}

/// Signed token for `account_id`, as the accounts service would issue it
pub fn token_for(account_id: i64) -> String {
    generate_jwt(&Claims::new(account_id, 1), SECRET).expect("sign test token")
}
