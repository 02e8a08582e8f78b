#![allow(dead_code)]

use apartment_listings::{app_router, AppState, HttpOptions, MemoryStore};
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_options(&HttpOptions::default())
    }

    pub fn with_options(options: &HttpOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let router = app_router(AppState::new(store.clone()), options);
        TestApp { router, store }
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.request(request).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    /// Create a record and return its id; panics unless the create succeeds.
    pub async fn create(&self, body: Value) -> i64 {
        let (status, value) = self.send(Method::POST, "/api/v1/apartments", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", value);
        value["data"]["id"].as_i64().unwrap()
    }
}

pub fn apartment(unit_number: &str, project: &str, price: f64, bedrooms: i32) -> Value {
    json!({
        "unitName": format!("Unit {}", unit_number),
        "unitNumber": unit_number,
        "project": project,
        "price": price,
        "bedrooms": bedrooms,
        "bathrooms": 1,
        "area": 80.0,
        "location": "Downtown"
    })
}

pub fn ids(value: &Value) -> Vec<i64> {
    value["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect()
}
