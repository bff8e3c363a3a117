#![allow(dead_code)]

use appfeedback::{
    AppState,
    config::Config,
    create_app,
    services::{
        ai_scoring_service::DisabledScorer, issue_service::DisabledIssueTracker,
        ledger::FeedbackLedger,
    },
    store::MemoryStore,
};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

/// Router over a fresh in-memory store with collaborators disabled and the
/// default ranking algorithm seeded.
pub async fn test_app() -> Router {
    let config = Config::default();
    let ledger = Arc::new(FeedbackLedger::new(
        Arc::new(MemoryStore::new()),
        Arc::new(DisabledScorer),
        Arc::new(DisabledIssueTracker),
        config.credits.clone(),
    ));
    ledger.ensure_default_algorithm().await.unwrap();

    create_app(AppState {
        ledger,
        redis: None,
        config: Arc::new(config),
    })
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

pub fn feedback_body(item_type: &str, user_id: &str, title: &str) -> Value {
    json!({
        "item_type": item_type,
        "title": title,
        "description": "A description comfortably over twenty characters",
        "user_id": user_id,
        "x_handle": format!("@{}", user_id)
    })
}

/// Create an item and return its id.
pub async fn create_item(app: &Router, item_type: &str, user_id: &str, title: &str) -> String {
    let (status, body) = post(app, "/api/feedback", feedback_body(item_type, user_id, title)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}
