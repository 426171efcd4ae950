//! Router test helpers shared by the v1 handler tests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::api::{AppState, create_router};
use crate::db::{Database, SqliteDatabase};

pub async fn test_app() -> axum::Router {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to run migrations");
    create_router(AppState::new(db))
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Send a request, optionally authenticated and with a JSON body.
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

/// Register `name` and log in, returning (user id, bearer token).
pub async fn sign_up(app: &axum::Router, name: &str) -> (i64, String) {
    let (status, _) = send(
        app,
        "POST",
        "/api/v1/authentication/register",
        None,
        Some(json!({
            "username": name,
            "email": format!("{}@example.com", name),
            "password": "Passw0rd!"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        "POST",
        "/api/v1/authentication/login",
        None,
        Some(json!({
            "email": format!("{}@example.com", name),
            "password": "Passw0rd!"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    (
        body["user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}
