// SPDX-License-Identifier: MIT

//! Request validation tests.
//!
//! These run against the offline mock database: every request here must
//! be rejected before any database access happens.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use step_challenge::middleware::auth::create_jwt;
use tower::ServiceExt;
use uuid::Uuid;

mod common;

fn json_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let (app, _) = common::create_test_app();

    let body = r#"{
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "not-an-email",
        "password": "longenough"
    }"#;

    let response = app
        .oneshot(json_post("/auth/register", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let (app, _) = common::create_test_app();

    let body = r#"{
        "first_name": "Jane",
        "last_name": "Doe",
        "email": "jane@example.com",
        "password": "short"
    }"#;

    let response = app
        .oneshot(json_post("/auth/register", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_empty_name() {
    let (app, _) = common::create_test_app();

    let body = r#"{
        "first_name": "",
        "last_name": "Doe",
        "email": "jane@example.com",
        "password": "longenough"
    }"#;

    let response = app
        .oneshot(json_post("/auth/register", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_rejects_missing_fields() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(json_post("/auth/login", r#"{"email": "jane@example.com"}"#))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_submissions_list_requires_challenge_id() {
    let (app, state) = common::create_test_app();
    let token = create_jwt(Uuid::new_v4(), &state.config.jwt_signing_key).unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/submissions")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_extract_steps_unavailable_without_vision() {
    let (app, state) = common::create_test_app();
    let token = create_jwt(Uuid::new_v4(), &state.config.jwt_signing_key).unwrap();

    // The availability check runs before the body is read, so an empty
    // multipart body is fine here.
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/submissions/extract-steps")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(
                    header::CONTENT_TYPE,
                    "multipart/form-data; boundary=XBOUNDARY",
                )
                .body(Body::from("--XBOUNDARY--\r\n"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
