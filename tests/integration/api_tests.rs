//! Router-level tests driven through the full axum stack

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use lending_server::{
    api,
    config::AppConfig,
    repository::MemoryStore,
    services::Services,
    AppState,
};

async fn app() -> Router {
    let config = AppConfig::default();
    let services = Services::new(Arc::new(MemoryStore::new()), config.auth.clone());
    services.catalog.seed().await.unwrap();

    api::router(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    })
}

/// Send a request and return status plus JSON body (Null when empty)
async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(format!("/api/v1{}", uri));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str, role_id: Option<i64>, library_id: Option<i64>) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Tester",
            "email": email,
            "password": "secret!1",
            "role_id": role_id,
            "library_id": library_id,
        })),
    )
    .await
}

async fn role_id(app: &Router, name: &str) -> i64 {
    let (status, roles) = send(app, Method::GET, "/roles/dropdown", None, None).await;
    assert_eq!(status, StatusCode::OK);
    roles
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == name)
        .map(|r| r["id"].as_i64().unwrap())
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_roles_dropdown_hides_super_admin() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/roles/dropdown", None, None).await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 3);
    assert!(!names.contains(&"SUPER_ADMIN"));
}

#[tokio::test]
async fn test_register_bootstrap_and_me() {
    let app = app().await;
    let (status, body) = register(&app, "root@example.org", None, None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["roles"][0]["role"], "SUPER_ADMIN");
    assert_eq!(body["user"]["roles"][0]["status"], "APPROVED");
    assert!(body["user"].get("password").is_none());

    let token = body["token"].as_str().unwrap();
    let (status, me) = send(&app, Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "root@example.org");
}

#[tokio::test]
async fn test_error_body_carries_kind() {
    let app = app().await;
    register(&app, "root@example.org", None, None).await;

    let (status, body) = register(&app, "second@example.org", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_weak_password_is_rejected() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "name": "Weak",
            "email": "weak@example.org",
            "password": "password",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_missing_or_stale_token_is_unauthorized() {
    let app = app().await;
    let (_, body) = register(&app, "root@example.org", None, None).await;
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/libraries", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHENTICATED");

    let (status, _) = send(&app, Method::POST, "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/libraries", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_lending_flow() {
    let app = app().await;

    let (_, root) = register(&app, "root@example.org", None, None).await;
    let root_token = root["token"].as_str().unwrap().to_string();

    let (status, library) = send(
        &app,
        Method::POST,
        "/libraries",
        Some(&root_token),
        Some(json!({ "name": "Central" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let library_id = library["id"].as_i64().unwrap();

    // Library admin applies and gets approved
    let admin_role = role_id(&app, "LIBRARY_ADMIN").await;
    let (status, admin) = register(&app, "admin@example.org", Some(admin_role), Some(library_id)).await;
    assert_eq!(status, StatusCode::CREATED);
    let admin_id = admin["user"]["id"].as_i64().unwrap();
    let admin_token = admin["token"].as_str().unwrap().to_string();

    let (status, _) = register(&app, "rival@example.org", Some(admin_role), Some(library_id)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, pending) = send(&app, Method::GET, "/users/pending-roles", Some(&root_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        "/users/approve",
        Some(&root_token),
        Some(json!({ "user_id": admin_id, "role_id": admin_role })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Admin creates and stocks a book
    let (status, book) = send(
        &app,
        Method::POST,
        "/books",
        Some(&admin_token),
        Some(json!({ "title": "Dune", "author_id": admin_id, "price": "12.50" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let book_id = book["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/libraries/{}/inventory", library_id),
        Some(&admin_token),
        Some(json!({ "book_id": book_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // SUPER_ADMIN has no inventory rights
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/libraries/{}/inventory", library_id),
        Some(&root_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");

    // Borrower applies, is approved, borrows and returns
    let borrower_role = role_id(&app, "BORROWER").await;
    let (_, borrower) = register(&app, "reader@example.org", Some(borrower_role), Some(library_id)).await;
    let borrower_id = borrower["user"]["id"].as_i64().unwrap();
    let borrower_token = borrower["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/books/borrow",
        Some(&borrower_token),
        Some(json!({ "book_id": book_id, "charge": "1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    send(
        &app,
        Method::POST,
        "/users/approve",
        Some(&root_token),
        Some(json!({ "user_id": borrower_id, "role_id": borrower_role })),
    )
    .await;

    let (status, record) = send(
        &app,
        Method::POST,
        "/books/borrow",
        Some(&borrower_token),
        Some(json!({ "book_id": book_id, "charge": "1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record["status"], "BORROWED");
    let record_id = record["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        Method::POST,
        "/books/borrow",
        Some(&borrower_token),
        Some(json!({ "book_id": book_id, "charge": "1.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, returned) = send(
        &app,
        Method::PUT,
        &format!("/books/return/{}", record_id),
        Some(&borrower_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "RETURNED");

    let (status, mine) = send(&app, Method::GET, "/books/borrows", Some(&borrower_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    // Book details show the stocking library and history
    let (status, details) = send(
        &app,
        Method::GET,
        &format!("/books/{}", book_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["libraries"][0]["id"], library_id);
    assert_eq!(details["borrows"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/libraries/{}/inventory/{}", library_id, book_id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_libraries_dropdown_is_public() {
    let app = app().await;
    let (_, root) = register(&app, "root@example.org", None, None).await;
    let token = root["token"].as_str().unwrap().to_string();
    send(
        &app,
        Method::POST,
        "/libraries",
        Some(&token),
        Some(json!({ "name": "Central" })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/libraries/dropdown", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Central");
}
