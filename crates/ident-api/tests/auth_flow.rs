//! End-to-end tests through the HTTP router

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use ident_api::{AppState, CredentialService, MetricsHandle, create_router};
use ident_auth::{HasherParams, PasswordHasher, TokenLifetimes, TokenManager};
use ident_db::{Database, NewUser};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn test_app() -> Router {
    test_app_with(None).await.0
}

/// Router plus a handle on its store, for seeding rows directly
async fn test_app_with(metrics: Option<Arc<MetricsHandle>>) -> (Router, Database) {
    let db = Database::in_memory().await.unwrap();
    let hasher = PasswordHasher::new(HasherParams {
        time_cost: 1,
        memory_cost_kib: 64,
        parallelism: 1,
        ..HasherParams::default()
    })
    .unwrap();
    let tokens = Arc::new(TokenManager::new(
        "test-secret-key",
        "ident",
        TokenLifetimes::default(),
    ));
    let service = CredentialService::new(db.clone(), hasher, tokens).unwrap();
    (create_router(AppState::new(Arc::new(service)), metrics), db)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn sign_up(app: &Router, cpf: &str, password: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/sign-up",
        None,
        Some(json!({
            "cpf": cpf,
            "first_name": "Lucas",
            "last_name": "Albuquerque",
            "password": password,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "sign-up failed: {}", body);
    body
}

async fn sign_in(app: &Router, cpf: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/sign-in",
        None,
        Some(json!({ "cpf": cpf, "password": password })),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "ok");

    let (status, _) = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let (app, _) = test_app_with(Some(Arc::new(MetricsHandle::new(handle)))).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_metrics_disabled_without_handle() {
    let app = test_app().await;
    let (status, _) = send(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sign_up_and_sign_in_flow() {
    let app = test_app().await;
    let user = sign_up(&app, "831.035.690-09", "password123").await;

    assert_eq!(user["cpf"], "83103569009");
    assert!(user.get("password_hash").is_none());

    let (status, body) = sign_in(&app, "83103569009", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user["id"]);
    assert_eq!(body["key"]["token_type"], "Bearer");
    assert_eq!(body["key"]["expires_in"], 24 * 3600);

    let token = body["key"]["token"].as_str().unwrap();
    let uri = format!("/users/{}", user["id"].as_str().unwrap());
    let (status, fetched) = send(&app, Method::GET, &uri, Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["first_name"], "Lucas");
}

#[tokio::test]
async fn test_duplicate_sign_up_conflicts() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/sign-up",
        None,
        Some(json!({
            "cpf": "83103569009",
            "first_name": "Other",
            "last_name": "Person",
            "password": "password456",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_sign_up_validation() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/sign-up",
        None,
        Some(json!({
            "cpf": "invalidCPF",
            "first_name": "Lucas",
            "last_name": "Albuquerque",
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/sign-up",
        None,
        Some(json!({
            "cpf": "83103569009",
            "first_name": "",
            "last_name": "Albuquerque",
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sign_in_failures_look_identical() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;

    let (wrong_status, wrong_body) = sign_in(&app, "83103569009", "wrongpassword").await;
    let (unknown_status, unknown_body) = sign_in(&app, "11111111111", "password123").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_users_require_access_token() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;
    let (_, body) = sign_in(&app, "83103569009", "password123").await;
    let refresh = body["key"]["refresh_token"].as_str().unwrap();

    let (status, _) = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/users", Some(refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/users", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejections_share_one_envelope() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;

    let (_, from_middleware) = send(&app, Method::GET, "/users", None, None).await;
    let (_, from_handler) = sign_in(&app, "83103569009", "wrongpassword").await;

    assert_eq!(from_middleware, from_handler);
    assert_eq!(from_handler["error"]["code"], "UNAUTHORIZED");
    assert_eq!(from_handler["error"]["message"], "Invalid credential");
}

#[tokio::test]
async fn test_list_and_lookup_users() {
    let app = test_app().await;
    for cpf in ["11111111111", "22222222222", "33333333333"] {
        sign_up(&app, cpf, "password123").await;
    }
    let (_, body) = sign_in(&app, "11111111111", "password123").await;
    let token = body["key"]["token"].as_str().unwrap();

    let (status, users) = send(&app, Method::GET, "/users?limit=2", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let (_, users) = send(&app, Method::GET, "/users?limit=2&offset=2", Some(token), None).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/users/not-a-uuid", Some(token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = format!("/users/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, Method::GET, &missing, Some(token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_users_limit_is_clamped() {
    let (app, db) = test_app_with(None).await;
    sign_up(&app, "83103569009", "password123").await;
    for i in 1..=105 {
        db.insert_user(NewUser {
            cpf: format!("{:011}", i),
            first_name: "Seeded".to_string(),
            last_name: "User".to_string(),
            password_hash: "c2FsdA$a2V5".to_string(),
        })
        .await
        .unwrap();
    }
    let (_, body) = sign_in(&app, "83103569009", "password123").await;
    let token = body["key"]["token"].as_str().unwrap();

    let (status, users) = send(&app, Method::GET, "/users?limit=500", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 100);

    let (_, defaults) = send(&app, Method::GET, "/users", Some(token), None).await;
    assert_eq!(defaults.as_array().unwrap().len(), 10);

    let (status, negative) = send(
        &app,
        Method::GET,
        "/users?limit=-1&offset=-5",
        Some(token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(negative, defaults);
}

#[tokio::test]
async fn test_refresh_flow() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;
    let (_, body) = sign_in(&app, "83103569009", "password123").await;
    let access = body["key"]["token"].as_str().unwrap();
    let refresh = body["key"]["refresh_token"].as_str().unwrap();

    let (status, key) = send(
        &app,
        Method::POST,
        "/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = key["token"].as_str().unwrap();
    let (status, _) = send(&app, Method::GET, "/users", Some(new_access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/refresh",
        None,
        Some(json!({ "refresh_token": access })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;
    let (_, body) = sign_in(&app, "83103569009", "password123").await;
    let token = body["key"]["token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::PUT,
        "/users/me/password",
        Some(token),
        Some(json!({ "current_password": "password123", "new_password": "brand-new-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = sign_in(&app, "83103569009", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = sign_in(&app, "83103569009", "brand-new-secret").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_delete_account() {
    let app = test_app().await;
    sign_up(&app, "83103569009", "password123").await;
    let (_, body) = sign_in(&app, "83103569009", "password123").await;
    let token = body["key"]["token"].as_str().unwrap();
    let refresh = body["key"]["refresh_token"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/users/me",
        Some(token),
        Some(json!({ "password": "wrongpassword" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/users/me",
        Some(token),
        Some(json!({ "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = sign_in(&app, "83103569009", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
