//! Route-level tests driving the router end to end with a mock database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use tower::ServiceExt;
use uuid::Uuid;

use ironbank_api::{AppState, create_router};
use ironbank_db::entities::accounts;
use ironbank_shared::{JwtConfig, JwtService};

fn test_state(db: DatabaseConnection) -> AppState {
    AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_expires_minutes: 60,
        })),
    }
}

fn bearer_token(state: &AppState, user_id: Uuid, account_id: Uuid) -> String {
    let token = state
        .jwt_service
        .generate_access_token(user_id, account_id)
        .unwrap();
    format!("Bearer {token}")
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_router(test_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_protected_route_requires_token() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_router(test_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/balance")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_router(test_state(db));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/balance")
                .header(header::AUTHORIZATION, "Bearer not.a.token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "INVALID_TOKEN");
}

#[tokio::test]
async fn test_deposit_rejects_non_positive_amount() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = test_state(db);
    let auth = bearer_token(&state, Uuid::new_v4(), Uuid::new_v4());
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/deposit")
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"amount": "-5"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "INVALID_AMOUNT");
}

#[tokio::test]
async fn test_transfer_rejects_blank_recipient() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let state = test_state(db);
    let auth = bearer_token(&state, Uuid::new_v4(), Uuid::new_v4());
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/transfer")
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"recipient": "  ", "amount": "10"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_withdraw_insufficient_funds_maps_to_422() {
    let account_id = Uuid::new_v4();
    let now = Utc::now().into();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![accounts::Model {
            id: account_id,
            user_id: Uuid::new_v4(),
            balance: dec!(150),
            created_at: now,
            updated_at: now,
        }]])
        .into_connection();

    let state = test_state(db);
    let auth = bearer_token(&state, Uuid::new_v4(), account_id);
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/withdraw")
                .header(header::AUTHORIZATION, auth)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"amount": "200"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn test_balance_returns_current_amount() {
    let account_id = Uuid::new_v4();
    let now = Utc::now().into();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![accounts::Model {
            id: account_id,
            user_id: Uuid::new_v4(),
            balance: dec!(42.50),
            created_at: now,
            updated_at: now,
        }]])
        .into_connection();

    let state = test_state(db);
    let auth = bearer_token(&state, Uuid::new_v4(), account_id);
    let app = create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/balance")
                .header(header::AUTHORIZATION, auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["balance"], "42.50");
}
