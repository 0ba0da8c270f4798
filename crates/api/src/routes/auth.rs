//! Authentication routes for registration and login.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use ironbank_core::auth::{hash_password, validate_credentials, verify_password};
use ironbank_db::repositories::{AccountRepository, UserRepoError, UserRepository};
use ironbank_shared::auth::{LoginRequest, LoginResponse, RegisterRequest, UserInfo};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// POST /auth/register - Create a user and their zero-balance account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    if let Err(fields) = validate_credentials(&payload.username, &payload.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "VALIDATION_ERROR",
                "message": format!("Invalid fields: {}", fields.join(", ")),
                "fields": fields,
            })),
        )
            .into_response();
    }

    let user_repo = UserRepository::new((*state.db).clone());

    match user_repo.username_exists(&payload.username).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "CONFLICT",
                    "message": "An account with this username already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking username");
            return internal_error("An error occurred during registration");
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash password");
            return internal_error("An error occurred during registration");
        }
    };

    // The pre-check above is advisory; a racing registration with the same
    // username is caught here by the unique constraint.
    match user_repo
        .create_with_account(&payload.username, &password_hash)
        .await
    {
        Ok((user, account)) => {
            info!(user_id = %user.id, account_id = %account.id, "User registered");
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "User created successfully",
                    "user": UserInfo {
                        id: user.id,
                        username: user.username,
                        account_id: account.id,
                    },
                })),
            )
                .into_response()
        }
        Err(UserRepoError::UsernameTaken(_)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "CONFLICT",
                "message": "An account with this username already exists"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            internal_error("An error occurred during registration")
        }
    }
}

/// POST /auth/login - Authenticate and return an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_username(&payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(username = %payload.username, "Login attempt for non-existent user");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("An error occurred during login");
        }
    };

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            info!(user_id = %user.id, "Failed login attempt - invalid password");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred during login");
        }
    }

    // Registration creates the account in the same transaction as the
    // user, so a missing account is a broken invariant, not a 404.
    let account_repo = AccountRepository::new((*state.db).clone());
    let account = match account_repo.find_by_owner(user.id).await {
        Ok(Some(a)) => a,
        Ok(None) => {
            error!(user_id = %user.id, "User has no account");
            return internal_error("An error occurred during login");
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("An error occurred during login");
        }
    };

    let access_token = match state.jwt_service.generate_access_token(user.id, account.id) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to generate access token");
            return internal_error("An error occurred during login");
        }
    };

    info!(user_id = %user.id, "User logged in successfully");

    let response = LoginResponse {
        user: UserInfo {
            id: user.id,
            username: user.username,
            account_id: account.id,
        },
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "UNAUTHORIZED",
            "message": "Invalid username or password"
        })),
    )
        .into_response()
}

fn internal_error(message: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "INTERNAL_ERROR",
            "message": message
        })),
    )
        .into_response()
}
