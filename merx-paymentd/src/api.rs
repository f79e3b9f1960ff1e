//! HTTP API for the payment service.
//!
//! Thin boundary over the account service:
//! - Account lifecycle and balance operations
//! - User lifecycle
//! - Health check

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use merx_domain::{Account, User};

use crate::accounts::AccountService;
use crate::error::PaymentdError;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Deposit/withdraw request body.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

/// User creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router(service: AccountService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/accounts", post(create_account_handler))
        .route("/accounts/:user_id", get(get_account_handler))
        .route("/accounts/:user_id/deposit", post(deposit_handler))
        .route("/accounts/:user_id/withdraw", post(withdraw_handler))
        .route("/users", post(create_user_handler).get(list_users_handler))
        .route("/users/:id", get(get_user_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Open an account for the user named in the `X-User-ID` header.
async fn create_account_handler(
    State(service): State<AccountService>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Account>), (StatusCode, Json<ErrorResponse>)> {
    let user_id = headers
        .get("X-User-ID")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "user ID is required".to_string(),
                }),
            )
        })?;

    let account = service
        .create_account(user_id)
        .await
        .map_err(to_error_response)?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Get an account by user id.
async fn get_account_handler(
    State(service): State<AccountService>,
    Path(user_id): Path<String>,
) -> Result<Json<Account>, (StatusCode, Json<ErrorResponse>)> {
    let account = service
        .get_account(&user_id)
        .await
        .map_err(to_error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "account not found".to_string(),
                }),
            )
        })?;

    Ok(Json(account))
}

/// Add funds to an account.
async fn deposit_handler(
    State(service): State<AccountService>,
    Path(user_id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    service
        .deposit(&user_id, request.amount)
        .await
        .map_err(to_error_response)?;

    Ok(StatusCode::OK)
}

/// Remove funds from an account.
async fn withdraw_handler(
    State(service): State<AccountService>,
    Path(user_id): Path<String>,
    Json(request): Json<AmountRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    service
        .withdraw(&user_id, request.amount)
        .await
        .map_err(to_error_response)?;

    Ok(StatusCode::OK)
}

/// Register a user.
async fn create_user_handler(
    State(service): State<AccountService>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), (StatusCode, Json<ErrorResponse>)> {
    let user = service
        .create_user(&request.name)
        .await
        .map_err(to_error_response)?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// List all users.
async fn list_users_handler(
    State(service): State<AccountService>,
) -> Result<Json<Vec<User>>, (StatusCode, Json<ErrorResponse>)> {
    let users = service.list_users().await.map_err(to_error_response)?;

    Ok(Json(users))
}

/// Get a user by id.
async fn get_user_handler(
    State(service): State<AccountService>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, (StatusCode, Json<ErrorResponse>)> {
    let user = service
        .get_user(id)
        .await
        .map_err(to_error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "user not found".to_string(),
                }),
            )
        })?;

    Ok(Json(user))
}

/// Map service errors to HTTP responses.
///
/// Infrastructure details never reach the client.
fn to_error_response(err: PaymentdError) -> (StatusCode, Json<ErrorResponse>) {
    match &err {
        PaymentdError::InvalidCommand(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: msg.clone() }),
        ),
        PaymentdError::BusinessRule(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: msg.clone() }),
        ),
        PaymentdError::Domain(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        ),
        PaymentdError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: msg.clone() }),
        ),
        PaymentdError::Conflict(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "account already exists".to_string(),
            }),
        ),
        _ => {
            error!(error = %err, "Request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "internal error".to_string(),
                }),
            )
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryAccountStore, MemoryUserStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> Router {
        create_router(AccountService::new(
            Arc::new(MemoryAccountStore::new()),
            Arc::new(MemoryUserStore::new()),
        ))
    }

    fn create_account_request(user_id: &str) -> Request<Body> {
        Request::post("/accounts")
            .header("X-User-ID", user_id)
            .body(Body::empty())
            .unwrap()
    }

    fn amount_request(path: &str, amount: &str) -> Request<Body> {
        Request::post(path)
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"amount":{}}}"#, amount)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_account_returns_201() {
        let response = test_router()
            .oneshot(create_account_request("u1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_account_without_header_is_400() {
        let response = test_router()
            .oneshot(Request::post("/accounts").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_account_is_409() {
        let router = test_router();

        let first = router
            .clone()
            .oneshot(create_account_request("u1"))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let second = router
            .oneshot(create_account_request("u1"))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_withdraw_insufficient_funds_is_400() {
        let router = test_router();

        router
            .clone()
            .oneshot(create_account_request("u1"))
            .await
            .unwrap();
        router
            .clone()
            .oneshot(amount_request("/accounts/u1/deposit", "10"))
            .await
            .unwrap();

        let response = router
            .oneshot(amount_request("/accounts/u1/withdraw", "40"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "insufficient funds");
    }

    #[tokio::test]
    async fn test_get_missing_account_is_404() {
        let response = test_router()
            .oneshot(Request::get("/accounts/ghost").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
