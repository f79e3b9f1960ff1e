//! HTTP API for the order service.
//!
//! Thin boundary over the order saga coordinator:
//! - Create order
//! - Get order / user's orders
//! - List products
//! - Health check

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use merx_domain::{Order, Product};

use crate::error::OrderdError;
use crate::service::{CreateOrderCommand, OrderService};

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
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
pub fn create_router(service: OrderService) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/orders", post(create_order_handler))
        .route("/orders/:id", get(get_order_handler))
        .route("/orders/user/:user_id", get(list_user_orders_handler))
        .route("/products", get(list_products_handler))
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

/// Create a new order.
async fn create_order_handler(
    State(service): State<OrderService>,
    Json(command): Json<CreateOrderCommand>,
) -> Result<(StatusCode, Json<Order>), (StatusCode, Json<ErrorResponse>)> {
    let order = service
        .create_order(command)
        .await
        .map_err(to_error_response)?;

    Ok((StatusCode::CREATED, Json(order)))
}

/// Get a single order.
async fn get_order_handler(
    State(service): State<OrderService>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, (StatusCode, Json<ErrorResponse>)> {
    let order = service
        .get_order(id)
        .await
        .map_err(to_error_response)?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Order not found: {}", id),
                }),
            )
        })?;

    Ok(Json(order))
}

/// Get all orders for a user.
async fn list_user_orders_handler(
    State(service): State<OrderService>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Order>>, (StatusCode, Json<ErrorResponse>)> {
    let orders = service
        .list_user_orders(&user_id)
        .await
        .map_err(to_error_response)?;

    Ok(Json(orders))
}

/// List the product catalog.
async fn list_products_handler(
    State(service): State<OrderService>,
) -> Result<Json<Vec<Product>>, (StatusCode, Json<ErrorResponse>)> {
    let products = service.list_products().await.map_err(to_error_response)?;

    Ok(Json(products))
}

/// Map service errors to HTTP responses.
///
/// Infrastructure details never reach the client.
fn to_error_response(err: OrderdError) -> (StatusCode, Json<ErrorResponse>) {
    match &err {
        OrderdError::InvalidCommand(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: msg.clone() }),
        ),
        OrderdError::Domain(e) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        ),
        OrderdError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: msg.clone() }),
        ),
        OrderdError::Conflict(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "conflicting state".to_string(),
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
    use crate::store::{MemoryOrderStore, MemoryProductStore};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use merx_domain::Amount;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let orders = Arc::new(MemoryOrderStore::new());
        let products = Arc::new(MemoryProductStore::with_products(vec![Product {
            id: 1,
            name: "Widget".to_string(),
            price: Amount::new(dec!(25.0)).unwrap(),
        }]));
        create_router(OrderService::new(orders, products))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_create_order_returns_201() {
        let response = test_router()
            .oneshot(
                Request::post("/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"user_id":"u1","items":[{"product_id":1,"quantity":2}]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert_eq!(body["user_id"], "u1");
        assert_eq!(body["status"], "NEW");
    }

    #[tokio::test]
    async fn test_create_order_with_unknown_product_is_400() {
        let response = test_router()
            .oneshot(
                Request::post("/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"user_id":"u1","items":[{"product_id":42,"quantity":1}]}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_get_missing_order_is_404() {
        let response = test_router()
            .oneshot(
                Request::get(format!("/orders/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_products() {
        let response = test_router()
            .oneshot(Request::get("/products").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Widget");
    }
}
