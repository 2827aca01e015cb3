// SPDX-FileCopyrightText: 2026 Cartpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook HTTP server built on axum.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cartpulse_config::WebhookConfig;
use cartpulse_core::CartpulseError;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::event::CartEventPayload;
use crate::reconciler::NotificationReconciler;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct WebhookState {
    pub reconciler: Arc<NotificationReconciler>,
}

/// Response body for POST /webhooks/cart.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Builds the webhook router. Split out from [`start_server`] so tests can
/// drive it without binding a socket.
pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhooks/cart", post(post_cart_webhook))
        .route("/health", get(get_health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Binds the configured address and serves webhook requests until the
/// server task is dropped.
pub async fn start_server(
    config: &WebhookConfig,
    state: WebhookState,
) -> Result<(), CartpulseError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CartpulseError::Channel {
            message: format!("failed to bind webhook server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("webhook server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| CartpulseError::Channel {
            message: format!("webhook server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

/// POST /webhooks/cart
///
/// Runs the payload through the reconciler and reports which notification
/// action was taken.
async fn post_cart_webhook(
    State(state): State<WebhookState>,
    Json(payload): Json<CartEventPayload>,
) -> Response {
    match state.reconciler.process(&payload).await {
        Ok(action) => (
            StatusCode::OK,
            Json(WebhookResponse {
                success: true,
                message: "Webhook processed".to_string(),
                action: Some(action.as_str().to_string()),
            }),
        )
            .into_response(),
        Err(CartpulseError::InvalidPayload(message)) => (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse {
                success: false,
                message,
                action: None,
            }),
        )
            .into_response(),
        Err(error) => {
            error!(%error, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    success: false,
                    message: "Failed to process webhook".to_string(),
                    action: None,
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
