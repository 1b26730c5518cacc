//! Route definitions for the entitlement API.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    can_view, check_feature, create_checkout, create_portal, get_entitlement, health,
    mobile_webhook, visible_count, web_webhook,
};
use super::state::AppState;

/// Provider webhook receivers.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/web", post(web_webhook))
        .route("/mobile", post(mobile_webhook))
}

pub fn entitlement_routes() -> Router<AppState> {
    Router::new()
        .route("/:user_id", get(get_entitlement))
        .route("/:user_id/features/:feature", get(check_feature))
}

/// Checkout and portal call-through; requires `X-User-Id`.
pub fn billing_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", get(create_portal))
}

pub fn team_routes() -> Router<AppState> {
    Router::new()
        .route("/:viewer/can-view/:target", get(can_view))
        .route("/:viewer/visible-count", post(visible_count))
}

/// Full application router with tracing and request timeout.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/webhooks", webhook_routes())
        .nest("/entitlements", entitlement_routes())
        .nest("/billing", billing_routes())
        .nest("/teams", team_routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
