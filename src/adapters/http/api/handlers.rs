//! HTTP handlers for webhooks, entitlement reads, billing, and team visibility.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::dto::{
    CanViewResponse, CheckoutBody, ErrorResponse, HealthResponse, RedirectResponse,
    VisibleCountBody,
};
use super::error::ApiError;
use super::state::AppState;
use crate::application::{
    CanViewQuery, CheckFeatureQuery, CountVisibleQuery, CreateCheckoutCommand,
    CreatePortalCommand, GetEntitlementQuery, ProcessWebhookCommand,
};
use crate::domain::entitlement::{Feature, Provider};
use crate::domain::foundation::{DomainError, TeamId, UserId};
use crate::domain::webhook::{MOBILE_SIGNATURE_HEADER, WEB_SIGNATURE_HEADER};

/// Header carrying the caller's identity, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

// ════════════════════════════════════════════════════════════════════════════════
// Authenticated caller
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity for billing routes.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

/// Rejection when no usable identity header is present.
#[derive(Debug)]
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(
                "AUTHENTICATION_REQUIRED",
                "Authentication required",
            )),
        )
            .into_response()
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s).ok())
            .ok_or(AuthenticationRequired)?;

        Ok(AuthenticatedUser { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhooks
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/web
pub async fn web_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    process_webhook(state, Provider::Web, WEB_SIGNATURE_HEADER, &headers, body).await
}

/// POST /webhooks/mobile
pub async fn mobile_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    process_webhook(state, Provider::Mobile, MOBILE_SIGNATURE_HEADER, &headers, body).await
}

async fn process_webhook(
    state: AppState,
    provider: Provider,
    signature_header: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(signature_header)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let cmd = ProcessWebhookCommand {
        provider,
        payload: body.to_vec(),
        signature,
    };

    let outcome = state.process_webhook_handler().handle(cmd).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Entitlement reads
// ════════════════════════════════════════════════════════════════════════════════

/// GET /entitlements/:user_id
pub async fn get_entitlement(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let view = state
        .get_entitlement_handler()
        .handle(GetEntitlementQuery { user_id })
        .await;
    Ok(Json(view))
}

/// GET /entitlements/:user_id/features/:feature
pub async fn check_feature(
    State(state): State<AppState>,
    Path((user_id, feature)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = parse_user_id(&user_id)?;
    let feature = feature.parse::<Feature>().map_err(DomainError::from)?;

    let check = state
        .check_feature_handler()
        .handle(CheckFeatureQuery { user_id, feature })
        .await;
    Ok(Json(check))
}

fn parse_user_id(raw: &str) -> Result<UserId, ApiError> {
    Ok(UserId::new(raw).map_err(DomainError::from)?)
}

// ════════════════════════════════════════════════════════════════════════════════
// Billing
// ════════════════════════════════════════════════════════════════════════════════

/// POST /billing/checkout - Start a hosted checkout for a paid plan
pub async fn create_checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CheckoutBody>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreateCheckoutCommand {
        user_id: user.user_id,
        plan: body.plan,
    };
    let session = state.create_checkout_handler().handle(cmd).await?;
    Ok(Json(RedirectResponse { url: session.url }))
}

/// GET /billing/portal - Open the provider's self-service portal
pub async fn create_portal(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CreatePortalCommand {
        user_id: user.user_id,
    };
    let session = state.create_portal_handler().handle(cmd).await?;
    Ok(Json(RedirectResponse { url: session.url }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Team visibility
// ════════════════════════════════════════════════════════════════════════════════

/// GET /teams/:viewer/can-view/:target
pub async fn can_view(
    State(state): State<AppState>,
    Path((viewer, target)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = parse_team_id(&viewer)?;
    let target = parse_team_id(&target)?;

    let can_view = state.can_view_handler().handle(CanViewQuery {
        viewer: viewer.clone(),
        target: target.clone(),
    });
    Ok(Json(CanViewResponse {
        viewer,
        target,
        can_view,
    }))
}

/// POST /teams/:viewer/visible-count
pub async fn visible_count(
    State(state): State<AppState>,
    Path(viewer): Path<String>,
    Json(body): Json<VisibleCountBody>,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = parse_team_id(&viewer)?;
    let count = state.count_visible_handler().handle(CountVisibleQuery {
        viewer,
        content_by_team: body.content_by_team,
        global_count: body.global_count,
    });
    Ok(Json(count))
}

fn parse_team_id(raw: &str) -> Result<TeamId, ApiError> {
    Ok(TeamId::new(raw).map_err(DomainError::from)?)
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
