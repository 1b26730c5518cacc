//! Entitlement HTTP API.
//!
//! - `POST /webhooks/{web,mobile}` - signed provider deliveries
//! - `GET /entitlements/:user_id[/features/:feature]` - effective entitlement reads
//! - `POST /billing/checkout`, `GET /billing/portal` - provider call-through
//! - `GET|POST /teams/...` - team visibility queries

mod dto;
mod error;
mod handlers;
mod routes;
mod state;

pub use dto::{CanViewResponse, CheckoutBody, ErrorResponse, RedirectResponse, VisibleCountBody};
pub use error::ApiError;
pub use handlers::{AuthenticatedUser, AuthenticationRequired, USER_ID_HEADER};
pub use routes::{app_router, billing_routes, entitlement_routes, team_routes, webhook_routes};
pub use state::AppState;
