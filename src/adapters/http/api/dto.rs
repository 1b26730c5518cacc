//! HTTP DTOs for the entitlement API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::entitlement::Plan;
use crate::domain::foundation::TeamId;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to start a web checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutBody {
    pub plan: Plan,
}

/// Per-team content counts for a visibility aggregate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisibleCountBody {
    #[serde(default)]
    pub content_by_team: HashMap<TeamId, u64>,
    #[serde(default)]
    pub global_count: u64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct CanViewResponse {
    pub viewer: TeamId,
    pub target: TeamId,
    pub can_view: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedirectResponse {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
