//! Team visibility queries over the configured allow-list.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::TeamId;
use crate::domain::visibility::VisibilityPolicy;

#[derive(Debug, Clone)]
pub struct CanViewQuery {
    pub viewer: TeamId,
    pub target: TeamId,
}

/// Content counts to aggregate for a viewer.
#[derive(Debug, Clone, Deserialize)]
pub struct CountVisibleQuery {
    pub viewer: TeamId,
    #[serde(default)]
    pub content_by_team: HashMap<TeamId, u64>,
    #[serde(default)]
    pub global_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleCount {
    pub viewer: TeamId,
    pub visible: u64,
}

pub struct CanViewHandler {
    policy: Arc<VisibilityPolicy>,
}

impl CanViewHandler {
    pub fn new(policy: Arc<VisibilityPolicy>) -> Self {
        Self { policy }
    }

    pub fn handle(&self, query: CanViewQuery) -> bool {
        self.policy.can_view(&query.viewer, &query.target)
    }
}

pub struct CountVisibleHandler {
    policy: Arc<VisibilityPolicy>,
}

impl CountVisibleHandler {
    pub fn new(policy: Arc<VisibilityPolicy>) -> Self {
        Self { policy }
    }

    pub fn handle(&self, query: CountVisibleQuery) -> VisibleCount {
        let visible =
            self.policy
                .count_visible(&query.viewer, &query.content_by_team, query.global_count);
        VisibleCount {
            viewer: query.viewer,
            visible,
        }
    }
}
