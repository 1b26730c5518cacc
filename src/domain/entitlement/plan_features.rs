//! Plan-based feature gating.
//!
//! Defines what features and limits are available for each plan.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Plan;
use crate::domain::foundation::ValidationError;

/// Gated feature names exposed to the read API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    UnlimitedPrompts,
    VersionHistory,
    TeamSharing,
    PriorityModels,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::UnlimitedPrompts => "unlimited-prompts",
            Feature::VersionHistory => "version-history",
            Feature::TeamSharing => "team-sharing",
            Feature::PriorityModels => "priority-models",
        }
    }
}

impl FromStr for Feature {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unlimited-prompts" => Ok(Feature::UnlimitedPrompts),
            "version-history" => Ok(Feature::VersionHistory),
            "team-sharing" => Ok(Feature::TeamSharing),
            "priority-models" => Ok(Feature::PriorityModels),
            other => Err(ValidationError::invalid_format(
                "feature",
                format!("unknown feature '{}'", other),
            )),
        }
    }
}

/// Feature limits for a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanFeatures {
    pub plan: Plan,
    /// Maximum saved prompts. None = unlimited.
    pub max_prompts: Option<u32>,
    pub version_history: bool,
    pub team_sharing: bool,
    pub priority_models: bool,
}

impl PlanFeatures {
    /// Get the features for a specific plan.
    ///
    /// | Plan | Prompts | History | Team sharing | Priority models |
    /// |------|---------|---------|--------------|-----------------|
    /// | Free | 10 | No | No | No |
    /// | Pro | Unlimited | Yes | No | No |
    /// | Max | Unlimited | Yes | Yes | Yes |
    pub fn for_plan(plan: Plan) -> Self {
        match plan {
            Plan::Free => Self {
                plan,
                max_prompts: Some(10),
                version_history: false,
                team_sharing: false,
                priority_models: false,
            },
            Plan::Pro => Self {
                plan,
                max_prompts: None,
                version_history: true,
                team_sharing: false,
                priority_models: false,
            },
            Plan::Max => Self {
                plan,
                max_prompts: None,
                version_history: true,
                team_sharing: true,
                priority_models: true,
            },
        }
    }

    pub fn grants(&self, feature: Feature) -> bool {
        match feature {
            Feature::UnlimitedPrompts => self.max_prompts.is_none(),
            Feature::VersionHistory => self.version_history,
            Feature::TeamSharing => self.team_sharing,
            Feature::PriorityModels => self.priority_models,
        }
    }

    /// Returns false if unlimited or under limit.
    pub fn prompt_limit_reached(&self, current_prompts: u32) -> bool {
        self.max_prompts
            .map(|max| current_prompts >= max)
            .unwrap_or(false)
    }
}
