//! Team visibility configuration.
//!
//! Rules come from an optional YAML file plus inline entries:
//!
//! ```yaml
//! rules:
//!   - viewer: design
//!     target: engineering
//! ```

use serde::Deserialize;
use std::path::Path;

use super::error::{ConfigError, ValidationError};
use crate::domain::visibility::{VisibilityPolicy, VisibilityRule};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamsConfig {
    /// Path to a YAML allow-list file
    pub rules_file: Option<String>,

    /// Rules declared directly in configuration
    #[serde(default)]
    pub rules: Vec<VisibilityRule>,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default)]
    rules: Vec<VisibilityRule>,
}

impl TeamsConfig {
    /// Builds the policy from inline rules and the rules file.
    pub fn load_policy(&self) -> Result<VisibilityPolicy, ConfigError> {
        let mut rules = self.rules.clone();
        if let Some(path) = &self.rules_file {
            rules.extend(load_rules_file(Path::new(path))?);
        }
        if rules
            .iter()
            .any(|r| r.viewer.as_str().trim().is_empty() || r.target.as_str().trim().is_empty())
        {
            return Err(ValidationError::InvalidTeamRule.into());
        }
        Ok(VisibilityPolicy::new(rules))
    }
}

fn load_rules_file(path: &Path) -> Result<Vec<VisibilityRule>, ConfigError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::TeamsFileRead {
        path: display.clone(),
        source,
    })?;
    let file: RulesFile = serde_yaml::from_str(&raw).map_err(|source| {
        ConfigError::TeamsFileParse {
            path: display,
            source,
        }
    })?;
    Ok(file.rules)
}
