//! Team visibility policy.
//!
//! A team always sees its own content. Cross-team visibility comes only from
//! an explicit allow-list of `(viewer, target)` pairs and is directional.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::foundation::TeamId;

/// One allow-list entry: `viewer` may see content scoped to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibilityRule {
    pub viewer: TeamId,
    pub target: TeamId,
}

/// Pure visibility policy over declared team relationships.
#[derive(Debug, Clone, Default)]
pub struct VisibilityPolicy {
    grants: HashSet<(TeamId, TeamId)>,
}

impl VisibilityPolicy {
    pub fn new(rules: impl IntoIterator<Item = VisibilityRule>) -> Self {
        Self {
            grants: rules
                .into_iter()
                .map(|rule| (rule.viewer, rule.target))
                .collect(),
        }
    }

    /// Number of distinct cross-team grants.
    pub fn rule_count(&self) -> usize {
        self.grants.len()
    }

    /// Returns true if `viewer` may see content scoped to `target`.
    pub fn can_view(&self, viewer: &TeamId, target: &TeamId) -> bool {
        viewer == target || self.grants.contains(&(viewer.clone(), target.clone()))
    }

    /// Global content plus content of every team the viewer can see.
    ///
    /// Each team contributes once, however many rules grant it.
    pub fn count_visible(
        &self,
        viewer: &TeamId,
        content_by_team: &HashMap<TeamId, u64>,
        global_count: u64,
    ) -> u64 {
        content_by_team
            .iter()
            .filter(|(team, _)| self.can_view(viewer, team))
            .fold(global_count, |total, (_, count)| total.saturating_add(*count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn team(id: &str) -> TeamId {
        TeamId::new(id).unwrap()
    }

    fn rule(viewer: &str, target: &str) -> VisibilityRule {
        VisibilityRule {
            viewer: team(viewer),
            target: team(target),
        }
    }

    #[test]
    fn team_sees_itself_without_rules() {
        let policy = VisibilityPolicy::default();
        assert!(policy.can_view(&team("a"), &team("a")));
        assert!(!policy.can_view(&team("a"), &team("b")));
    }

    #[test]
    fn rules_are_directional() {
        let policy = VisibilityPolicy::new([rule("a", "b")]);
        assert!(policy.can_view(&team("a"), &team("b")));
        assert!(!policy.can_view(&team("b"), &team("a")));
    }

    #[test]
    fn count_includes_global_own_and_granted_teams() {
        let policy = VisibilityPolicy::new([rule("a", "b")]);
        let content = HashMap::from([(team("a"), 3), (team("b"), 5), (team("c"), 7)]);
        assert_eq!(policy.count_visible(&team("a"), &content, 10), 18);
        assert_eq!(policy.count_visible(&team("b"), &content, 10), 15);
        assert_eq!(policy.count_visible(&team("z"), &content, 10), 10);
    }

    #[test]
    fn duplicate_rules_do_not_double_count() {
        let policy = VisibilityPolicy::new([rule("a", "b"), rule("a", "b"), rule("a", "a")]);
        let content = HashMap::from([(team("a"), 1), (team("b"), 2)]);
        assert_eq!(policy.count_visible(&team("a"), &content, 0), 3);
        assert_eq!(policy.rule_count(), 2);
    }

    fn team_id() -> impl Strategy<Value = TeamId> {
        "[a-e]".prop_map(|s| TeamId::new(s).unwrap())
    }

    fn rules() -> impl Strategy<Value = Vec<VisibilityRule>> {
        prop::collection::vec(
            (team_id(), team_id()).prop_map(|(viewer, target)| VisibilityRule { viewer, target }),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn can_view_is_reflexive(rules in rules(), t in team_id()) {
            prop_assert!(VisibilityPolicy::new(rules).can_view(&t, &t));
        }

        #[test]
        fn single_direction_rule_stays_asymmetric(a in team_id(), b in team_id()) {
            prop_assume!(a != b);
            let policy = VisibilityPolicy::new([VisibilityRule { viewer: a.clone(), target: b.clone() }]);
            prop_assert!(policy.can_view(&a, &b));
            prop_assert!(!policy.can_view(&b, &a));
        }

        #[test]
        fn count_visible_matches_distinct_visible_teams(
            rules in rules(),
            viewer in team_id(),
            counts in prop::collection::hash_map(team_id(), 0u64..100, 0..5),
            global in 0u64..100,
        ) {
            let policy = VisibilityPolicy::new(rules.clone());
            let expected: u64 = global + counts
                .iter()
                .filter(|(team, _)| **team == viewer || rules.iter().any(|r| r.viewer == viewer && r.target == **team))
                .map(|(_, c)| *c)
                .sum::<u64>();
            prop_assert_eq!(policy.count_visible(&viewer, &counts, global), expected);
        }
    }
}
