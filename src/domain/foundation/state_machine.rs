//! Validated transitions for lifecycle status enums.

use super::ValidationError;

/// Status enum with a fixed transition table.
///
/// Implementors list the allowed moves; `transition_to` and `is_terminal`
/// are derived from that table.
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    fn can_transition_to(&self, target: &Self) -> bool;

    /// Every status reachable in one step.
    fn valid_transitions(&self) -> Vec<Self>;

    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if !self.can_transition_to(&target) {
            return Err(ValidationError::invalid_format(
                "status",
                format!("no transition from {:?} to {:?}", self, target),
            ));
        }
        Ok(target)
    }

    /// No outgoing transitions.
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Door {
        Open,
        Shut,
        Sealed,
    }

    impl StateMachine for Door {
        fn can_transition_to(&self, target: &Self) -> bool {
            self.valid_transitions().contains(target)
        }

        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Door::Open => vec![Door::Shut],
                Door::Shut => vec![Door::Open, Door::Sealed],
                Door::Sealed => vec![],
            }
        }
    }

    #[test]
    fn allowed_transition_returns_target() {
        assert_eq!(Door::Open.transition_to(Door::Shut), Ok(Door::Shut));
    }

    #[test]
    fn disallowed_transition_names_both_states() {
        let err = Door::Open.transition_to(Door::Sealed).unwrap_err();
        assert!(err.to_string().contains("Open"));
        assert!(err.to_string().contains("Sealed"));
    }

    #[test]
    fn terminal_when_nothing_follows() {
        assert!(Door::Sealed.is_terminal());
        assert!(!Door::Shut.is_terminal());
    }
}
