//! Actions a participant can take on its move

use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleAbility {
    /// Advance one row toward the enemy; targets the user itself
    Step { user: EntityId },
    /// Plain weapon attack
    NormalStrike { user: EntityId, target: EntityId },
}

impl BattleAbility {
    pub fn step(user: EntityId) -> Self {
        BattleAbility::Step { user }
    }

    pub fn strike(user: EntityId, target: EntityId) -> Self {
        BattleAbility::NormalStrike { user, target }
    }

    pub fn user(&self) -> EntityId {
        match self {
            BattleAbility::Step { user } => *user,
            BattleAbility::NormalStrike { user, .. } => *user,
        }
    }

    pub fn target(&self) -> EntityId {
        match self {
            BattleAbility::Step { user } => *user,
            BattleAbility::NormalStrike { target, .. } => *target,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BattleAbility::Step { .. } => "step",
            BattleAbility::NormalStrike { .. } => "strike",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_targets_self() {
        let id = EntityId::new();
        let step = BattleAbility::step(id);
        assert_eq!(step.user(), id);
        assert_eq!(step.target(), id);
    }

    #[test]
    fn test_strike_target() {
        let (a, b) = (EntityId::new(), EntityId::new());
        let strike = BattleAbility::strike(a, b);
        assert_eq!(strike.user(), a);
        assert_eq!(strike.target(), b);
    }
}
