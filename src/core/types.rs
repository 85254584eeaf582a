//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Unique identifier for entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static BATTLE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Process-wide battle identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BattleId(pub u64);

impl BattleId {
    /// Issue the next id (counter starts at 0, first id is 1)
    pub fn next() -> Self {
        Self(BATTLE_COUNTER.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleTeam {
    TeamA,
    TeamB,
}

impl BattleTeam {
    pub fn opposite(&self) -> Self {
        match self {
            BattleTeam::TeamA => BattleTeam::TeamB,
            BattleTeam::TeamB => BattleTeam::TeamA,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battle_ids_increase() {
        let a = BattleId::next();
        let b = BattleId::next();
        assert!(b > a);
        assert!(a.0 >= 1);
    }

    #[test]
    fn test_entity_id_uniqueness() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn test_team_opposite() {
        assert_eq!(BattleTeam::TeamA.opposite(), BattleTeam::TeamB);
        assert_eq!(BattleTeam::TeamB.opposite(), BattleTeam::TeamA);
    }
}
