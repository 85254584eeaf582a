//! Combat-capable entities and the registry that owns them
//!
//! Battles never own entities. They hold ids and resolve them through the
//! registry, which also carries each entity's "current battle" back-reference.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{BattleId, EntityId};

/// Character class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profession {
    Warrior,
    Paladin,
    BladeDancer,
    Mage,
    Hunter,
    Tracker,
}

/// Monster tier, drives the experience multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NpcSubtype {
    #[default]
    Normal,
    Elite,
    Elite2,
    Hero,
}

/// Who decides an entity's moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Human-controlled, earns persisted experience
    Player,
    /// Automated
    Npc { subtype: NpcSubtype },
}

/// Weapon reach class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeaponReach {
    #[default]
    Melee,
    Ranged,
}

/// Combat statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatStats {
    pub level: u32,
    pub max_hp: i64,
    pub attack_speed: f64,
    pub damage_min: i64,
    pub damage_max: i64,
    /// Flat physical reduction
    pub armor: i64,
    /// Percent, 0-100
    pub block_chance: f64,
    pub block_amount: i64,
    /// Percent, 0-100
    pub evade_chance: f64,
    pub weapon: WeaponReach,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            level: 1,
            max_hp: 100,
            attack_speed: 1.0,
            damage_min: 5,
            damage_max: 10,
            armor: 0,
            block_chance: 0.0,
            block_amount: 0,
            evade_chance: 0.0,
            weapon: WeaponReach::Melee,
        }
    }
}

/// A player or monster that can take part in battles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub profession: Profession,
    pub stats: CombatStats,
    pub hp: i64,
    pub current_battle: Option<BattleId>,
}

impl Entity {
    pub fn player(name: impl Into<String>, profession: Profession, stats: CombatStats) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            kind: EntityKind::Player,
            profession,
            hp: stats.max_hp,
            stats,
            current_battle: None,
        }
    }

    pub fn npc(
        name: impl Into<String>,
        subtype: NpcSubtype,
        profession: Profession,
        stats: CombatStats,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            kind: EntityKind::Npc { subtype },
            profession,
            hp: stats.max_hp,
            stats,
            current_battle: None,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player)
    }

    pub fn level(&self) -> u32 {
        self.stats.level
    }

    pub fn has_ranged_weapon(&self) -> bool {
        self.stats.weapon == WeaponReach::Ranged
    }

    /// Remaining health in whole percent (0-100)
    pub fn health_percent(&self) -> i64 {
        if self.stats.max_hp <= 0 {
            return 0;
        }
        (self.hp.max(0) * 100 / self.stats.max_hp).min(100)
    }
}

/// Id-indexed entity store
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: AHashMap<EntityId, Entity>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity, returning its id
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.insert(id, entity);
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Battle the entity currently belongs to
    pub fn current_battle(&self, id: EntityId) -> Option<BattleId> {
        self.entities.get(&id).and_then(|e| e.current_battle)
    }

    pub fn is_in_battle(&self, id: EntityId, battle: BattleId) -> bool {
        self.current_battle(id) == Some(battle)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_percent_rounds_down() {
        let mut e = Entity::player("a", Profession::Warrior, CombatStats::default());
        e.hp = 33;
        assert_eq!(e.health_percent(), 33);
        e.hp = -5;
        assert_eq!(e.health_percent(), 0);
    }

    #[test]
    fn test_registry_back_reference() {
        let mut registry = EntityRegistry::new();
        let id = registry.insert(Entity::npc(
            "rat",
            NpcSubtype::Normal,
            Profession::Warrior,
            CombatStats::default(),
        ));
        let battle = BattleId(77);
        assert!(!registry.is_in_battle(id, battle));

        registry.get_mut(id).unwrap().current_battle = Some(battle);
        assert!(registry.is_in_battle(id, battle));
        assert_eq!(registry.current_battle(id), Some(battle));
    }
}
