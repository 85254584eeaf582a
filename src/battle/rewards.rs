//! Experience distribution after a won fight against monsters
//!
//! Every winner receives the whole pool, it is not split between them.

use ahash::AHashMap;

use crate::battle::entity::{Entity, EntityKind, NpcSubtype};
use crate::core::config::BattleConfig;
use crate::core::types::EntityId;

/// Base experience a monster of a given level is worth
pub trait ExperienceTable {
    fn base_exp(&self, level: u32) -> i64;
}

/// `level^2 / 4 + 5 * level + 10`
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardExperienceTable;

impl ExperienceTable for StandardExperienceTable {
    fn base_exp(&self, level: u32) -> i64 {
        let level = level as i64;
        level * level / 4 + 5 * level + 10
    }
}

/// Where experience and human-readable activity records go
pub trait RewardSink {
    fn add_experience(&mut self, entity: EntityId, amount: i64);
    fn game_log(&mut self, line: &str);
}

/// In-memory sink
#[derive(Debug, Clone, Default)]
pub struct RewardLedger {
    pub experience: AHashMap<EntityId, i64>,
    pub lines: Vec<String>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn experience_of(&self, entity: EntityId) -> i64 {
        self.experience.get(&entity).copied().unwrap_or(0)
    }
}

impl RewardSink for RewardLedger {
    fn add_experience(&mut self, entity: EntityId, amount: i64) {
        *self.experience.entry(entity).or_insert(0) += amount;
    }

    fn game_log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Snapshot of a participant for reward purposes
#[derive(Debug, Clone)]
pub struct RewardCandidate {
    pub entity: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub level: u32,
    pub health_percent: i64,
}

impl RewardCandidate {
    pub fn from_entity(entity: &Entity) -> Self {
        Self {
            entity: entity.id,
            name: entity.name.clone(),
            kind: entity.kind,
            level: entity.level(),
            health_percent: entity.health_percent(),
        }
    }

    fn is_npc(&self) -> bool {
        matches!(self.kind, EntityKind::Npc { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceAward {
    /// Pool every winner receives
    pub pool: i64,
    /// Persisted grants, human winners only
    pub grants: Vec<(EntityId, String, i64)>,
    /// Sum over all winners, automated ones included
    pub total_granted: i64,
}

/// Bonus fraction for health the winners lost (10% per full 15%)
pub fn health_bonus(winners: &[RewardCandidate], config: &BattleConfig) -> f64 {
    if winners.is_empty() {
        return 0.0;
    }
    let average_hp: i64 =
        winners.iter().map(|w| w.health_percent).sum::<i64>() / winners.len() as i64;
    let hp_lost = 100 - average_hp;
    (hp_lost / config.health_loss_step_percent) as f64 * config.health_loss_bonus
}

/// Experience one monster is worth to winners of the given average level
///
/// Returns `None` when the winners outlevel it past the cutoff.
pub fn monster_exp(
    level: u32,
    subtype: NpcSubtype,
    winner_average_level: u32,
    hp_bonus: f64,
    config: &BattleConfig,
    table: &dyn ExperienceTable,
) -> Option<i64> {
    if winner_average_level > level + config.level_advantage_cutoff {
        return None;
    }

    let mut exp = table.base_exp(level);

    if winner_average_level > level {
        let advantage = (winner_average_level - level) as f64;
        let reduction = (advantage * config.level_advantage_reduction * exp as f64) as i64;
        exp -= reduction;
    }

    exp += (hp_bonus * exp as f64) as i64;

    match subtype {
        NpcSubtype::Elite2 => exp *= config.elite2_multiplier,
        NpcSubtype::Hero => exp *= config.hero_multiplier,
        NpcSubtype::Normal | NpcSubtype::Elite => {}
    }

    Some(exp)
}

/// Work out the experience award, if any
///
/// Only fights where automated entities lost to at least one human earn
/// experience.
pub fn calculate_experience(
    winners: &[RewardCandidate],
    losers: &[RewardCandidate],
    config: &BattleConfig,
    table: &dyn ExperienceTable,
) -> Option<ExperienceAward> {
    if winners.is_empty() || winners.iter().all(|w| w.is_npc()) {
        return None;
    }
    if !losers.iter().all(|l| l.is_npc()) {
        return None;
    }

    let average_level = winners.iter().map(|w| w.level).sum::<u32>() / winners.len() as u32;
    let hp_bonus = health_bonus(winners, config);

    let pool: i64 = losers
        .iter()
        .filter_map(|loser| match loser.kind {
            EntityKind::Npc { subtype } => {
                monster_exp(loser.level, subtype, average_level, hp_bonus, config, table)
            }
            EntityKind::Player => None,
        })
        .sum();

    let grants = winners
        .iter()
        .filter(|w| !w.is_npc())
        .map(|w| (w.entity, w.name.clone(), pool))
        .collect();

    Some(ExperienceAward {
        pool,
        grants,
        total_granted: pool * winners.len() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatTable(i64);
    impl ExperienceTable for FlatTable {
        fn base_exp(&self, _level: u32) -> i64 {
            self.0
        }
    }

    fn player(level: u32, hp: i64) -> RewardCandidate {
        RewardCandidate {
            entity: EntityId::new(),
            name: "hero".into(),
            kind: EntityKind::Player,
            level,
            health_percent: hp,
        }
    }

    fn monster(level: u32, subtype: NpcSubtype) -> RewardCandidate {
        RewardCandidate {
            entity: EntityId::new(),
            name: "monster".into(),
            kind: EntityKind::Npc { subtype },
            level,
            health_percent: 0,
        }
    }

    #[test]
    fn test_even_fight_full_health_grants_base() {
        let config = BattleConfig::default();
        let award = calculate_experience(
            &[player(10, 100)],
            &[monster(10, NpcSubtype::Normal)],
            &config,
            &FlatTable(100),
        )
        .unwrap();
        assert_eq!(award.pool, 100);
        assert_eq!(award.grants.len(), 1);
        assert_eq!(award.grants[0].2, 100);
    }

    #[test]
    fn test_every_winner_gets_whole_pool() {
        let config = BattleConfig::default();
        let award = calculate_experience(
            &[player(10, 100), player(10, 100)],
            &[monster(10, NpcSubtype::Normal)],
            &config,
            &FlatTable(100),
        )
        .unwrap();
        assert!(award.grants.iter().all(|g| g.2 == 100));
        assert_eq!(award.total_granted, 200);
    }

    #[test]
    fn test_subtype_multipliers() {
        let config = BattleConfig::default();
        let table = FlatTable(100);
        assert_eq!(monster_exp(10, NpcSubtype::Elite, 10, 0.0, &config, &table), Some(100));
        assert_eq!(monster_exp(10, NpcSubtype::Elite2, 10, 0.0, &config, &table), Some(200));
        assert_eq!(monster_exp(10, NpcSubtype::Hero, 10, 0.0, &config, &table), Some(1500));
    }

    #[test]
    fn test_level_advantage_reduction() {
        let config = BattleConfig::default();
        // 5 levels above: 20% off
        assert_eq!(
            monster_exp(10, NpcSubtype::Normal, 15, 0.0, &config, &FlatTable(100)),
            Some(80)
        );
        // exactly at the cutoff still counts
        assert_eq!(
            monster_exp(10, NpcSubtype::Normal, 35, 0.0, &config, &FlatTable(100)),
            Some(0)
        );
        assert_eq!(monster_exp(10, NpcSubtype::Normal, 36, 0.0, &config, &FlatTable(100)), None);
    }

    #[test]
    fn test_lower_winner_gets_no_bonus_for_level() {
        let config = BattleConfig::default();
        assert_eq!(
            monster_exp(20, NpcSubtype::Normal, 10, 0.0, &config, &FlatTable(100)),
            Some(100)
        );
    }

    #[test]
    fn test_health_bonus_steps() {
        let config = BattleConfig::default();
        assert_eq!(health_bonus(&[player(1, 100)], &config), 0.0);
        assert_eq!(health_bonus(&[player(1, 86)], &config), 0.0);
        assert!((health_bonus(&[player(1, 85)], &config) - 0.1).abs() < 1e-9);
        // average of 40 and 60 is 50: 50 lost -> 3 steps
        assert!((health_bonus(&[player(1, 40), player(1, 60)], &config) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_npc_winners_get_nothing() {
        let config = BattleConfig::default();
        let winners = [monster(10, NpcSubtype::Normal)];
        assert!(calculate_experience(&winners, &[player(10, 0)], &config, &FlatTable(100)).is_none());
    }

    #[test]
    fn test_pvp_grants_nothing() {
        let config = BattleConfig::default();
        assert!(
            calculate_experience(&[player(10, 100)], &[player(10, 0)], &config, &FlatTable(100))
                .is_none()
        );
    }

    #[test]
    fn test_mixed_winners_only_players_persist() {
        let config = BattleConfig::default();
        let award = calculate_experience(
            &[player(10, 100), monster(10, NpcSubtype::Normal)],
            &[monster(10, NpcSubtype::Normal)],
            &config,
            &FlatTable(50),
        )
        .unwrap();
        assert_eq!(award.grants.len(), 1);
        assert_eq!(award.total_granted, 100);
    }

    #[test]
    fn test_standard_table_grows_with_level() {
        let table = StandardExperienceTable;
        assert_eq!(table.base_exp(0), 10);
        assert!(table.base_exp(20) > table.base_exp(10));
    }
}
