//! Per-participant battle state
//!
//! Rows run 0-5 across the field. Team A occupies 0-2 (2 is its front line),
//! team B is mirrored into 3-5 (3 is its front line).

use serde::{Deserialize, Serialize};

use crate::battle::entity::{Entity, EntityKind, Profession, WeaponReach};
use crate::core::types::{BattleTeam, EntityId};

pub const MIN_ROW: u8 = 0;
pub const MAX_ROW: u8 = 5;

/// Row for a participant before team mirroring is applied
pub fn base_row(weapon: WeaponReach, profession: Profession) -> u8 {
    if weapon != WeaponReach::Ranged {
        return 2;
    }

    match profession {
        Profession::Warrior | Profession::Paladin | Profession::BladeDancer => 2,
        Profession::Mage => 1,
        Profession::Hunter | Profession::Tracker => 0,
    }
}

/// Battlefield row for a participant on the given team
pub fn assign_row(weapon: WeaponReach, profession: Profession, team: BattleTeam) -> u8 {
    let row = base_row(weapon, profession);
    match team {
        BattleTeam::TeamA => row,
        BattleTeam::TeamB => MAX_ROW - row,
    }
}

/// Derived combat state for one participant in one battle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatProfile {
    /// Per-battle numeric id used for targeting (1-based)
    pub id: u32,
    pub entity: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub level: u32,
    pub team: BattleTeam,
    pub row: u8,
    pub weapon: WeaponReach,

    /// Progress toward the next action slot
    pub turn_attack_speed: f64,
    /// Added to `turn_attack_speed` every turn
    pub battle_attack_speed: f64,

    pub dead: bool,

    // Human decision countdown
    pub seconds_left: i32,
    pub starts_move: i32,
    pub last_second_update: u64,
    pub auto: bool,

    // Bookkeeping maintained by checkpoint stages
    pub moves_taken: u32,
    pub turns_survived: u32,
}

impl CombatProfile {
    pub fn new(id: u32, entity: &Entity, team: BattleTeam, decision_seconds: i32) -> Self {
        Self {
            id,
            entity: entity.id,
            name: entity.name.clone(),
            kind: entity.kind,
            level: entity.level(),
            team,
            row: assign_row(entity.stats.weapon, entity.profession, team),
            weapon: entity.stats.weapon,
            turn_attack_speed: 0.0,
            battle_attack_speed: entity.stats.attack_speed,
            dead: false,
            seconds_left: decision_seconds,
            starts_move: decision_seconds,
            last_second_update: 0,
            auto: false,
            moves_taken: 0,
            turns_survived: 0,
        }
    }

    pub fn has_ranged_weapon(&self) -> bool {
        self.weapon == WeaponReach::Ranged
    }

    /// Ranged weapons reach any row, melee only an adjacent one
    pub fn can_reach(&self, row: u8) -> bool {
        self.has_ranged_weapon() || self.row.abs_diff(row) <= 1
    }

    /// Move one row toward the opposing side
    pub fn step_forward(&mut self) -> u8 {
        self.row = match self.team {
            BattleTeam::TeamA => (self.row + 1).min(MAX_ROW),
            BattleTeam::TeamB => self.row.saturating_sub(1),
        };
        self.row
    }
}
