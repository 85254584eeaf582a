//! Strike resolution stages
//!
//! armor reduction -> block -> evasion -> physical damage

use serde::{Deserialize, Serialize};

use crate::battle::entity::CombatStats;
use crate::battle::pipeline::{Pipeline, PipelineStage};
use crate::core::types::EntityId;

/// Shared record for one strike
///
/// Rolls are drawn before the pipeline runs; stages never touch the RNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikePipelineData {
    pub attacker: EntityId,
    pub target: EntityId,

    // Inputs
    pub raw_damage: i64,
    pub target_armor: i64,
    pub block_chance: f64,
    pub block_amount: i64,
    pub evade_chance: f64,
    pub block_roll: f64,
    pub evade_roll: f64,

    // Outputs
    pub armor_physical_reduction: i64,
    pub blocked: bool,
    pub blocked_physical_amount: i64,
    pub evaded: bool,
    pub physical_damage: i64,
}

impl StrikePipelineData {
    pub fn new(
        attacker: EntityId,
        target: EntityId,
        raw_damage: i64,
        defender: &CombatStats,
        block_roll: f64,
        evade_roll: f64,
    ) -> Self {
        Self {
            attacker,
            target,
            raw_damage,
            target_armor: defender.armor,
            block_chance: defender.block_chance,
            block_amount: defender.block_amount,
            evade_chance: defender.evade_chance,
            block_roll,
            evade_roll,
            armor_physical_reduction: 0,
            blocked: false,
            blocked_physical_amount: 0,
            evaded: false,
            physical_damage: 0,
        }
    }
}

/// Flat armor soak, never more than the hit itself
pub struct ArmorReductionStage;

impl PipelineStage<StrikePipelineData> for ArmorReductionStage {
    fn name(&self) -> &'static str {
        "armor_reduction"
    }

    fn process(&self, data: &mut StrikePipelineData) {
        data.armor_physical_reduction = data.target_armor.clamp(0, data.raw_damage.max(0));
    }
}

pub struct BlockStage;

impl PipelineStage<StrikePipelineData> for BlockStage {
    fn name(&self) -> &'static str {
        "block"
    }

    fn process(&self, data: &mut StrikePipelineData) {
        if data.block_roll >= data.block_chance {
            return;
        }

        let remaining = (data.raw_damage - data.armor_physical_reduction).max(0);
        data.blocked = true;
        data.blocked_physical_amount = data.block_amount.clamp(0, remaining);
    }
}

pub struct EvasionStage;

impl PipelineStage<StrikePipelineData> for EvasionStage {
    fn name(&self) -> &'static str {
        "evasion"
    }

    fn process(&self, data: &mut StrikePipelineData) {
        data.evaded = data.evade_roll < data.evade_chance;
    }
}

pub struct PhysicalDamageStage;

impl PipelineStage<StrikePipelineData> for PhysicalDamageStage {
    fn name(&self) -> &'static str {
        "physical_damage"
    }

    fn process(&self, data: &mut StrikePipelineData) {
        data.physical_damage = if data.evaded {
            0
        } else {
            (data.raw_damage - data.armor_physical_reduction - data.blocked_physical_amount).max(0)
        };
    }
}

pub fn standard_pipeline() -> Pipeline<StrikePipelineData> {
    Pipeline::new("strike")
        .with_stage(ArmorReductionStage)
        .with_stage(BlockStage)
        .with_stage(EvasionStage)
        .with_stage(PhysicalDamageStage)
}
