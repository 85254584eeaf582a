//! Move/turn checkpoint bookkeeping
//!
//! Runs independent of the action taken, keyed by position.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::battle::pipeline::PipelineStage;
use crate::battle::profile::CombatProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovePosition {
    MoveStart,
    MoveEnd,
    TurnEnd,
}

/// Shared record for a checkpoint, borrowing the participant's profile
#[derive(Debug)]
pub struct MovePipelineData<'a> {
    pub position: MovePosition,
    pub profile: &'a mut CombatProfile,
}

impl<'a> MovePipelineData<'a> {
    pub fn new(profile: &'a mut CombatProfile, position: MovePosition) -> Self {
        Self { position, profile }
    }
}

/// Stage usable with a record of any borrow length
pub type CheckpointStage = dyn for<'a> PipelineStage<MovePipelineData<'a>>;

/// Ordered checkpoint stages
///
/// Same contract as `Pipeline`, but stages see a borrowed record, so they
/// are stored as higher-ranked trait objects.
pub struct CheckpointPipeline {
    stages: Vec<Box<CheckpointStage>>,
}

impl CheckpointPipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with_stage(
        mut self,
        stage: impl for<'a> PipelineStage<MovePipelineData<'a>> + 'static,
    ) -> Self {
        self.add_stage(stage);
        self
    }

    /// Append a stage after every existing one
    pub fn add_stage(&mut self, stage: impl for<'a> PipelineStage<MovePipelineData<'a>> + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn process(&self, data: &mut MovePipelineData<'_>) {
        for stage in &self.stages {
            stage.process(data);
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for CheckpointPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CheckpointPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckpointPipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

pub struct CountMovesStage;

impl<'a> PipelineStage<MovePipelineData<'a>> for CountMovesStage {
    fn name(&self) -> &'static str {
        "count_moves"
    }

    fn process(&self, data: &mut MovePipelineData<'a>) {
        if data.position == MovePosition::MoveEnd {
            data.profile.moves_taken += 1;
        }
    }
}

pub struct CountTurnsStage;

impl<'a> PipelineStage<MovePipelineData<'a>> for CountTurnsStage {
    fn name(&self) -> &'static str {
        "count_turns"
    }

    fn process(&self, data: &mut MovePipelineData<'a>) {
        if data.position == MovePosition::TurnEnd && !data.profile.dead {
            data.profile.turns_survived += 1;
        }
    }
}

pub fn standard_pipeline() -> CheckpointPipeline {
    CheckpointPipeline::new()
        .with_stage(CountMovesStage)
        .with_stage(CountTurnsStage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::entity::{CombatStats, Entity, Profession};
    use crate::core::types::BattleTeam;

    fn profile() -> CombatProfile {
        let entity = Entity::player("a", Profession::Warrior, CombatStats::default());
        CombatProfile::new(1, &entity, BattleTeam::TeamA, 15)
    }

    #[test]
    fn test_move_end_counts_move_only() {
        let mut p = profile();
        standard_pipeline().process(&mut MovePipelineData::new(&mut p, MovePosition::MoveEnd));
        assert_eq!(p.moves_taken, 1);
        assert_eq!(p.turns_survived, 0);
    }

    #[test]
    fn test_turn_end_counts_turn_only() {
        let mut p = profile();
        standard_pipeline().process(&mut MovePipelineData::new(&mut p, MovePosition::TurnEnd));
        assert_eq!(p.moves_taken, 0);
        assert_eq!(p.turns_survived, 1);
    }

    #[test]
    fn test_move_start_is_ignored() {
        let mut p = profile();
        standard_pipeline().process(&mut MovePipelineData::new(&mut p, MovePosition::MoveStart));
        assert_eq!(p.moves_taken, 0);
        assert_eq!(p.turns_survived, 0);
    }

    #[test]
    fn test_dead_profile_survives_no_turn() {
        let mut p = profile();
        p.dead = true;
        standard_pipeline().process(&mut MovePipelineData::new(&mut p, MovePosition::TurnEnd));
        assert_eq!(p.turns_survived, 0);
    }

    struct Heal;

    impl<'a> PipelineStage<MovePipelineData<'a>> for Heal {
        fn name(&self) -> &'static str {
            "heal"
        }

        fn process(&self, data: &mut MovePipelineData<'a>) {
            if data.position == MovePosition::MoveStart {
                data.profile.seconds_left += 1;
            }
        }
    }

    #[test]
    fn test_appended_stage_writes_through_borrow() {
        let mut pipeline = standard_pipeline();
        pipeline.add_stage(Heal);
        assert_eq!(pipeline.stage_names(), vec!["count_moves", "count_turns", "heal"]);

        let mut p = profile();
        pipeline.process(&mut MovePipelineData::new(&mut p, MovePosition::MoveStart));
        assert_eq!(p.seconds_left, 16);
    }
}
