//! Ability pipelines
//!
//! A pipeline is an ordered list of stages sharing one mutable record.
//! Stages only touch the record, so new ones can be appended without
//! changing the ones already registered.

pub mod checkpoint;
pub mod strike;

use std::fmt;

pub use checkpoint::{CheckpointPipeline, MovePipelineData, MovePosition};
pub use strike::StrikePipelineData;

/// One step of a pipeline
pub trait PipelineStage<D>: Send + Sync {
    fn name(&self) -> &'static str;
    fn process(&self, data: &mut D);
}

/// Ordered stages over a shared record
pub struct Pipeline<D> {
    name: &'static str,
    stages: Vec<Box<dyn PipelineStage<D>>>,
}

impl<D> Pipeline<D> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            stages: Vec::new(),
        }
    }

    pub fn with_stage(mut self, stage: impl PipelineStage<D> + 'static) -> Self {
        self.add_stage(stage);
        self
    }

    /// Append a stage after every existing one
    pub fn add_stage(&mut self, stage: impl PipelineStage<D> + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn process(&self, data: &mut D) {
        for stage in &self.stages {
            stage.process(data);
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<D> fmt::Debug for Pipeline<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

/// The pipelines a battle runs
#[derive(Debug)]
pub struct BattlePipelines {
    pub strike: Pipeline<StrikePipelineData>,
    pub movement: CheckpointPipeline,
}

impl Default for BattlePipelines {
    fn default() -> Self {
        Self {
            strike: strike::standard_pipeline(),
            movement: checkpoint::standard_pipeline(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Double;
    impl PipelineStage<i64> for Double {
        fn name(&self) -> &'static str {
            "double"
        }
        fn process(&self, data: &mut i64) {
            *data *= 2;
        }
    }

    struct AddOne;
    impl PipelineStage<i64> for AddOne {
        fn name(&self) -> &'static str {
            "add_one"
        }
        fn process(&self, data: &mut i64) {
            *data += 1;
        }
    }

    #[test]
    fn test_stages_run_in_registration_order() {
        let pipeline = Pipeline::new("math").with_stage(AddOne).with_stage(Double);
        let mut value = 3;
        pipeline.process(&mut value);
        assert_eq!(value, 8);
        assert_eq!(pipeline.stage_names(), vec!["add_one", "double"]);
    }

    #[test]
    fn test_appended_stage_runs_last() {
        let mut pipeline = Pipeline::new("math").with_stage(Double);
        pipeline.add_stage(AddOne);
        let mut value = 3;
        pipeline.process(&mut value);
        assert_eq!(value, 7);
    }

    #[test]
    fn test_standard_pipelines_order() {
        let pipelines = BattlePipelines::default();
        assert_eq!(
            pipelines.strike.stage_names(),
            vec!["armor_reduction", "block", "evasion", "physical_damage"]
        );
        assert_eq!(pipelines.movement.stage_names(), vec!["count_moves", "count_turns"]);
    }
}
