//! Battle system - turn-based team fights driven by the server tick
//!
//! - Speed accumulators decide who acts each turn (`scheduler`)
//! - Humans get a decision countdown, automation takes over on timeout
//! - Strikes resolve through an ordered stage pipeline (`pipeline`)
//! - Winners of fights against monsters earn experience (`rewards`)

pub mod abilities;
pub mod clock;
pub mod context;
pub mod entity;
pub mod events;
pub mod execution;
pub mod log;
pub mod manager;
pub mod pipeline;
pub mod profile;
pub mod rewards;
pub mod scheduler;

// Re-exports for convenient access
pub use abilities::BattleAbility;
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::{BattleContext, LocalServices};
pub use entity::{
    CombatStats, Entity, EntityKind, EntityRegistry, NpcSubtype, Profession, WeaponReach,
};
pub use events::{BattleEvent, EventPublisher, EventRecorder, Propagation};
pub use execution::Battle;
pub use log::{BattleLog, LogEntry};
pub use manager::{BattleManager, TickReport};
pub use pipeline::{
    BattlePipelines, CheckpointPipeline, MovePipelineData, MovePosition, Pipeline, PipelineStage,
    StrikePipelineData,
};
pub use profile::{assign_row, CombatProfile, MAX_ROW, MIN_ROW};
pub use rewards::{
    calculate_experience, ExperienceAward, ExperienceTable, RewardCandidate, RewardLedger,
    RewardSink, StandardExperienceTable,
};
pub use scheduler::TurnScheduler;
