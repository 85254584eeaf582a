//! Collaborators a battle needs while it runs

use crate::battle::clock::{Clock, SystemClock};
use crate::battle::entity::EntityRegistry;
use crate::battle::events::{EventPublisher, EventRecorder};
use crate::battle::rewards::{ExperienceTable, RewardLedger, RewardSink, StandardExperienceTable};

/// Borrowed view of the server state a battle call may touch
pub struct BattleContext<'a> {
    pub entities: &'a mut EntityRegistry,
    pub events: &'a mut dyn EventPublisher,
    pub rewards: &'a mut dyn RewardSink,
    pub clock: &'a dyn Clock,
    pub exp_table: &'a dyn ExperienceTable,
}

/// Self-contained in-memory collaborators
///
/// Used by the runner binary and by tests.
#[derive(Debug, Default)]
pub struct LocalServices<C: Clock = SystemClock> {
    pub entities: EntityRegistry,
    pub events: EventRecorder,
    pub rewards: RewardLedger,
    pub clock: C,
    pub exp_table: StandardExperienceTable,
}

impl LocalServices<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> LocalServices<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            entities: EntityRegistry::new(),
            events: EventRecorder::new(),
            rewards: RewardLedger::new(),
            clock,
            exp_table: StandardExperienceTable,
        }
    }

    pub fn context(&mut self) -> BattleContext<'_> {
        BattleContext {
            entities: &mut self.entities,
            events: &mut self.events,
            rewards: &mut self.rewards,
            clock: &self.clock,
            exp_table: &self.exp_table,
        }
    }
}
