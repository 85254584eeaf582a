//! Active battles, driven once per server tick

use std::collections::BTreeMap;

use crate::battle::abilities::BattleAbility;
use crate::battle::context::BattleContext;
use crate::battle::entity::EntityRegistry;
use crate::battle::execution::Battle;
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{BattleId, EntityId};

/// What happened during one `tick`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub finished: Vec<BattleId>,
    pub failed: Vec<(BattleId, BattleError)>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.finished.is_empty() && self.failed.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct BattleManager {
    config: BattleConfig,
    battles: BTreeMap<BattleId, Battle>,
}

impl BattleManager {
    pub fn new(config: BattleConfig) -> Self {
        Self {
            config,
            battles: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Build and start a battle
    ///
    /// `Ok(None)` when a listener cancelled the start.
    pub fn start_battle(
        &mut self,
        team_a: Vec<EntityId>,
        team_b: Vec<EntityId>,
        seed: u64,
        ctx: &mut BattleContext,
    ) -> Result<Option<BattleId>> {
        let mut battle = Battle::new(team_a, team_b, ctx.entities, self.config.clone(), seed)?;
        if !battle.start(ctx)? {
            return Ok(None);
        }

        let id = battle.id();
        self.battles.insert(id, battle);
        Ok(Some(id))
    }

    /// Process every active battle once
    ///
    /// Finished and failed battles are dropped and their participants
    /// released.
    pub fn tick(&mut self, ctx: &mut BattleContext) -> TickReport {
        let mut report = TickReport::default();

        for (id, battle) in self.battles.iter_mut() {
            match battle.process_turn(ctx) {
                Ok(()) if battle.is_finished() => report.finished.push(*id),
                Ok(()) => {}
                Err(err) => {
                    tracing::error!("{}: tick failed: {}", id, err);
                    report.failed.push((*id, err));
                }
            }
        }

        let done = report
            .finished
            .iter()
            .chain(report.failed.iter().map(|(id, _)| id));
        for id in done {
            if let Some(battle) = self.battles.remove(id) {
                battle.release_participants(ctx.entities);
            }
        }

        report
    }

    pub fn get(&self, id: BattleId) -> Option<&Battle> {
        self.battles.get(&id)
    }

    pub fn get_mut(&mut self, id: BattleId) -> Option<&mut Battle> {
        self.battles.get_mut(&id)
    }

    /// Battle the entity is currently enrolled in
    pub fn battle_of(&self, entity: EntityId, entities: &EntityRegistry) -> Option<&Battle> {
        entities
            .current_battle(entity)
            .and_then(|id| self.battles.get(&id))
    }

    /// Route a submitted move to the user's battle
    ///
    /// Submissions from entities outside any active battle are ignored.
    pub fn queue_move(&mut self, ability: BattleAbility, entities: &EntityRegistry) -> bool {
        match entities
            .current_battle(ability.user())
            .and_then(|id| self.battles.get_mut(&id))
        {
            Some(battle) => battle.queue_move(ability, entities),
            None => {
                tracing::trace!("queue_move: {} is not in a battle", ability.user());
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.battles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.battles.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = BattleId> + '_ {
        self.battles.keys().copied()
    }
}
