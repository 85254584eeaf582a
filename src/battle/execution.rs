//! Battle orchestration
//!
//! `process_turn` is called once per server tick and makes as much progress
//! as it can without waiting on a human:
//! queued move -> pick current actor -> finish check -> act -> finish check

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::battle::abilities::BattleAbility;
use crate::battle::context::BattleContext;
use crate::battle::entity::{EntityKind, EntityRegistry};
use crate::battle::events::{BattleEvent, Propagation};
use crate::battle::log::{BattleLog, LogEntry};
use crate::battle::pipeline::{BattlePipelines, MovePipelineData, MovePosition, StrikePipelineData};
use crate::battle::profile::CombatProfile;
use crate::battle::rewards::{calculate_experience, RewardCandidate};
use crate::battle::scheduler::TurnScheduler;
use crate::core::config::BattleConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{BattleId, BattleTeam, EntityId};

/// One fight between two teams
#[derive(Debug)]
pub struct Battle {
    id: BattleId,
    config: BattleConfig,

    team_a: Vec<EntityId>,
    team_b: Vec<EntityId>,
    /// Team A first, then team B; never resized
    profiles: Vec<CombatProfile>,
    index: AHashMap<EntityId, usize>,

    // Status
    started: bool,
    finished: bool,
    winner: Option<BattleTeam>,

    // Scheduling
    scheduler: TurnScheduler,
    current: Option<usize>,
    queued_move: Option<BattleAbility>,

    log: BattleLog,
    rng: ChaCha8Rng,
    pipelines: BattlePipelines,
}

impl Battle {
    /// Build a battle and its participant profiles
    ///
    /// Nothing is touched on the entities until `start`.
    pub fn new(
        team_a: Vec<EntityId>,
        team_b: Vec<EntityId>,
        entities: &EntityRegistry,
        config: BattleConfig,
        seed: u64,
    ) -> Result<Self> {
        if team_a.is_empty() {
            return Err(BattleError::EmptyTeam(BattleTeam::TeamA));
        }
        if team_b.is_empty() {
            return Err(BattleError::EmptyTeam(BattleTeam::TeamB));
        }

        let id = BattleId::next();
        let mut profiles = Vec::with_capacity(team_a.len() + team_b.len());
        let mut index = AHashMap::new();

        let roster = team_a
            .iter()
            .map(|e| (*e, BattleTeam::TeamA))
            .chain(team_b.iter().map(|e| (*e, BattleTeam::TeamB)));

        for (entity_id, team) in roster {
            let entity = entities
                .get(entity_id)
                .ok_or(BattleError::UnknownEntity(entity_id))?;

            if index.insert(entity_id, profiles.len()).is_some() {
                return Err(BattleError::DuplicateParticipant(entity_id));
            }

            let profile_id = profiles.len() as u32 + 1;
            profiles.push(CombatProfile::new(
                profile_id,
                entity,
                team,
                config.initial_decision_seconds,
            ));
        }

        Ok(Self {
            id,
            team_a,
            team_b,
            profiles,
            index,
            started: false,
            finished: false,
            winner: None,
            scheduler: TurnScheduler::new(id),
            current: None,
            queued_move: None,
            log: BattleLog::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            pipelines: BattlePipelines::default(),
            config,
        })
    }

    // === ACCESSORS ===

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn winner(&self) -> Option<BattleTeam> {
        self.winner
    }

    /// Always the opposite of `winner`
    pub fn loser(&self) -> Option<BattleTeam> {
        self.winner.map(|w| w.opposite())
    }

    pub fn current_turn(&self) -> u32 {
        self.scheduler.current_turn()
    }

    pub fn attack_speed_threshold(&self) -> f64 {
        self.scheduler.threshold()
    }

    pub fn current_entity(&self) -> Option<EntityId> {
        self.current.map(|i| self.profiles[i].entity)
    }

    /// Participants still waiting for their slot this round
    pub fn turn_order(&self) -> Vec<EntityId> {
        self.scheduler
            .turn_order()
            .map(|i| self.profiles[i].entity)
            .collect()
    }

    pub fn queued_move(&self) -> Option<&BattleAbility> {
        self.queued_move.as_ref()
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn team(&self, team: BattleTeam) -> &[EntityId] {
        match team {
            BattleTeam::TeamA => &self.team_a,
            BattleTeam::TeamB => &self.team_b,
        }
    }

    pub fn participants(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.profiles.iter().map(|p| p.entity)
    }

    pub fn profiles(&self) -> &[CombatProfile] {
        &self.profiles
    }

    pub fn profile(&self, entity: EntityId) -> Option<&CombatProfile> {
        self.index.get(&entity).map(|&i| &self.profiles[i])
    }

    pub fn pipelines_mut(&mut self) -> &mut BattlePipelines {
        &mut self.pipelines
    }

    /// Resolve a participant by its per-battle numeric id
    pub fn find_by_id(&self, target_id: u32, entities: &EntityRegistry) -> Option<EntityId> {
        self.profiles
            .iter()
            .find(|p| p.id == target_id && entities.is_in_battle(p.entity, self.id))
            .map(|p| p.entity)
    }

    /// Switch a human participant between manual and automated play
    pub fn set_auto(&mut self, entity: EntityId, auto: bool) -> bool {
        match self.index.get(&entity) {
            Some(&i) if self.profiles[i].kind == EntityKind::Player => {
                self.profiles[i].auto = auto;
                true
            }
            _ => false,
        }
    }

    pub fn add_log(&mut self, entry: LogEntry) -> u32 {
        self.log.push(entry)
    }

    // === LIFECYCLE ===

    /// Enrol every participant and prepare the scheduler
    ///
    /// Returns `Ok(false)` if the battle was already started or a listener
    /// cancelled the starting event; nothing is changed in either case.
    pub fn start(&mut self, ctx: &mut BattleContext) -> Result<bool> {
        tracing::trace!("{}: start", self.id);

        if self.started {
            return Ok(false);
        }

        for profile in &self.profiles {
            let entity = ctx
                .entities
                .get(profile.entity)
                .ok_or(BattleError::UnknownEntity(profile.entity))?;
            if entity.current_battle.is_some_and(|other| other != self.id) {
                return Err(BattleError::AlreadyInBattle(profile.entity));
            }
        }

        if ctx.events.publish(&BattleEvent::Starting { battle: self.id }) == Propagation::Cancelled {
            tracing::debug!("{}: start cancelled", self.id);
            return Ok(false);
        }

        for profile in &self.profiles {
            let Some(entity) = ctx.entities.get_mut(profile.entity) else {
                continue;
            };

            if matches!(entity.kind, EntityKind::Npc { .. }) {
                entity.hp = entity.stats.max_hp;
            }
            entity.current_battle = Some(self.id);
        }

        self.update_attack_speed_threshold(ctx.entities);
        self.started = true;

        tracing::info!(
            "{}: started, {} vs {}",
            self.id,
            self.team_a.len(),
            self.team_b.len()
        );
        ctx.events.publish(&BattleEvent::Started { battle: self.id });
        Ok(true)
    }

    /// Clear the back-reference of every participant still pointing here
    pub fn release_participants(&self, entities: &mut EntityRegistry) {
        for profile in &self.profiles {
            if let Some(entity) = entities.get_mut(profile.entity) {
                if entity.current_battle == Some(self.id) {
                    entity.current_battle = None;
                }
            }
        }
    }

    /// Recompute the pace of the fastest alive participant
    pub fn update_attack_speed_threshold(&mut self, entities: &EntityRegistry) -> bool {
        let alive = self.alive_indices(entities);
        self.scheduler
            .update_attack_speed_threshold(&mut self.profiles, &alive)
    }

    // === TICK ===

    /// Make as much progress as possible without waiting on a human
    pub fn process_turn(&mut self, ctx: &mut BattleContext) -> Result<()> {
        if !self.started || self.finished {
            return Ok(());
        }

        loop {
            if let Some(ability) = self.queued_move.take() {
                if self.is_ability_valid(&ability, ctx.entities) {
                    self.perform_now(ability, ctx)?;
                }
            }

            self.update_current(ctx);

            if self.check_finish_condition(ctx.entities) {
                self.finish(ctx);
                return Ok(());
            }

            let can_continue = self.process_one(ctx)?;

            if self.check_finish_condition(ctx.entities) {
                self.finish(ctx);
                return Ok(());
            }

            if !can_continue {
                return Ok(());
            }
        }
    }

    fn update_current(&mut self, ctx: &mut BattleContext) {
        if let Some(current) = self.current {
            let profile = &mut self.profiles[current];
            if profile.kind == EntityKind::Player && !profile.auto {
                let now = ctx.clock.now_millis();
                if profile.last_second_update + self.config.countdown_interval_ms <= now {
                    profile.last_second_update = now;
                    profile.seconds_left -= 1;
                }
            }
            return;
        }

        loop {
            if self.scheduler.is_order_empty() {
                self.turn_done(ctx.entities);
                self.calculate_turn_order(ctx.entities);
                if self.scheduler.is_order_empty() {
                    return;
                }
            }

            // Skip anyone who died or left earlier in the round
            while let Some(next) = self.scheduler.next_actor() {
                if !self.is_alive(next, ctx.entities) {
                    continue;
                }

                self.profiles[next].last_second_update = ctx.clock.now_millis();
                self.current = Some(next);
                self.run_checkpoint(next, MovePosition::MoveStart);

                tracing::trace!("{}: update_current: {}", self.id, self.profiles[next].name);
                return;
            }

            // The rest of the round was skipped; a wiped team ends the
            // battle on this turn instead of opening the next one
            if self.is_everyone_dead(BattleTeam::TeamA, ctx.entities)
                || self.is_everyone_dead(BattleTeam::TeamB, ctx.entities)
            {
                return;
            }
        }
    }

    fn calculate_turn_order(&mut self, entities: &EntityRegistry) {
        let alive = self.alive_indices(entities);
        self.scheduler.calculate_turn_order(&mut self.profiles, &alive);
    }

    /// Close the turn: advance the counter and feed every accumulator
    pub fn turn_done(&mut self, entities: &EntityRegistry) {
        let alive = self.alive_indices(entities);
        self.scheduler.turn_done(&mut self.profiles, &alive);

        for index in alive {
            self.run_checkpoint(index, MovePosition::TurnEnd);
        }
    }

    /// Let the current actor act; `false` means it waits for a human
    fn process_one(&mut self, ctx: &mut BattleContext) -> Result<bool> {
        let Some(current) = self.current else {
            return Ok(false);
        };

        match self.profiles[current].kind {
            EntityKind::Npc { .. } => {
                self.process_auto(current, ctx)?;
                Ok(true)
            }
            EntityKind::Player => {
                let profile = &mut self.profiles[current];
                let mut auto = profile.auto;

                if !auto && profile.seconds_left <= 0 {
                    auto = true;

                    if profile.starts_move >= self.config.timeout_penalty_floor {
                        profile.starts_move -= self.config.timeout_penalty_seconds;
                    }
                    tracing::debug!("{}: {} timed out", self.id, profile.name);
                }

                if auto {
                    self.process_auto(current, ctx)?;
                    return Ok(true);
                }
                Ok(false)
            }
        }
    }

    /// Automated move: strike the best reachable opponent, otherwise step
    fn process_auto(&mut self, actor: usize, ctx: &mut BattleContext) -> Result<()> {
        tracing::trace!("{}: process_auto {}", self.id, self.profiles[actor].name);

        let target = self.choose_auto_target(actor, ctx.entities);
        let user = self.profiles[actor].entity;
        let (ability, error) = match target {
            None => (
                BattleAbility::step(user),
                format!("{}: step failed", self.profiles[actor].name),
            ),
            Some(t) => (
                BattleAbility::strike(user, self.profiles[t].entity),
                format!(
                    "{}: target failed: {}",
                    self.profiles[actor].name, self.profiles[t].name
                ),
            ),
        };

        self.perform_or_error(ability, error, ctx)
    }

    /// Melee targets beat ranged ones, then strictly lower level wins
    fn choose_auto_target(&self, actor: usize, entities: &EntityRegistry) -> Option<usize> {
        let me = &self.profiles[actor];
        let mut target: Option<usize> = None;

        for candidate in self.alive_indices(entities) {
            let other = &self.profiles[candidate];
            if other.team == me.team || !me.can_reach(other.row) {
                continue;
            }

            let Some(current) = target else {
                target = Some(candidate);
                continue;
            };

            let current_melee = !self.profiles[current].has_ranged_weapon();
            let candidate_melee = !other.has_ranged_weapon();

            if !current_melee && candidate_melee {
                target = Some(candidate);
                continue;
            } else if current_melee && !candidate_melee {
                continue;
            }

            if other.level < self.profiles[current].level {
                target = Some(candidate);
            }
        }

        target
    }

    fn perform_or_error(
        &mut self,
        ability: BattleAbility,
        error: String,
        ctx: &mut BattleContext,
    ) -> Result<()> {
        if !self.perform_now(ability, ctx)? {
            self.add_log(LogEntry::text(error));
            self.move_done(ability.user())?;
        }
        Ok(())
    }

    /// Resolve an ability right away; `false` if it could not legally happen
    pub fn perform_now(&mut self, ability: BattleAbility, ctx: &mut BattleContext) -> Result<bool> {
        if !self.is_ability_valid(&ability, ctx.entities) {
            return Ok(false);
        }

        match ability {
            BattleAbility::Step { user } => {
                let index = self.index[&user];
                let row = self.profiles[index].step_forward();
                tracing::debug!("{}: {} steps to row {}", self.id, self.profiles[index].name, row);
                self.add_log(LogEntry::Step {
                    actor: self.profiles[index].name.clone(),
                    row,
                });
            }
            BattleAbility::NormalStrike { user, target } => {
                let (u, t) = (self.index[&user], self.index[&target]);
                if !self.profiles[u].can_reach(self.profiles[t].row) {
                    return Ok(false);
                }
                self.resolve_strike(u, t, ctx)?;
            }
        }

        self.move_done(ability.user())?;
        Ok(true)
    }

    fn resolve_strike(&mut self, user: usize, target: usize, ctx: &mut BattleContext) -> Result<()> {
        let attacker_id = self.profiles[user].entity;
        let target_id = self.profiles[target].entity;

        let attacker = ctx
            .entities
            .get(attacker_id)
            .ok_or(BattleError::UnknownEntity(attacker_id))?
            .stats;
        let defender = ctx
            .entities
            .get(target_id)
            .ok_or(BattleError::UnknownEntity(target_id))?
            .stats;

        let low = attacker.damage_min.min(attacker.damage_max);
        let high = attacker.damage_min.max(attacker.damage_max);
        let raw_damage = self.rng.gen_range(low..=high);
        let block_roll = self.rng.gen_range(0.0..100.0);
        let evade_roll = self.rng.gen_range(0.0..100.0);

        let mut data = StrikePipelineData::new(
            attacker_id,
            target_id,
            raw_damage,
            &defender,
            block_roll,
            evade_roll,
        );
        self.pipelines.strike.process(&mut data);
        tracing::debug!("{}: strike {:?}", self.id, data);

        let entity = ctx
            .entities
            .get_mut(target_id)
            .ok_or(BattleError::UnknownEntity(target_id))?;
        entity.hp -= data.physical_damage;
        let health_percent = entity.health_percent();
        let killed = entity.hp <= 0;

        self.add_log(LogEntry::Strike {
            attacker: self.profiles[user].name.clone(),
            target: self.profiles[target].name.clone(),
            damage: data.physical_damage,
            armor_reduction: data.armor_physical_reduction,
            blocked: data.blocked.then_some(data.blocked_physical_amount),
            evaded: data.evaded,
            target_health_percent: health_percent,
        });

        if killed {
            self.profiles[target].dead = true;
            self.add_log(LogEntry::Death {
                name: self.profiles[target].name.clone(),
            });
            tracing::debug!("{}: {} died", self.id, self.profiles[target].name);
            self.update_attack_speed_threshold(ctx.entities);
        }

        Ok(())
    }

    /// Submit a move for the current actor, resolved on the next tick
    pub fn queue_move(&mut self, ability: BattleAbility, entities: &EntityRegistry) -> bool {
        tracing::trace!("{}: queue_move {:?}", self.id, ability);

        if !self.is_ability_valid(&ability, entities) {
            return false;
        }

        let index = self.index[&ability.user()];
        if self.profiles[index].kind == EntityKind::Player {
            self.profiles[index].starts_move = self.config.decision_seconds;
        }

        self.queued_move = Some(ability);
        true
    }

    pub fn is_ability_valid(&self, ability: &BattleAbility, entities: &EntityRegistry) -> bool {
        if self.finished {
            return false;
        }

        let (Some(&user), Some(&target)) = (
            self.index.get(&ability.user()),
            self.index.get(&ability.target()),
        ) else {
            return false;
        };

        if !entities.is_in_battle(ability.user(), self.id)
            || !entities.is_in_battle(ability.target(), self.id)
        {
            return false;
        }
        if self.profiles[user].dead || self.profiles[target].dead {
            return false;
        }

        self.current == Some(user)
    }

    /// Finish the current actor's move and charge its accumulator
    pub fn move_done(&mut self, entity: EntityId) -> Result<()> {
        tracing::trace!("{}: move_done {}", self.id, entity);

        let index = match self.index.get(&entity) {
            Some(&i) if self.current == Some(i) => i,
            _ => return Err(BattleError::NotCurrentActor(entity)),
        };

        self.run_checkpoint(index, MovePosition::MoveEnd);
        self.current = None;
        self.scheduler.pay_move_cost(&mut self.profiles[index]);
        Ok(())
    }

    fn run_checkpoint(&mut self, index: usize, position: MovePosition) {
        let mut data = MovePipelineData::new(&mut self.profiles[index], position);
        self.pipelines.movement.process(&mut data);
    }

    // === FINISH ===

    fn check_finish_condition(&mut self, entities: &EntityRegistry) -> bool {
        if self.scheduler.current_turn() >= self.config.max_turns {
            return true;
        }

        if self.winner.is_some() {
            return true;
        }

        // Team A is checked first, so it loses if both sides fall together
        if self.is_everyone_dead(BattleTeam::TeamA, entities) {
            self.winner = Some(BattleTeam::TeamB);
        } else if self.is_everyone_dead(BattleTeam::TeamB, entities) {
            self.winner = Some(BattleTeam::TeamA);
        }

        self.winner.is_some()
    }

    fn is_everyone_dead(&self, team: BattleTeam, entities: &EntityRegistry) -> bool {
        self.team(team)
            .iter()
            .all(|id| !self.is_alive(self.index[id], entities))
    }

    fn finish(&mut self, ctx: &mut BattleContext) {
        tracing::info!(
            "{}: finish on turn {}, winner {:?}",
            self.id,
            self.scheduler.current_turn(),
            self.winner
        );
        ctx.rewards
            .game_log(&format!("battle finished: {}", self.id));

        let names = match self.winner {
            Some(team) => self
                .team(team)
                .iter()
                .map(|id| self.profiles[self.index[id]].name.clone())
                .collect(),
            None => Vec::new(),
        };
        self.add_log(LogEntry::Winner { names });

        self.calc_exp(ctx);

        self.finished = true;

        ctx.events.publish(&BattleEvent::Finished {
            battle: self.id,
            has_winner: self.winner.is_some(),
            winner_team: self.winner,
            loser_team: self.loser(),
        });
    }

    fn calc_exp(&mut self, ctx: &mut BattleContext) {
        let (Some(winner), Some(loser)) = (self.winner, self.loser()) else {
            return;
        };

        let candidates = |team: &[EntityId]| -> Vec<RewardCandidate> {
            team.iter()
                .filter_map(|id| ctx.entities.get(*id))
                .map(RewardCandidate::from_entity)
                .collect()
        };
        let winners = candidates(self.team(winner));
        let losers = candidates(self.team(loser));

        let Some(award) = calculate_experience(&winners, &losers, &self.config, ctx.exp_table)
        else {
            return;
        };

        for (entity, name, amount) in &award.grants {
            ctx.rewards
                .game_log(&format!("battle {}: +{} XP for {}", self.id, amount, name));
            ctx.rewards.add_experience(*entity, *amount);
        }

        self.add_log(LogEntry::ExperienceGained {
            amount: award.total_granted,
        });
    }

    // === HELPERS ===

    fn is_alive(&self, index: usize, entities: &EntityRegistry) -> bool {
        let profile = &self.profiles[index];
        !profile.dead && entities.is_in_battle(profile.entity, self.id)
    }

    /// Alive participants in registration order
    fn alive_indices(&self, entities: &EntityRegistry) -> Vec<usize> {
        (0..self.profiles.len())
            .filter(|&i| self.is_alive(i, entities))
            .collect()
    }
}
