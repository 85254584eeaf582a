//! Speed-based turn scheduling
//!
//! Every participant accumulates its attack speed once per turn. Whoever
//! has accumulated at least the threshold (the fastest alive participant's
//! speed) gets an action slot this round, and pays the threshold back when
//! the move completes.
//!
//! Participants are addressed by their index in the battle's profile list,
//! and `alive` slices are always in registration order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::battle::profile::CombatProfile;
use crate::core::types::BattleId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnScheduler {
    battle: BattleId,
    /// Negative until the first update
    attack_speed_threshold: f64,
    current_turn_order: VecDeque<usize>,
    current_turn: u32,
}

impl TurnScheduler {
    pub fn new(battle: BattleId) -> Self {
        Self {
            battle,
            attack_speed_threshold: -1.0,
            current_turn_order: VecDeque::new(),
            current_turn: 0,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.attack_speed_threshold
    }

    pub fn current_turn(&self) -> u32 {
        self.current_turn
    }

    pub fn turn_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.current_turn_order.iter().copied()
    }

    pub fn is_order_empty(&self) -> bool {
        self.current_turn_order.is_empty()
    }

    /// Recompute the threshold from alive participants
    ///
    /// When it changes, every accumulator is scaled by `previous / new` so
    /// relative progress survives the change of pace. Returns whether the
    /// threshold changed.
    pub fn update_attack_speed_threshold(
        &mut self,
        profiles: &mut [CombatProfile],
        alive: &[usize],
    ) -> bool {
        let previous = self.attack_speed_threshold;
        let Some(max_attack_speed) = alive
            .iter()
            .map(|&i| profiles[i].battle_attack_speed)
            .reduce(f64::max)
        else {
            tracing::trace!("{}: update_attack_speed_threshold: nobody alive", self.battle);
            return false;
        };

        tracing::trace!(
            "{}: update_attack_speed_threshold: previous {}, current {}",
            self.battle,
            previous,
            max_attack_speed
        );

        if previous == max_attack_speed {
            return false;
        }

        if previous > 0.0 && max_attack_speed > 0.0 {
            let change_factor = max_attack_speed / previous;
            tracing::trace!(
                "{}: update_attack_speed_threshold: change factor {}",
                self.battle,
                change_factor
            );

            for profile in profiles.iter_mut() {
                let from = profile.turn_attack_speed;
                profile.turn_attack_speed /= change_factor;
                tracing::trace!(
                    "{}: update_attack_speed_threshold: {}: {} -> {}",
                    self.battle,
                    profile.id,
                    from,
                    profile.turn_attack_speed
                );
            }
        }

        self.attack_speed_threshold = max_attack_speed;
        true
    }

    /// Build this round's order and reset every alive decision budget
    pub fn calculate_turn_order(&mut self, profiles: &mut [CombatProfile], alive: &[usize]) {
        tracing::trace!("{}: calculate_turn_order", self.battle);

        self.current_turn_order.clear();
        for &index in alive {
            let profile = &mut profiles[index];

            if profile.turn_attack_speed >= self.attack_speed_threshold {
                self.current_turn_order.push_back(index);
            }

            profile.seconds_left = profile.starts_move;
        }
    }

    /// Advance the turn counter and feed every alive accumulator
    pub fn turn_done(&mut self, profiles: &mut [CombatProfile], alive: &[usize]) {
        tracing::trace!(
            "{}: turn_done: {} -> {}",
            self.battle,
            self.current_turn,
            self.current_turn + 1
        );

        self.current_turn += 1;
        for &index in alive {
            let profile = &mut profiles[index];
            profile.turn_attack_speed += profile.battle_attack_speed;
        }
    }

    /// Pop the next participant of this round
    pub fn next_actor(&mut self) -> Option<usize> {
        self.current_turn_order.pop_front()
    }

    /// Charge the threshold for a completed move
    pub fn pay_move_cost(&self, profile: &mut CombatProfile) {
        profile.turn_attack_speed -= self.attack_speed_threshold;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::entity::{CombatStats, Entity, Profession};
    use crate::core::types::BattleTeam;
    use proptest::prelude::*;

    fn profiles(speeds: &[f64]) -> Vec<CombatProfile> {
        speeds
            .iter()
            .enumerate()
            .map(|(i, &speed)| {
                let stats = CombatStats { attack_speed: speed, ..CombatStats::default() };
                let entity = Entity::player(format!("p{}", i), Profession::Warrior, stats);
                CombatProfile::new(i as u32 + 1, &entity, BattleTeam::TeamA, 15)
            })
            .collect()
    }

    fn all(profiles: &[CombatProfile]) -> Vec<usize> {
        (0..profiles.len()).collect()
    }

    #[test]
    fn test_threshold_is_max_alive_speed() {
        let mut p = profiles(&[1.0, 3.0, 2.0]);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        assert!(scheduler.update_attack_speed_threshold(&mut p, &[0, 2]));
        assert_eq!(scheduler.threshold(), 2.0);
    }

    #[test]
    fn test_first_threshold_does_not_rescale() {
        let mut p = profiles(&[2.0, 4.0]);
        p[0].turn_attack_speed = 3.0;
        let alive = all(&p);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.update_attack_speed_threshold(&mut p, &alive);
        assert_eq!(p[0].turn_attack_speed, 3.0);
    }

    #[test]
    fn test_threshold_change_rescales_by_previous_over_new() {
        let mut p = profiles(&[2.0, 4.0]);
        let alive = all(&p);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.update_attack_speed_threshold(&mut p, &alive);

        p[0].turn_attack_speed = 3.0;
        p[1].turn_attack_speed = 6.0;
        // Fastest participant drops out: threshold 4 -> 2
        assert!(scheduler.update_attack_speed_threshold(&mut p, &[0]));
        assert_eq!(scheduler.threshold(), 2.0);
        assert_eq!(p[0].turn_attack_speed, 1.5);
        assert_eq!(p[1].turn_attack_speed, 3.0);
    }

    #[test]
    fn test_unchanged_threshold_leaves_accumulators() {
        let mut p = profiles(&[2.0, 4.0]);
        let alive = all(&p);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.update_attack_speed_threshold(&mut p, &alive);
        p[0].turn_attack_speed = 3.0;
        assert!(!scheduler.update_attack_speed_threshold(&mut p, &alive));
        assert_eq!(p[0].turn_attack_speed, 3.0);
    }

    #[test]
    fn test_turn_order_keeps_registration_order() {
        let mut p = profiles(&[1.0, 5.0, 5.0]);
        let alive = all(&p);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.update_attack_speed_threshold(&mut p, &alive);
        p[0].turn_attack_speed = 9.0;
        p[1].turn_attack_speed = 5.0;
        p[2].turn_attack_speed = 7.0;

        scheduler.calculate_turn_order(&mut p, &alive);
        assert_eq!(scheduler.turn_order().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(scheduler.next_actor(), Some(0));
        assert_eq!(scheduler.next_actor(), Some(1));
    }

    #[test]
    fn test_turn_order_resets_decision_budget() {
        let mut p = profiles(&[1.0, 2.0]);
        let alive = all(&p);
        p[0].starts_move = 10;
        p[0].seconds_left = 0;
        p[1].starts_move = 15;
        p[1].seconds_left = 3;
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.update_attack_speed_threshold(&mut p, &alive);
        scheduler.calculate_turn_order(&mut p, &alive);
        assert_eq!(p[0].seconds_left, 10);
        assert_eq!(p[1].seconds_left, 15);
    }

    #[test]
    fn test_turn_done_feeds_alive_only() {
        let mut p = profiles(&[1.0, 2.0]);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.turn_done(&mut p, &[1]);
        assert_eq!(scheduler.current_turn(), 1);
        assert_eq!(p[0].turn_attack_speed, 0.0);
        assert_eq!(p[1].turn_attack_speed, 2.0);
    }

    #[test]
    fn test_move_cost_subtracts_threshold() {
        let mut p = profiles(&[3.0]);
        let alive = all(&p);
        let mut scheduler = TurnScheduler::new(BattleId(1));
        scheduler.update_attack_speed_threshold(&mut p, &alive);
        p[0].turn_attack_speed = 4.0;
        scheduler.pay_move_cost(&mut p[0]);
        assert_eq!(p[0].turn_attack_speed, 1.0);
    }

    proptest! {
        #[test]
        fn prop_turn_order_partitions_alive(
            speeds in prop::collection::vec(0.5f64..10.0, 1..8),
            progress in prop::collection::vec(0.0f64..20.0, 8),
        ) {
            let mut p = profiles(&speeds);
            let alive = all(&p);
            let mut scheduler = TurnScheduler::new(BattleId(1));
            scheduler.update_attack_speed_threshold(&mut p, &alive);
            for (profile, value) in p.iter_mut().zip(progress.iter()) {
                profile.turn_attack_speed = *value;
            }

            scheduler.calculate_turn_order(&mut p, &alive);
            let order: Vec<usize> = scheduler.turn_order().collect();
            let threshold = scheduler.threshold();
            for index in alive {
                if order.contains(&index) {
                    prop_assert!(p[index].turn_attack_speed >= threshold);
                } else {
                    prop_assert!(p[index].turn_attack_speed < threshold);
                }
            }
        }

        #[test]
        fn prop_rescale_multiplies_by_old_over_new(
            speeds in prop::collection::vec(0.5f64..10.0, 2..8),
            progress in prop::collection::vec(0.0f64..20.0, 8),
        ) {
            let mut p = profiles(&speeds);
            let alive = all(&p);
            let mut scheduler = TurnScheduler::new(BattleId(1));
            scheduler.update_attack_speed_threshold(&mut p, &alive);
            let t0 = scheduler.threshold();

            for (profile, value) in p.iter_mut().zip(progress.iter()) {
                profile.turn_attack_speed = *value;
            }
            let before: Vec<f64> = p.iter().map(|x| x.turn_attack_speed).collect();

            // Drop the first participant from the alive set
            let rest: Vec<usize> = alive[1..].to_vec();
            scheduler.update_attack_speed_threshold(&mut p, &rest);
            let t1 = scheduler.threshold();

            for (profile, old) in p.iter().zip(before.iter()) {
                let expected = old * t0 / t1;
                prop_assert!((profile.turn_attack_speed - expected).abs() < 1e-9);
            }
        }
    }
}
