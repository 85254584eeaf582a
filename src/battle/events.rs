//! Battle lifecycle events
//!
//! Delivery is the caller's business; the engine only publishes.

use serde::{Deserialize, Serialize};

use crate::core::types::{BattleId, BattleTeam};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// Published before any state changes; may be cancelled
    Starting { battle: BattleId },
    Started { battle: BattleId },
    Finished {
        battle: BattleId,
        has_winner: bool,
        winner_team: Option<BattleTeam>,
        loser_team: Option<BattleTeam>,
    },
}

/// Listener verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Cancelled,
}

pub trait EventPublisher {
    fn publish(&mut self, event: &BattleEvent) -> Propagation;
}

/// Keeps every published event, optionally cancelling `Starting`
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    pub events: Vec<BattleEvent>,
    pub cancel_starting: bool,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling() -> Self {
        Self {
            events: Vec::new(),
            cancel_starting: true,
        }
    }
}

impl EventPublisher for EventRecorder {
    fn publish(&mut self, event: &BattleEvent) -> Propagation {
        self.events.push(event.clone());
        match event {
            BattleEvent::Starting { .. } if self.cancel_starting => Propagation::Cancelled,
            _ => Propagation::Continue,
        }
    }
}
