use thiserror::Error;

use crate::core::types::{BattleTeam, EntityId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BattleError {
    #[error("Team is empty: {0:?}")]
    EmptyTeam(BattleTeam),

    #[error("Entity not found: {0}")]
    UnknownEntity(EntityId),

    #[error("Entity listed more than once: {0}")]
    DuplicateParticipant(EntityId),

    #[error("Entity is already in a battle: {0}")]
    AlreadyInBattle(EntityId),

    #[error("Entity is not the current actor: {0}")]
    NotCurrentActor(EntityId),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, BattleError>;
