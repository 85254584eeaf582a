//! Skirmish - turn-based team battle engine

pub mod battle;
pub mod core;
