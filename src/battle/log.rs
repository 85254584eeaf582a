//! Append-only battle log
//!
//! Entries are numbered from 0 in insertion order. Clients remember the last
//! id they saw and ask for everything after it.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEntry {
    /// Free-form line (failures, notices)
    Text { text: String },
    Step { actor: String, row: u8 },
    Strike {
        attacker: String,
        target: String,
        damage: i64,
        armor_reduction: i64,
        blocked: Option<i64>,
        evaded: bool,
        target_health_percent: i64,
    },
    Death { name: String },
    /// Final entry; empty when nobody won
    Winner { names: Vec<String> },
    ExperienceGained { amount: i64 },
}

impl LogEntry {
    pub fn text(text: impl Into<String>) -> Self {
        LogEntry::Text { text: text.into() }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Text { text } => write!(f, "{}", text),
            LogEntry::Step { actor, row } => write!(f, "{} steps to row {}", actor, row),
            LogEntry::Strike {
                attacker,
                target,
                damage,
                armor_reduction,
                blocked,
                evaded,
                target_health_percent,
            } => {
                if *evaded {
                    return write!(f, "{} strikes {}: evaded", attacker, target);
                }
                write!(f, "{} strikes {} for {}", attacker, target, damage)?;
                if *armor_reduction > 0 {
                    write!(f, " (armor -{})", armor_reduction)?;
                }
                if let Some(amount) = blocked {
                    write!(f, " (blocked {})", amount)?;
                }
                write!(f, ", {} at {}%", target, target_health_percent)
            }
            LogEntry::Death { name } => write!(f, "{} falls", name),
            LogEntry::Winner { names } if names.is_empty() => write!(f, "Battle ended without a winner"),
            LogEntry::Winner { names } => write!(f, "Winners: {}", names.join(", ")),
            LogEntry::ExperienceGained { amount } => write!(f, "Experience gained: {}", amount),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BattleLog {
    entries: Vec<LogEntry>,
}

impl BattleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, returning its id
    pub fn push(&mut self, entry: LogEntry) -> u32 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u32
    }

    pub fn get(&self, id: u32) -> Option<&LogEntry> {
        self.entries.get(id as usize)
    }

    /// Number of entries, also the id the next entry will get
    pub fn count(&self) -> u32 {
        self.entries.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &LogEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (i as u32, e))
    }

    /// Entries with id >= `from`
    pub fn entries_since(&self, from: u32) -> impl Iterator<Item = (u32, &LogEntry)> {
        self.iter().skip(from as usize)
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut log = BattleLog::new();
        assert_eq!(log.push(LogEntry::text("a")), 0);
        assert_eq!(log.push(LogEntry::text("b")), 1);
        assert_eq!(log.count(), 2);
        assert_eq!(log.get(1), Some(&LogEntry::text("b")));
    }

    #[test]
    fn test_entries_since() {
        let mut log = BattleLog::new();
        log.push(LogEntry::text("a"));
        log.push(LogEntry::text("b"));
        log.push(LogEntry::text("c"));
        let ids: Vec<u32> = log.entries_since(1).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(log.entries_since(3).count(), 0);
    }

    #[test]
    fn test_display_lines() {
        assert_eq!(
            LogEntry::Winner { names: vec![] }.to_string(),
            "Battle ended without a winner"
        );
        assert_eq!(
            LogEntry::Winner { names: vec!["Ann".into(), "Bo".into()] }.to_string(),
            "Winners: Ann, Bo"
        );
        let strike = LogEntry::Strike {
            attacker: "Ann".into(),
            target: "Rat".into(),
            damage: 7,
            armor_reduction: 2,
            blocked: Some(1),
            evaded: false,
            target_health_percent: 30,
        };
        assert_eq!(strike.to_string(), "Ann strikes Rat for 7 (armor -2) (blocked 1), Rat at 30%");
    }
}
