//! Headless Battle Runner
//!
//! Runs an automated party against a monster pack and prints the outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use skirmish::battle::{
    Battle, CombatStats, Entity, LocalServices, NpcSubtype, Profession, WeaponReach,
};
use skirmish::core::{BattleConfig, EntityId};
use tracing_subscriber::EnvFilter;

/// Headless Battle Runner - party vs monster pack
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run an automated party against a monster pack and report the outcome")]
struct Args {
    /// Number of player characters
    #[arg(long, default_value_t = 3)]
    party: usize,

    /// Number of monsters
    #[arg(long, default_value_t = 4)]
    pack: usize,

    /// Level of every combatant
    #[arg(long, default_value_t = 10)]
    level: u32,

    /// Maximum server ticks before giving up
    #[arg(long, default_value_t = 100)]
    max_ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Battle config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print the battle log to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct BattleSummary {
    battle: u64,
    outcome: String,
    winners: Vec<String>,
    turns: u32,
    ticks: u64,
    log_entries: u32,
    experience: Vec<(String, i64)>,
    seed: u64,
}

const PROFESSIONS: [Profession; 6] = [
    Profession::Warrior,
    Profession::Mage,
    Profession::Hunter,
    Profession::Paladin,
    Profession::Tracker,
    Profession::BladeDancer,
];

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skirmish=info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match BattleConfig::load_from_toml(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => BattleConfig::default(),
    };

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut services = LocalServices::new();
    let party: Vec<EntityId> = (0..args.party)
        .map(|i| services.entities.insert(create_player(i, args.level, &mut rng)))
        .collect();
    let pack: Vec<EntityId> = (0..args.pack)
        .map(|i| services.entities.insert(create_monster(i, args.level, &mut rng)))
        .collect();

    let mut battle = match Battle::new(party.clone(), pack, &services.entities, config, seed) {
        Ok(battle) => battle,
        Err(e) => {
            eprintln!("Cannot set up battle: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match battle.start(&mut services.context()) {
        Ok(true) => {}
        Ok(false) => {
            eprintln!("Battle start was cancelled");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Cannot start battle: {}", e);
            return ExitCode::FAILURE;
        }
    }

    for id in &party {
        battle.set_auto(*id, true);
    }

    let mut ticks = 0;
    let mut seen = 0;
    while !battle.is_finished() && ticks < args.max_ticks {
        if let Err(e) = battle.process_turn(&mut services.context()) {
            eprintln!("Tick {} failed: {}", ticks, e);
            break;
        }
        ticks += 1;

        if args.verbose {
            for (id, entry) in battle.log().entries_since(seen) {
                eprintln!("  [{}] {}", id, entry);
            }
            seen = battle.log().count();
        }
    }
    battle.release_participants(&mut services.entities);

    let summary = BattleSummary {
        battle: battle.id().0,
        outcome: match (battle.is_finished(), battle.winner()) {
            (false, _) => "Undecided".to_string(),
            (true, None) => "Draw".to_string(),
            (true, Some(team)) => format!("{:?}", team),
        },
        winners: battle
            .winner()
            .map(|team| {
                battle
                    .team(team)
                    .iter()
                    .filter_map(|id| services.entities.get(*id))
                    .map(|e| e.name.clone())
                    .collect()
            })
            .unwrap_or_default(),
        turns: battle.current_turn(),
        ticks,
        log_entries: battle.log().count(),
        experience: party
            .iter()
            .filter_map(|id| services.entities.get(*id))
            .map(|e| (e.name.clone(), services.rewards.experience_of(e.id)))
            .collect(),
        seed,
    };

    match args.format.as_str() {
        "text" => {
            println!("Battle Result");
            println!("=============");
            println!("Battle: #{}", summary.battle);
            println!("Outcome: {}", summary.outcome);
            println!("Winners: {}", summary.winners.join(", "));
            println!("Turns: {} ({} ticks)", summary.turns, summary.ticks);
            println!("Log entries: {}", summary.log_entries);
            for (name, amount) in &summary.experience {
                println!("  {}: +{} XP", name, amount);
            }
            println!();
            println!("Seed: {}", summary.seed);
        }
        format => {
            if format != "json" {
                eprintln!("Unknown format '{}', defaulting to json", format);
            }
            match serde_json::to_string_pretty(&summary) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("Failed to serialize summary: {}", e);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}

/// Player character with a profession-appropriate weapon
fn create_player(index: usize, level: u32, rng: &mut StdRng) -> Entity {
    let profession = PROFESSIONS[index % PROFESSIONS.len()];
    let weapon = match profession {
        Profession::Mage | Profession::Hunter | Profession::Tracker => WeaponReach::Ranged,
        _ => WeaponReach::Melee,
    };
    let stats = CombatStats {
        level,
        max_hp: 80 + level as i64 * 10,
        attack_speed: rng.gen_range(0.8..1.4),
        damage_min: 4 + level as i64,
        damage_max: 8 + level as i64 * 2,
        armor: rng.gen_range(0..=3),
        block_chance: rng.gen_range(0.0..15.0),
        block_amount: 2,
        evade_chance: rng.gen_range(0.0..10.0),
        weapon,
    };
    Entity::player(format!("Hero {}", index + 1), profession, stats)
}

/// Monster; every fourth one is an elite
fn create_monster(index: usize, level: u32, rng: &mut StdRng) -> Entity {
    let subtype = if index % 4 == 3 {
        NpcSubtype::Elite2
    } else {
        NpcSubtype::Normal
    };
    let stats = CombatStats {
        level,
        max_hp: 60 + level as i64 * 8,
        attack_speed: rng.gen_range(0.6..1.2),
        damage_min: 2 + level as i64,
        damage_max: 5 + level as i64,
        armor: rng.gen_range(0..=2),
        ..CombatStats::default()
    };
    Entity::npc(format!("Ghoul {}", index + 1), subtype, Profession::Warrior, stats)
}
