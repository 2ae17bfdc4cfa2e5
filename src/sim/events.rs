//! Outbound notifications for the presentation layer
//!
//! The simulation queues these as state changes happen; a frontend drains
//! them once per frame with `Simulation::drain_events`.

use serde::{Deserialize, Serialize};

use super::progression::UpgradeOption;
use super::state::{GamePhase, Player, World};
use super::stats::Multipliers;

/// HUD view of the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub hp: f32,
    pub max_hp: f32,
    pub xp: f32,
    pub max_xp: u32,
    pub level: u32,
    pub score: u64,
    /// Currency picked up this run
    pub gold: u64,
    pub kills: u32,
    /// Elapsed run time in seconds
    pub time: f32,
    pub multipliers: Multipliers,
}

impl StatsSnapshot {
    pub fn capture(world: &World) -> Self {
        let p: &Player = &world.player;
        Self {
            hp: p.hp,
            max_hp: p.max_hp(),
            xp: p.xp,
            max_xp: p.max_xp,
            level: p.level,
            score: p.score,
            gold: world.run_gold,
            kills: world.kills,
            // Whole seconds keep the HUD from being re-sent every tick
            time: world.time.floor(),
            multipliers: p.stats.multipliers,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    PhaseChanged(GamePhase),
    Stats(StatsSnapshot),
    /// Exactly three choices; the run is paused until one is applied
    LevelUp { options: Vec<UpgradeOption> },
    WaveAnnounced { title: String },
    BossWarning { seconds: f32 },
    BossSpawned { max_hp: f32 },
    Victory { score: u64 },
    /// Emitted on game over after the profile has been updated
    RunEnded { score: u64, gold: u64, high_score: u64 },
}
